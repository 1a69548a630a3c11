//! Interpolated delay with sinusoidal modulation

use crate::arena::ArenaAllocator;
use crate::dsp::Modulator;
use crate::error::ArenaError;
use crate::ring::RingBuffer;

/// Delay line whose length wobbles slowly around a nominal value
///
/// The incoming sample is written before the taps are read, so a delay of 0
/// passes the input straight through.
pub struct ModulatedDelay<'a> {
    buffer: RingBuffer<'a>,
    modulator: Modulator,
}

impl<'a> ModulatedDelay<'a> {
    /// Guard samples past the longest requested delay
    const GUARD: usize = 2;

    /// Create a delay holding up to `max_delay_seconds` of audio
    ///
    /// `phase` is the starting modulation phase in `[0, 1)`.
    pub fn new(
        alloc: &mut ArenaAllocator<'a>,
        sample_rate: f32,
        max_delay_seconds: f32,
        phase: f32,
    ) -> Result<Self, ArenaError> {
        let capacity = Self::capacity_for(sample_rate, max_delay_seconds);
        let buffer = RingBuffer::new(alloc.allocate_samples(capacity)?);
        let modulator = Modulator::new(phase, 0, buffer.max_age());
        let mut delay = Self { buffer, modulator };
        delay.set_delay(0.0);
        Ok(delay)
    }

    /// Buffer length in samples for a maximum delay
    pub fn capacity_for(sample_rate: f32, max_delay_seconds: f32) -> usize {
        (sample_rate * max_delay_seconds).ceil() as usize + Self::GUARD
    }

    /// Longest usable delay in samples
    pub fn max_delay(&self) -> usize {
        self.buffer.capacity() - Self::GUARD
    }

    pub fn delay(&self) -> f32 {
        self.modulator.delay
    }

    /// Set the nominal delay in samples
    pub fn set_delay(&mut self, samples: f32) {
        self.modulator.delay = samples;
        self.modulator.update_taps();
    }

    pub fn mod_amount(&self) -> f32 {
        self.modulator.amount
    }

    /// Set the modulation depth in samples
    pub fn set_mod_amount(&mut self, samples: f32) {
        self.modulator.amount = samples;
        self.modulator.update_taps();
    }

    pub fn mod_rate(&self) -> f32 {
        self.modulator.rate
    }

    /// Set the modulation rate in cycles per sample
    pub fn set_mod_rate(&mut self, cycles_per_sample: f32) {
        self.modulator.rate = cycles_per_sample;
    }

    /// Delay currently applied, modulation included
    pub fn current_delay(&self) -> f32 {
        self.modulator.current_delay()
    }

    /// Process one sample
    #[inline]
    pub fn tick(&mut self, input: f32) -> f32 {
        self.modulator.step();
        self.buffer.push(input);
        let m = &self.modulator;
        self.buffer.read(m.delay_a) * m.gain_a + self.buffer.read(m.delay_b) * m.gain_b
    }

    /// Process a block
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        for (out, &x) in output.iter_mut().zip(input) {
            *out = self.tick(x);
        }
    }

    /// Process a block in place
    pub fn process_in_place(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.tick(*sample);
        }
    }

    /// Silence the delay memory
    pub fn clear_buffers(&mut self) {
        self.buffer.clear();
    }
}
