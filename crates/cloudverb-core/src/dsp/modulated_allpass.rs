//! Schroeder allpass with a modulated, interpolated delay tap

use crate::arena::ArenaAllocator;
use crate::dsp::Modulator;
use crate::error::ArenaError;
use crate::ring::RingBuffer;

/// First-order allpass over a modulated delay
///
/// `v[n] = x[n] + g * d[n]`, `y[n] = d[n] - g * v[n]` where `d[n]` is `v`
/// delayed by the current tap. Flat magnitude response for any feedback in
/// `(-1, 1)`; only the phase is smeared.
pub struct ModulatedAllpass<'a> {
    buffer: RingBuffer<'a>,
    modulator: Modulator,
    feedback: f32,
    interpolation_enabled: bool,
    modulation_enabled: bool,
}

impl<'a> ModulatedAllpass<'a> {
    /// Create an allpass holding up to `max_delay_samples` of history
    pub fn new(
        alloc: &mut ArenaAllocator<'a>,
        max_delay_samples: usize,
        phase: f32,
    ) -> Result<Self, ArenaError> {
        let buffer = RingBuffer::new(alloc.allocate_samples(Self::capacity_for(max_delay_samples))?);
        // Taps are read before the push, so a tap of `d` sits at age `d - 1`
        let modulator = Modulator::new(phase, 1, buffer.capacity());
        Ok(Self {
            buffer,
            modulator,
            feedback: 0.5,
            interpolation_enabled: true,
            modulation_enabled: false,
        })
    }

    /// Buffer length in samples for a maximum delay
    pub fn capacity_for(max_delay_samples: usize) -> usize {
        max_delay_samples.max(2) + 1
    }

    pub fn delay(&self) -> f32 {
        self.modulator.delay
    }

    /// Set the nominal delay in samples (at least 1)
    pub fn set_delay(&mut self, samples: f32) {
        self.modulator.delay = samples;
        self.modulator.update_taps();
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
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

    pub fn interpolation_enabled(&self) -> bool {
        self.interpolation_enabled
    }

    /// Blend two taps (`true`) or read the truncated tap only (`false`)
    pub fn set_interpolation_enabled(&mut self, enabled: bool) {
        self.interpolation_enabled = enabled;
    }

    pub fn modulation_enabled(&self) -> bool {
        self.modulation_enabled
    }

    /// Follow the modulator (`true`) or hold the nominal delay (`false`)
    pub fn set_modulation_enabled(&mut self, enabled: bool) {
        self.modulation_enabled = enabled;
    }

    #[inline]
    fn read_delayed(&mut self) -> f32 {
        if !self.modulation_enabled {
            let delay = (self.modulator.delay as usize).clamp(1, self.buffer.capacity());
            return self.buffer.read(delay - 1);
        }

        self.modulator.step();
        let m = &self.modulator;
        if self.interpolation_enabled {
            self.buffer.read(m.delay_a - 1) * m.gain_a + self.buffer.read(m.delay_b - 1) * m.gain_b
        } else {
            self.buffer.read(m.delay_a - 1)
        }
    }

    /// Process one sample
    #[inline]
    pub fn tick(&mut self, input: f32) -> f32 {
        let buf_out = self.read_delayed();
        let in_val = input + buf_out * self.feedback;
        self.buffer.push(in_val);
        buf_out - in_val * self.feedback
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
