//! Seeded multi-tap early reflections
//!
//! A single delay buffer read at up to [`MAX_DIFFUSER_TAPS`] positions spread
//! pseudo-randomly over the tap length. Taps are summed with random signs and
//! an optional exponential fade; tap 0 sits at zero delay and carries the
//! clean signal so `gain` works as a clean/tap mix.

use crate::arena::ArenaAllocator;
use crate::error::ArenaError;
use crate::random;
use crate::ring::RingBuffer;

/// Most taps a multitap diffuser can sum
pub const MAX_DIFFUSER_TAPS: usize = 50;

/// Non-recursive tapped delay with seed-derived layout
pub struct MultitapDiffuser<'a> {
    buffer: RingBuffer<'a>,

    tap_gains: [f32; MAX_DIFFUSER_TAPS],
    tap_positions: [usize; MAX_DIFFUSER_TAPS],
    /// First half spaces the taps, second half picks their signs
    seed_values: [f32; MAX_DIFFUSER_TAPS * 2],

    seed: u64,
    cross_seed: f32,
    tap_count: usize,
    /// Span of the taps in samples
    tap_length: usize,
    gain: f32,
    decay: f32,
}

impl<'a> MultitapDiffuser<'a> {
    /// Create a diffuser holding `buffer_samples` of history
    pub fn new(alloc: &mut ArenaAllocator<'a>, buffer_samples: usize) -> Result<Self, ArenaError> {
        let mut diffuser = Self {
            buffer: RingBuffer::new(alloc.allocate_samples(buffer_samples.max(1))?),
            tap_gains: [0.0; MAX_DIFFUSER_TAPS],
            tap_positions: [0; MAX_DIFFUSER_TAPS],
            seed_values: [0.0; MAX_DIFFUSER_TAPS * 2],
            seed: 0,
            cross_seed: 0.0,
            tap_count: 1,
            tap_length: 1,
            gain: 1.0,
            decay: 0.0,
        };
        diffuser.update_seeds();
        Ok(diffuser)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.update_seeds();
    }

    pub fn set_cross_seed(&mut self, cross_seed: f32) {
        self.cross_seed = cross_seed;
        self.update_seeds();
    }

    pub fn tap_count(&self) -> usize {
        self.tap_count
    }

    /// Number of taps, clamped to `1..=MAX_DIFFUSER_TAPS`
    pub fn set_tap_count(&mut self, count: usize) {
        self.tap_count = count.clamp(1, MAX_DIFFUSER_TAPS);
        self.update_taps();
    }

    pub fn tap_length(&self) -> usize {
        self.tap_length
    }

    /// Span of the taps in samples
    pub fn set_tap_length(&mut self, samples: usize) {
        self.tap_length = samples;
        self.update_taps();
    }

    /// Tap level against the clean signal
    pub fn set_tap_gain(&mut self, gain: f32) {
        self.gain = gain;
        self.update_taps();
    }

    /// Fade across the taps: 0 is flat, 1 reaches -40dB at the last tap
    pub fn set_tap_decay(&mut self, decay: f32) {
        self.decay = decay;
        self.update_taps();
    }

    /// Active tap positions in samples
    pub fn tap_positions(&self) -> &[usize] {
        &self.tap_positions[..self.tap_count]
    }

    /// Active tap gains
    pub fn tap_gains(&self) -> &[f32] {
        &self.tap_gains[..self.tap_count]
    }

    fn update_seeds(&mut self) {
        random::generate_crossed(self.seed, self.cross_seed, &mut self.seed_values);
        self.update_taps();
    }

    fn update_taps(&mut self) {
        let count = self.tap_count;
        let tap_length = self.tap_length.max(count);
        let max_age = self.buffer.max_age();

        // Output grows with tap count; pull it back
        let count_factor = 1.0 / (1.0 + (count as f32 / MAX_DIFFUSER_TAPS as f32).sqrt());

        let (spacing, signs) = self.seed_values.split_at(count);
        let sum: f32 = spacing.iter().map(|r| 0.1 + r).sum();
        let scale = tap_length as f32 / sum;

        self.tap_positions[0] = 0;
        for i in 1..count {
            let step = ((0.1 + spacing[i]) * scale) as usize;
            self.tap_positions[i] = (self.tap_positions[i - 1] + step).min(max_age);
        }

        let last = self.tap_positions[count - 1] as f32;
        for i in 0..count {
            let fade = 10f32.powf(-self.decay * 2.0 * self.tap_positions[i] as f32 / (last + 1.0));
            let sign = 2.0 * signs[i] - 1.0;
            self.tap_gains[i] = sign * count_factor * fade * self.gain;
        }

        self.tap_gains[0] = 1.0 - self.gain;
    }

    /// Process one sample
    #[inline]
    pub fn tick(&mut self, input: f32) -> f32 {
        self.buffer.push(input);
        self.tap_positions[..self.tap_count]
            .iter()
            .zip(&self.tap_gains[..self.tap_count])
            .map(|(&pos, &gain)| self.buffer.read(pos) * gain)
            .sum()
    }

    /// Process a block in place
    pub fn process_in_place(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.tick(*sample);
        }
    }

    /// Silence the tap buffer
    pub fn clear_buffers(&mut self) {
        self.buffer.clear();
    }
}
