//! Delay-based building blocks of the reverb graph
//!
//! Everything here borrows its sample memory from an
//! [`ArenaAllocator`](crate::arena::ArenaAllocator) at construction and never
//! allocates afterwards.
//!
//! - [`ModulatedDelay`]: interpolated delay with slow sinusoidal wobble
//! - [`ModulatedAllpass`]: the same tap wired as a Schroeder allpass
//! - [`AllpassDiffuser`]: seeded cascade of modulated allpasses
//! - [`MultitapDiffuser`]: seeded non-recursive tap cloud for early reflections
//! - [`DelayLine`]: one late-reverb feedback line with diffusion and tone shaping

pub mod allpass_diffuser;
pub mod delay_line;
pub mod modulated_allpass;
pub mod modulated_delay;
pub mod multitap;

pub use allpass_diffuser::{AllpassDiffuser, MAX_DIFFUSER_STAGE_COUNT};
pub use delay_line::DelayLine;
pub use modulated_allpass::ModulatedAllpass;
pub use modulated_delay::ModulatedDelay;
pub use multitap::{MultitapDiffuser, MAX_DIFFUSER_TAPS};

use std::f32::consts::TAU;

/// Samples between modulation recomputations
pub const MODULATION_UPDATE_RATE: usize = 8;

/// Sinusoidal delay-time modulation shared by the modulated delay and allpass
///
/// Produces a pair of integer taps `(delay_a, delay_a + 1)` with linear
/// interpolation gains. Recomputed every [`MODULATION_UPDATE_RATE`] samples.
#[derive(Debug, Clone)]
pub(crate) struct Modulator {
    /// Nominal delay in samples
    pub delay: f32,
    /// Peak deviation in samples
    pub amount: f32,
    /// Cycles per sample
    pub rate: f32,
    phase: f32,
    samples_since_update: usize,
    /// Shortest tap allowed
    min_delay: usize,
    /// Longest tap allowed for `delay_b`
    max_delay: usize,

    pub delay_a: usize,
    pub delay_b: usize,
    pub gain_a: f32,
    pub gain_b: f32,
}

impl Modulator {
    pub fn new(phase: f32, min_delay: usize, max_delay: usize) -> Self {
        let mut modulator = Self {
            delay: min_delay as f32,
            amount: 0.0,
            rate: 0.0,
            phase: phase - phase.floor(),
            samples_since_update: 0,
            min_delay,
            max_delay: max_delay.max(min_delay + 1),
            delay_a: min_delay,
            delay_b: min_delay + 1,
            gain_a: 1.0,
            gain_b: 0.0,
        };
        modulator.update_taps();
        modulator
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Advance the update counter; recompute taps when it is due
    #[inline]
    pub fn step(&mut self) {
        if self.samples_since_update >= MODULATION_UPDATE_RATE {
            self.advance();
        }
        self.samples_since_update += 1;
    }

    /// Move the phase forward one update period and recompute taps
    fn advance(&mut self) {
        self.phase += self.rate * MODULATION_UPDATE_RATE as f32;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        self.update_taps();
        self.samples_since_update = 0;
    }

    /// Recompute taps at the current phase
    pub fn update_taps(&mut self) {
        let lo = self.min_delay as f32;
        let hi = (self.max_delay - 1) as f32;
        let total = (self.delay + self.amount * (TAU * self.phase).sin()).clamp(lo, hi);

        let delay_a = total as usize;
        let partial = total - delay_a as f32;
        self.delay_a = delay_a;
        self.delay_b = delay_a + 1;
        self.gain_a = 1.0 - partial;
        self.gain_b = partial;
    }

    /// Effective delay in samples
    pub fn current_delay(&self) -> f32 {
        self.delay_a as f32 + self.gain_b
    }
}
