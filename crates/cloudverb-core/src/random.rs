//! Seeded variance for parallel DSP structures
//!
//! Delay lengths, tap layouts and modulation rates are perturbed by
//! deterministic pseudo-random series so parallel structures don't line up.
//! Series are pure functions of `(seed, position)`: the same seed always
//! yields the same values, on every platform.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Fill `out` with values in `[0, 1)` drawn from `seed`'s series
pub fn generate(seed: u64, out: &mut [f32]) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for value in out.iter_mut() {
        *value = rng.random::<f32>();
    }
}

/// Fill `out` with `seed`'s series blended towards its complement's series
///
/// `cross_seed` of 0 gives the plain series of `seed`; 1 gives the series of
/// `!seed`. Values stay in `[0, 1)`.
pub fn generate_crossed(seed: u64, cross_seed: f32, out: &mut [f32]) {
    let cross = cross_seed.clamp(0.0, 1.0);
    let mut series_a = ChaCha8Rng::seed_from_u64(seed);
    let mut series_b = ChaCha8Rng::seed_from_u64(!seed);
    for value in out.iter_mut() {
        let a = series_a.random::<f32>();
        let b = series_b.random::<f32>();
        *value = blend(a, b, cross);
    }
}

/// Largest f32 below 1.0
const MAX_VALUE: f32 = 1.0 - f32::EPSILON / 2.0;

/// Linear blend that rounding can't push up to 1.0
#[inline]
fn blend(a: f32, b: f32, cross: f32) -> f32 {
    (a * (1.0 - cross) + b * cross).min(MAX_VALUE)
}

/// Stream of initial modulation phases for sibling modulators
///
/// Each modulated delay or allpass takes its starting phase from the channel's
/// phase source, so siblings differ while two channels built from the same
/// seed stay bit-identical.
pub struct PhaseSource {
    rng: ChaCha8Rng,
}

impl PhaseSource {
    /// Default seed used when a configuration doesn't set one
    pub const DEFAULT_SEED: u64 = 0x5EED;

    /// Create a phase source from a seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Next phase in `[0, 1)`
    pub fn next_phase(&mut self) -> f32 {
        self.rng.random::<f32>()
    }
}

impl Default for PhaseSource {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}
