//! Cascade of seeded modulated allpass stages

use crate::arena::ArenaAllocator;
use crate::dsp::ModulatedAllpass;
use crate::error::ArenaError;
use crate::random::{self, PhaseSource};

/// Most allpass stages a diffuser can run
pub const MAX_DIFFUSER_STAGE_COUNT: usize = 2;

/// Seed values per stage: delay, modulation amount, modulation rate
const SEED_COUNT: usize = MAX_DIFFUSER_STAGE_COUNT * 3;

/// Series of allpass filters with seed-derived delay and modulation spread
///
/// Every stage gets its own multiple of the base delay (0.1x to 1x) and a
/// ±15% spread on modulation depth and rate, all drawn from the seed.
pub struct AllpassDiffuser<'a> {
    stages: Vec<ModulatedAllpass<'a>>,
    sample_rate: f32,
    active_stages: usize,

    seed: u64,
    cross_seed: f32,
    seed_values: [f32; SEED_COUNT],

    /// Base delay in samples
    delay: usize,
    /// Base modulation depth in samples
    mod_amount: f32,
    /// Base modulation rate in Hz
    mod_rate: f32,
}

impl<'a> AllpassDiffuser<'a> {
    pub const DEFAULT_SEED: u64 = 23456;
    /// Base delay before one is configured, in samples
    pub const DEFAULT_DELAY: usize = 100;

    /// Create a diffuser whose stages can each delay up to `max_delay_ms`
    pub fn new(
        alloc: &mut ArenaAllocator<'a>,
        sample_rate: f32,
        max_delay_ms: f32,
        phases: &mut PhaseSource,
    ) -> Result<Self, ArenaError> {
        let max_delay_samples = Self::max_delay_samples(sample_rate, max_delay_ms);
        let mut stages = Vec::with_capacity(MAX_DIFFUSER_STAGE_COUNT);
        for _ in 0..MAX_DIFFUSER_STAGE_COUNT {
            stages.push(ModulatedAllpass::new(alloc, max_delay_samples, phases.next_phase())?);
        }

        let mut diffuser = Self {
            stages,
            sample_rate,
            active_stages: 1,
            seed: Self::DEFAULT_SEED,
            cross_seed: 0.0,
            seed_values: [0.0; SEED_COUNT],
            delay: Self::DEFAULT_DELAY,
            mod_amount: 0.0,
            mod_rate: 0.0,
        };
        diffuser.update_seeds();
        Ok(diffuser)
    }

    fn max_delay_samples(sample_rate: f32, max_delay_ms: f32) -> usize {
        (sample_rate * max_delay_ms / 1000.0) as usize
    }

    /// Arena bytes one diffuser needs
    pub fn required_bytes(sample_rate: f32, max_delay_ms: f32) -> usize {
        let samples =
            ModulatedAllpass::capacity_for(Self::max_delay_samples(sample_rate, max_delay_ms));
        MAX_DIFFUSER_STAGE_COUNT * samples * std::mem::size_of::<f32>()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Re-derive every stage from a new seed
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.update_seeds();
    }

    pub fn cross_seed(&self) -> f32 {
        self.cross_seed
    }

    /// Blend the seed series towards its complement and re-derive
    pub fn set_cross_seed(&mut self, cross_seed: f32) {
        self.cross_seed = cross_seed;
        self.update_seeds();
    }

    pub fn stages(&self) -> usize {
        self.active_stages
    }

    /// Number of stages to run, clamped to `1..=MAX_DIFFUSER_STAGE_COUNT`
    pub fn set_stages(&mut self, stages: usize) {
        self.active_stages = stages.clamp(1, MAX_DIFFUSER_STAGE_COUNT);
    }

    /// Set the base delay in samples
    pub fn set_delay(&mut self, samples: usize) {
        self.delay = samples;
        self.update_delays();
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        for stage in &mut self.stages {
            stage.set_feedback(feedback);
        }
    }

    /// Set the base modulation depth in samples; zero disables modulation
    pub fn set_mod_amount(&mut self, samples: f32) {
        self.mod_amount = samples;
        self.update_modulation();
    }

    /// Set the base modulation rate in Hz
    pub fn set_mod_rate(&mut self, hz: f32) {
        self.mod_rate = hz;
        self.update_modulation();
    }

    pub fn set_interpolation_enabled(&mut self, enabled: bool) {
        for stage in &mut self.stages {
            stage.set_interpolation_enabled(enabled);
        }
    }

    pub fn modulation_enabled(&self) -> bool {
        self.stages[0].modulation_enabled()
    }

    /// Stage delays in samples, for inspection
    pub fn stage_delays(&self) -> impl Iterator<Item = f32> + '_ {
        self.stages.iter().map(|stage| stage.delay())
    }

    fn update_seeds(&mut self) {
        random::generate_crossed(self.seed, self.cross_seed, &mut self.seed_values);
        self.update_delays();
        self.update_modulation();
    }

    fn update_delays(&mut self) {
        for (stage, &r) in self.stages.iter_mut().zip(&self.seed_values) {
            // 0.1x .. 1x of the base delay
            let scale = 10f32.powf(r) * 0.1;
            let delay = ((self.delay as f32 * scale) as usize).max(1);
            stage.set_delay(delay as f32);
        }
    }

    fn update_modulation(&mut self) {
        let amounts = &self.seed_values[MAX_DIFFUSER_STAGE_COUNT..2 * MAX_DIFFUSER_STAGE_COUNT];
        let rates = &self.seed_values[2 * MAX_DIFFUSER_STAGE_COUNT..];
        let enabled = self.mod_amount > 0.0;

        for ((stage, &ra), &rr) in self.stages.iter_mut().zip(amounts).zip(rates) {
            stage.set_modulation_enabled(enabled);
            stage.set_mod_amount(self.mod_amount * (0.85 + 0.3 * ra));
            stage.set_mod_rate(self.mod_rate * (0.85 + 0.3 * rr) / self.sample_rate);
        }
    }

    /// Process a block in place through the active stages
    pub fn process_in_place(&mut self, buffer: &mut [f32]) {
        for stage in &mut self.stages[..self.active_stages] {
            stage.process_in_place(buffer);
        }
    }

    /// Process one sample through the active stages
    #[inline]
    pub fn tick(&mut self, input: f32) -> f32 {
        self.stages[..self.active_stages]
            .iter_mut()
            .fold(input, |x, stage| stage.tick(x))
    }

    /// Silence every stage, active or not
    pub fn clear_buffers(&mut self) {
        for stage in &mut self.stages {
            stage.clear_buffers();
        }
    }
}
