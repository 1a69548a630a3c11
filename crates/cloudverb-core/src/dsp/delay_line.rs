//! One late-reverb feedback line
//!
//! Signal flow per block:
//!
//! ```text
//! input ──(+)──► [diffuser?] ──► delay ──► [diffuser?] ──► low shelf ─► high shelf ─► cutoff ─┐
//!          ▲                                                                                  │
//!          └────────────────────────── × feedback (next block) ◄──────────────────────────────┘
//! ```
//!
//! The late-stage-tap switch puts the diffuser before the delay and taps the
//! line output ahead of the delay; otherwise the diffuser follows the delay
//! and the line output is the raw delay output. Tone shaping only ever
//! colours the recirculating signal.

use crate::arena::ArenaAllocator;
use crate::dsp::{AllpassDiffuser, ModulatedDelay};
use crate::error::ArenaError;
use crate::filter::{Biquad, FilterType, Tone};
use crate::random::PhaseSource;

/// Longest line delay including modulation and seed spread
const DELAY_BUFFER_SECONDS: f32 = 2.0;

/// Diffuser stage memory in ms (100ms base delay plus modulation headroom)
pub const DIFFUSER_BUFFER_MS: f32 = 150.0;

const DEFAULT_LOW_PASS_FREQ: f32 = 1000.0;
const DEFAULT_LOW_SHELF_FREQ: f32 = 20.0;
const DEFAULT_HIGH_SHELF_FREQ: f32 = 19000.0;
const DEFAULT_SHELF_GAIN_DB: f32 = -20.0;
const DEFAULT_DIFFUSER_SEED: u64 = 1;

/// Feedback delay line with optional diffusion and tone shaping
pub struct DelayLine<'a> {
    delay: ModulatedDelay<'a>,
    diffuser: AllpassDiffuser<'a>,
    low_shelf: Biquad,
    high_shelf: Biquad,
    low_pass: Tone,

    feedback: f32,
    diffuser_enabled: bool,
    low_shelf_enabled: bool,
    high_shelf_enabled: bool,
    cutoff_enabled: bool,
    late_stage_tap: bool,

    /// Input plus feedback; holds the line output after `process`
    mixed: &'a mut [f32],
    /// Recirculating path before filtering
    scratch: &'a mut [f32],
    /// Filtered output of the previous block
    feedback_buffer: &'a mut [f32],
}

impl<'a> DelayLine<'a> {
    pub fn new(
        alloc: &mut ArenaAllocator<'a>,
        sample_rate: f32,
        block_size: usize,
        phases: &mut PhaseSource,
    ) -> Result<Self, ArenaError> {
        let delay = ModulatedDelay::new(alloc, sample_rate, DELAY_BUFFER_SECONDS, phases.next_phase())?;
        let mut diffuser = AllpassDiffuser::new(alloc, sample_rate, DIFFUSER_BUFFER_MS, phases)?;
        diffuser.set_seed(DEFAULT_DIFFUSER_SEED);

        let mut low_shelf = Biquad::new(FilterType::LowShelf, sample_rate);
        low_shelf.set_slope(1.0);
        low_shelf.set_gain_db(DEFAULT_SHELF_GAIN_DB);
        low_shelf.set_frequency(DEFAULT_LOW_SHELF_FREQ);
        low_shelf.update();

        let mut high_shelf = Biquad::new(FilterType::HighShelf, sample_rate);
        high_shelf.set_slope(1.0);
        high_shelf.set_gain_db(DEFAULT_SHELF_GAIN_DB);
        high_shelf.set_frequency(DEFAULT_HIGH_SHELF_FREQ);
        high_shelf.update();

        let mut low_pass = Tone::new(sample_rate);
        low_pass.set_freq(DEFAULT_LOW_PASS_FREQ);

        Ok(Self {
            delay,
            diffuser,
            low_shelf,
            high_shelf,
            low_pass,
            feedback: 0.0,
            diffuser_enabled: false,
            low_shelf_enabled: false,
            high_shelf_enabled: false,
            cutoff_enabled: false,
            late_stage_tap: false,
            mixed: alloc.allocate_samples(block_size)?,
            scratch: alloc.allocate_samples(block_size)?,
            feedback_buffer: alloc.allocate_samples(block_size)?,
        })
    }

    /// Arena bytes one line needs
    pub fn required_bytes(sample_rate: f32, block_size: usize) -> usize {
        let delay = ModulatedDelay::capacity_for(sample_rate, DELAY_BUFFER_SECONDS);
        (delay + 3 * block_size) * std::mem::size_of::<f32>()
            + AllpassDiffuser::required_bytes(sample_rate, DIFFUSER_BUFFER_MS)
    }

    // ─── Delay ──────────────────────────────────────────────────────────────

    /// Nominal delay in samples
    pub fn delay(&self) -> f32 {
        self.delay.delay()
    }

    pub fn set_delay(&mut self, samples: f32) {
        self.delay.set_delay(samples);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
    }

    /// Line modulation depth in samples
    pub fn set_line_mod_amount(&mut self, samples: f32) {
        self.delay.set_mod_amount(samples);
    }

    /// Line modulation rate in cycles per sample
    pub fn set_line_mod_rate(&mut self, cycles_per_sample: f32) {
        self.delay.set_mod_rate(cycles_per_sample);
    }

    // ─── Diffuser ───────────────────────────────────────────────────────────

    pub fn diffuser_enabled(&self) -> bool {
        self.diffuser_enabled
    }

    /// Switch the diffuser in or out; its memory is cleared on change
    pub fn set_diffuser_enabled(&mut self, enabled: bool) {
        if enabled != self.diffuser_enabled {
            self.diffuser.clear_buffers();
        }
        self.diffuser_enabled = enabled;
    }

    pub fn set_diffuser_seed(&mut self, seed: u64) {
        self.diffuser.set_seed(seed);
    }

    pub fn set_diffuser_cross_seed(&mut self, cross_seed: f32) {
        self.diffuser.set_cross_seed(cross_seed);
    }

    pub fn set_diffuser_delay(&mut self, samples: usize) {
        self.diffuser.set_delay(samples);
    }

    pub fn set_diffuser_feedback(&mut self, feedback: f32) {
        self.diffuser.set_feedback(feedback);
    }

    pub fn set_diffuser_stages(&mut self, stages: usize) {
        self.diffuser.set_stages(stages);
    }

    /// Diffuser modulation depth in samples
    pub fn set_diffuser_mod_amount(&mut self, samples: f32) {
        self.diffuser.set_mod_amount(samples);
    }

    /// Diffuser modulation rate in Hz
    pub fn set_diffuser_mod_rate(&mut self, hz: f32) {
        self.diffuser.set_mod_rate(hz);
    }

    pub fn set_interpolation_enabled(&mut self, enabled: bool) {
        self.diffuser.set_interpolation_enabled(enabled);
    }

    // ─── Tone ───────────────────────────────────────────────────────────────

    /// Low shelf gain (linear)
    pub fn set_low_shelf_gain(&mut self, gain: f32) {
        self.low_shelf.set_gain(gain);
        self.low_shelf.update();
    }

    pub fn set_low_shelf_frequency(&mut self, hz: f32) {
        self.low_shelf.set_frequency(hz);
        self.low_shelf.update();
    }

    /// High shelf gain (linear)
    pub fn set_high_shelf_gain(&mut self, gain: f32) {
        self.high_shelf.set_gain(gain);
        self.high_shelf.update();
    }

    pub fn set_high_shelf_frequency(&mut self, hz: f32) {
        self.high_shelf.set_frequency(hz);
        self.high_shelf.update();
    }

    pub fn set_cutoff_frequency(&mut self, hz: f32) {
        self.low_pass.set_freq(hz);
    }

    pub fn set_low_shelf_enabled(&mut self, enabled: bool) {
        self.low_shelf_enabled = enabled;
    }

    pub fn set_high_shelf_enabled(&mut self, enabled: bool) {
        self.high_shelf_enabled = enabled;
    }

    pub fn set_cutoff_enabled(&mut self, enabled: bool) {
        self.cutoff_enabled = enabled;
    }

    pub fn late_stage_tap(&self) -> bool {
        self.late_stage_tap
    }

    pub fn set_late_stage_tap(&mut self, enabled: bool) {
        self.late_stage_tap = enabled;
    }

    // ─── Processing ─────────────────────────────────────────────────────────

    /// Process one block and return the line output
    ///
    /// Blocks longer than the configured block size are truncated.
    pub fn process(&mut self, input: &[f32]) -> &[f32] {
        let n = input.len().min(self.mixed.len());
        let mixed = &mut self.mixed[..n];
        let scratch = &mut self.scratch[..n];
        let feedback_buffer = &mut self.feedback_buffer[..n];

        for ((m, &x), &fb) in mixed.iter_mut().zip(input).zip(feedback_buffer.iter()) {
            *m = x + fb * self.feedback;
        }

        if self.late_stage_tap {
            if self.diffuser_enabled {
                self.diffuser.process_in_place(mixed);
            }
            scratch.copy_from_slice(mixed);
            self.delay.process_in_place(scratch);
        } else {
            self.delay.process_in_place(mixed);
            scratch.copy_from_slice(mixed);
            if self.diffuser_enabled {
                self.diffuser.process_in_place(scratch);
            }
        }

        for sample in scratch.iter_mut() {
            let mut y = *sample;
            if self.low_shelf_enabled {
                y = self.low_shelf.tick(y);
            }
            if self.high_shelf_enabled {
                y = self.high_shelf.tick(y);
            }
            if self.cutoff_enabled {
                y = self.low_pass.process(y);
            }
            *sample = y;
        }
        feedback_buffer.copy_from_slice(scratch);

        &self.mixed[..n]
    }

    /// Silence everything the line holds
    pub fn clear_buffers(&mut self) {
        self.delay.clear_buffers();
        self.diffuser.clear_buffers();
        self.low_shelf.clear_buffers();
        self.high_shelf.clear_buffers();
        self.low_pass.reset();
        self.mixed.fill(0.0);
        self.scratch.fill(0.0);
        self.feedback_buffer.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;

    const SR: f32 = 48000.0;
    const BLOCK: usize = 16;

    fn run(line: &mut DelayLine, input: &[f32]) -> Vec<f32> {
        input
            .chunks(BLOCK)
            .flat_map(|block| line.process(block).to_vec())
            .collect()
    }

    fn impulse(len: usize) -> Vec<f32> {
        let mut x = vec![0.0; len];
        x[0] = 1.0;
        x
    }

    #[test]
    fn test_plain_delay_without_feedback() {
        let mut arena = Arena::new(DelayLine::required_bytes(SR, BLOCK));
        let mut alloc = arena.allocator();
        let mut line = DelayLine::new(&mut alloc, SR, BLOCK, &mut PhaseSource::default()).unwrap();
        line.set_delay(100.0);

        let out = run(&mut line, &impulse(256));
        assert_eq!(out[100], 1.0);
        assert_eq!(out.iter().filter(|&&x| x != 0.0).count(), 1);
    }

    #[test]
    fn test_feedback_repeats_after_delay_plus_block() {
        let mut arena = Arena::new(DelayLine::required_bytes(SR, BLOCK));
        let mut alloc = arena.allocator();
        let mut line = DelayLine::new(&mut alloc, SR, BLOCK, &mut PhaseSource::default()).unwrap();
        line.set_delay(100.0);
        line.set_feedback(0.5);

        let out = run(&mut line, &impulse(512));
        assert_eq!(out[100], 1.0);
        // Feedback re-enters one block later
        assert!((out[200 + BLOCK] - 0.5).abs() < 1e-6, "got {}", out[200 + BLOCK]);
    }

    #[test]
    fn test_late_stage_tap_outputs_before_delay() {
        let mut arena = Arena::new(DelayLine::required_bytes(SR, BLOCK));
        let mut alloc = arena.allocator();
        let mut line = DelayLine::new(&mut alloc, SR, BLOCK, &mut PhaseSource::default()).unwrap();
        line.set_delay(100.0);
        line.set_feedback(0.5);
        line.set_late_stage_tap(true);

        let out = run(&mut line, &impulse(512));
        assert_eq!(out[0], 1.0, "input is tapped before the delay");
        assert!((out[100 + BLOCK] - 0.5).abs() < 1e-6, "got {}", out[100 + BLOCK]);
    }

    #[test]
    fn test_cutoff_darkens_feedback_only() {
        let mut arena = Arena::new(DelayLine::required_bytes(SR, BLOCK));
        let mut alloc = arena.allocator();
        let mut line = DelayLine::new(&mut alloc, SR, BLOCK, &mut PhaseSource::default()).unwrap();
        line.set_delay(50.0);
        line.set_feedback(1.0);
        line.set_cutoff_frequency(200.0);
        line.set_cutoff_enabled(true);

        let out = run(&mut line, &impulse(256));
        assert_eq!(out[50], 1.0, "first pass is unfiltered");
        let second = &out[100 + BLOCK - 2..100 + BLOCK + 40];
        let peak = second.iter().fold(0.0f32, |a, &b| a.max(b.abs()));
        assert!(peak < 0.1, "recirculated impulse should be smeared, peak {}", peak);
    }

    #[test]
    fn test_clear_buffers_silences() {
        let mut arena = Arena::new(DelayLine::required_bytes(SR, BLOCK));
        let mut alloc = arena.allocator();
        let mut line = DelayLine::new(&mut alloc, SR, BLOCK, &mut PhaseSource::default()).unwrap();
        line.set_delay(30.0);
        line.set_feedback(0.9);
        line.set_diffuser_enabled(true);
        line.set_low_shelf_enabled(true);
        line.set_high_shelf_enabled(true);
        line.set_cutoff_enabled(true);
        run(&mut line, &impulse(64));

        line.clear_buffers();
        let out = run(&mut line, &vec![0.0; 4096]);
        assert!(out.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_required_bytes_is_exact() {
        let mut arena = Arena::new(DelayLine::required_bytes(SR, BLOCK));
        let mut alloc = arena.allocator();
        DelayLine::new(&mut alloc, SR, BLOCK, &mut PhaseSource::default()).unwrap();
        assert_eq!(alloc.remaining(), 0);
    }
}
