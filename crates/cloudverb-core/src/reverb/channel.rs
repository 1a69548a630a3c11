//! One mono reverb channel
//!
//! ```text
//! input ─► high-pass? ─► low-pass? ─► gate ─► pre-delay ─► multitap ─► diffuser? ─► early
//!                                                                                     │
//!          ┌────────────────────────── line 0 .. line N-1 ◄───────────────────────────┘
//!          ▼
//!   Σ / sqrt(N) = main
//!
//! out = dry·input + predelay·pre-delay out + early·early + main·Σ
//! ```
//!
//! Parameters arrive already scaled to engineering units; see
//! [`Parameter::scale`] for the mapping from raw knob values.

use crate::arena::ArenaAllocator;
use crate::config::ReverbConfig;
use crate::dsp::delay_line::DIFFUSER_BUFFER_MS;
use crate::dsp::{AllpassDiffuser, DelayLine, ModulatedDelay, MultitapDiffuser};
use crate::error::ReverbResult;
use crate::filter::{ATone, Tone};
use crate::random::{self, PhaseSource};
use crate::reverb::{Parameter, PARAMETER_COUNT};
use crate::types::{ms_to_samples, ChannelSide, MAX_DELAY_LINES};

/// Longest pre-delay
const PRE_DELAY_SECONDS: f32 = 1.0;
/// History kept by the multitap diffuser
const MULTITAP_SECONDS: f32 = 1.0;

const DEFAULT_HIGH_PASS_FREQ: f32 = 20.0;
const DEFAULT_LOW_PASS_FREQ: f32 = 20000.0;

/// Squared level below which the filtered input is flushed to zero
const SILENCE_THRESHOLD: f32 = 1e-9;

/// Per line: delay, modulation amount, modulation rate
const LINE_SEED_COUNT: usize = MAX_DELAY_LINES * 3;

/// Mono reverb: input filters, pre-delay, early reflections and a bank of
/// feedback delay lines mixed to one output
pub struct ReverbChannel<'a> {
    sample_rate: f32,
    block_size: usize,
    side: ChannelSide,

    /// Last scaled value per parameter; NaN until first set
    parameters: [f32; PARAMETER_COUNT],

    pre_delay: ModulatedDelay<'a>,
    multitap: MultitapDiffuser<'a>,
    diffuser: AllpassDiffuser<'a>,
    lines: Vec<DelayLine<'a>>,
    high_pass: ATone,
    low_pass: Tone,

    line_seeds: [f32; LINE_SEED_COUNT],
    delay_line_seed: u64,
    post_diffusion_seed: u64,
    /// Effective cross seed for this side
    cross_seed: f32,

    line_count: usize,
    high_pass_enabled: bool,
    low_pass_enabled: bool,
    diffuser_enabled: bool,

    dry_gain: f32,
    predelay_gain: f32,
    early_gain: f32,
    main_gain: f32,

    filtered: &'a mut [f32],
    predelay_out: &'a mut [f32],
    early: &'a mut [f32],
    line_sum: &'a mut [f32],
}

impl<'a> ReverbChannel<'a> {
    /// Build a channel, taking every buffer from `alloc`
    ///
    /// The arena needs at least [`ReverbChannel::required_bytes`] free.
    pub fn new(config: &ReverbConfig, alloc: &mut ArenaAllocator<'a>) -> ReverbResult<Self> {
        config.validate()?;

        let sample_rate = config.sample_rate_f32();
        let block_size = config.block_size;
        let mut phases = PhaseSource::new(config.phase_seed);

        let pre_delay = ModulatedDelay::new(alloc, sample_rate, PRE_DELAY_SECONDS, phases.next_phase())?;
        let multitap = MultitapDiffuser::new(alloc, Self::multitap_samples(sample_rate))?;
        let diffuser = AllpassDiffuser::new(alloc, sample_rate, DIFFUSER_BUFFER_MS, &mut phases)?;

        let mut lines = Vec::with_capacity(MAX_DELAY_LINES);
        for _ in 0..MAX_DELAY_LINES {
            lines.push(DelayLine::new(alloc, sample_rate, block_size, &mut phases)?);
        }

        let mut high_pass = ATone::new(sample_rate);
        high_pass.set_freq(DEFAULT_HIGH_PASS_FREQ);
        let mut low_pass = Tone::new(sample_rate);
        low_pass.set_freq(DEFAULT_LOW_PASS_FREQ);

        let mut channel = Self {
            sample_rate,
            block_size,
            side: config.side,
            parameters: [f32::NAN; PARAMETER_COUNT],
            pre_delay,
            multitap,
            diffuser,
            lines,
            high_pass,
            low_pass,
            line_seeds: [0.0; LINE_SEED_COUNT],
            delay_line_seed: 0,
            post_diffusion_seed: 0,
            cross_seed: config.side.effective_cross_seed(0.0),
            line_count: MAX_DELAY_LINES,
            high_pass_enabled: false,
            low_pass_enabled: false,
            diffuser_enabled: false,
            dry_gain: 0.0,
            predelay_gain: 0.0,
            early_gain: 0.0,
            main_gain: 0.0,
            filtered: alloc.allocate_samples(block_size)?,
            predelay_out: alloc.allocate_samples(block_size)?,
            early: alloc.allocate_samples(block_size)?,
            line_sum: alloc.allocate_samples(block_size)?,
        };
        channel.apply_cross_seed();
        channel.update_post_diffusion();

        log::debug!(
            "ReverbChannel::new: {} side, {}Hz, block {}, arena used {} bytes",
            channel.side.name(),
            config.sample_rate,
            block_size,
            alloc.used()
        );
        Ok(channel)
    }

    fn multitap_samples(sample_rate: f32) -> usize {
        (sample_rate * MULTITAP_SECONDS) as usize
    }

    /// Arena bytes one channel built from `config` needs
    pub fn required_bytes(config: &ReverbConfig) -> usize {
        let sample_rate = config.sample_rate_f32();
        let block_size = config.block_size;
        let f32_size = std::mem::size_of::<f32>();

        let pre_delay = ModulatedDelay::capacity_for(sample_rate, PRE_DELAY_SECONDS) * f32_size;
        let multitap = Self::multitap_samples(sample_rate).max(1) * f32_size;
        let diffuser = AllpassDiffuser::required_bytes(sample_rate, DIFFUSER_BUFFER_MS);
        let lines = MAX_DELAY_LINES * DelayLine::required_bytes(sample_rate, block_size);
        let work = 4 * block_size * f32_size;

        pre_delay + multitap + diffuser + lines + work
    }

    pub fn side(&self) -> ChannelSide {
        self.side
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of active delay lines
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Delay of line `index` in samples
    pub fn line_delay(&self, index: usize) -> Option<f32> {
        self.lines.get(index).map(|line| line.delay())
    }

    /// Per-pass feedback gain of line `index`
    pub fn line_feedback(&self, index: usize) -> Option<f32> {
        self.lines.get(index).map(|line| line.feedback())
    }

    /// Last scaled value applied for `param`, if any
    pub fn parameter(&self, param: Parameter) -> Option<f32> {
        let value = self.parameters[param.index()];
        (!value.is_nan()).then_some(value)
    }

    /// Stored value, zero if never set
    fn param(&self, param: Parameter) -> f32 {
        self.parameter(param).unwrap_or(0.0)
    }

    fn ms_to_samples_f32(&self, ms: f32) -> f32 {
        ms * self.sample_rate / 1000.0
    }

    /// Apply a scaled parameter value
    ///
    /// Repeating the last value is a no-op.
    pub fn set_parameter(&mut self, param: Parameter, value: f32) {
        let slot = &mut self.parameters[param.index()];
        if *slot == value {
            return;
        }
        *slot = value;

        let sample_rate = self.sample_rate;
        let on = value >= 0.5;

        match param {
            // Consumed by the controller's wet/dry mix
            Parameter::InputMix => {}

            Parameter::PreDelay => {
                self.pre_delay.set_delay(ms_to_samples(value, sample_rate) as f32);
            }
            Parameter::HighPass => self.high_pass.set_freq(value),
            Parameter::LowPass => self.low_pass.set_freq(value),

            Parameter::TapCount => self.multitap.set_tap_count(value as usize),
            Parameter::TapLength => self.multitap.set_tap_length(ms_to_samples(value, sample_rate)),
            Parameter::TapGain => self.multitap.set_tap_gain(value),
            Parameter::TapDecay => self.multitap.set_tap_decay(value),

            Parameter::DiffusionEnabled => {
                if on != self.diffuser_enabled {
                    self.diffuser.clear_buffers();
                }
                self.diffuser_enabled = on;
            }
            Parameter::DiffusionStages => self.diffuser.set_stages(value as usize),
            Parameter::DiffusionDelay => self.diffuser.set_delay(ms_to_samples(value, sample_rate)),
            Parameter::DiffusionFeedback => self.diffuser.set_feedback(value),

            Parameter::LineCount => self.line_count = (value as usize).clamp(1, MAX_DELAY_LINES),
            Parameter::LineDelay
            | Parameter::LineDecay
            | Parameter::LineModAmount
            | Parameter::LineModRate
            | Parameter::LateDiffusionModAmount
            | Parameter::LateDiffusionModRate => self.update_lines(),

            Parameter::LateDiffusionEnabled => self.for_each_line(|line| line.set_diffuser_enabled(on)),
            Parameter::LateDiffusionStages => {
                self.for_each_line(|line| line.set_diffuser_stages(value as usize))
            }
            Parameter::LateDiffusionDelay => {
                let samples = ms_to_samples(value, sample_rate);
                self.for_each_line(|line| line.set_diffuser_delay(samples));
            }
            Parameter::LateDiffusionFeedback => {
                self.for_each_line(|line| line.set_diffuser_feedback(value))
            }

            Parameter::PostLowShelfGain => self.for_each_line(|line| line.set_low_shelf_gain(value)),
            Parameter::PostLowShelfFrequency => {
                self.for_each_line(|line| line.set_low_shelf_frequency(value))
            }
            Parameter::PostHighShelfGain => self.for_each_line(|line| line.set_high_shelf_gain(value)),
            Parameter::PostHighShelfFrequency => {
                self.for_each_line(|line| line.set_high_shelf_frequency(value))
            }
            Parameter::PostCutoffFrequency => {
                self.for_each_line(|line| line.set_cutoff_frequency(value))
            }

            Parameter::EarlyDiffusionModAmount => {
                let samples = self.ms_to_samples_f32(value);
                self.diffuser.set_mod_amount(samples);
            }
            Parameter::EarlyDiffusionModRate => self.diffuser.set_mod_rate(value),

            Parameter::TapSeed => self.multitap.set_seed(value as u64),
            Parameter::DiffusionSeed => self.diffuser.set_seed(value as u64),
            Parameter::DelaySeed => {
                self.delay_line_seed = value as u64;
                self.update_lines();
            }
            Parameter::PostDiffusionSeed => {
                self.post_diffusion_seed = value as u64;
                self.update_post_diffusion();
            }
            Parameter::CrossSeed => {
                self.cross_seed = self.side.effective_cross_seed(value);
                self.apply_cross_seed();
            }

            Parameter::DryOut => self.dry_gain = value,
            Parameter::PredelayOut => self.predelay_gain = value,
            Parameter::EarlyOut => self.early_gain = value,
            Parameter::MainOut => self.main_gain = value,

            Parameter::HiPassEnabled => self.high_pass_enabled = on,
            Parameter::LowPassEnabled => self.low_pass_enabled = on,
            Parameter::LowShelfEnabled => self.for_each_line(|line| line.set_low_shelf_enabled(on)),
            Parameter::HighShelfEnabled => self.for_each_line(|line| line.set_high_shelf_enabled(on)),
            Parameter::CutoffEnabled => self.for_each_line(|line| line.set_cutoff_enabled(on)),
            Parameter::LateStageTap => self.for_each_line(|line| line.set_late_stage_tap(on)),
            Parameter::Interpolation => {
                self.for_each_line(|line| line.set_interpolation_enabled(on))
            }
        }
    }

    /// Apply to every line, active or not
    fn for_each_line(&mut self, f: impl FnMut(&mut DelayLine<'a>)) {
        self.lines.iter_mut().for_each(f);
    }

    fn apply_cross_seed(&mut self) {
        let cross_seed = self.cross_seed;
        self.multitap.set_cross_seed(cross_seed);
        self.diffuser.set_cross_seed(cross_seed);
        self.for_each_line(|line| line.set_diffuser_cross_seed(cross_seed));
        self.update_lines();
    }

    /// Re-derive delay, feedback and modulation of every line
    fn update_lines(&mut self) {
        let sample_rate = self.sample_rate;
        let line_delay = self.ms_to_samples_f32(self.param(Parameter::LineDelay)).trunc();
        let line_decay = (self.param(Parameter::LineDecay) * sample_rate).max(1.0);
        let line_mod_amount = self.ms_to_samples_f32(self.param(Parameter::LineModAmount));
        let line_mod_rate = self.param(Parameter::LineModRate);
        let late_mod_amount = self.ms_to_samples_f32(self.param(Parameter::LateDiffusionModAmount));
        let late_mod_rate = self.param(Parameter::LateDiffusionModRate);

        random::generate_crossed(self.delay_line_seed, self.cross_seed, &mut self.line_seeds);
        let (delays, rest) = self.line_seeds.split_at(MAX_DELAY_LINES);
        let (amounts, rates) = rest.split_at(MAX_DELAY_LINES);

        for (i, line) in self.lines.iter_mut().enumerate() {
            let mod_amount = line_mod_amount * (0.7 + 0.3 * amounts[i]);
            let mod_rate = line_mod_rate * (0.7 + 0.3 * rates[i]) / sample_rate;

            // Keep the modulated tap clear of zero
            let delay = ((0.5 + delays[i]) * line_delay).max(mod_amount + 2.0).trunc();
            // One pass loses delay/decay of the 60dB
            let feedback = 10f32.powf(delay / line_decay * -60.0 / 20.0);

            line.set_delay(delay);
            line.set_feedback(feedback);
            line.set_line_mod_amount(mod_amount);
            line.set_line_mod_rate(mod_rate);
            line.set_diffuser_mod_amount(late_mod_amount);
            line.set_diffuser_mod_rate(late_mod_rate);
        }
    }

    fn update_post_diffusion(&mut self) {
        let seed = self.post_diffusion_seed;
        for (i, line) in self.lines.iter_mut().enumerate() {
            line.set_diffuser_seed(seed.wrapping_mul(i as u64 + 1));
        }
    }

    /// Process one block
    ///
    /// Handles up to `block_size` samples; anything past that, or past the
    /// shorter of the two slices, is left untouched.
    pub fn tick(&mut self, input: &[f32], output: &mut [f32]) {
        let n = input.len().min(output.len()).min(self.block_size);
        let input = &input[..n];
        let output = &mut output[..n];

        let filtered = &mut self.filtered[..n];
        for (f, &x) in filtered.iter_mut().zip(input) {
            let mut y = x;
            if self.high_pass_enabled {
                y = self.high_pass.process(y);
            }
            if self.low_pass_enabled {
                y = self.low_pass.process(y);
            }
            *f = if y * y < SILENCE_THRESHOLD { 0.0 } else { y };
        }

        let predelay_out = &mut self.predelay_out[..n];
        self.pre_delay.process(filtered, predelay_out);

        let early = &mut self.early[..n];
        early.copy_from_slice(predelay_out);
        self.multitap.process_in_place(early);
        if self.diffuser_enabled {
            self.diffuser.process_in_place(early);
        }

        let line_sum = &mut self.line_sum[..n];
        line_sum.fill(0.0);
        for line in &mut self.lines[..self.line_count] {
            for (sum, &y) in line_sum.iter_mut().zip(line.process(early)) {
                *sum += y;
            }
        }
        let per_line_gain = 1.0 / (self.line_count as f32).sqrt();

        for (i, out) in output.iter_mut().enumerate() {
            *out = self.dry_gain * input[i]
                + self.predelay_gain * predelay_out[i]
                + self.early_gain * early[i]
                + self.main_gain * (line_sum[i] * per_line_gain);
        }
    }

    /// Silence every buffer and filter state
    pub fn clear_buffers(&mut self) {
        self.pre_delay.clear_buffers();
        self.multitap.clear_buffers();
        self.diffuser.clear_buffers();
        for line in &mut self.lines {
            line.clear_buffers();
        }
        self.high_pass.reset();
        self.low_pass.reset();
        self.filtered.fill(0.0);
        self.predelay_out.fill(0.0);
        self.early.fill(0.0);
        self.line_sum.fill(0.0);
    }
}
