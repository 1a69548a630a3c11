//! Reverb parameter identifiers and knob scaling
//!
//! Every parameter has two representations: a *raw* value in `[0, 1]` as a
//! knob or preset stores it, and a *scaled* value in its engineering unit
//! (Hz, ms, seconds, a linear gain, a count, a seed or a 0/1 switch).
//! [`Parameter::scale`] is the single mapping between them.

use crate::dsp::{MAX_DIFFUSER_STAGE_COUNT, MAX_DIFFUSER_TAPS};
use crate::tables::Curve;
use crate::types::MAX_DELAY_LINES;

/// Number of reverb parameters
pub const PARAMETER_COUNT: usize = 46;

/// Reverb parameter identifier
///
/// The discriminant is the parameter's slot in raw parameter arrays and
/// preset blobs; the order is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Parameter {
    // Input
    InputMix = 0,
    PreDelay,
    HighPass,
    LowPass,

    // Early reflections
    TapCount,
    TapLength,
    TapGain,
    TapDecay,

    // Early diffusion
    DiffusionEnabled,
    DiffusionStages,
    DiffusionDelay,
    DiffusionFeedback,

    // Late lines
    LineCount,
    LineDelay,
    LineDecay,

    // Late diffusion
    LateDiffusionEnabled,
    LateDiffusionStages,
    LateDiffusionDelay,
    LateDiffusionFeedback,

    // Post EQ
    PostLowShelfGain,
    PostLowShelfFrequency,
    PostHighShelfGain,
    PostHighShelfFrequency,
    PostCutoffFrequency,

    // Modulation
    EarlyDiffusionModAmount,
    EarlyDiffusionModRate,
    LineModAmount,
    LineModRate,
    LateDiffusionModAmount,
    LateDiffusionModRate,

    // Seeds
    TapSeed,
    DiffusionSeed,
    DelaySeed,
    PostDiffusionSeed,

    // Output
    CrossSeed,
    DryOut,
    PredelayOut,
    EarlyOut,
    MainOut,

    // Switches
    HiPassEnabled,
    LowPassEnabled,
    LowShelfEnabled,
    HighShelfEnabled,
    CutoffEnabled,
    LateStageTap,
    Interpolation,
}

impl Parameter {
    /// All parameters in slot order
    pub const ALL: [Parameter; PARAMETER_COUNT] = [
        Parameter::InputMix,
        Parameter::PreDelay,
        Parameter::HighPass,
        Parameter::LowPass,
        Parameter::TapCount,
        Parameter::TapLength,
        Parameter::TapGain,
        Parameter::TapDecay,
        Parameter::DiffusionEnabled,
        Parameter::DiffusionStages,
        Parameter::DiffusionDelay,
        Parameter::DiffusionFeedback,
        Parameter::LineCount,
        Parameter::LineDelay,
        Parameter::LineDecay,
        Parameter::LateDiffusionEnabled,
        Parameter::LateDiffusionStages,
        Parameter::LateDiffusionDelay,
        Parameter::LateDiffusionFeedback,
        Parameter::PostLowShelfGain,
        Parameter::PostLowShelfFrequency,
        Parameter::PostHighShelfGain,
        Parameter::PostHighShelfFrequency,
        Parameter::PostCutoffFrequency,
        Parameter::EarlyDiffusionModAmount,
        Parameter::EarlyDiffusionModRate,
        Parameter::LineModAmount,
        Parameter::LineModRate,
        Parameter::LateDiffusionModAmount,
        Parameter::LateDiffusionModRate,
        Parameter::TapSeed,
        Parameter::DiffusionSeed,
        Parameter::DelaySeed,
        Parameter::PostDiffusionSeed,
        Parameter::CrossSeed,
        Parameter::DryOut,
        Parameter::PredelayOut,
        Parameter::EarlyOut,
        Parameter::MainOut,
        Parameter::HiPassEnabled,
        Parameter::LowPassEnabled,
        Parameter::LowShelfEnabled,
        Parameter::HighShelfEnabled,
        Parameter::CutoffEnabled,
        Parameter::LateStageTap,
        Parameter::Interpolation,
    ];

    /// Slot index of this parameter
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Convert from slot index to parameter
    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    /// Stable snake_case name used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            Parameter::InputMix => "input_mix",
            Parameter::PreDelay => "pre_delay",
            Parameter::HighPass => "high_pass",
            Parameter::LowPass => "low_pass",
            Parameter::TapCount => "tap_count",
            Parameter::TapLength => "tap_length",
            Parameter::TapGain => "tap_gain",
            Parameter::TapDecay => "tap_decay",
            Parameter::DiffusionEnabled => "diffusion_enabled",
            Parameter::DiffusionStages => "diffusion_stages",
            Parameter::DiffusionDelay => "diffusion_delay",
            Parameter::DiffusionFeedback => "diffusion_feedback",
            Parameter::LineCount => "line_count",
            Parameter::LineDelay => "line_delay",
            Parameter::LineDecay => "line_decay",
            Parameter::LateDiffusionEnabled => "late_diffusion_enabled",
            Parameter::LateDiffusionStages => "late_diffusion_stages",
            Parameter::LateDiffusionDelay => "late_diffusion_delay",
            Parameter::LateDiffusionFeedback => "late_diffusion_feedback",
            Parameter::PostLowShelfGain => "post_low_shelf_gain",
            Parameter::PostLowShelfFrequency => "post_low_shelf_frequency",
            Parameter::PostHighShelfGain => "post_high_shelf_gain",
            Parameter::PostHighShelfFrequency => "post_high_shelf_frequency",
            Parameter::PostCutoffFrequency => "post_cutoff_frequency",
            Parameter::EarlyDiffusionModAmount => "early_diffusion_mod_amount",
            Parameter::EarlyDiffusionModRate => "early_diffusion_mod_rate",
            Parameter::LineModAmount => "line_mod_amount",
            Parameter::LineModRate => "line_mod_rate",
            Parameter::LateDiffusionModAmount => "late_diffusion_mod_amount",
            Parameter::LateDiffusionModRate => "late_diffusion_mod_rate",
            Parameter::TapSeed => "tap_seed",
            Parameter::DiffusionSeed => "diffusion_seed",
            Parameter::DelaySeed => "delay_seed",
            Parameter::PostDiffusionSeed => "post_diffusion_seed",
            Parameter::CrossSeed => "cross_seed",
            Parameter::DryOut => "dry_out",
            Parameter::PredelayOut => "predelay_out",
            Parameter::EarlyOut => "early_out",
            Parameter::MainOut => "main_out",
            Parameter::HiPassEnabled => "hi_pass_enabled",
            Parameter::LowPassEnabled => "low_pass_enabled",
            Parameter::LowShelfEnabled => "low_shelf_enabled",
            Parameter::HighShelfEnabled => "high_shelf_enabled",
            Parameter::CutoffEnabled => "cutoff_enabled",
            Parameter::LateStageTap => "late_stage_tap",
            Parameter::Interpolation => "interpolation",
        }
    }

    /// Look up a parameter by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Whether the scaled value is a 0/1 switch
    pub fn is_switch(&self) -> bool {
        matches!(
            self,
            Parameter::DiffusionEnabled
                | Parameter::LateDiffusionEnabled
                | Parameter::HiPassEnabled
                | Parameter::LowPassEnabled
                | Parameter::LowShelfEnabled
                | Parameter::HighShelfEnabled
                | Parameter::CutoffEnabled
                | Parameter::LateStageTap
                | Parameter::Interpolation
        )
    }

    /// Raw value a fresh controller starts with
    ///
    /// A medium hall: two early diffusion stages, six lines around 150ms
    /// with a ~2s tail, gentle modulation, darkened feedback.
    pub fn default_raw(&self) -> f32 {
        match self {
            Parameter::InputMix => 0.0,
            Parameter::PreDelay => 0.0,
            Parameter::HighPass => 0.0,
            Parameter::LowPass => 0.8,
            Parameter::TapCount => 0.35,
            Parameter::TapLength => 0.4,
            Parameter::TapGain => 0.8,
            Parameter::TapDecay => 0.5,
            Parameter::DiffusionEnabled => 1.0,
            Parameter::DiffusionStages => 1.0,
            Parameter::DiffusionDelay => 0.4,
            Parameter::DiffusionFeedback => 0.7,
            Parameter::LineCount => 0.45,
            Parameter::LineDelay => 0.6,
            Parameter::LineDecay => 0.55,
            Parameter::LateDiffusionEnabled => 1.0,
            Parameter::LateDiffusionStages => 0.5,
            Parameter::LateDiffusionDelay => 0.25,
            Parameter::LateDiffusionFeedback => 0.6,
            Parameter::PostLowShelfGain => 0.85,
            Parameter::PostLowShelfFrequency => 0.3,
            Parameter::PostHighShelfGain => 0.7,
            Parameter::PostHighShelfFrequency => 0.6,
            Parameter::PostCutoffFrequency => 0.8,
            Parameter::EarlyDiffusionModAmount => 0.15,
            Parameter::EarlyDiffusionModRate => 0.3,
            Parameter::LineModAmount => 0.2,
            Parameter::LineModRate => 0.3,
            Parameter::LateDiffusionModAmount => 0.15,
            Parameter::LateDiffusionModRate => 0.3,
            Parameter::TapSeed => 0.000_1,
            Parameter::DiffusionSeed => 0.000_2,
            Parameter::DelaySeed => 0.000_3,
            Parameter::PostDiffusionSeed => 0.000_4,
            Parameter::CrossSeed => 0.0,
            Parameter::DryOut => 0.0,
            Parameter::PredelayOut => 0.0,
            Parameter::EarlyOut => 0.7,
            Parameter::MainOut => 0.9,
            Parameter::HiPassEnabled => 0.0,
            Parameter::LowPassEnabled => 0.0,
            Parameter::LowShelfEnabled => 0.0,
            Parameter::HighShelfEnabled => 1.0,
            Parameter::CutoffEnabled => 1.0,
            Parameter::LateStageTap => 1.0,
            Parameter::Interpolation => 1.0,
        }
    }

    /// Map a raw value to engineering units
    ///
    /// Raw is clamped to `[0, 1]` first. Integer-valued results are truncated
    /// toward zero.
    pub fn scale(&self, raw: f32) -> f32 {
        let raw = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };

        match self {
            Parameter::InputMix
            | Parameter::TapDecay
            | Parameter::DiffusionFeedback
            | Parameter::LateDiffusionFeedback
            | Parameter::CrossSeed => raw,

            Parameter::PreDelay => (raw * 1000.0).trunc(),
            Parameter::HighPass | Parameter::PostLowShelfFrequency => {
                20.0 + Curve::Oct4.apply(raw) * 980.0
            }
            Parameter::LowPass
            | Parameter::PostHighShelfFrequency
            | Parameter::PostCutoffFrequency => 400.0 + Curve::Oct4.apply(raw) * 19600.0,

            Parameter::TapCount => 1.0 + (raw * (MAX_DIFFUSER_TAPS - 1) as f32).trunc(),
            Parameter::TapLength => (raw * 500.0).trunc(),
            Parameter::TapGain
            | Parameter::PostLowShelfGain
            | Parameter::PostHighShelfGain
            | Parameter::DryOut
            | Parameter::PredelayOut
            | Parameter::EarlyOut
            | Parameter::MainOut => Curve::Dec2.apply(raw),

            Parameter::DiffusionStages | Parameter::LateDiffusionStages => {
                1.0 + (raw * (MAX_DIFFUSER_STAGE_COUNT as f32 - 0.001)).trunc()
            }
            Parameter::DiffusionDelay | Parameter::LateDiffusionDelay => (10.0 + raw * 90.0).trunc(),

            Parameter::LineCount => 1.0 + (raw * (MAX_DELAY_LINES as f32 - 0.001)).trunc(),
            Parameter::LineDelay => (20.0 + Curve::Dec2.apply(raw) * 980.0).trunc(),
            Parameter::LineDecay => 0.05 + Curve::Dec3.apply(raw) * 59.95,

            Parameter::EarlyDiffusionModAmount
            | Parameter::LineModAmount
            | Parameter::LateDiffusionModAmount => raw * 2.5,
            Parameter::EarlyDiffusionModRate
            | Parameter::LineModRate
            | Parameter::LateDiffusionModRate => Curve::Dec2.apply(raw) * 5.0,

            Parameter::TapSeed
            | Parameter::DiffusionSeed
            | Parameter::DelaySeed
            | Parameter::PostDiffusionSeed => (raw * 1_000_000.0 + 0.001).floor(),

            Parameter::HiPassEnabled
            | Parameter::LowPassEnabled
            | Parameter::LowShelfEnabled
            | Parameter::HighShelfEnabled
            | Parameter::CutoffEnabled
            | Parameter::LateStageTap
            | Parameter::Interpolation
            | Parameter::DiffusionEnabled
            | Parameter::LateDiffusionEnabled => {
                if raw < 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    /// Display unit of the scaled value
    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::PreDelay
            | Parameter::TapLength
            | Parameter::DiffusionDelay
            | Parameter::LateDiffusionDelay
            | Parameter::LineDelay
            | Parameter::EarlyDiffusionModAmount
            | Parameter::LineModAmount
            | Parameter::LateDiffusionModAmount => "ms",
            Parameter::LineDecay => "s",
            Parameter::HighPass
            | Parameter::LowPass
            | Parameter::PostLowShelfFrequency
            | Parameter::PostHighShelfFrequency
            | Parameter::PostCutoffFrequency
            | Parameter::EarlyDiffusionModRate
            | Parameter::LineModRate
            | Parameter::LateDiffusionModRate => "Hz",
            _ => "",
        }
    }
}
