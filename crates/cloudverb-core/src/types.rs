//! Common types for Cloudverb
//!
//! Engine-wide constants and the small enums shared by the DSP graph,
//! the parameter layer and configuration.

use serde::{Deserialize, Serialize};

/// Default sample rate (48kHz - standard professional audio rate)
pub const SAMPLE_RATE: u32 = 48000;

/// Default processing block size in samples
pub const DEFAULT_BLOCK_SIZE: usize = 16;

/// Largest block size a channel accepts per `tick`
/// The controller splits longer inputs into chunks of the configured block size.
pub const MAX_BLOCK_SIZE: usize = 256;

/// Number of late-stage delay lines a channel owns
/// `LineCount` selects how many of them are active.
pub const MAX_DELAY_LINES: usize = 12;

/// Audio sample type
pub type Sample = f32;

/// Which side of a stereo pair a channel renders
///
/// Both sides share the same seeds; the cross seed blends each seed's
/// series with its complement's in opposite directions so the pair is
/// decorrelated until the cross seed reaches 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelSide {
    #[default]
    Left,
    Right,
}

impl ChannelSide {
    /// Map the user-facing cross seed amount to this side's blend weight
    #[inline]
    pub fn effective_cross_seed(self, amount: f32) -> f32 {
        match self {
            ChannelSide::Left => 1.0 - 0.5 * amount,
            ChannelSide::Right => 0.5 * amount,
        }
    }

    /// Get the name of this side
    pub fn name(&self) -> &'static str {
        match self {
            ChannelSide::Left => "Left",
            ChannelSide::Right => "Right",
        }
    }
}

/// Convert milliseconds to a whole number of samples
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> usize {
    (ms * sample_rate / 1000.0) as usize
}
