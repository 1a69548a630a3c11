//! Reverb engine configuration
//!
//! Everything fixed at construction time: sample rate, block size, which side
//! of a stereo pair a channel plays, the modulation phase seed, and raw
//! parameter overrides applied on top of the built-in defaults.
//!
//! # Usage
//!
//! ```ignore
//! use cloudverb_core::config::{load_config, ReverbConfig};
//!
//! let config: ReverbConfig = load_config(&path);
//! config.validate()?;
//! ```

mod io;

pub use io::{load_config, read_config, save_config};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::random::PhaseSource;
use crate::reverb::Parameter;
use crate::types::{ChannelSide, DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE, SAMPLE_RATE};

/// Lowest sample rate a channel accepts
pub const MIN_SAMPLE_RATE: u32 = 8000;
/// Highest sample rate a channel accepts
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Construction-time settings for a reverb channel or controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbConfig {
    /// Sample rate in Hz
    /// Default: 48000
    pub sample_rate: u32,

    /// Samples per processing block; a power of two up to 256
    /// Default: 16
    pub block_size: usize,

    /// Side of a stereo pair, decides how the cross seed is applied
    /// Default: left
    pub side: ChannelSide,

    /// Seed for the initial phases of every modulator
    pub phase_seed: u64,

    /// Raw overrides keyed by parameter name, e.g. `line_decay: 0.7`
    pub parameters: BTreeMap<String, f32>,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            side: ChannelSide::default(),
            phase_seed: PhaseSource::DEFAULT_SEED,
            parameters: BTreeMap::new(),
        }
    }
}

impl ReverbConfig {
    /// Same settings for the other side of a stereo pair
    pub fn with_side(&self, side: ChannelSide) -> Self {
        Self {
            side,
            ..self.clone()
        }
    }

    pub fn sample_rate_f32(&self) -> f32 {
        self.sample_rate as f32
    }

    /// Check every field, returning the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if !self.block_size.is_power_of_two() || self.block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::InvalidBlockSize(self.block_size));
        }
        for (name, &value) in &self.parameters {
            if Parameter::from_name(name).is_none() {
                return Err(ConfigError::UnknownParameter(name.clone()));
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ParameterOutOfRange {
                    name: name.clone(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Overrides resolved to parameter identifiers, unknown names skipped
    pub fn parameter_overrides(&self) -> impl Iterator<Item = (Parameter, f32)> + '_ {
        self.parameters.iter().filter_map(|(name, &value)| match Parameter::from_name(name) {
            Some(param) => Some((param, value)),
            None => {
                log::warn!("ReverbConfig: ignoring unknown parameter {:?}", name);
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ReverbConfig::default();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.block_size, 16);
        assert_eq!(config.side, ChannelSide::Left);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_block_size() {
        for block_size in [0, 3, 24, 512] {
            let config = ReverbConfig {
                block_size,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::InvalidBlockSize(block_size)));
        }
        let config = ReverbConfig {
            block_size: 1,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_sample_rate() {
        let config = ReverbConfig {
            sample_rate: 1000,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidSampleRate(1000)));
    }

    #[test]
    fn test_rejects_bad_overrides() {
        let mut config = ReverbConfig::default();
        config.parameters.insert("room_size".to_string(), 0.5);
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownParameter("room_size".to_string()))
        );

        let mut config = ReverbConfig::default();
        config.parameters.insert("line_decay".to_string(), 1.5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ParameterOutOfRange { .. })
        ));
    }

    #[test]
    fn test_overrides_skip_unknown_names() {
        let mut config = ReverbConfig::default();
        config.parameters.insert("line_decay".to_string(), 0.7);
        config.parameters.insert("room_size".to_string(), 0.5);
        let overrides: Vec<_> = config.parameter_overrides().collect();
        assert_eq!(overrides, vec![(Parameter::LineDecay, 0.7)]);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: ReverbConfig = serde_yaml::from_str("block_size: 64\nside: right\n").unwrap();
        assert_eq!(config.block_size, 64);
        assert_eq!(config.side, ChannelSide::Right);
        assert_eq!(config.sample_rate, 48000);
        assert!(config.parameters.is_empty());
    }
}
