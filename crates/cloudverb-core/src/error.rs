//! Reverb engine error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while carving buffers out of an [`Arena`](crate::arena::Arena)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// Not enough room left for the requested slice
    #[error("Arena exhausted: requested {requested} bytes, {available} available")]
    Exhausted { requested: usize, available: usize },

    /// Element alignment exceeds what the backing storage guarantees
    #[error("Unsupported alignment: {0} bytes")]
    UnsupportedAlignment(usize),
}

/// Errors found while reading or validating a [`ReverbConfig`](crate::config::ReverbConfig)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read {path:?}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// Config file is not valid YAML for a reverb config
    #[error("Failed to parse {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Sample rate outside the supported range
    #[error("Invalid sample rate: {0}Hz")]
    InvalidSampleRate(u32),

    /// Block size is zero, not a power of two, or too large
    #[error("Invalid block size: {0} (must be a power of two up to {max})", max = crate::types::MAX_BLOCK_SIZE)]
    InvalidBlockSize(usize),

    /// Parameter override names an unknown parameter
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Parameter override outside the normalized range
    #[error("Parameter {name} out of range: {value} (expected 0.0-1.0)")]
    ParameterOutOfRange { name: String, value: f32 },
}

/// Errors that can occur while building a reverb engine
#[derive(Error, Debug)]
pub enum ReverbError {
    /// Buffer allocation failed
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// Configuration rejected
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for reverb engine construction
pub type ReverbResult<T> = Result<T, ReverbError>;
