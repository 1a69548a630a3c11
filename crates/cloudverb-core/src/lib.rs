//! Cloudverb Core - Algorithmic reverb engine
//!
//! A feedback-delay-network reverb in the CloudSeed lineage: input filters,
//! pre-delay, a seeded multitap for early reflections, allpass diffusion and
//! a bank of modulated feedback delay lines. All sample memory comes from one
//! [`Arena`] sized up front, so processing never allocates.
//!
//! ```ignore
//! use cloudverb_core::{Arena, ReverbConfig, ReverbController, Parameter};
//!
//! let config = ReverbConfig::default();
//! let mut arena = Arena::new(ReverbController::required_bytes(&config));
//! let mut alloc = arena.allocator();
//! let mut reverb = ReverbController::new(&config, &mut alloc)?;
//! reverb.set_parameter(Parameter::LineDecay, 0.6);
//! reverb.tick(&input, &mut output);
//! ```

pub mod arena;
pub mod config;
pub mod dsp;
pub mod error;
pub mod filter;
pub mod random;
pub mod reverb;
pub mod ring;
pub mod tables;
pub mod types;

pub use arena::{Arena, ArenaAllocator};
pub use config::ReverbConfig;
pub use error::{ArenaError, ConfigError, ReverbError, ReverbResult};
pub use reverb::{Parameter, PresetBank, ReverbChannel, ReverbController, PARAMETER_COUNT};
pub use types::*;
