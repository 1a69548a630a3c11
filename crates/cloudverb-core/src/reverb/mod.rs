//! The reverb proper
//!
//! - [`ReverbChannel`]: one mono signal graph fed with scaled parameters
//! - [`ReverbController`]: raw-parameter front end with block splitting and mixing
//! - [`Parameter`]: parameter identifiers and raw-to-scaled mapping
//! - [`PresetBank`]: in-memory preset slots

pub mod channel;
pub mod controller;
pub mod mix;
pub mod parameter;
pub mod preset;

pub use channel::ReverbChannel;
pub use controller::ReverbController;
pub use mix::{early_late_gains, CrossFade};
pub use parameter::{Parameter, PARAMETER_COUNT};
pub use preset::{PresetBank, PresetBlob, EARLY_LATE_SLOT, NUM_PRESETS, PRESET_LEN, WET_DRY_SLOT};
