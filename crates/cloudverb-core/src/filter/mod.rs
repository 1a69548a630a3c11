//! Filters used for input conditioning and feedback tone shaping
//!
//! - [`Biquad`]: second-order sections from the audio-EQ cookbook
//! - [`Tone`] / [`ATone`]: one-pole low-pass and high-pass

pub mod biquad;
pub mod tone;

pub use biquad::{Biquad, FilterType};
pub use tone::{ATone, Tone};
