//! Raw-parameter front end for a reverb channel
//!
//! The controller is what a host or a hardware panel talks to. It keeps the
//! raw `[0, 1]` value of every parameter, scales on the way in, splits
//! arbitrary buffers into channel blocks and owns the pedal-style wet/dry
//! and early/late mixes.
//!
//! # Usage
//!
//! ```ignore
//! let config = ReverbConfig::default();
//! let mut arena = Arena::new(ReverbController::required_bytes(&config));
//! let mut alloc = arena.allocator();
//! let mut reverb = ReverbController::new(&config, &mut alloc)?;
//!
//! reverb.set_parameter(Parameter::LineDecay, 0.7);
//! reverb.tick(&input, &mut output);
//! ```

use crate::arena::ArenaAllocator;
use crate::config::ReverbConfig;
use crate::error::ReverbResult;
use crate::reverb::mix::{early_late_gains, CrossFade};
use crate::reverb::preset::{PresetBlob, EARLY_LATE_SLOT, PRESET_LEN, WET_DRY_SLOT};
use crate::reverb::{Parameter, ReverbChannel, PARAMETER_COUNT};
use crate::tables;

/// Reverb channel driven by raw parameter values
pub struct ReverbController<'a> {
    channel: ReverbChannel<'a>,
    /// Raw value per parameter, always within `[0, 1]`
    parameters: [f32; PARAMETER_COUNT],

    wet_dry: CrossFade,
    /// Last early/late balance, cleared when EarlyOut or MainOut is set directly
    early_late_mix: Option<f32>,
    bypassed: bool,

    /// Channel output before the wet/dry crossfade
    wet: &'a mut [f32],
}

impl<'a> ReverbController<'a> {
    /// Build a controller with the default parameters plus `config`'s overrides
    pub fn new(config: &ReverbConfig, alloc: &mut ArenaAllocator<'a>) -> ReverbResult<Self> {
        tables::init();

        let channel = ReverbChannel::new(config, alloc)?;
        let wet = alloc.allocate_samples(config.block_size)?;

        let mut controller = Self {
            channel,
            parameters: [0.0; PARAMETER_COUNT],
            wet_dry: CrossFade::new(1.0),
            early_late_mix: None,
            bypassed: false,
            wet,
        };

        for param in Parameter::ALL {
            controller.set_parameter(param, param.default_raw());
        }
        let mut overrides = 0;
        for (param, raw) in config.parameter_overrides() {
            controller.set_parameter(param, raw);
            overrides += 1;
        }

        log::info!(
            "ReverbController::new: {} side, {} lines, {} parameter overrides",
            config.side.name(),
            controller.channel.line_count(),
            overrides
        );
        Ok(controller)
    }

    /// Arena bytes one controller built from `config` needs
    pub fn required_bytes(config: &ReverbConfig) -> usize {
        ReverbChannel::required_bytes(config) + config.block_size * std::mem::size_of::<f32>()
    }

    /// The channel being driven
    pub fn channel(&self) -> &ReverbChannel<'a> {
        &self.channel
    }

    pub fn block_size(&self) -> usize {
        self.channel.block_size()
    }

    // ─── Parameters ─────────────────────────────────────────────────────────

    /// Set a raw value; it is clamped to `[0, 1]`, scaled and applied
    pub fn set_parameter(&mut self, param: Parameter, raw: f32) {
        let raw = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };
        self.parameters[param.index()] = raw;
        if matches!(param, Parameter::EarlyOut | Parameter::MainOut) {
            self.early_late_mix = None;
        }
        self.channel.set_parameter(param, param.scale(raw));
    }

    /// Set a raw value by slot index; unknown indices are ignored
    pub fn set_parameter_by_id(&mut self, id: u8, raw: f32) {
        match Parameter::from_index(id as usize) {
            Some(param) => self.set_parameter(param, raw),
            None => log::debug!("ReverbController: ignoring parameter id {}", id),
        }
    }

    /// Current raw value
    pub fn raw_parameter(&self, param: Parameter) -> f32 {
        self.parameters[param.index()]
    }

    /// Current value in engineering units
    pub fn scaled_parameter(&self, param: Parameter) -> f32 {
        param.scale(self.parameters[param.index()])
    }

    /// Raw values in slot order
    pub fn all_parameters(&self) -> &[f32; PARAMETER_COUNT] {
        &self.parameters
    }

    /// Apply a full set of raw values in slot order
    pub fn set_all_parameters(&mut self, raw: &[f32; PARAMETER_COUNT]) {
        for (param, &value) in Parameter::ALL.iter().zip(raw) {
            self.set_parameter(*param, value);
        }
    }

    // ─── Mixing ─────────────────────────────────────────────────────────────

    pub fn wet_dry_mix(&self) -> f32 {
        self.wet_dry.pos()
    }

    /// Crossfade used by [`tick_mixed`](Self::tick_mixed): 0 dry, 1 wet
    pub fn set_wet_dry_mix(&mut self, mix: f32) {
        self.wet_dry.set_pos(mix);
    }

    pub fn early_late_mix(&self) -> Option<f32> {
        self.early_late_mix
    }

    /// Balance early reflections against the late tail at constant power
    ///
    /// Writes the raw EarlyOut and MainOut values.
    pub fn set_early_late_mix(&mut self, mix: f32) {
        let mix = if mix.is_nan() { 0.0 } else { mix.clamp(0.0, 1.0) };
        let (early, late) = early_late_gains(mix);
        self.set_parameter(Parameter::EarlyOut, early);
        self.set_parameter(Parameter::MainOut, late);
        self.early_late_mix = Some(mix);
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Pass the input straight through [`tick_mixed`](Self::tick_mixed)
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    // ─── Presets ────────────────────────────────────────────────────────────

    /// Snapshot of every raw value plus the mix slots
    ///
    /// The early/late slot is NaN when EarlyOut and MainOut were set directly.
    pub fn preset_blob(&self) -> PresetBlob {
        let mut blob = [0.0; PRESET_LEN];
        blob[..PARAMETER_COUNT].copy_from_slice(&self.parameters);
        blob[WET_DRY_SLOT] = self.wet_dry.pos();
        blob[EARLY_LATE_SLOT] = self.early_late_mix.unwrap_or(f32::NAN);
        blob
    }

    /// Restore a snapshot taken by [`preset_blob`](Self::preset_blob)
    pub fn load_preset_blob(&mut self, blob: &PresetBlob) {
        for (param, &value) in Parameter::ALL.iter().zip(blob.iter()) {
            self.set_parameter(*param, value);
        }
        self.set_wet_dry_mix(blob[WET_DRY_SLOT]);

        let early_late = blob[EARLY_LATE_SLOT];
        if (0.0..=1.0).contains(&early_late) {
            self.set_early_late_mix(early_late);
        }
    }

    // ─── Processing ─────────────────────────────────────────────────────────

    /// Run the reverb over any number of samples
    ///
    /// Input is split into channel blocks; the last block may be short.
    /// Processes `min(input.len(), output.len())` samples.
    pub fn tick(&mut self, input: &[f32], output: &mut [f32]) {
        let block_size = self.channel.block_size();
        for (x, y) in input.chunks(block_size).zip(output.chunks_mut(block_size)) {
            self.channel.tick(x, y);
        }
    }

    /// Run the reverb and crossfade it with the input
    pub fn tick_mixed(&mut self, input: &[f32], output: &mut [f32]) {
        if self.bypassed {
            let n = input.len().min(output.len());
            output[..n].copy_from_slice(&input[..n]);
            return;
        }

        let block_size = self.channel.block_size();
        for (x, y) in input.chunks(block_size).zip(output.chunks_mut(block_size)) {
            let wet = &mut self.wet[..x.len().min(y.len())];
            self.channel.tick(x, wet);
            for ((out, &dry), &w) in y.iter_mut().zip(x).zip(wet.iter()) {
                *out = self.wet_dry.process(dry, w);
            }
        }
    }

    /// Silence all reverb state
    pub fn clear_buffers(&mut self) {
        self.channel.clear_buffers();
        self.wet.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::random;

    fn noise(seed: u64, len: usize) -> Vec<f32> {
        let mut x = vec![0.0; len];
        random::generate(seed, &mut x);
        x.iter_mut().for_each(|v| *v = 2.0 * *v - 1.0);
        x
    }

    #[test]
    fn test_defaults_applied() {
        let config = ReverbConfig::default();
        let mut arena = Arena::new(ReverbController::required_bytes(&config));
        let mut alloc = arena.allocator();
        let reverb = ReverbController::new(&config, &mut alloc).unwrap();

        assert_eq!(alloc.remaining(), 0);
        for param in Parameter::ALL {
            assert_eq!(reverb.raw_parameter(param), param.default_raw(), "{:?}", param);
            assert_eq!(
                reverb.channel().parameter(param),
                Some(reverb.scaled_parameter(param)),
                "{:?} reaches the channel scaled",
                param
            );
        }
    }

    #[test]
    fn test_config_overrides() {
        let mut config = ReverbConfig::default();
        config.parameters.insert("line_count".to_string(), 1.0);
        config.parameters.insert("pre_delay".to_string(), 0.25);

        let mut arena = Arena::new(ReverbController::required_bytes(&config));
        let mut alloc = arena.allocator();
        let reverb = ReverbController::new(&config, &mut alloc).unwrap();

        assert_eq!(reverb.scaled_parameter(Parameter::PreDelay), 250.0);
        assert_eq!(reverb.channel().line_count(), 12);
    }

    #[test]
    fn test_set_parameter_clamps_and_scales() {
        let config = ReverbConfig::default();
        let mut arena = Arena::new(ReverbController::required_bytes(&config));
        let mut alloc = arena.allocator();
        let mut reverb = ReverbController::new(&config, &mut alloc).unwrap();

        reverb.set_parameter(Parameter::PreDelay, 2.0);
        assert_eq!(reverb.raw_parameter(Parameter::PreDelay), 1.0);
        assert_eq!(reverb.scaled_parameter(Parameter::PreDelay), 1000.0);
        assert_eq!(reverb.channel().parameter(Parameter::PreDelay), Some(1000.0));

        reverb.set_parameter(Parameter::LineCount, 0.0);
        assert_eq!(reverb.channel().line_count(), 1);
    }

    #[test]
    fn test_unknown_id_ignored() {
        let config = ReverbConfig::default();
        let mut arena = Arena::new(ReverbController::required_bytes(&config));
        let mut alloc = arena.allocator();
        let mut reverb = ReverbController::new(&config, &mut alloc).unwrap();

        let before = *reverb.all_parameters();
        reverb.set_parameter_by_id(PARAMETER_COUNT as u8, 0.3);
        reverb.set_parameter_by_id(255, 0.3);
        assert_eq!(reverb.all_parameters(), &before);

        reverb.set_parameter_by_id(Parameter::TapDecay.index() as u8, 0.3);
        assert_eq!(reverb.raw_parameter(Parameter::TapDecay), 0.3);
    }

    #[test]
    fn test_early_late_mix_writes_gains() {
        let config = ReverbConfig::default();
        let mut arena = Arena::new(ReverbController::required_bytes(&config));
        let mut alloc = arena.allocator();
        let mut reverb = ReverbController::new(&config, &mut alloc).unwrap();

        reverb.set_early_late_mix(1.0);
        assert!((reverb.raw_parameter(Parameter::EarlyOut) - 1.0).abs() < 1e-6);
        assert!(reverb.raw_parameter(Parameter::MainOut).abs() < 1e-6);
        assert_eq!(reverb.early_late_mix(), Some(1.0));

        reverb.set_parameter(Parameter::MainOut, 0.5);
        assert_eq!(reverb.early_late_mix(), None, "direct gain clears the balance");
    }

    #[test]
    fn test_preset_blob_round_trip() {
        let config = ReverbConfig::default();
        let mut arena_a = Arena::new(ReverbController::required_bytes(&config));
        let mut arena_b = Arena::new(ReverbController::required_bytes(&config));
        let mut alloc_a = arena_a.allocator();
        let mut alloc_b = arena_b.allocator();
        let mut a = ReverbController::new(&config, &mut alloc_a).unwrap();
        let mut b = ReverbController::new(&config, &mut alloc_b).unwrap();

        a.set_parameter(Parameter::LineDecay, 0.8);
        a.set_parameter(Parameter::TapCount, 0.1);
        a.set_wet_dry_mix(0.4);
        a.set_early_late_mix(0.3);

        let blob = a.preset_blob();
        b.load_preset_blob(&blob);
        assert_eq!(b.all_parameters(), a.all_parameters());
        assert_eq!(b.wet_dry_mix(), 0.4);
        assert_eq!(b.early_late_mix(), Some(0.3));
        assert_eq!(b.preset_blob(), blob);
    }

    #[test]
    fn test_preset_without_early_late_balance() {
        let config = ReverbConfig::default();
        let mut arena_a = Arena::new(ReverbController::required_bytes(&config));
        let mut arena_b = Arena::new(ReverbController::required_bytes(&config));
        let mut alloc_a = arena_a.allocator();
        let mut alloc_b = arena_b.allocator();
        let mut a = ReverbController::new(&config, &mut alloc_a).unwrap();
        let mut b = ReverbController::new(&config, &mut alloc_b).unwrap();

        a.set_early_late_mix(0.8);
        a.set_parameter(Parameter::EarlyOut, 0.2);
        a.set_parameter(Parameter::MainOut, 0.4);
        let blob = a.preset_blob();
        assert!(blob[EARLY_LATE_SLOT].is_nan());

        b.set_early_late_mix(0.1);
        b.load_preset_blob(&blob);
        assert_eq!(b.early_late_mix(), None);
        assert_eq!(b.raw_parameter(Parameter::EarlyOut), 0.2);
        assert_eq!(b.raw_parameter(Parameter::MainOut), 0.4);
        assert_eq!(b.all_parameters(), a.all_parameters());
        assert!(b.preset_blob()[EARLY_LATE_SLOT].is_nan());
    }

    fn render_interpolation(enabled: bool, input: &[f32]) -> Vec<f32> {
        let config = ReverbConfig::default();
        let mut arena = Arena::new(ReverbController::required_bytes(&config));
        let mut alloc = arena.allocator();
        let mut reverb = ReverbController::new(&config, &mut alloc).unwrap();
        reverb.set_parameter(Parameter::LateDiffusionEnabled, 1.0);
        reverb.set_parameter(Parameter::LateDiffusionModAmount, 0.6);
        reverb.set_parameter(Parameter::LateDiffusionModRate, 0.5);
        reverb.set_parameter(Parameter::Interpolation, if enabled { 1.0 } else { 0.0 });

        let mut output = vec![0.0; input.len()];
        reverb.tick(input, &mut output);
        output
    }

    #[test]
    fn test_interpolation_reaches_line_diffusers() {
        let input = noise(31, 24000);
        let smooth = render_interpolation(true, &input);
        let stepped = render_interpolation(false, &input);
        assert!(smooth.iter().all(|y| y.is_finite()));
        assert!(stepped.iter().all(|y| y.is_finite()));
        assert_ne!(smooth, stepped, "truncated taps should change the tail");
        assert_eq!(smooth, render_interpolation(true, &input));
    }

    #[test]
    fn test_tick_handles_uneven_lengths() {
        let config = ReverbConfig::default();
        let mut arena_a = Arena::new(ReverbController::required_bytes(&config));
        let mut arena_b = Arena::new(ReverbController::required_bytes(&config));
        let mut alloc_a = arena_a.allocator();
        let mut alloc_b = arena_b.allocator();
        let mut a = ReverbController::new(&config, &mut alloc_a).unwrap();
        let mut b = ReverbController::new(&config, &mut alloc_b).unwrap();

        let input = noise(4, 16 * 40);
        let mut whole = vec![0.0; input.len()];
        a.tick(&input, &mut whole);

        // Same signal in block-aligned pieces of different sizes
        let mut pieces = vec![0.0; input.len()];
        let mut start = 0;
        for len in [48, 16, 160, 416] {
            b.tick(&input[start..start + len], &mut pieces[start..start + len]);
            start += len;
        }
        assert_eq!(start, input.len());
        assert_eq!(whole, pieces);
    }

    #[test]
    fn test_tick_mixed_crossfades() {
        let config = ReverbConfig::default();
        let mut arena = Arena::new(ReverbController::required_bytes(&config));
        let mut alloc = arena.allocator();
        let mut reverb = ReverbController::new(&config, &mut alloc).unwrap();
        let input = noise(8, 1024);
        let mut output = vec![0.0; input.len()];

        reverb.set_wet_dry_mix(0.0);
        reverb.tick_mixed(&input, &mut output);
        for (y, x) in output.iter().zip(&input) {
            assert!((y - x).abs() < 1e-6);
        }

        reverb.set_bypassed(true);
        reverb.set_wet_dry_mix(1.0);
        reverb.tick_mixed(&input, &mut output);
        assert_eq!(output, input);
    }

    #[test]
    fn test_clear_buffers_silences_tail() {
        let config = ReverbConfig::default();
        let mut arena = Arena::new(ReverbController::required_bytes(&config));
        let mut alloc = arena.allocator();
        let mut reverb = ReverbController::new(&config, &mut alloc).unwrap();

        let input = noise(12, 4800);
        let mut output = vec![0.0; input.len()];
        reverb.tick(&input, &mut output);
        assert!(output.iter().any(|&y| y != 0.0));

        reverb.clear_buffers();
        let silence = vec![0.0; 48000];
        let mut tail = vec![1.0; silence.len()];
        reverb.tick_mixed(&silence, &mut tail);
        assert!(tail.iter().all(|&y| y == 0.0));
    }
}
