//! Constant-power mixing between signal pairs

use std::f32::consts::FRAC_PI_2;

/// Early and late output gains for an early/late balance in `[0, 1]`
///
/// 0 is all late reverb, 1 is all early reflections; the sum of squares
/// stays 1 across the range.
pub fn early_late_gains(mix: f32) -> (f32, f32) {
    let mix = mix.clamp(0.0, 1.0);
    ((mix * FRAC_PI_2).sin(), ((1.0 - mix) * FRAC_PI_2).sin())
}

/// Constant-power dry/wet crossfade
///
/// Position 0 is fully dry, 1 fully wet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossFade {
    pos: f32,
    dry_gain: f32,
    wet_gain: f32,
}

impl CrossFade {
    pub fn new(pos: f32) -> Self {
        let mut fade = Self {
            pos: 0.0,
            dry_gain: 1.0,
            wet_gain: 0.0,
        };
        fade.set_pos(pos);
        fade
    }

    pub fn pos(&self) -> f32 {
        self.pos
    }

    /// Move the crossfade, clamped to `[0, 1]`
    pub fn set_pos(&mut self, pos: f32) {
        self.pos = if pos.is_nan() { 0.0 } else { pos.clamp(0.0, 1.0) };
        self.dry_gain = ((1.0 - self.pos) * FRAC_PI_2).sin();
        self.wet_gain = (self.pos * FRAC_PI_2).sin();
    }

    #[inline]
    pub fn process(&self, dry: f32, wet: f32) -> f32 {
        dry * self.dry_gain + wet * self.wet_gain
    }
}

impl Default for CrossFade {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_early_late_endpoints() {
        let (early, late) = early_late_gains(0.0);
        assert!(early.abs() < 1e-6);
        assert!((late - 1.0).abs() < 1e-6);

        let (early, late) = early_late_gains(1.0);
        assert!((early - 1.0).abs() < 1e-6);
        assert!(late.abs() < 1e-6);
    }

    #[test]
    fn test_early_late_constant_power() {
        for i in 0..=10 {
            let (early, late) = early_late_gains(i as f32 / 10.0);
            assert!((early * early + late * late - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_crossfade_endpoints() {
        let dry = CrossFade::new(0.0);
        assert!((dry.process(0.8, 0.3) - 0.8).abs() < 1e-6);

        let wet = CrossFade::new(1.0);
        assert!((wet.process(0.8, 0.3) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_crossfade_midpoint() {
        let fade = CrossFade::new(0.5);
        let half = std::f32::consts::FRAC_1_SQRT_2;
        assert!((fade.process(1.0, 0.0) - half).abs() < 1e-6);
        assert!((fade.process(0.0, 1.0) - half).abs() < 1e-6);
    }

    #[test]
    fn test_crossfade_clamps() {
        let mut fade = CrossFade::default();
        fade.set_pos(4.0);
        assert_eq!(fade.pos(), 1.0);
        fade.set_pos(f32::NAN);
        assert_eq!(fade.pos(), 0.0);
    }
}
