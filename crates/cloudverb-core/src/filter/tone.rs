//! One-pole tone filters
//!
//! [`Tone`] is a first-order low-pass, [`ATone`] its high-pass complement.
//! Both share the same pole so a `Tone`/`ATone` pair at one cutoff splits a
//! signal cleanly.

use std::f32::consts::PI;

/// Feedback coefficient for a one-pole section at `freq`
fn pole(freq: f32, sample_rate: f32) -> f32 {
    let b = 2.0 - (2.0 * PI * freq / sample_rate).cos();
    b - (b * b - 1.0).max(0.0).sqrt()
}

/// First-order low-pass
#[derive(Debug, Clone)]
pub struct Tone {
    sample_rate: f32,
    freq: f32,
    c1: f32,
    c2: f32,
    prev_out: f32,
}

impl Tone {
    pub fn new(sample_rate: f32) -> Self {
        let mut tone = Self {
            sample_rate,
            freq: 100.0,
            c1: 0.0,
            c2: 0.0,
            prev_out: 0.0,
        };
        tone.set_freq(100.0);
        tone
    }

    pub fn freq(&self) -> f32 {
        self.freq
    }

    /// Set the cutoff in Hz
    pub fn set_freq(&mut self, freq: f32) {
        self.freq = freq;
        self.c2 = pole(freq, self.sample_rate);
        self.c1 = 1.0 - self.c2;
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let out = self.c1 * x + self.c2 * self.prev_out;
        self.prev_out = out;
        out
    }

    /// Forget the previous output
    pub fn reset(&mut self) {
        self.prev_out = 0.0;
    }
}

/// First-order high-pass
#[derive(Debug, Clone)]
pub struct ATone {
    sample_rate: f32,
    freq: f32,
    c2: f32,
    prev_in: f32,
    prev_out: f32,
}

impl ATone {
    pub fn new(sample_rate: f32) -> Self {
        let mut atone = Self {
            sample_rate,
            freq: 1000.0,
            c2: 0.0,
            prev_in: 0.0,
            prev_out: 0.0,
        };
        atone.set_freq(1000.0);
        atone
    }

    pub fn freq(&self) -> f32 {
        self.freq
    }

    /// Set the cutoff in Hz
    pub fn set_freq(&mut self, freq: f32) {
        self.freq = freq;
        self.c2 = pole(freq, self.sample_rate);
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let out = self.c2 * (self.prev_out + x - self.prev_in);
        self.prev_out = out;
        self.prev_in = x;
        out
    }

    /// Forget the previous input and output
    pub fn reset(&mut self) {
        self.prev_in = 0.0;
        self.prev_out = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    #[test]
    fn test_tone_passes_dc() {
        let mut lp = Tone::new(SR);
        lp.set_freq(1000.0);
        let mut out = 0.0;
        for _ in 0..10000 {
            out = lp.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-4, "got {}", out);
    }

    #[test]
    fn test_atone_blocks_dc() {
        let mut hp = ATone::new(SR);
        hp.set_freq(20.0);
        let mut out = 1.0;
        for _ in 0..48000 {
            out = hp.process(1.0);
        }
        assert!(out.abs() < 1e-3, "got {}", out);
    }

    #[test]
    fn test_tone_attenuates_nyquist() {
        let mut lp = Tone::new(SR);
        lp.set_freq(500.0);
        let mut peak: f32 = 0.0;
        for i in 0..2000 {
            let y = lp.process(if i % 2 == 0 { 1.0 } else { -1.0 });
            if i > 1000 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 0.05, "got {}", peak);
    }

    #[test]
    fn test_reset() {
        let mut lp = Tone::new(SR);
        let mut hp = ATone::new(SR);
        for _ in 0..10 {
            lp.process(1.0);
            hp.process(1.0);
        }
        lp.reset();
        hp.reset();
        assert_eq!(lp.process(0.0), 0.0);
        assert_eq!(hp.process(0.0), 0.0);
    }
}
