//! Second-order IIR filter
//!
//! Coefficients follow the audio-EQ cookbook. Setters only store values;
//! call [`Biquad::update`] once after changing any of them so coefficient
//! math stays off the per-sample path.

use std::f32::consts::PI;

/// Filter response shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    Notch,
    Peak,
    LowShelf,
    HighShelf,
}

/// Biquad section evaluated in direct form I (input and output history)
#[derive(Debug, Clone)]
pub struct Biquad {
    filter_type: FilterType,
    sample_rate: f32,
    frequency: f32,
    q: f32,
    slope: f32,
    /// Linear gain for peak and shelf types
    gain: f32,

    // Normalized coefficients (a0 = 1)
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    // History
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Smallest linear gain accepted (-60dB)
    const MIN_GAIN: f32 = 0.001;
    /// Q substituted for zero
    const MIN_Q: f32 = 1e-12;
    /// Lowest corner frequency in Hz
    const MIN_FREQUENCY: f32 = 1.0;
    /// Highest corner frequency as a fraction of the sample rate
    const MAX_FREQUENCY_RATIO: f32 = 0.49;

    /// Create a filter at a quarter of the sample rate, unity gain, Q 0.5
    pub fn new(filter_type: FilterType, sample_rate: f32) -> Self {
        let mut filter = Self {
            filter_type,
            sample_rate,
            frequency: sample_rate / 4.0,
            q: 0.5,
            slope: 1.0,
            gain: 1.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };
        filter.update();
        filter
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Set the corner or center frequency in Hz
    ///
    /// Kept below Nyquist; past it the poles leave the unit circle.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency
            .max(Self::MIN_FREQUENCY)
            .min(self.sample_rate * Self::MAX_FREQUENCY_RATIO);
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    /// Set Q; zero is replaced by a tiny positive value
    pub fn set_q(&mut self, q: f32) {
        self.q = if q == 0.0 { Self::MIN_Q } else { q };
    }

    pub fn slope(&self) -> f32 {
        self.slope
    }

    /// Set the shelf slope (1.0 is the steepest monotonic shelf)
    pub fn set_slope(&mut self, slope: f32) {
        self.slope = slope;
    }

    /// Linear gain
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Set linear gain; zero is replaced by -60dB
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = if gain == 0.0 { Self::MIN_GAIN } else { gain };
    }

    pub fn set_gain_db(&mut self, db: f32) {
        self.set_gain(10f32.powf(db / 20.0));
    }

    /// Recompute coefficients from the current settings
    pub fn update(&mut self) {
        let omega = 2.0 * PI * self.frequency / self.sample_rate;
        let (sin_w, cos_w) = omega.sin_cos();

        // Cookbook A: square root of the linear gain, so shelves settle at `gain`
        let a = self.gain.sqrt();
        let alpha = match self.filter_type {
            FilterType::LowShelf | FilterType::HighShelf => {
                sin_w / 2.0 * ((a + 1.0 / a) * (1.0 / self.slope - 1.0) + 2.0).max(0.0).sqrt()
            }
            _ => sin_w / (2.0 * self.q),
        };
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        let (b0, b1, b2, a0, a1, a2) = match self.filter_type {
            FilterType::LowPass => (
                (1.0 - cos_w) / 2.0,
                1.0 - cos_w,
                (1.0 - cos_w) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w,
                1.0 - alpha,
            ),
            FilterType::HighPass => (
                (1.0 + cos_w) / 2.0,
                -(1.0 + cos_w),
                (1.0 + cos_w) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w,
                1.0 - alpha,
            ),
            FilterType::BandPass => (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha),
            FilterType::Notch => (1.0, -2.0 * cos_w, 1.0, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha),
            FilterType::Peak => (
                1.0 + alpha * a,
                -2.0 * cos_w,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cos_w,
                1.0 - alpha / a,
            ),
            FilterType::LowShelf => (
                a * ((a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha),
                2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
                a * ((a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha),
                (a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha,
                -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
                (a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha,
            ),
            FilterType::HighShelf => (
                a * ((a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w),
                a * ((a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha),
                (a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha,
                2.0 * ((a - 1.0) - (a + 1.0) * cos_w),
                (a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha,
            ),
        };

        let g = 1.0 / a0;
        self.b0 = b0 * g;
        self.b1 = b1 * g;
        self.b2 = b2 * g;
        self.a1 = a1 * g;
        self.a2 = a2 * g;
    }

    /// Squared magnitude response at `freq` Hz
    pub fn response(&self, freq: f32) -> f32 {
        let (b0, b1, b2, a1, a2) = (self.b0, self.b1, self.b2, self.a1, self.a2);
        let phi = (PI * freq / self.sample_rate).sin().powi(2);
        let num = (b0 + b1 + b2).powi(2) - 4.0 * (b0 * b1 + 4.0 * b0 * b2 + b1 * b2) * phi
            + 16.0 * b0 * b2 * phi * phi;
        let den = (1.0 + a1 + a2).powi(2) - 4.0 * (a1 + 4.0 * a2 + a1 * a2) * phi
            + 16.0 * a2 * phi * phi;
        num / den
    }

    /// Process one sample
    #[inline]
    pub fn tick(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.y2 = self.y1;
        self.x1 = x;
        self.y1 = y;
        y
    }

    /// Zero the filter history
    pub fn clear_buffers(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn steady_state(filter: &mut Biquad, input: f32, samples: usize) -> f32 {
        let mut out = 0.0;
        for _ in 0..samples {
            out = filter.tick(input);
        }
        out
    }

    #[test]
    fn test_low_shelf_dc_gain_matches_setting() {
        let mut shelf = Biquad::new(FilterType::LowShelf, SR);
        shelf.set_slope(1.0);
        shelf.set_gain_db(-20.0);
        shelf.set_frequency(1000.0);
        shelf.update();

        let dc = steady_state(&mut shelf, 1.0, 20000);
        assert!((dc - 0.1).abs() < 1e-3, "DC gain should be -20dB, got {}", dc);
        assert!((shelf.response(0.0) - 0.01).abs() < 1e-4);
        assert!((shelf.response(SR / 2.0) - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_high_shelf_passes_dc() {
        let mut shelf = Biquad::new(FilterType::HighShelf, SR);
        shelf.set_gain_db(-20.0);
        shelf.set_frequency(2000.0);
        shelf.update();

        let dc = steady_state(&mut shelf, 1.0, 20000);
        assert!((dc - 1.0).abs() < 1e-3, "High shelf should leave DC alone, got {}", dc);
        assert!((shelf.response(SR / 2.0) - 0.01).abs() < 1e-3);
    }

    #[test]
    fn test_low_pass_blocks_nyquist() {
        let mut lp = Biquad::new(FilterType::LowPass, SR);
        lp.set_frequency(1000.0);
        lp.set_q(0.707);
        lp.update();

        let mut peak: f32 = 0.0;
        for i in 0..4000 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            let y = lp.tick(x);
            if i > 2000 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 1e-3, "Nyquist should be removed, got {}", peak);
    }

    #[test]
    fn test_degenerate_values_are_replaced() {
        let mut filter = Biquad::new(FilterType::Peak, SR);
        filter.set_gain(0.0);
        filter.set_q(0.0);
        assert_eq!(filter.gain(), 0.001);
        assert!(filter.q() > 0.0);
        filter.update();
        assert!(filter.tick(1.0).is_finite());
    }

    #[test]
    fn test_frequency_kept_below_nyquist() {
        let sr = 22050.0;
        for filter_type in [FilterType::LowPass, FilterType::HighShelf] {
            let mut filter = Biquad::new(filter_type, sr);
            filter.set_gain_db(-20.0);
            filter.set_frequency(20000.0);
            assert!(filter.frequency() <= 0.49 * sr);
            filter.update();

            let mut peak: f32 = 0.0;
            for i in 0..10000 {
                let y = filter.tick(if i == 0 { 1.0 } else { 0.0 });
                assert!(y.is_finite(), "{:?} diverged at {}", filter_type, i);
                peak = peak.max(y.abs());
            }
            assert!(peak < 10.0, "{:?} impulse peak {}", filter_type, peak);
        }

        let mut filter = Biquad::new(FilterType::LowPass, sr);
        filter.set_frequency(f32::NAN);
        assert_eq!(filter.frequency(), 1.0);
        filter.set_frequency(-5.0);
        assert_eq!(filter.frequency(), 1.0);
    }

    #[test]
    fn test_clear_buffers() {
        let mut lp = Biquad::new(FilterType::LowPass, SR);
        lp.set_frequency(500.0);
        lp.update();
        steady_state(&mut lp, 1.0, 100);
        lp.clear_buffers();
        assert_eq!(lp.tick(0.0), 0.0);
    }
}
