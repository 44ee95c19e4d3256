//! Second-order IIR sections
//!
//! Coefficients follow the RBJ audio-EQ cookbook. They are computed in f64 and
//! stored as f32; the recurrent state is kept per channel so one set of
//! coefficients can drive any number of channels.

use std::f64::consts::PI;

/// Gains below this magnitude (in dB) produce identity coefficients.
const IDENTITY_GAIN_DB: f32 = 0.01;

/// Highest usable corner frequency as a fraction of the sample rate.
const MAX_CORNER_RATIO: f64 = 0.45;

/// Normalized biquad coefficients (`a0` already divided out)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::identity()
    }
}

impl BiquadCoefficients {
    /// Pass-through section: `y[n] = x[n]` exactly
    pub const fn identity() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    /// Check whether these coefficients are the exact identity
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Peaking (bell) filter
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz
    /// * `frequency` - Center frequency in Hz
    /// * `q` - Bandwidth control
    /// * `gain_db` - Boost (positive) or cut (negative) at the center frequency
    pub fn peaking(sample_rate: u32, frequency: f32, q: f32, gain_db: f32) -> Self {
        let Some(w) = Warp::new(sample_rate, frequency) else {
            return Self::identity();
        };
        if gain_db.abs() < IDENTITY_GAIN_DB {
            return Self::identity();
        }

        let a = 10.0_f64.powf(f64::from(gain_db) / 40.0);
        let alpha = w.sin / (2.0 * f64::from(q.max(0.05)));

        Self::normalize(
            1.0 + alpha * a,
            -2.0 * w.cos,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * w.cos,
            1.0 - alpha / a,
        )
    }

    /// Low shelf: boosts or cuts everything below `frequency`
    ///
    /// `slope` is the cookbook shelf slope S (1.0 = steepest monotonic shelf).
    pub fn low_shelf(sample_rate: u32, frequency: f32, slope: f32, gain_db: f32) -> Self {
        let Some(w) = Warp::new(sample_rate, frequency) else {
            return Self::identity();
        };
        if gain_db.abs() < IDENTITY_GAIN_DB {
            return Self::identity();
        }

        let a = 10.0_f64.powf(f64::from(gain_db) / 40.0);
        let beta = 2.0 * a.sqrt() * shelf_alpha(w.sin, a, slope);

        Self::normalize(
            a * ((a + 1.0) - (a - 1.0) * w.cos + beta),
            2.0 * a * ((a - 1.0) - (a + 1.0) * w.cos),
            a * ((a + 1.0) - (a - 1.0) * w.cos - beta),
            (a + 1.0) + (a - 1.0) * w.cos + beta,
            -2.0 * ((a - 1.0) + (a + 1.0) * w.cos),
            (a + 1.0) + (a - 1.0) * w.cos - beta,
        )
    }

    /// High shelf: boosts or cuts everything above `frequency`
    pub fn high_shelf(sample_rate: u32, frequency: f32, slope: f32, gain_db: f32) -> Self {
        let Some(w) = Warp::new(sample_rate, frequency) else {
            return Self::identity();
        };
        if gain_db.abs() < IDENTITY_GAIN_DB {
            return Self::identity();
        }

        let a = 10.0_f64.powf(f64::from(gain_db) / 40.0);
        let beta = 2.0 * a.sqrt() * shelf_alpha(w.sin, a, slope);

        Self::normalize(
            a * ((a + 1.0) + (a - 1.0) * w.cos + beta),
            -2.0 * a * ((a - 1.0) + (a + 1.0) * w.cos),
            a * ((a + 1.0) + (a - 1.0) * w.cos - beta),
            (a + 1.0) - (a - 1.0) * w.cos + beta,
            2.0 * ((a - 1.0) - (a + 1.0) * w.cos),
            (a + 1.0) - (a - 1.0) * w.cos - beta,
        )
    }

    /// Second-order low pass
    pub fn low_pass(sample_rate: u32, frequency: f32, q: f32) -> Self {
        let Some(w) = Warp::new(sample_rate, frequency) else {
            return Self::identity();
        };
        let alpha = w.sin / (2.0 * f64::from(q.max(0.05)));

        Self::normalize(
            (1.0 - w.cos) / 2.0,
            1.0 - w.cos,
            (1.0 - w.cos) / 2.0,
            1.0 + alpha,
            -2.0 * w.cos,
            1.0 - alpha,
        )
    }

    /// Second-order high pass
    pub fn high_pass(sample_rate: u32, frequency: f32, q: f32) -> Self {
        let Some(w) = Warp::new(sample_rate, frequency) else {
            return Self::identity();
        };
        let alpha = w.sin / (2.0 * f64::from(q.max(0.05)));

        Self::normalize(
            (1.0 + w.cos) / 2.0,
            -(1.0 + w.cos),
            (1.0 + w.cos) / 2.0,
            1.0 + alpha,
            -2.0 * w.cos,
            1.0 - alpha,
        )
    }

    fn normalize(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: (b0 / a0) as f32,
            b1: (b1 / a0) as f32,
            b2: (b2 / a0) as f32,
            a1: (a1 / a0) as f32,
            a2: (a2 / a0) as f32,
        }
    }

    /// Magnitude response in dB at `frequency`
    ///
    /// Used by tests and by callers that want to report a curve.
    pub fn magnitude_db(&self, sample_rate: u32, frequency: f32) -> f32 {
        let w = 2.0 * PI * f64::from(frequency) / f64::from(sample_rate.max(1));
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = f64::from(self.b0) + f64::from(self.b1) * c1 + f64::from(self.b2) * c2;
        let num_im = -(f64::from(self.b1) * s1 + f64::from(self.b2) * s2);
        let den_re = 1.0 + f64::from(self.a1) * c1 + f64::from(self.a2) * c2;
        let den_im = -(f64::from(self.a1) * s1 + f64::from(self.a2) * s2);

        let num = num_re * num_re + num_im * num_im;
        let den = den_re * den_re + den_im * den_im;
        (10.0 * (num / den.max(1e-30)).log10()) as f32
    }
}

/// Pre-computed trigonometry for one corner frequency
struct Warp {
    sin: f64,
    cos: f64,
}

impl Warp {
    fn new(sample_rate: u32, frequency: f32) -> Option<Self> {
        if sample_rate == 0 || !frequency.is_finite() || frequency <= 0.0 {
            return None;
        }
        let sr = f64::from(sample_rate);
        let clamped = f64::from(frequency).min(sr * MAX_CORNER_RATIO);
        let omega = 2.0 * PI * clamped / sr;
        Some(Self {
            sin: omega.sin(),
            cos: omega.cos(),
        })
    }
}

fn shelf_alpha(sin_omega: f64, a: f64, slope: f32) -> f64 {
    let s = f64::from(slope.clamp(0.1, 1.0));
    sin_omega / 2.0 * ((a + 1.0 / a) * (1.0 / s - 1.0) + 2.0).sqrt()
}

/// Direct-form-I recurrent state for one channel
#[derive(Debug, Clone, Copy, Default)]
pub struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadState {
    pub const fn new() -> Self {
        Self {
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, c: &BiquadCoefficients, input: f32) -> f32 {
        let mut out = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        // Flush denormals
        if out.abs() < 1e-15 {
            out = 0.0;
        }

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = out;
        out
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// One coefficient set shared by a left and a right state
#[derive(Debug, Clone, Default)]
pub struct StereoBiquad {
    coefficients: BiquadCoefficients,
    left: BiquadState,
    right: BiquadState,
}

impl StereoBiquad {
    pub fn new(coefficients: BiquadCoefficients) -> Self {
        Self {
            coefficients,
            left: BiquadState::new(),
            right: BiquadState::new(),
        }
    }

    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coefficients
    }

    /// Replace the coefficients, keeping the recurrent state
    pub fn set_coefficients(&mut self, coefficients: BiquadCoefficients) {
        self.coefficients = coefficients;
    }

    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        (
            self.left.process(&self.coefficients, left),
            self.right.process(&self.coefficients, right),
        )
    }

    /// Run the section over a planar stereo block in place
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process(*l, *r);
        }
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
