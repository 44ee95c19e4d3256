//! Audio analysis tools for verification

use std::f32::consts::PI;

/// RMS (Root Mean Square) level
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Absolute maximum sample value
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

/// No NaN or infinity anywhere
pub fn all_finite(samples: &[f32]) -> bool {
    samples.iter().all(|s| s.is_finite())
}

/// Convert linear amplitude to dB
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        -100.0 // Silence
    } else {
        20.0 * linear.log10()
    }
}

/// Convert dB to linear amplitude
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Amplitude of one frequency component (Goertzel single-bin DFT)
///
/// For a sine of amplitude `A` at `frequency` the result is close to `A`.
pub fn tone_magnitude(samples: &[f32], frequency: f32, sample_rate: u32) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let omega = 2.0 * PI * frequency / sample_rate as f32;
    let coeff = 2.0 * omega.cos();

    // f64 accumulators keep long windows accurate
    let (mut s1, mut s2) = (0.0_f64, 0.0_f64);
    for &x in samples {
        let s0 = f64::from(x) + f64::from(coeff) * s1 - s2;
        s2 = s1;
        s1 = s0;
    }
    let (sin, cos) = f64::from(omega).sin_cos();
    let real = s1 - s2 * cos;
    let imag = s2 * sin;
    (2.0 * (real * real + imag * imag).sqrt() / samples.len() as f64) as f32
}

/// Largest absolute difference between consecutive samples
///
/// A click shows up as a step far larger than the signal's own slope.
pub fn max_step(samples: &[f32]) -> f32 {
    samples
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .fold(0.0_f32, f32::max)
}
