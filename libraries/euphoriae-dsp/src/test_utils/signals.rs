//! Test signal generation
//!
//! - Sine waves (single frequency)
//! - White noise
//! - Tone bursts (silence, tone, silence)
//! - Impulses

use std::f32::consts::PI;

use rand::Rng;

/// Generate a mono sine wave
///
/// # Arguments
/// * `frequency` - Frequency in Hz
/// * `sample_rate` - Sample rate in Hz
/// * `duration` - Duration in seconds
/// * `amplitude` - Peak amplitude (0.0 to 1.0)
pub fn generate_sine(frequency: f32, sample_rate: u32, duration: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * duration) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * PI * frequency * t).sin() * amplitude
        })
        .collect()
}

/// Generate mono white noise with a uniform distribution
pub fn generate_white_noise(sample_rate: u32, duration: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * duration) as usize;
    let mut rng = rand::thread_rng();
    (0..num_samples)
        .map(|_| rng.gen_range(-1.0..=1.0) * amplitude)
        .collect()
}

/// Silence, then a sine burst, then silence
///
/// Useful for checking attack/release behaviour and tails.
pub fn generate_burst(
    frequency: f32,
    sample_rate: u32,
    silence: f32,
    burst: f32,
    amplitude: f32,
) -> Vec<f32> {
    let gap = (sample_rate as f32 * silence) as usize;
    let mut samples = vec![0.0; gap];
    samples.extend(generate_sine(frequency, sample_rate, burst, amplitude));
    samples.extend(std::iter::repeat(0.0).take(gap));
    samples
}

/// A single unit impulse followed by silence
pub fn generate_impulse(sample_rate: u32, duration: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = ((sample_rate as f32 * duration) as usize).max(1);
    let mut samples = vec![0.0; num_samples];
    samples[0] = amplitude;
    samples
}
