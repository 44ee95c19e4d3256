//! Strength-driven dynamic range compressor
//!
//! One normalized strength picks the whole transfer curve: stronger settings
//! compress earlier and harder, and part of the lost loudness is given back
//! as makeup gain.
use super::effect::AudioEffect;
use crate::filters::time_coefficient;

/// Smallest envelope considered when converting to dB
const ENVELOPE_FLOOR: f32 = 1e-6;

/// Envelope decay, long enough to ride over a 20 Hz cycle
const ENVELOPE_DECAY_MS: f32 = 50.0;
const ATTACK_MS: f32 = 10.0;
const RELEASE_MS: f32 = 120.0;

/// Static transfer curve of the compressor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorCurve {
    pub threshold_db: f32,
    pub ratio: f32,
    /// Width of the soft knee centred on the threshold
    pub knee_db: f32,
    pub makeup_db: f32,
}

impl CompressorCurve {
    /// Curve for a strength in [0, 1]
    ///
    /// Threshold moves from -6 dB to -30 dB and the ratio from 1:1 to 8:1.
    /// Makeup restores a quarter of what a full-scale signal loses.
    pub fn for_strength(strength: f32) -> Self {
        let s = strength.clamp(0.0, 1.0);
        let threshold_db = -6.0 - 24.0 * s;
        let ratio = 1.0 + 7.0 * s;
        Self {
            threshold_db,
            ratio,
            knee_db: 6.0,
            makeup_db: 0.25 * -threshold_db * (1.0 - ratio.recip()),
        }
    }

    /// Gain change (zero or negative) for a detector level, before makeup
    pub fn gain_db(&self, level_db: f32) -> f32 {
        let over = level_db - self.threshold_db;
        let slope = 1.0 - self.ratio.recip();
        let half_knee = self.knee_db * 0.5;

        if over <= -half_knee {
            0.0
        } else if over >= half_knee || self.knee_db <= 0.0 {
            -slope * over
        } else {
            let into_knee = over + half_knee;
            -slope * into_knee * into_knee / (2.0 * self.knee_db)
        }
    }
}

impl Default for CompressorCurve {
    fn default() -> Self {
        Self::for_strength(0.5)
    }
}

/// Stereo-linked feed-forward compressor
///
/// The detector follows the louder channel with instant rise and a slow
/// decay; the resulting gain moves with separate attack and release times.
pub struct Compressor {
    curve: CompressorCurve,
    strength: f32,
    enabled: bool,

    envelope: f32,
    gain_db: f32,

    decay: f32,
    attack: f32,
    release: f32,
    makeup: f32,
    sample_rate: u32,
}

impl Compressor {
    pub fn new() -> Self {
        let mut compressor = Self {
            curve: CompressorCurve::for_strength(0.0),
            strength: 0.0,
            enabled: true,
            envelope: 0.0,
            gain_db: 0.0,
            decay: 0.0,
            attack: 0.0,
            release: 0.0,
            makeup: 1.0,
            sample_rate: 0,
        };
        compressor.prepare(44100);
        compressor
    }

    pub fn set_strength(&mut self, strength: f32) {
        let strength = strength.clamp(0.0, 1.0);
        if strength != self.strength {
            self.strength = strength;
            self.curve = CompressorCurve::for_strength(strength);
            self.makeup = 10.0_f32.powf(self.curve.makeup_db / 20.0);
        }
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn curve(&self) -> CompressorCurve {
        self.curve
    }

    /// Smoothed gain reduction in dB, excluding makeup
    pub fn gain_reduction_db(&self) -> f32 {
        self.gain_db
    }

    fn prepare(&mut self, sample_rate: u32) {
        if sample_rate == self.sample_rate {
            return;
        }
        self.sample_rate = sample_rate;
        self.decay = time_coefficient(ENVELOPE_DECAY_MS, sample_rate);
        self.attack = time_coefficient(ATTACK_MS, sample_rate);
        self.release = time_coefficient(RELEASE_MS, sample_rate);
    }

    #[inline]
    fn next_gain(&mut self, level: f32) -> f32 {
        self.envelope = level.max(self.envelope * self.decay);
        let level_db = 20.0 * self.envelope.max(ENVELOPE_FLOOR).log10();
        let target = self.curve.gain_db(level_db);

        let coeff = if target < self.gain_db { self.attack } else { self.release };
        self.gain_db = target + coeff * (self.gain_db - target);
        10.0_f32.powf(self.gain_db / 20.0) * self.makeup
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEffect for Compressor {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], sample_rate: u32) {
        if !self.enabled || self.strength <= 0.0 {
            return;
        }
        self.prepare(sample_rate);

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let gain = self.next_gain(l.abs().max(r.abs()));
            *l *= gain;
            *r *= gain;
        }
    }

    fn reset(&mut self) {
        self.envelope = 0.0;
        self.gain_db = 0.0;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Compressor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{generate_sine, peak};

    #[test]
    fn stronger_curves_compress_earlier_and_harder() {
        let soft = CompressorCurve::for_strength(0.2);
        let hard = CompressorCurve::for_strength(0.9);
        assert!(hard.threshold_db < soft.threshold_db);
        assert!(hard.ratio > soft.ratio);

        let off = CompressorCurve::for_strength(0.0);
        assert_eq!(off.ratio, 1.0);
        assert_eq!(off.makeup_db, 0.0);
        assert_eq!(off.gain_db(0.0), 0.0);
    }

    #[test]
    fn hard_knee_follows_the_ratio() {
        let mut curve = CompressorCurve::for_strength(1.0);
        curve.knee_db = 0.0;
        assert_eq!(curve.gain_db(-40.0), 0.0);
        // 24 dB over an 8:1 threshold comes out 3 dB over
        assert!((curve.gain_db(-6.0) + 21.0).abs() < 1e-4);
    }

    #[test]
    fn knee_edges_are_continuous() {
        let curve = CompressorCurve::default();
        let half = curve.knee_db / 2.0;
        for edge in [curve.threshold_db - half, curve.threshold_db + half] {
            let below = curve.gain_db(edge - 1e-3);
            let above = curve.gain_db(edge + 1e-3);
            assert!((below - above).abs() < 0.01, "jump at {edge} dB");
        }
    }

    #[test]
    fn zero_strength_is_transparent() {
        let mut comp = Compressor::new();
        let mut left = vec![0.9, -0.9, 0.5];
        let mut right = left.clone();
        comp.process(&mut left, &mut right, 48000);
        assert_eq!(left, vec![0.9, -0.9, 0.5]);
    }

    #[test]
    fn loud_signal_is_reduced() {
        let mut comp = Compressor::new();
        comp.set_strength(1.0);

        let mut left = generate_sine(1000.0, 48000, 1.0, 0.9);
        let mut right = left.clone();
        comp.process(&mut left, &mut right, 48000);

        let settled = peak(&left[24000..]);
        assert!(settled < 0.6, "settled peak {settled}");
        assert!(comp.gain_reduction_db() < -10.0);

        comp.reset();
        assert_eq!(comp.gain_reduction_db(), 0.0);
    }
}
