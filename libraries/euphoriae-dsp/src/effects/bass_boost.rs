//! Bass boost
//!
//! A single low shelf whose gain scales with strength.

use super::effect::AudioEffect;
use crate::filters::{BiquadCoefficients, StereoBiquad};

/// Shelf corner frequency (Hz)
pub const BASS_BOOST_CORNER_HZ: f32 = 120.0;

/// Shelf gain at strength 1.0
pub const BASS_BOOST_MAX_DB: f32 = 12.0;

/// Low-shelf bass enhancer
pub struct BassBoost {
    strength: f32,
    shelf: StereoBiquad,
    enabled: bool,
    sample_rate: u32,
    needs_update: bool,
}

impl BassBoost {
    pub fn new() -> Self {
        Self {
            strength: 0.0,
            shelf: StereoBiquad::default(),
            enabled: true,
            sample_rate: 44100,
            needs_update: true,
        }
    }

    /// Set strength in [0, 1]
    pub fn set_strength(&mut self, strength: f32) {
        let strength = strength.clamp(0.0, 1.0);
        if strength != self.strength {
            self.strength = strength;
            self.needs_update = true;
        }
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Shelf gain in dB for the current strength
    pub fn gain_db(&self) -> f32 {
        self.strength * BASS_BOOST_MAX_DB
    }

    fn update_coefficients(&mut self) {
        if self.needs_update {
            self.shelf.set_coefficients(BiquadCoefficients::low_shelf(
                self.sample_rate,
                BASS_BOOST_CORNER_HZ,
                1.0,
                self.gain_db(),
            ));
            self.needs_update = false;
        }
    }
}

impl Default for BassBoost {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEffect for BassBoost {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], sample_rate: u32) {
        if !self.enabled || self.strength <= 0.0 {
            return;
        }
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.needs_update = true;
        }
        self.update_coefficients();
        self.shelf.process_block(left, right);
    }

    fn reset(&mut self) {
        self.shelf.reset();
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Bass Boost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{generate_sine, rms};

    #[test]
    fn zero_strength_is_transparent() {
        let mut bass = BassBoost::new();
        let mut left = vec![0.25, -0.5, 0.75];
        let mut right = left.clone();
        bass.process(&mut left, &mut right, 48000);
        assert_eq!(left, vec![0.25, -0.5, 0.75]);
    }

    #[test]
    fn boosts_lows_not_highs() {
        let mut bass = BassBoost::new();
        bass.set_strength(1.0);

        let mut low_l = generate_sine(25.0, 48000, 0.5, 0.1);
        let mut low_r = low_l.clone();
        bass.process(&mut low_l, &mut low_r, 48000);
        let low_gain = rms(&low_l[12000..]) / rms(&generate_sine(25.0, 48000, 0.5, 0.1)[12000..]);

        bass.reset();
        let mut high_l = generate_sine(5000.0, 48000, 0.5, 0.1);
        let mut high_r = high_l.clone();
        bass.process(&mut high_l, &mut high_r, 48000);
        let high_gain =
            rms(&high_l[12000..]) / rms(&generate_sine(5000.0, 48000, 0.5, 0.1)[12000..]);

        assert!(low_gain > 2.8, "25 Hz gain {low_gain}");
        assert!((high_gain - 1.0).abs() < 0.05, "5 kHz gain {high_gain}");
    }

    #[test]
    fn strength_is_clamped() {
        let mut bass = BassBoost::new();
        bass.set_strength(4.0);
        assert_eq!(bass.strength(), 1.0);
        assert_eq!(bass.gain_db(), 12.0);
    }
}
