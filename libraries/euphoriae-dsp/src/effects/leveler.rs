//! Volume leveler (slow automatic gain control)
//!
//! Tracks long-term loudness with a power-domain detector and steers a gain
//! toward a target level. The correction is bounded to ±12 dB scaled by
//! strength and moves over seconds, so it never pumps on transients. Input
//! below the gate freezes the gain, which keeps silence and fade-outs from
//! being pulled up.

use super::effect::AudioEffect;
use crate::filters::time_coefficient;

/// Default target level (dBFS, mean power)
pub const DEFAULT_TARGET_DB: f32 = -18.0;

/// Largest correction at strength 1.0 (dB)
pub const MAX_CORRECTION_DB: f32 = 12.0;

/// Detector level below which the gain holds (dBFS)
pub const GATE_DB: f32 = -50.0;

const DETECTOR_MS: f32 = 1500.0;
const GAIN_SMOOTHING_MS: f32 = 2000.0;

/// Automatic volume leveler
pub struct VolumeLeveler {
    strength: f32,
    target_db: f32,
    enabled: bool,

    /// Mean-square level
    power: f32,
    /// Current gain in dB
    gain_db: f32,

    detector_coeff: f32,
    gain_coeff: f32,
    sample_rate: u32,
    needs_update: bool,
}

impl VolumeLeveler {
    pub fn new(target_db: f32) -> Self {
        Self {
            strength: 0.0,
            target_db: target_db.clamp(-40.0, 0.0),
            enabled: true,
            power: 0.0,
            gain_db: 0.0,
            detector_coeff: 0.0,
            gain_coeff: 0.0,
            sample_rate: 44100,
            needs_update: true,
        }
    }

    /// Set strength in [0, 1]
    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength.clamp(0.0, 1.0);
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn target_db(&self) -> f32 {
        self.target_db
    }

    /// Current applied gain in dB
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Detected long-term level in dBFS
    pub fn level_db(&self) -> f32 {
        if self.power > 1e-12 {
            10.0 * self.power.log10()
        } else {
            -120.0
        }
    }

    fn update_coefficients(&mut self) {
        if self.needs_update {
            self.detector_coeff = time_coefficient(DETECTOR_MS, self.sample_rate);
            self.gain_coeff = time_coefficient(GAIN_SMOOTHING_MS, self.sample_rate);
            self.needs_update = false;
        }
    }
}

impl Default for VolumeLeveler {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_DB)
    }
}

impl AudioEffect for VolumeLeveler {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], sample_rate: u32) {
        if !self.enabled || self.strength <= 0.0 {
            return;
        }
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.needs_update = true;
        }
        self.update_coefficients();

        let bound = MAX_CORRECTION_DB * self.strength;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let square = 0.5 * (*l * *l + *r * *r);
            self.power = self.detector_coeff * self.power + (1.0 - self.detector_coeff) * square;

            let level_db = self.level_db();
            if level_db > GATE_DB {
                let wanted = (self.target_db - level_db).clamp(-bound, bound);
                self.gain_db = self.gain_coeff * self.gain_db + (1.0 - self.gain_coeff) * wanted;
            }
            // A lowered strength narrows the bound immediately
            self.gain_db = self.gain_db.clamp(-bound, bound);

            let gain = 10.0_f32.powf(self.gain_db / 20.0);
            *l *= gain;
            *r *= gain;
        }
    }

    fn reset(&mut self) {
        self.power = 0.0;
        self.gain_db = 0.0;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Volume Leveler"
    }
}
