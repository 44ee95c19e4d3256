//! Spectral enhancers
//!
//! Clarity, spectrum extension, tube warmth and treble boost are the same
//! processor with different voicings:
//!
//! 1. a high shelf
//! 2. a soft-clip saturator blended in by strength
//! 3. a harmonic generator: the band above `harmonic_hz` is full-wave
//!    rectified (which produces even harmonics), high-passed above the source
//!    band and mixed back in
//!
//! Any stage whose voicing amount is zero is skipped, and strength zero
//! bypasses the whole processor.

use super::effect::AudioEffect;
use crate::filters::{BiquadCoefficients, Saturator, StereoBiquad};

/// Parameters that distinguish one enhancer from another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhancerVoicing {
    pub name: &'static str,
    /// High-shelf corner (Hz)
    pub shelf_hz: f32,
    /// Shelf gain at strength 1.0 (dB, may be negative)
    pub shelf_max_db: f32,
    /// Saturator drive at strength 1.0 (1.0 = gentle)
    pub drive_max: f32,
    /// Saturator asymmetry
    pub bias: f32,
    /// Saturated signal blended in at strength 1.0
    pub saturation_mix: f32,
    /// Lower edge of the band used to synthesize harmonics (Hz)
    pub harmonic_hz: f32,
    /// Synthesized harmonics blended in at strength 1.0
    pub harmonic_mix: f32,
}

/// Presence lift with a touch of saturation and harmonics
pub const CLARITY: EnhancerVoicing = EnhancerVoicing {
    name: "Clarity",
    shelf_hz: 3000.0,
    shelf_max_db: 6.0,
    drive_max: 2.0,
    bias: 0.0,
    saturation_mix: 0.3,
    harmonic_hz: 2500.0,
    harmonic_mix: 0.15,
};

/// Restores air above the band limit of lossy sources
pub const SPECTRUM_EXTENSION: EnhancerVoicing = EnhancerVoicing {
    name: "Spectrum Extension",
    shelf_hz: 8000.0,
    shelf_max_db: 3.0,
    drive_max: 1.0,
    bias: 0.0,
    saturation_mix: 0.0,
    harmonic_hz: 5000.0,
    harmonic_mix: 0.4,
};

/// Asymmetric saturation with a slightly darker top end
pub const TUBE_WARMTH: EnhancerVoicing = EnhancerVoicing {
    name: "Tube Warmth",
    shelf_hz: 7000.0,
    shelf_max_db: -2.0,
    drive_max: 4.0,
    bias: 0.25,
    saturation_mix: 0.8,
    harmonic_hz: 0.0,
    harmonic_mix: 0.0,
};

/// Plain treble shelf
pub const TREBLE_BOOST: EnhancerVoicing = EnhancerVoicing {
    name: "Treble Boost",
    shelf_hz: 6000.0,
    shelf_max_db: 12.0,
    drive_max: 1.0,
    bias: 0.0,
    saturation_mix: 0.0,
    harmonic_hz: 0.0,
    harmonic_mix: 0.0,
};

/// Shelf + saturator + harmonic generator
pub struct Enhancer {
    voicing: EnhancerVoicing,
    strength: f32,
    shelf: StereoBiquad,
    saturator: Saturator,
    band_split: StereoBiquad,
    harmonic_filter: StereoBiquad,
    saturation_amount: f32,
    harmonic_amount: f32,
    enabled: bool,
    sample_rate: u32,
    needs_update: bool,
}

impl Enhancer {
    pub fn new(voicing: EnhancerVoicing) -> Self {
        Self {
            voicing,
            strength: 0.0,
            shelf: StereoBiquad::default(),
            saturator: Saturator::default(),
            band_split: StereoBiquad::default(),
            harmonic_filter: StereoBiquad::default(),
            saturation_amount: 0.0,
            harmonic_amount: 0.0,
            enabled: true,
            sample_rate: 44100,
            needs_update: true,
        }
    }

    pub fn voicing(&self) -> &EnhancerVoicing {
        &self.voicing
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

    fn update_parameters(&mut self) {
        if !self.needs_update {
            return;
        }
        let v = self.voicing;
        let s = self.strength;
        let sr = self.sample_rate;

        self.shelf.set_coefficients(BiquadCoefficients::high_shelf(
            sr,
            v.shelf_hz,
            1.0,
            v.shelf_max_db * s,
        ));
        self.saturator.set(1.0 + (v.drive_max - 1.0) * s, v.bias);
        self.saturation_amount = v.saturation_mix * s;
        self.harmonic_amount = v.harmonic_mix * s;

        if v.harmonic_hz > 0.0 {
            self.band_split
                .set_coefficients(BiquadCoefficients::high_pass(sr, v.harmonic_hz, 0.707));
            self.harmonic_filter.set_coefficients(BiquadCoefficients::high_pass(
                sr,
                v.harmonic_hz * 1.5,
                0.707,
            ));
        }
        self.needs_update = false;
    }

    #[inline]
    fn harmonics(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (band_l, band_r) = self.band_split.process(left, right);
        self.harmonic_filter.process(band_l.abs(), band_r.abs())
    }
}

impl AudioEffect for Enhancer {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], sample_rate: u32) {
        if !self.enabled || self.strength <= 0.0 {
            return;
        }
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.needs_update = true;
        }
        self.update_parameters();

        if !self.shelf.coefficients().is_identity() {
            self.shelf.process_block(left, right);
        }

        if self.saturation_amount > 0.0 {
            let amount = self.saturation_amount;
            for sample in left.iter_mut().chain(right.iter_mut()) {
                let shaped = self.saturator.process(*sample);
                *sample += amount * (shaped - *sample);
            }
        }

        if self.harmonic_amount > 0.0 && self.voicing.harmonic_hz > 0.0 {
            let amount = self.harmonic_amount;
            for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                let (h_l, h_r) = self.harmonics(*l, *r);
                *l += amount * h_l;
                *r += amount * h_r;
            }
        }
    }

    fn reset(&mut self) {
        self.shelf.reset();
        self.band_split.reset();
        self.harmonic_filter.reset();
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        self.voicing.name
    }
}
