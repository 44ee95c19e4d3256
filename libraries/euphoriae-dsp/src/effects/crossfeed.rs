//! Headphone crossfeed
//!
//! Bleeds a low-passed copy of each channel into the opposite one, the way
//! a pair of speakers reaches both ears. Headphone surround runs it after
//! the surround stage to soften hard-panned content.

use super::effect::AudioEffect;
use crate::filters::OnePoleLowPass;

/// Bleed level (dB) and low-pass corner (Hz) used by headphone surround
pub const DEFAULT_BLEED_DB: f32 = -4.5;
pub const DEFAULT_CORNER_HZ: f32 = 700.0;

pub struct Crossfeed {
    bleed_db: f32,
    corner_hz: f32,
    bleed: f32,
    /// Keeps centred low frequencies at unity gain
    trim: f32,
    /// Filters indexed by source channel
    filters: [OnePoleLowPass; 2],
    enabled: bool,
    sample_rate: u32,
}

impl Crossfeed {
    pub fn new() -> Self {
        Self::with_voicing(DEFAULT_BLEED_DB, DEFAULT_CORNER_HZ)
    }

    pub fn with_voicing(bleed_db: f32, corner_hz: f32) -> Self {
        let bleed = 10.0_f32.powf(bleed_db.min(0.0) / 20.0);
        Self {
            bleed_db,
            corner_hz,
            bleed,
            trim: (1.0 + bleed).recip(),
            filters: [
                OnePoleLowPass::new(corner_hz, 44100),
                OnePoleLowPass::new(corner_hz, 44100),
            ],
            enabled: true,
            sample_rate: 44100,
        }
    }

    pub fn bleed_db(&self) -> f32 {
        self.bleed_db
    }

    pub fn corner_hz(&self) -> f32 {
        self.corner_hz
    }
}

impl Default for Crossfeed {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEffect for Crossfeed {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], sample_rate: u32) {
        if !self.enabled {
            return;
        }
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            for filter in &mut self.filters {
                filter.set_cutoff(self.corner_hz, sample_rate);
            }
        }

        let [from_left, from_right] = &mut self.filters;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let into_right = from_left.process(*l);
            let into_left = from_right.process(*r);
            *l = (*l + self.bleed * into_left) * self.trim;
            *r = (*r + self.bleed * into_right) * self.trim;
        }
    }

    fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Crossfeed"
    }
}
