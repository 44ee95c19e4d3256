//! Headphone correction profiles
//!
//! Each profile is a short list of fixed biquads that nudges a class of
//! headphones toward a neutral response. Profile ids are stable and
//! out-of-range ids clamp to the nearest profile.

use super::effect::AudioEffect;
use crate::filters::{BiquadCoefficients, StereoBiquad};

/// One correction filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CorrectionFilter {
    LowShelf { frequency: f32, gain_db: f32 },
    Peak { frequency: f32, q: f32, gain_db: f32 },
    HighShelf { frequency: f32, gain_db: f32 },
}

impl CorrectionFilter {
    fn coefficients(&self, sample_rate: u32) -> BiquadCoefficients {
        match *self {
            Self::LowShelf { frequency, gain_db } => {
                BiquadCoefficients::low_shelf(sample_rate, frequency, 1.0, gain_db)
            }
            Self::Peak {
                frequency,
                q,
                gain_db,
            } => BiquadCoefficients::peaking(sample_rate, frequency, q, gain_db),
            Self::HighShelf { frequency, gain_db } => {
                BiquadCoefficients::high_shelf(sample_rate, frequency, 1.0, gain_db)
            }
        }
    }
}

/// Headphone type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadphoneProfile {
    #[default]
    Generic,
    InEar,
    OverEar,
    OnEar,
    Earbuds,
}

impl HeadphoneProfile {
    pub const ALL: [Self; 5] = [
        Self::Generic,
        Self::InEar,
        Self::OverEar,
        Self::OnEar,
        Self::Earbuds,
    ];

    pub fn id(&self) -> u32 {
        match self {
            Self::Generic => 0,
            Self::InEar => 1,
            Self::OverEar => 2,
            Self::OnEar => 3,
            Self::Earbuds => 4,
        }
    }

    /// Profile for an id, clamping out-of-range values
    pub fn from_id(id: i64) -> Self {
        Self::ALL[id.clamp(0, 4) as usize]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Generic => "Generic",
            Self::InEar => "In-Ear",
            Self::OverEar => "Over-Ear",
            Self::OnEar => "On-Ear",
            Self::Earbuds => "Earbuds",
        }
    }

    /// Correction filters for this profile (empty = flat)
    pub fn filters(&self) -> &'static [CorrectionFilter] {
        use CorrectionFilter::{HighShelf, LowShelf, Peak};
        match self {
            Self::Generic => &[],
            Self::InEar => &[
                LowShelf { frequency: 80.0, gain_db: -2.0 },
                Peak { frequency: 2800.0, q: 1.2, gain_db: 3.0 },
                HighShelf { frequency: 9000.0, gain_db: -2.0 },
            ],
            Self::OverEar => &[
                LowShelf { frequency: 100.0, gain_db: -1.5 },
                Peak { frequency: 3200.0, q: 1.0, gain_db: 2.0 },
                Peak { frequency: 6500.0, q: 2.5, gain_db: -2.0 },
            ],
            Self::OnEar => &[
                LowShelf { frequency: 120.0, gain_db: 1.0 },
                Peak { frequency: 2500.0, q: 1.0, gain_db: 2.5 },
                HighShelf { frequency: 10000.0, gain_db: -1.0 },
            ],
            Self::Earbuds => &[
                LowShelf { frequency: 100.0, gain_db: 4.0 },
                Peak { frequency: 3000.0, q: 1.0, gain_db: 1.5 },
                HighShelf { frequency: 8000.0, gain_db: 1.0 },
            ],
        }
    }
}

const MAX_FILTERS: usize = 3;

/// Applies the active headphone profile
pub struct HeadphoneCorrection {
    profile: HeadphoneProfile,
    stages: [StereoBiquad; MAX_FILTERS],
    active: usize,
    enabled: bool,
    sample_rate: u32,
    needs_update: bool,
}

impl HeadphoneCorrection {
    pub fn new() -> Self {
        Self {
            profile: HeadphoneProfile::Generic,
            stages: std::array::from_fn(|_| StereoBiquad::default()),
            active: 0,
            enabled: true,
            sample_rate: 44100,
            needs_update: true,
        }
    }

    /// Switch profile; filter state is cleared
    pub fn set_profile(&mut self, profile: HeadphoneProfile) {
        if profile != self.profile {
            self.profile = profile;
            self.needs_update = true;
            self.reset();
        }
    }

    pub fn profile(&self) -> HeadphoneProfile {
        self.profile
    }

    fn update_coefficients(&mut self) {
        if !self.needs_update {
            return;
        }
        let filters = self.profile.filters();
        self.active = filters.len().min(MAX_FILTERS);
        for (stage, filter) in self.stages.iter_mut().zip(filters) {
            stage.set_coefficients(filter.coefficients(self.sample_rate));
        }
        self.needs_update = false;
    }
}

impl Default for HeadphoneCorrection {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEffect for HeadphoneCorrection {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], sample_rate: u32) {
        if !self.enabled || self.profile == HeadphoneProfile::Generic {
            return;
        }
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.needs_update = true;
        }
        self.update_coefficients();

        for stage in &mut self.stages[..self.active] {
            stage.process_block(left, right);
        }
    }

    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Headphone Correction"
    }
}
