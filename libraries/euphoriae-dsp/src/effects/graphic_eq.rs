//! Graphic Equalizer
//!
//! Fixed-frequency band equalization:
//! - 5-band: 60 / 230 / 910 / 3.6k / 14k Hz
//! - 10-band: octave bands from 31 Hz to 16 kHz
//! - Per-band gain -12 to +12 dB, driven by a normalized level in [-1, 1]
//!
//! Each band is a peaking biquad. Coefficients are shared by both channels,
//! state is per channel. A band is only recomputed when its gain moves by more
//! than [`GAIN_EPSILON_DB`], so a slowly ramping level costs one coefficient
//! update per control step at most.

use super::effect::AudioEffect;
use crate::filters::{BiquadCoefficients, StereoBiquad};

/// Five-band center frequencies (Hz)
pub const FIVE_BAND_FREQUENCIES: [f32; 5] = [60.0, 230.0, 910.0, 3600.0, 14000.0];

/// Ten-band center frequencies (Hz)
pub const TEN_BAND_FREQUENCIES: [f32; 10] = [
    31.0, 62.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Upper bound on band count across layouts
pub const MAX_BANDS: usize = 10;

/// Gain at level +1.0 (and cut at -1.0)
pub const MAX_GAIN_DB: f32 = 12.0;

/// Smallest gain change that triggers a coefficient update
pub const GAIN_EPSILON_DB: f32 = 0.001;

/// Map a normalized band level to a gain in dB (`level * 12`)
pub fn level_to_gain_db(level: f32) -> f32 {
    level.clamp(-1.0, 1.0) * MAX_GAIN_DB
}

/// Band layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EqLayout {
    /// 5 bands, two octaves apart
    FiveBand,
    /// 10 octave bands
    #[default]
    TenBand,
}

impl EqLayout {
    /// Get the number of bands
    pub fn count(&self) -> usize {
        self.frequencies().len()
    }

    /// Get the center frequencies for this layout
    pub fn frequencies(&self) -> &'static [f32] {
        match self {
            Self::FiveBand => &FIVE_BAND_FREQUENCIES,
            Self::TenBand => &TEN_BAND_FREQUENCIES,
        }
    }

    /// Q giving an even overlap between neighbouring bands
    pub fn q_factor(&self) -> f32 {
        match self {
            Self::FiveBand => 0.67, // ~2 octave bandwidth
            Self::TenBand => 1.41,  // Octave bandwidth
        }
    }

    /// Stable numeric id (0 = five band, 1 = ten band)
    pub fn id(&self) -> u32 {
        match self {
            Self::FiveBand => 0,
            Self::TenBand => 1,
        }
    }

    pub fn from_id(id: u32) -> Self {
        if id == 0 {
            Self::FiveBand
        } else {
            Self::TenBand
        }
    }
}

#[derive(Debug, Clone)]
struct Band {
    frequency: f32,
    q: f32,
    gain_db: f32,
    filter: StereoBiquad,
}

impl Band {
    fn new() -> Self {
        Self {
            frequency: 1000.0,
            q: 1.0,
            gain_db: 0.0,
            filter: StereoBiquad::default(),
        }
    }

    fn update_coefficients(&mut self, sample_rate: u32) {
        self.filter.set_coefficients(BiquadCoefficients::peaking(
            sample_rate,
            self.frequency,
            self.q,
            self.gain_db,
        ));
    }

    fn is_identity(&self) -> bool {
        self.filter.coefficients().is_identity()
    }
}

/// 5-band or 10-band graphic equalizer
pub struct GraphicEq {
    bands: [Band; MAX_BANDS],
    layout: EqLayout,
    enabled: bool,
    sample_rate: u32,
}

impl GraphicEq {
    /// Create an equalizer with the given layout, all bands flat
    pub fn new(layout: EqLayout) -> Self {
        let mut eq = Self {
            bands: std::array::from_fn(|_| Band::new()),
            layout,
            enabled: true,
            sample_rate: 44100,
        };
        eq.configure_bands();
        eq
    }

    fn configure_bands(&mut self) {
        let q = self.layout.q_factor();
        for (band, &frequency) in self.bands.iter_mut().zip(self.layout.frequencies()) {
            band.frequency = frequency;
            band.q = q;
            band.update_coefficients(self.sample_rate);
        }
    }

    pub fn layout(&self) -> EqLayout {
        self.layout
    }

    /// Switch layout, keeping per-index gains and zeroing filter state
    pub fn set_layout(&mut self, layout: EqLayout) {
        if layout == self.layout {
            return;
        }
        self.layout = layout;
        self.configure_bands();
        self.reset();
    }

    /// Get number of active bands
    pub fn band_count(&self) -> usize {
        self.layout.count()
    }

    /// Get center frequency of a band
    pub fn band_frequency(&self, index: usize) -> Option<f32> {
        self.layout.frequencies().get(index).copied()
    }

    /// Get gain of a band in dB
    pub fn band_gain(&self, index: usize) -> Option<f32> {
        (index < self.band_count()).then(|| self.bands[index].gain_db)
    }

    /// Set gain of a band in dB (clamped to ±12 dB)
    ///
    /// Filter state is kept so a ramped gain stays continuous. Bands past the
    /// current layout still record their gain, so switching back to a wider
    /// layout plays what was last written.
    pub fn set_band_gain(&mut self, index: usize, gain_db: f32) {
        if index >= MAX_BANDS || !gain_db.is_finite() {
            return;
        }
        let gain_db = gain_db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB);
        let band = &mut self.bands[index];
        if (band.gain_db - gain_db).abs() <= GAIN_EPSILON_DB && gain_db != 0.0 {
            return;
        }
        band.gain_db = gain_db;
        band.update_coefficients(self.sample_rate);
    }

    /// Set gain of a band from a normalized level in [-1, 1]
    pub fn set_band_level(&mut self, index: usize, level: f32) {
        self.set_band_gain(index, level_to_gain_db(level));
    }

    /// Set all band gains in dB; extra values are ignored
    pub fn set_gains(&mut self, gains_db: &[f32]) {
        for (index, &gain) in gains_db.iter().enumerate().take(self.band_count()) {
            self.set_band_gain(index, gain);
        }
    }

    /// All active bands are exactly transparent
    pub fn is_flat(&self) -> bool {
        self.bands[..self.band_count()].iter().all(Band::is_identity)
    }

    /// Combined magnitude response in dB of the current coefficients
    pub fn response_db(&self, frequency: f32) -> f32 {
        self.bands[..self.band_count()]
            .iter()
            .map(|b| b.filter.coefficients().magnitude_db(self.sample_rate, frequency))
            .sum()
    }

    /// Bind to a sample rate, recomputing coefficients if it changed
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate == self.sample_rate || sample_rate == 0 {
            return;
        }
        self.sample_rate = sample_rate;
        let count = self.band_count();
        for band in &mut self.bands[..count] {
            band.update_coefficients(sample_rate);
            band.filter.reset();
        }
    }
}

impl Default for GraphicEq {
    fn default() -> Self {
        Self::new(EqLayout::TenBand)
    }
}

impl AudioEffect for GraphicEq {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], sample_rate: u32) {
        if !self.enabled {
            return;
        }

        self.set_sample_rate(sample_rate);

        let count = self.band_count();
        for band in self.bands[..count].iter_mut().filter(|b| !b.is_identity()) {
            band.filter.process_block(left, right);
        }
    }

    fn reset(&mut self) {
        for band in &mut self.bands {
            band.filter.reset();
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        match self.layout {
            EqLayout::FiveBand => "5-Band Graphic EQ",
            EqLayout::TenBand => "10-Band Graphic EQ",
        }
    }
}
