//! Parameter identifiers and their ranges
//!
//! Every user-facing control of the engine is one [`ParamId`]. Values are
//! stored as `f32` whatever their nature: switches are 0.0 / 1.0 and
//! selectors (headphone profile, reverb preset, EQ layout) are whole numbers.

use std::fmt;

use euphoriae_dsp::effects::MAX_BANDS;

/// How a parameter reaches the audio thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Ramped over the smoothing window
    Continuous,
    /// Switched immediately; the affected state is reset first
    Structural,
    /// Read by the engine but not by any graph stage
    Setting,
}

/// Range and metadata of one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub kind: ParamKind,
    /// What the normalized value means
    pub unit: &'static str,
}

impl ParamSpec {
    const fn new(
        name: &'static str,
        min: f32,
        max: f32,
        default: f32,
        kind: ParamKind,
        unit: &'static str,
    ) -> Self {
        Self {
            name,
            min,
            max,
            default,
            kind,
            unit,
        }
    }

    const fn strength(name: &'static str) -> Self {
        Self::new(name, 0.0, 1.0, 0.0, ParamKind::Continuous, "0..1")
    }

    /// Clamp a value into range, rounding selectors and switches
    ///
    /// Returns `None` for NaN.
    pub fn clamp(&self, value: f32) -> Option<f32> {
        if value.is_nan() {
            return None;
        }
        let value = value.clamp(self.min, self.max);
        Some(match self.kind {
            ParamKind::Structural => value.round(),
            _ => value,
        })
    }
}

/// Number of parameters
pub const PARAM_COUNT: usize = 34;

/// Every engine parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamId {
    EqBand0,
    EqBand1,
    EqBand2,
    EqBand3,
    EqBand4,
    EqBand5,
    EqBand6,
    EqBand7,
    EqBand8,
    EqBand9,
    BassBoost,
    Virtualizer,
    Clarity,
    SpectrumExtension,
    TubeWarmth,
    TrebleBoost,
    Compressor,
    VolumeLeveler,
    Limiter,
    StereoBalance,
    ChannelSeparation,
    SurroundLevel,
    RoomSize,
    Surround3D,
    HeadphoneType,
    HeadphoneSurround,
    ReverbPreset,
    ReverbWetness,
    Tempo,
    Pitch,
    CrossfadeMs,
    Volume,
    Enabled,
    EqLayout,
}

impl ParamId {
    pub const ALL: [Self; PARAM_COUNT] = [
        Self::EqBand0,
        Self::EqBand1,
        Self::EqBand2,
        Self::EqBand3,
        Self::EqBand4,
        Self::EqBand5,
        Self::EqBand6,
        Self::EqBand7,
        Self::EqBand8,
        Self::EqBand9,
        Self::BassBoost,
        Self::Virtualizer,
        Self::Clarity,
        Self::SpectrumExtension,
        Self::TubeWarmth,
        Self::TrebleBoost,
        Self::Compressor,
        Self::VolumeLeveler,
        Self::Limiter,
        Self::StereoBalance,
        Self::ChannelSeparation,
        Self::SurroundLevel,
        Self::RoomSize,
        Self::Surround3D,
        Self::HeadphoneType,
        Self::HeadphoneSurround,
        Self::ReverbPreset,
        Self::ReverbWetness,
        Self::Tempo,
        Self::Pitch,
        Self::CrossfadeMs,
        Self::Volume,
        Self::Enabled,
        Self::EqLayout,
    ];

    pub const EQ_BANDS: [Self; MAX_BANDS] = [
        Self::EqBand0,
        Self::EqBand1,
        Self::EqBand2,
        Self::EqBand3,
        Self::EqBand4,
        Self::EqBand5,
        Self::EqBand6,
        Self::EqBand7,
        Self::EqBand8,
        Self::EqBand9,
    ];

    /// Position in [`ParamId::ALL`] and in every per-parameter array
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parameter of an EQ band, `None` past the last band
    pub fn eq_band(band: usize) -> Option<Self> {
        Self::EQ_BANDS.get(band).copied()
    }

    /// Band index for EQ band parameters
    pub fn band_index(self) -> Option<usize> {
        Self::EQ_BANDS.iter().position(|&id| id == self)
    }

    pub fn spec(self) -> ParamSpec {
        use ParamKind::{Continuous, Setting, Structural};

        match self {
            Self::EqBand0
            | Self::EqBand1
            | Self::EqBand2
            | Self::EqBand3
            | Self::EqBand4
            | Self::EqBand5
            | Self::EqBand6
            | Self::EqBand7
            | Self::EqBand8
            | Self::EqBand9 => ParamSpec::new("eq_band", -1.0, 1.0, 0.0, Continuous, "±12 dB"),
            Self::BassBoost => ParamSpec::strength("bass_boost"),
            Self::Virtualizer => ParamSpec::strength("virtualizer"),
            Self::Clarity => ParamSpec::strength("clarity"),
            Self::SpectrumExtension => ParamSpec::strength("spectrum_extension"),
            Self::TubeWarmth => ParamSpec::strength("tube_warmth"),
            Self::TrebleBoost => ParamSpec::strength("treble_boost"),
            Self::Compressor => ParamSpec::strength("compressor"),
            Self::VolumeLeveler => ParamSpec::strength("volume_leveler"),
            Self::Limiter => ParamSpec::new("limiter", 0.0, 1.0, 0.0, Continuous, "ceiling 0.99 - 0.49x"),
            Self::StereoBalance => ParamSpec::new("stereo_balance", -1.0, 1.0, 0.0, Continuous, "left..right"),
            Self::ChannelSeparation => {
                ParamSpec::new("channel_separation", 0.0, 1.0, 0.5, Continuous, "width 2x")
            }
            Self::SurroundLevel => ParamSpec::strength("surround_level"),
            Self::RoomSize => ParamSpec::new("room_size", 0.0, 1.0, 0.5, Continuous, "0..1"),
            Self::Surround3D => ParamSpec::strength("surround_3d"),
            Self::HeadphoneType => ParamSpec::new("headphone_type", 0.0, 4.0, 0.0, Structural, "profile id"),
            Self::HeadphoneSurround => {
                ParamSpec::new("headphone_surround", 0.0, 1.0, 0.0, Structural, "switch")
            }
            Self::ReverbPreset => ParamSpec::new("reverb_preset", 0.0, 6.0, 0.0, Structural, "preset id"),
            Self::ReverbWetness => ParamSpec::strength("reverb_wetness"),
            Self::Tempo => ParamSpec::new("tempo", 0.5, 2.0, 1.0, Setting, "x"),
            Self::Pitch => ParamSpec::new("pitch", -12.0, 12.0, 0.0, Continuous, "semitones"),
            Self::CrossfadeMs => ParamSpec::new("crossfade_ms", 0.0, 12000.0, 0.0, Continuous, "ms"),
            Self::Volume => ParamSpec::new("volume", 0.0, 1.0, 1.0, Continuous, "linear"),
            Self::Enabled => ParamSpec::new("enabled", 0.0, 1.0, 1.0, Structural, "switch"),
            Self::EqLayout => ParamSpec::new("eq_layout", 0.0, 1.0, 1.0, Structural, "0 = 5 band, 1 = 10 band"),
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.band_index() {
            Some(band) => write!(f, "eq_band[{band}]"),
            None => f.write_str(self.name()),
        }
    }
}

/// Defaults of every parameter, indexed by [`ParamId::index`]
pub fn default_values() -> [f32; PARAM_COUNT] {
    let mut values = [0.0; PARAM_COUNT];
    for id in ParamId::ALL {
        values[id.index()] = id.spec().default;
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_in_index_order() {
        for (position, id) in ParamId::ALL.iter().enumerate() {
            assert_eq!(id.index(), position);
        }
        assert_eq!(ParamId::EqLayout.index(), PARAM_COUNT - 1);
    }

    #[test]
    fn defaults_are_in_range() {
        for id in ParamId::ALL {
            let spec = id.spec();
            assert!(spec.min <= spec.default && spec.default <= spec.max, "{id}");
        }
    }

    #[test]
    fn clamp_rounds_selectors() {
        let spec = ParamId::ReverbPreset.spec();
        assert_eq!(spec.clamp(2.4), Some(2.0));
        assert_eq!(spec.clamp(99.0), Some(6.0));
        assert_eq!(spec.clamp(f32::NAN), None);

        let spec = ParamId::Pitch.spec();
        assert_eq!(spec.clamp(3.5), Some(3.5));
        assert_eq!(spec.clamp(f32::INFINITY), Some(12.0));
    }

    #[test]
    fn eq_band_lookup() {
        assert_eq!(ParamId::eq_band(5), Some(ParamId::EqBand5));
        assert_eq!(ParamId::eq_band(10), None);
        assert_eq!(ParamId::EqBand7.band_index(), Some(7));
        assert_eq!(ParamId::Limiter.band_index(), None);
        assert_eq!(ParamId::EqBand3.to_string(), "eq_band[3]");
        assert_eq!(ParamId::Surround3D.to_string(), "surround_3d");
    }
}
