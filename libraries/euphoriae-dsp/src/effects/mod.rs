//! Audio effects processing
//!
//! Every module implements [`AudioEffect`] on planar stereo blocks of f32
//! samples in [-1.0, 1.0]. Modules expose plain setters and never allocate
//! while processing; the engine owns ordering, smoothing and fault handling.
//!
//! Available effects:
//! - **GraphicEq**: 5-band or 10-band graphic equalizer
//! - **BassBoost**, **Virtualizer**, **Enhancer** voicings (clarity, spectrum
//!   extension, tube warmth, treble boost)
//! - **Compressor**, **VolumeLeveler**, **Limiter**
//! - **StereoImage**, **Surround**, **HeadphoneCorrection**, **Crossfeed**
//! - **Reverb**, **PitchShifter**, **OutputGain**

mod bass_boost;
mod compressor;
mod crossfeed;
mod effect;
mod enhancer;
mod gain;
mod graphic_eq;
mod headphone;
mod leveler;
mod limiter;
mod pitch;
mod reverb;
mod stereo;
mod surround;
mod virtualizer;

pub use bass_boost::{BassBoost, BASS_BOOST_CORNER_HZ, BASS_BOOST_MAX_DB};
pub use compressor::{Compressor, CompressorCurve};
pub use crossfeed::Crossfeed;
pub use effect::AudioEffect;
pub use enhancer::{
    Enhancer, EnhancerVoicing, CLARITY, SPECTRUM_EXTENSION, TREBLE_BOOST, TUBE_WARMTH,
};
pub use gain::OutputGain;
pub use graphic_eq::{
    level_to_gain_db, EqLayout, GraphicEq, FIVE_BAND_FREQUENCIES, GAIN_EPSILON_DB, MAX_BANDS,
    MAX_GAIN_DB, TEN_BAND_FREQUENCIES,
};
pub use headphone::{CorrectionFilter, HeadphoneCorrection, HeadphoneProfile};
pub use leveler::{VolumeLeveler, DEFAULT_TARGET_DB, GATE_DB, MAX_CORRECTION_DB};
pub use limiter::{ceiling_for_strength, Limiter, DEFAULT_LOOKAHEAD_MS};
pub use pitch::{semitones_to_ratio, PitchShifter, MAX_SEMITONES};
pub use reverb::{Reverb, ReverbCharacter, ReverbPreset};
pub use stereo::{balance_gains, StereoImage, NEUTRAL_SEPARATION};
pub use surround::{tap_spread, Surround};
pub use virtualizer::Virtualizer;
