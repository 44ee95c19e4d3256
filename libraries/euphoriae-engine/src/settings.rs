//! Serializable snapshot of every user-facing setting
//!
//! This is what an external persistence layer stores between sessions.
//! Missing fields take their defaults, so older snapshots keep loading.

use euphoriae_dsp::effects::{EqLayout, MAX_BANDS};
use serde::{Deserialize, Serialize};

use crate::config::BandLayout;
use crate::error::Result;
use crate::params::ParamId;
use crate::presets::PresetLabel;
use crate::profiles::EffectProfile;
use crate::store::ParamSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    pub enabled: bool,
    pub volume: f32,

    pub eq_layout: BandLayout,
    /// Normalized level per band of the layout
    pub eq_bands: Vec<f32>,
    pub active_preset: PresetLabel,
    pub profile: EffectProfile,

    pub bass_boost: f32,
    pub virtualizer: f32,
    pub clarity: f32,
    pub spectrum_extension: f32,
    pub tube_warmth: f32,
    pub treble_boost: f32,

    pub compressor: f32,
    pub volume_leveler: f32,
    pub limiter: f32,

    pub stereo_balance: f32,
    pub channel_separation: f32,
    pub surround_level: f32,
    pub room_size: f32,
    pub surround_3d: f32,
    pub headphone_type: u32,
    pub headphone_surround: bool,

    pub reverb_preset: u32,
    pub reverb_wetness: f32,

    pub tempo: f32,
    pub pitch: f32,
    pub crossfade_ms: u32,
}

impl EffectSettings {
    /// Read every setting out of a parameter snapshot
    pub fn from_snapshot(
        snapshot: &ParamSnapshot,
        active_preset: PresetLabel,
        profile: EffectProfile,
    ) -> Self {
        let layout = EqLayout::from_id(snapshot.get(ParamId::EqLayout) as u32);
        let eq_bands = ParamId::EQ_BANDS[..layout.count()]
            .iter()
            .map(|&id| snapshot.get(id))
            .collect();

        Self {
            enabled: snapshot.flag(ParamId::Enabled),
            volume: snapshot.get(ParamId::Volume),
            eq_layout: layout.into(),
            eq_bands,
            active_preset,
            profile,
            bass_boost: snapshot.get(ParamId::BassBoost),
            virtualizer: snapshot.get(ParamId::Virtualizer),
            clarity: snapshot.get(ParamId::Clarity),
            spectrum_extension: snapshot.get(ParamId::SpectrumExtension),
            tube_warmth: snapshot.get(ParamId::TubeWarmth),
            treble_boost: snapshot.get(ParamId::TrebleBoost),
            compressor: snapshot.get(ParamId::Compressor),
            volume_leveler: snapshot.get(ParamId::VolumeLeveler),
            limiter: snapshot.get(ParamId::Limiter),
            stereo_balance: snapshot.get(ParamId::StereoBalance),
            channel_separation: snapshot.get(ParamId::ChannelSeparation),
            surround_level: snapshot.get(ParamId::SurroundLevel),
            room_size: snapshot.get(ParamId::RoomSize),
            surround_3d: snapshot.get(ParamId::Surround3D),
            headphone_type: snapshot.get(ParamId::HeadphoneType) as u32,
            headphone_surround: snapshot.flag(ParamId::HeadphoneSurround),
            reverb_preset: snapshot.get(ParamId::ReverbPreset) as u32,
            reverb_wetness: snapshot.get(ParamId::ReverbWetness),
            tempo: snapshot.get(ParamId::Tempo),
            pitch: snapshot.get(ParamId::Pitch),
            crossfade_ms: snapshot.get(ParamId::CrossfadeMs) as u32,
        }
    }

    /// Every parameter write this snapshot stands for
    ///
    /// Bands missing from `eq_bands` are written as flat.
    pub fn to_writes(&self) -> Vec<(ParamId, f32)> {
        let flag = |on: bool| if on { 1.0 } else { 0.0 };
        let mut writes = vec![
            (ParamId::Enabled, flag(self.enabled)),
            (ParamId::Volume, self.volume),
            (ParamId::EqLayout, EqLayout::from(self.eq_layout).id() as f32),
            (ParamId::BassBoost, self.bass_boost),
            (ParamId::Virtualizer, self.virtualizer),
            (ParamId::Clarity, self.clarity),
            (ParamId::SpectrumExtension, self.spectrum_extension),
            (ParamId::TubeWarmth, self.tube_warmth),
            (ParamId::TrebleBoost, self.treble_boost),
            (ParamId::Compressor, self.compressor),
            (ParamId::VolumeLeveler, self.volume_leveler),
            (ParamId::Limiter, self.limiter),
            (ParamId::StereoBalance, self.stereo_balance),
            (ParamId::ChannelSeparation, self.channel_separation),
            (ParamId::SurroundLevel, self.surround_level),
            (ParamId::RoomSize, self.room_size),
            (ParamId::Surround3D, self.surround_3d),
            (ParamId::HeadphoneType, self.headphone_type as f32),
            (ParamId::HeadphoneSurround, flag(self.headphone_surround)),
            (ParamId::ReverbPreset, self.reverb_preset as f32),
            (ParamId::ReverbWetness, self.reverb_wetness),
            (ParamId::Tempo, self.tempo),
            (ParamId::Pitch, self.pitch),
            (ParamId::CrossfadeMs, self.crossfade_ms as f32),
        ];
        for band in 0..MAX_BANDS {
            let level = self.eq_bands.get(band).copied().unwrap_or(0.0);
            writes.push((ParamId::EQ_BANDS[band], level));
        }
        writes
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self::from_snapshot(
            &ParamSnapshot::defaults(),
            PresetLabel::default(),
            EffectProfile::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_parameter_defaults() {
        let settings = EffectSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.volume, 1.0);
        assert_eq!(settings.eq_bands, vec![0.0; 10]);
        assert_eq!(settings.channel_separation, 0.5);
        assert_eq!(settings.tempo, 1.0);
        assert_eq!(settings.active_preset, PresetLabel::named("Flat"));
    }

    #[test]
    fn writes_rebuild_the_snapshot() {
        let mut snapshot = ParamSnapshot::defaults();
        snapshot.set(ParamId::EqBand2, 0.4);
        snapshot.set(ParamId::ReverbPreset, 5.0);
        snapshot.set(ParamId::HeadphoneSurround, 1.0);
        snapshot.set(ParamId::CrossfadeMs, 3000.0);

        let settings = EffectSettings::from_snapshot(&snapshot, PresetLabel::Custom, EffectProfile::Custom);
        let mut rebuilt = ParamSnapshot::defaults();
        for (id, value) in settings.to_writes() {
            rebuilt.set(id, value);
        }
        assert_eq!(rebuilt, snapshot);
    }

    #[test]
    fn partial_json_takes_defaults() {
        let settings = EffectSettings::from_json(r#"{ "bass_boost": 0.7, "profile": "movie" }"#).unwrap();
        assert_eq!(settings.bass_boost, 0.7);
        assert_eq!(settings.profile, EffectProfile::Movie);
        assert_eq!(settings.room_size, 0.5);
        assert!(settings.enabled);
    }

    #[test]
    fn json_keeps_every_field() {
        let mut settings = EffectSettings::default();
        settings.active_preset = PresetLabel::named("Rock");
        settings.reverb_preset = 2;
        let json = settings.to_json().unwrap();
        assert!(json.contains("\"reverb_preset\": 2"));
        assert_eq!(EffectSettings::from_json(&json).unwrap(), settings);
    }
}
