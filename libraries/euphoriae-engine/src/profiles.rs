//! Effect profiles
//!
//! A profile is an EQ preset plus a few effect levels, applied together as
//! one composite write. Parameters a profile does not name keep their value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::ParamId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectProfile {
    Music,
    Movie,
    Game,
    Podcast,
    #[serde(rename = "hifi")]
    HiFi,
    /// Everything is set by hand; applying it changes nothing
    #[default]
    Custom,
}

impl EffectProfile {
    pub const ALL: [Self; 6] = [
        Self::Music,
        Self::Movie,
        Self::Game,
        Self::Podcast,
        Self::HiFi,
        Self::Custom,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Music => "Music",
            Self::Movie => "Movie",
            Self::Game => "Game",
            Self::Podcast => "Podcast",
            Self::HiFi => "Hi-Fi",
            Self::Custom => "Custom",
        }
    }

    /// Parse a display name or snake_case id, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|profile| {
            profile.name().eq_ignore_ascii_case(name)
                || (*profile == Self::HiFi && name.eq_ignore_ascii_case("hifi"))
        })
    }

    /// EQ preset the profile starts from
    pub fn preset(&self) -> Option<&'static str> {
        match self {
            Self::Music => Some("Pop"),
            Self::Movie | Self::Game | Self::HiFi => Some("Flat"),
            Self::Podcast => Some("Vocal"),
            Self::Custom => None,
        }
    }

    /// Effect levels written on top of the preset
    pub fn levels(&self) -> &'static [(ParamId, f32)] {
        match self {
            Self::Music => &[
                (ParamId::BassBoost, 0.3),
                (ParamId::Virtualizer, 0.4),
                (ParamId::Clarity, 0.3),
            ],
            Self::Movie => &[
                (ParamId::Surround3D, 0.6),
                (ParamId::RoomSize, 0.7),
                (ParamId::BassBoost, 0.5),
            ],
            Self::Game => &[
                (ParamId::Surround3D, 0.8),
                (ParamId::Clarity, 0.5),
                (ParamId::BassBoost, 0.6),
            ],
            Self::Podcast => &[
                (ParamId::Clarity, 0.7),
                (ParamId::VolumeLeveler, 0.6),
                (ParamId::Compressor, 0.4),
            ],
            Self::HiFi => &[(ParamId::TubeWarmth, 0.2), (ParamId::SpectrumExtension, 0.3)],
            Self::Custom => &[],
        }
    }
}

impl fmt::Display for EffectProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
