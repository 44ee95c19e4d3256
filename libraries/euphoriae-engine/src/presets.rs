//! Named equalizer presets
//!
//! Levels are normalized band levels in [-1, 1] (+12 dB at 1.0). Each layout
//! has its own table; the 5-band table has no Vocal or R&B entry.

use std::fmt;

use euphoriae_dsp::effects::EqLayout;
use serde::{Deserialize, Serialize};

/// Label shown for any band configuration that is not a named preset
pub const CUSTOM_LABEL: &str = "Custom";

/// Preset every engine starts from
pub const FLAT: &str = "Flat";

/// Named vector of band levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub levels: &'static [f32],
}

const fn preset(name: &'static str, levels: &'static [f32]) -> Preset {
    Preset { name, levels }
}

pub const TEN_BAND_PRESETS: [Preset; 11] = [
    preset(FLAT, &[0.0; 10]),
    preset("Bass Boost", &[0.8, 0.7, 0.5, 0.3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
    preset("Treble Boost", &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.3, 0.5, 0.7, 0.8]),
    preset("Rock", &[0.6, 0.4, 0.2, -0.2, -0.3, 0.0, 0.3, 0.5, 0.6, 0.6]),
    preset("Pop", &[-0.2, 0.0, 0.2, 0.4, 0.5, 0.4, 0.2, 0.0, -0.1, -0.2]),
    preset("Jazz", &[0.4, 0.3, 0.1, -0.2, -0.3, -0.2, 0.1, 0.3, 0.4, 0.5]),
    preset("Classical", &[0.3, 0.2, 0.1, 0.0, -0.1, -0.1, 0.0, 0.2, 0.4, 0.5]),
    preset("Hip Hop", &[0.7, 0.6, 0.4, 0.1, 0.0, -0.1, 0.1, 0.2, 0.3, 0.3]),
    preset("Electronic", &[0.6, 0.5, 0.2, 0.0, -0.2, 0.0, 0.2, 0.5, 0.7, 0.8]),
    preset("Vocal", &[-0.3, -0.2, 0.0, 0.3, 0.5, 0.5, 0.3, 0.0, -0.2, -0.3]),
    preset("R&B", &[0.5, 0.4, 0.2, 0.1, 0.0, 0.2, 0.3, 0.2, 0.1, 0.0]),
];

pub const FIVE_BAND_PRESETS: [Preset; 9] = [
    preset(FLAT, &[0.0; 5]),
    preset("Bass Boost", &[0.8, 0.5, 0.0, 0.0, 0.0]),
    preset("Treble Boost", &[0.0, 0.0, 0.0, 0.5, 0.8]),
    preset("Rock", &[0.6, 0.3, -0.2, 0.4, 0.6]),
    preset("Pop", &[-0.2, 0.3, 0.5, 0.3, -0.2]),
    preset("Jazz", &[0.4, 0.2, -0.3, 0.2, 0.4]),
    preset("Classical", &[0.3, 0.1, 0.0, 0.2, 0.5]),
    preset("Hip Hop", &[0.7, 0.4, 0.0, 0.2, 0.4]),
    preset("Electronic", &[0.6, 0.2, 0.0, 0.3, 0.7]),
];

/// Preset table of a layout
pub fn presets(layout: EqLayout) -> &'static [Preset] {
    match layout {
        EqLayout::FiveBand => &FIVE_BAND_PRESETS,
        EqLayout::TenBand => &TEN_BAND_PRESETS,
    }
}

/// Look a preset up by name, ignoring case
pub fn find(layout: EqLayout, name: &str) -> Option<&'static Preset> {
    let name = name.trim();
    presets(layout)
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name))
}

/// What the band levels currently correspond to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetLabel {
    /// Levels were set by this preset and not edited since
    Named(String),
    /// Levels were edited by hand
    Custom,
}

impl PresetLabel {
    pub fn named(name: &str) -> Self {
        Self::Named(name.to_string())
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Custom => CUSTOM_LABEL,
        }
    }
}

impl Default for PresetLabel {
    fn default() -> Self {
        Self::named(FLAT)
    }
}

impl fmt::Display for PresetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
