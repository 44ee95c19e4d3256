//! Render configuration
//!
//! Loaded from an optional TOML file, then overridden by `EUPHORIAE_`
//! environment variables with `__` between sections, e.g.
//! `EUPHORIAE_EFFECTS__BASS_BOOST=0.4` or `EUPHORIAE_ENGINE__RAMP_MS=15`.

use std::path::Path;

use anyhow::{Context, Result};
use euphoriae_engine::{EffectSettings, EngineConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default = "default_engine")]
    pub engine: EngineConfig,

    /// Effect settings applied before rendering
    #[serde(default)]
    pub effects: EffectSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Frames per synthetic callback
    #[serde(default = "default_period_frames")]
    pub period_frames: usize,

    /// Write 32-bit float instead of 16-bit integer samples
    #[serde(default)]
    pub float: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            period_frames: default_period_frames(),
            float: false,
        }
    }
}

impl RenderConfig {
    /// Load configuration from file (if given) and environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, "EUPHORIAE")
    }

    pub(crate) fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path).required(true));
        }

        settings = settings.add_source(
            config::Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .context("Failed to read render configuration")?
            .try_deserialize()
            .context("Invalid render configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate().context("Invalid [engine] section")?;
        if self.output.period_frames == 0 || self.output.period_frames > self.engine.max_block_frames {
            anyhow::bail!(
                "output.period_frames must be within 1..={}, got {}",
                self.engine.max_block_frames,
                self.output.period_frames
            );
        }
        Ok(())
    }
}

fn default_engine() -> EngineConfig {
    EngineConfig::default()
}

fn default_period_frames() -> usize {
    512
}

#[cfg(test)]
mod tests {
    use super::*;
    use euphoriae_engine::{BandLayout, EffectProfile, PresetLabel};
    use std::io::Write;

    const NO_ENV: &str = "EUPHORIAE_RENDER_UNIT_TEST_UNSET";

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = write_config("");
        let config = RenderConfig::load_with_prefix(Some(file.path()), NO_ENV).unwrap();
        assert_eq!(config, RenderConfig::default());
        assert_eq!(config.output.period_frames, 512);
    }

    #[test]
    fn toml_sections_are_read() {
        let file = write_config(
            r#"
[engine]
eq_layout = "five_band"
ramp_ms = 15.0

[effects]
bass_boost = 0.4
reverb_preset = 4
profile = "movie"
active_preset = { named = "Rock" }
eq_bands = [0.6, 0.3, -0.2, 0.4, 0.6]

[output]
period_frames = 256
float = true
"#,
        );
        let config = RenderConfig::load_with_prefix(Some(file.path()), NO_ENV).unwrap();
        assert_eq!(config.engine.eq_layout, BandLayout::FiveBand);
        assert_eq!(config.engine.ramp_ms, 15.0);
        assert_eq!(config.effects.bass_boost, 0.4);
        assert_eq!(config.effects.reverb_preset, 4);
        assert_eq!(config.effects.profile, EffectProfile::Movie);
        assert_eq!(config.effects.active_preset, PresetLabel::named("Rock"));
        assert_eq!(config.effects.eq_bands.len(), 5);
        assert_eq!(config.effects.room_size, 0.5);
        assert_eq!(config.output.period_frames, 256);
        assert!(config.output.float);
    }

    #[test]
    fn invalid_engine_section_is_rejected() {
        let file = write_config("[engine]\nramp_ms = 50.0\n");
        assert!(RenderConfig::load_with_prefix(Some(file.path()), NO_ENV).is_err());
    }

    #[test]
    fn oversized_period_is_rejected() {
        let file = write_config("[output]\nperiod_frames = 100000\n");
        assert!(RenderConfig::load_with_prefix(Some(file.path()), NO_ENV).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(RenderConfig::load_with_prefix(Some(&path), NO_ENV).is_err());
    }
}
