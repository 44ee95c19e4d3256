//! Engine configuration

use crate::error::{EngineError, Result};
use crate::smoothing::{DEFAULT_RAMP_MS, MAX_RAMP_MS, MIN_RAMP_MS};
use euphoriae_dsp::effects::{EqLayout, DEFAULT_LOOKAHEAD_MS, DEFAULT_TARGET_DB};
use euphoriae_dsp::MIN_SAMPLE_RATE;
use serde::{Deserialize, Serialize};

/// Largest buffer sub-block the graph processes at once
pub const MAX_BLOCK_FRAMES_LIMIT: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Band layout the engine starts with
    #[serde(default)]
    pub eq_layout: BandLayout,

    /// Duration of parameter ramps
    #[serde(default = "default_ramp_ms")]
    pub ramp_ms: f32,

    /// Highest stream sample rate; sizes every delay line
    #[serde(default = "default_max_sample_rate")]
    pub max_sample_rate: u32,

    /// Scratch size; longer host buffers are processed in pieces
    #[serde(default = "default_max_block_frames")]
    pub max_block_frames: usize,

    #[serde(default = "default_limiter_lookahead_ms")]
    pub limiter_lookahead_ms: f32,

    /// Loudness the volume leveler steers toward (dBFS)
    #[serde(default = "default_leveler_target_db")]
    pub leveler_target_db: f32,
}

/// Serializable EQ layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandLayout {
    FiveBand,
    #[default]
    TenBand,
}

impl From<BandLayout> for EqLayout {
    fn from(layout: BandLayout) -> Self {
        match layout {
            BandLayout::FiveBand => EqLayout::FiveBand,
            BandLayout::TenBand => EqLayout::TenBand,
        }
    }
}

impl From<EqLayout> for BandLayout {
    fn from(layout: EqLayout) -> Self {
        match layout {
            EqLayout::FiveBand => BandLayout::FiveBand,
            EqLayout::TenBand => BandLayout::TenBand,
        }
    }
}

impl EngineConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RAMP_MS..=MAX_RAMP_MS).contains(&self.ramp_ms) {
            return Err(EngineError::InvalidConfig(format!(
                "ramp_ms must be within {MIN_RAMP_MS}..={MAX_RAMP_MS}, got {}",
                self.ramp_ms
            )));
        }

        if self.max_sample_rate < MIN_SAMPLE_RATE || self.max_sample_rate > 768_000 {
            return Err(EngineError::InvalidConfig(format!(
                "max_sample_rate must be within {MIN_SAMPLE_RATE}..=768000, got {}",
                self.max_sample_rate
            )));
        }

        if self.max_block_frames == 0 || self.max_block_frames > MAX_BLOCK_FRAMES_LIMIT {
            return Err(EngineError::InvalidConfig(format!(
                "max_block_frames must be within 1..={MAX_BLOCK_FRAMES_LIMIT}, got {}",
                self.max_block_frames
            )));
        }

        if !(0.1..=20.0).contains(&self.limiter_lookahead_ms) {
            return Err(EngineError::InvalidConfig(format!(
                "limiter_lookahead_ms must be within 0.1..=20, got {}",
                self.limiter_lookahead_ms
            )));
        }

        if !(-40.0..=0.0).contains(&self.leveler_target_db) {
            return Err(EngineError::InvalidConfig(format!(
                "leveler_target_db must be within -40..=0, got {}",
                self.leveler_target_db
            )));
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            eq_layout: BandLayout::default(),
            ramp_ms: default_ramp_ms(),
            max_sample_rate: default_max_sample_rate(),
            max_block_frames: default_max_block_frames(),
            limiter_lookahead_ms: default_limiter_lookahead_ms(),
            leveler_target_db: default_leveler_target_db(),
        }
    }
}

// Default values
fn default_ramp_ms() -> f32 {
    DEFAULT_RAMP_MS
}

fn default_max_sample_rate() -> u32 {
    192_000
}

fn default_max_block_frames() -> usize {
    4096
}

fn default_limiter_lookahead_ms() -> f32 {
    DEFAULT_LOOKAHEAD_MS
}

fn default_leveler_target_db() -> f32 {
    DEFAULT_TARGET_DB
}
