//! Euphoriae Engine
//!
//! Real-time audio effect engine built on `euphoriae-dsp`.
//!
//! This crate provides:
//! - A lock-free parameter store shared by the control and audio threads
//! - Click-free parameter smoothing with a fixed ramp time
//! - The ordered effect graph with per-stage bypass and fault isolation
//! - Session lifecycle (`create`/`destroy`) and the control-side setters
//! - EQ presets, effect profiles and a serializable settings snapshot
//! - A crossfade engine and a synthetic callback driver for tests and renders
//!
//! # Example
//!
//! ```rust
//! use euphoriae_dsp::AudioBuffer;
//! use euphoriae_engine::{AudioEngine, EngineConfig};
//!
//! let (mut engine, handle) = AudioEngine::new(EngineConfig::default())?;
//! handle.create(1)?;
//! handle.apply_preset("Rock");
//! handle.set_bass_boost(0.4);
//!
//! // On the audio thread, once per host buffer
//! engine.prepare(48000);
//! let mut buffer = AudioBuffer::new(2, 256, 48000);
//! engine.process(&mut buffer);
//! # Ok::<(), euphoriae_engine::EngineError>(())
//! ```

pub mod config;
pub mod crossfade;
pub mod driver;
mod engine;
mod error;
pub mod graph;
pub mod params;
pub mod presets;
pub mod profiles;
pub mod settings;
pub mod smoothing;
pub mod store;

pub use config::{BandLayout, EngineConfig};
pub use crossfade::{CrossfadeEngine, CrossfadeState, FadeCurve};
pub use driver::{AudioCallback, DriverHandle, StreamConfig, SyntheticDriver};
pub use engine::{AudioEngine, EngineHandle, StretchProgress};
pub use error::{EngineError, Result};
pub use graph::{Faults, Stage};
pub use params::ParamId;
pub use presets::PresetLabel;
pub use profiles::EffectProfile;
pub use settings::EffectSettings;
