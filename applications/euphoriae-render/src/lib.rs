//! Euphoriae Render
//!
//! Offline host for the effect engine: reads a WAV file, runs it through the
//! engine in fixed-size periods and writes the result.

pub mod config;
pub mod render;
pub mod wav;

pub use config::{OutputSettings, RenderConfig};
pub use render::{render, RenderOptions, RenderReport};
pub use wav::{read_wav, write_wav, WavAudio};
