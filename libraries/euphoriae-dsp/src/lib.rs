//! Euphoriae DSP
//!
//! Signal-processing building blocks for the Euphoriae effect engine.
//!
//! This crate provides:
//! - A planar audio buffer type with interleaved conversion
//! - Filter primitives (RBJ biquads, one-pole filters, delay lines, saturator)
//! - Every effect module of the engine's graph, each behind [`effects::AudioEffect`]
//! - A streaming WSOLA time stretcher
//!
//! Nothing here spawns threads or holds locks; the engine crate layers
//! parameter storage, smoothing and lifecycle on top.
//!
//! # Example
//!
//! ```rust
//! use euphoriae_dsp::effects::{AudioEffect, EqLayout, GraphicEq, Limiter};
//!
//! let mut eq = GraphicEq::new(EqLayout::TenBand);
//! eq.set_band_level(1, 0.5); // +6 dB at 62 Hz
//!
//! let mut limiter = Limiter::new(3.0, 48000);
//!
//! let mut left = vec![0.0_f32; 512];
//! let mut right = vec![0.0_f32; 512];
//! eq.process(&mut left, &mut right, 48000);
//! limiter.process(&mut left, &mut right, 48000);
//! ```

pub mod buffer;
pub mod effects;
mod error;
pub mod filters;
pub mod time_stretch;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use buffer::{AudioBuffer, MAX_CHANNELS, MIN_SAMPLE_RATE};
pub use error::{DspError, Result};
pub use time_stretch::TimeStretcher;
