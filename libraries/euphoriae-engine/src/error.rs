//! Error types for the effect engine

use thiserror::Error;

/// Engine errors
///
/// None of these ever reach the audio thread: `AudioEngine::process` is
/// infallible and degrades to pass-through instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Session bindings are non-zero
    #[error("Invalid session binding: {0}")]
    InvalidSession(u64),

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested processing cannot run with this build or stream format
    #[error("Unsupported capability: {0}")]
    UnsupportedCapability(String),

    /// Settings snapshot could not be (de)serialized
    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// DSP error
    #[error("DSP error: {0}")]
    Dsp(#[from] euphoriae_dsp::DspError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
