/// DSP-level errors
use thiserror::Error;

/// Result type alias using `DspError`
pub type Result<T> = std::result::Result<T, DspError>;

/// DSP error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DspError {
    /// Buffer shape is inconsistent (ragged channels, wrong interleaved length)
    #[error("Invalid audio buffer: {0}")]
    InvalidBuffer(String),

    /// Only mono and stereo are processed
    #[error("Unsupported channel count: {0}")]
    UnsupportedChannelCount(usize),

    /// Sample rate outside the range the delay lines were sized for
    #[error("Unsupported sample rate: {0} Hz")]
    UnsupportedSampleRate(u32),
}
