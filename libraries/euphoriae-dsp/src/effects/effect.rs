//! Common interface of every effect module
//!
//! All effects operate on planar stereo blocks of f32 samples in [-1.0, 1.0].
//! Mono sources are duplicated into both channels by the caller.

/// An in-place stereo effect
///
/// # Real-Time Constraints
/// - `process()` must not allocate, lock or perform I/O
/// - Execution time must be bounded by the block length
/// - Must be `Send` so the owning graph can move to the audio thread
pub trait AudioEffect: Send {
    /// Process one planar stereo block in place
    ///
    /// # Arguments
    /// * `left` - Left channel samples
    /// * `right` - Right channel samples (same length as `left`)
    /// * `sample_rate` - Sample rate in Hz
    fn process(&mut self, left: &mut [f32], right: &mut [f32], sample_rate: u32);

    /// Zero all recurrent state (filter memories, delay lines, envelopes)
    fn reset(&mut self);

    /// Enable/disable the effect
    fn set_enabled(&mut self, enabled: bool);

    /// Check if effect is enabled
    fn is_enabled(&self) -> bool;

    /// Get effect name (for debugging)
    fn name(&self) -> &str;
}
