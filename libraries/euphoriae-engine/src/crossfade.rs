//! Crossfade engine for transitions between two streams
//!
//! Provides several fade curves:
//! - Linear: simple linear fade (3 dB dip at the midpoint)
//! - SquareRoot: faster rise than linear
//! - S-Curve: slow start and end
//! - Equal Power: constant perceived loudness (default)
//!
//! The duration comes from the engine's crossfade parameter at the moment the
//! fade starts, so a ramped duration change never stretches a running fade.

use std::f32::consts::PI;

use euphoriae_dsp::AudioBuffer;
use serde::{Deserialize, Serialize};

/// Crossfade curve type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Linear fade
    ///
    /// Keeps the amplitude sum constant but not the power: the midpoint is
    /// 3 dB down.
    Linear,

    /// `t^0.5`: rises quickly then slows down
    SquareRoot,

    /// Slow start, fast middle, slow end
    SCurve,

    /// `sin²(x) + cos²(x) = 1`, constant power across the fade
    #[default]
    EqualPower,
}

impl FadeCurve {
    pub const ALL: [Self; 4] = [Self::Linear, Self::SquareRoot, Self::SCurve, Self::EqualPower];

    /// Gain at a normalized position in the fade
    ///
    /// # Arguments
    /// * `position` - Position in the fade (0.0 to 1.0)
    /// * `fade_out` - Gain of the outgoing stream instead of the incoming one
    #[inline]
    pub fn calculate_gain(&self, position: f32, fade_out: bool) -> f32 {
        let position = position.clamp(0.0, 1.0);
        let t = if fade_out { 1.0 - position } else { position };

        match self {
            FadeCurve::Linear => t,
            FadeCurve::SquareRoot => {
                if t <= 0.0 {
                    0.0
                } else {
                    t.sqrt()
                }
            }
            FadeCurve::SCurve => (1.0 - (PI * t).cos()) * 0.5,
            FadeCurve::EqualPower => (t * PI * 0.5).sin(),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "Linear",
            FadeCurve::SquareRoot => "Square Root",
            FadeCurve::SCurve => "S-Curve",
            FadeCurve::EqualPower => "Equal Power",
        }
    }
}

/// Crossfade state during a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossfadeState {
    /// No crossfade, the incoming stream passes through
    Inactive,

    /// Crossfade in progress
    Active,

    /// Crossfade finished, the outgoing stream can be dropped
    Completed,
}

/// Mixes an outgoing and an incoming stream
pub struct CrossfadeEngine {
    curve: FadeCurve,
    state: CrossfadeState,

    /// Position in the current fade (frames)
    position_frames: usize,

    /// Length of the current fade (frames)
    duration_frames: usize,

    sample_rate: u32,
}

impl CrossfadeEngine {
    pub fn new(curve: FadeCurve) -> Self {
        Self {
            curve,
            state: CrossfadeState::Inactive,
            position_frames: 0,
            duration_frames: 0,
            sample_rate: 44100,
        }
    }

    pub fn set_curve(&mut self, curve: FadeCurve) {
        self.curve = curve;
    }

    pub fn curve(&self) -> FadeCurve {
        self.curve
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate > 0 {
            self.sample_rate = sample_rate;
        }
    }

    pub fn state(&self) -> CrossfadeState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == CrossfadeState::Active
    }

    /// Start a fade of `duration_ms`
    ///
    /// A zero duration switches to the incoming stream on the next block.
    pub fn start(&mut self, duration_ms: f32) {
        let duration_ms = if duration_ms.is_finite() {
            duration_ms.max(0.0)
        } else {
            0.0
        };
        self.duration_frames = (duration_ms as f64 * self.sample_rate as f64 / 1000.0) as usize;
        self.position_frames = 0;
        self.state = CrossfadeState::Active;
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    pub fn reset(&mut self) {
        self.state = CrossfadeState::Inactive;
        self.position_frames = 0;
        self.duration_frames = 0;
    }

    /// Progress of the current fade (0.0 to 1.0)
    pub fn progress(&self) -> f32 {
        if self.duration_frames == 0 {
            return 1.0;
        }
        self.position_frames as f32 / self.duration_frames as f32
    }

    pub fn remaining_frames(&self) -> usize {
        self.duration_frames.saturating_sub(self.position_frames)
    }

    /// Mix one block
    ///
    /// Streams with fewer channels than `output` are spread over the missing
    /// channels. Frames past the end of the fade are taken from `incoming`.
    ///
    /// # Returns
    /// Frames written to `output`, and whether the fade completed
    pub fn process(
        &mut self,
        outgoing: &AudioBuffer,
        incoming: &AudioBuffer,
        output: &mut AudioBuffer,
    ) -> (usize, bool) {
        let frames = output.frames().min(incoming.frames());

        if self.state != CrossfadeState::Active {
            copy_spread(incoming, output, 0, frames);
            return (frames, false);
        }

        let fading = frames.min(outgoing.frames()).min(self.remaining_frames());
        for channel in 0..output.channel_count() {
            let from = source_channel(outgoing, channel);
            let to = source_channel(incoming, channel);
            let Some(out) = output.channel_mut(channel) else {
                continue;
            };
            for (i, sample) in out[..fading].iter_mut().enumerate() {
                let progress = (self.position_frames + i) as f32 / self.duration_frames as f32;
                let out_gain = self.curve.calculate_gain(progress, true);
                let in_gain = self.curve.calculate_gain(progress, false);
                *sample = from[i] * out_gain + to[i] * in_gain;
            }
        }
        copy_spread(incoming, output, fading, frames);

        self.position_frames += fading;
        let completed = self.position_frames >= self.duration_frames;
        if completed {
            self.state = CrossfadeState::Completed;
        }
        (frames, completed)
    }
}

impl Default for CrossfadeEngine {
    fn default() -> Self {
        Self::new(FadeCurve::default())
    }
}

fn source_channel(buffer: &AudioBuffer, channel: usize) -> &[f32] {
    let last = buffer.channel_count().saturating_sub(1);
    buffer.channel(channel.min(last)).unwrap_or(&[])
}

fn copy_spread(source: &AudioBuffer, output: &mut AudioBuffer, start: usize, end: usize) {
    if start >= end {
        return;
    }
    for channel in 0..output.channel_count() {
        let from = source_channel(source, channel);
        if let Some(out) = output.channel_mut(channel) {
            out[start..end].copy_from_slice(&from[start..end]);
        }
    }
}
