//! Planar PCM buffer handed to the engine once per host callback

use crate::error::{DspError, Result};

/// Lowest sample rate any module is designed for
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Highest channel count the effect graph processes
pub const MAX_CHANNELS: usize = 2;

/// Planar floating-point audio, one `Vec` per channel
///
/// Samples are normalized to [-1.0, 1.0]. The frame count can shrink and grow
/// within the allocated capacity without reallocating, so a host can reuse
/// one buffer for every callback.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    frames: usize,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer
    pub fn new(channel_count: usize, frames: usize, sample_rate: u32) -> Self {
        Self {
            channels: vec![vec![0.0; frames]; channel_count],
            frames,
            sample_rate,
        }
    }

    /// Build from per-channel sample vectors (all must have the same length)
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        let frames = channels.first().map_or(0, Vec::len);
        if channels.iter().any(|ch| ch.len() != frames) {
            return Err(DspError::InvalidBuffer(
                "channels have different lengths".to_string(),
            ));
        }
        Ok(Self {
            channels,
            frames,
            sample_rate,
        })
    }

    /// De-interleave `L R L R ...` style samples
    pub fn from_interleaved(samples: &[f32], channel_count: usize, sample_rate: u32) -> Result<Self> {
        if channel_count == 0 || samples.len() % channel_count != 0 {
            return Err(DspError::InvalidBuffer(format!(
                "{} samples cannot be split into {} channels",
                samples.len(),
                channel_count
            )));
        }
        let frames = samples.len() / channel_count;
        let mut buffer = Self::new(channel_count, frames, sample_rate);
        for (frame, chunk) in samples.chunks_exact(channel_count).enumerate() {
            for (ch, &sample) in chunk.iter().enumerate() {
                buffer.channels[ch][frame] = sample;
            }
        }
        Ok(buffer)
    }

    /// Interleave into `out`, which must hold `frames * channel_count` samples
    pub fn write_interleaved(&self, out: &mut [f32]) -> Result<()> {
        let count = self.channels.len();
        if out.len() != self.frames * count {
            return Err(DspError::InvalidBuffer(format!(
                "expected {} interleaved samples, got {}",
                self.frames * count,
                out.len()
            )));
        }
        for (frame, chunk) in out.chunks_exact_mut(count.max(1)).enumerate() {
            for (ch, sample) in chunk.iter_mut().enumerate() {
                *sample = self.channels[ch][frame];
            }
        }
        Ok(())
    }

    /// Interleaved copy of the buffer contents
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.frames * self.channels.len()];
        // Length matches by construction
        let _ = self.write_interleaved(&mut out);
        out
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Frames that fit without reallocating
    pub fn capacity(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    /// Change the active frame count within the allocated capacity
    ///
    /// Returns the frame count actually set.
    pub fn set_frames(&mut self, frames: usize) -> usize {
        self.frames = frames.min(self.capacity());
        self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(|ch| &ch[..self.frames])
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [f32]> {
        let frames = self.frames;
        self.channels.get_mut(index).map(|ch| &mut ch[..frames])
    }

    /// Both channels of a stereo buffer, mutably
    pub fn stereo_mut(&mut self) -> Option<(&mut [f32], &mut [f32])> {
        if self.channels.len() != 2 {
            return None;
        }
        let frames = self.frames;
        let (left, right) = self.channels.split_at_mut(1);
        Some((&mut left[0][..frames], &mut right[0][..frames]))
    }

    /// Zero every active sample
    pub fn clear(&mut self) {
        let frames = self.frames;
        for ch in &mut self.channels {
            ch[..frames].fill(0.0);
        }
    }

    /// Copy samples and format from another buffer of the same shape
    pub fn copy_from(&mut self, other: &AudioBuffer) -> Result<()> {
        if other.channel_count() != self.channel_count() || other.frames > self.capacity() {
            return Err(DspError::InvalidBuffer(format!(
                "cannot copy {}x{} into {}x{}",
                other.channel_count(),
                other.frames,
                self.channel_count(),
                self.capacity()
            )));
        }
        self.frames = other.frames;
        self.sample_rate = other.sample_rate;
        for (dst, src) in self.channels.iter_mut().zip(&other.channels) {
            dst[..other.frames].copy_from_slice(&src[..other.frames]);
        }
        Ok(())
    }

    /// Largest absolute sample over all channels
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|ch| ch[..self.frames].iter())
            .fold(0.0_f32, |peak, s| peak.max(s.abs()))
    }

    /// Check channel count and sample rate against what the engine supports
    pub fn validate(&self, max_sample_rate: u32) -> Result<()> {
        let count = self.channels.len();
        if count == 0 || count > MAX_CHANNELS {
            return Err(DspError::UnsupportedChannelCount(count));
        }
        if self.sample_rate < MIN_SAMPLE_RATE || self.sample_rate > max_sample_rate {
            return Err(DspError::UnsupportedSampleRate(self.sample_rate));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleave_round_trip() {
        let samples = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buffer = AudioBuffer::from_interleaved(&samples, 2, 48000).unwrap();
        assert_eq!(buffer.frames(), 3);
        assert_eq!(buffer.channel(0).unwrap(), &[0.1, 0.2, 0.3]);
        assert_eq!(buffer.channel(1).unwrap(), &[-0.1, -0.2, -0.3]);
        assert_eq!(buffer.to_interleaved(), samples);
    }

    #[test]
    fn ragged_channels_are_rejected() {
        let result = AudioBuffer::from_channels(vec![vec![0.0; 4], vec![0.0; 3]], 48000);
        assert!(matches!(result, Err(DspError::InvalidBuffer(_))));
    }

    #[test]
    fn odd_interleaved_length_is_rejected() {
        assert!(AudioBuffer::from_interleaved(&[0.0; 5], 2, 48000).is_err());
        assert!(AudioBuffer::from_interleaved(&[0.0; 4], 0, 48000).is_err());
    }

    #[test]
    fn frames_stay_within_capacity() {
        let mut buffer = AudioBuffer::new(2, 64, 48000);
        assert_eq!(buffer.set_frames(16), 16);
        assert_eq!(buffer.channel(0).unwrap().len(), 16);
        assert_eq!(buffer.set_frames(1000), 64);
    }

    #[test]
    fn validation() {
        assert!(AudioBuffer::new(2, 8, 48000).validate(192000).is_ok());
        assert!(AudioBuffer::new(1, 8, 44100).validate(192000).is_ok());
        assert_eq!(
            AudioBuffer::new(6, 8, 48000).validate(192000),
            Err(DspError::UnsupportedChannelCount(6))
        );
        assert_eq!(
            AudioBuffer::new(2, 8, 384000).validate(192000),
            Err(DspError::UnsupportedSampleRate(384000))
        );
        assert_eq!(
            AudioBuffer::new(2, 8, 4000).validate(192000),
            Err(DspError::UnsupportedSampleRate(4000))
        );
    }

    #[test]
    fn stereo_split() {
        let mut buffer = AudioBuffer::new(2, 4, 48000);
        let (l, r) = buffer.stereo_mut().unwrap();
        l[0] = 1.0;
        r[0] = -1.0;
        assert_eq!(buffer.peak(), 1.0);
        assert!(AudioBuffer::new(1, 4, 48000).stereo_mut().is_none());
    }
}
