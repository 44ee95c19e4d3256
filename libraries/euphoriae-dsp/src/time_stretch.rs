//! Streaming time stretcher (WSOLA)
//!
//! Changes tempo without changing pitch. Output is built by overlap-adding
//! Hann-windowed frames at a fixed synthesis hop of half a frame; input frames
//! are taken at `hop * tempo`, each nudged within a small search range to the
//! offset that best continues the previous frame's waveform, which keeps
//! periodic material phase-coherent across the splice.
//!
//! Buffers are sized once for the maximum sample rate and block size. Input is
//! pushed with [`TimeStretcher::write`] and stretched output pulled with
//! [`TimeStretcher::read`]; neither allocates.

use std::f32::consts::PI;

/// Frame length (ms)
pub const FRAME_MS: f32 = 20.0;

/// Similarity search range either side of the nominal position (ms)
pub const SEARCH_MS: f32 = 5.0;

/// Tempo range
pub const MIN_TEMPO: f32 = 0.5;
pub const MAX_TEMPO: f32 = 2.0;

/// Planar stereo WSOLA time stretcher
pub struct TimeStretcher {
    tempo: f32,
    sample_rate: u32,

    frame_len: usize,
    hop: usize,
    search: usize,
    window: Vec<f32>,

    input_l: Vec<f32>,
    input_r: Vec<f32>,
    input_len: usize,

    /// Nominal analysis position of the next frame (input buffer index)
    nominal: f64,
    /// Start of the last frame taken
    previous: Option<usize>,

    overlap_l: Vec<f32>,
    overlap_r: Vec<f32>,

    ready_l: Vec<f32>,
    ready_r: Vec<f32>,
    ready_start: usize,
    ready_end: usize,
}

impl TimeStretcher {
    /// Create a stretcher able to run at up to `max_sample_rate` and accept
    /// blocks of up to `max_block_frames`
    pub fn new(max_sample_rate: u32, max_block_frames: usize) -> Self {
        let max_frame = frame_len_for(max_sample_rate.max(8000));
        let max_search = search_len_for(max_sample_rate.max(8000));
        // Room for one full analysis span at the fastest tempo plus a block
        let input_capacity = 3 * max_frame + 2 * max_search + max_block_frames.max(1);

        let mut stretcher = Self {
            tempo: 1.0,
            sample_rate: 0,
            frame_len: 0,
            hop: 0,
            search: 0,
            window: vec![0.0; max_frame],
            input_l: vec![0.0; input_capacity],
            input_r: vec![0.0; input_capacity],
            input_len: 0,
            nominal: 0.0,
            previous: None,
            overlap_l: vec![0.0; max_frame],
            overlap_r: vec![0.0; max_frame],
            ready_l: vec![0.0; max_frame / 2 + 1],
            ready_r: vec![0.0; max_frame / 2 + 1],
            ready_start: 0,
            ready_end: 0,
        };
        stretcher.set_sample_rate(44100.min(max_sample_rate.max(8000)));
        stretcher
    }

    /// Tempo factor, clamped to [0.5, 2.0]; 2.0 plays twice as fast
    pub fn set_tempo(&mut self, tempo: f32) {
        if tempo.is_finite() {
            self.tempo = tempo.clamp(MIN_TEMPO, MAX_TEMPO);
        }
    }

    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Rebind to a sample rate; buffered audio is dropped
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate == self.sample_rate || sample_rate == 0 {
            return;
        }
        let max_frame = self.window.len();
        self.sample_rate = sample_rate;
        self.frame_len = frame_len_for(sample_rate).min(max_frame);
        self.hop = self.frame_len / 2;
        self.search = search_len_for(sample_rate);
        // Periodic Hann: overlapping at half a frame sums to exactly one
        let n = self.frame_len as f32;
        for (i, w) in self.window[..self.frame_len].iter_mut().enumerate() {
            *w = 0.5 - 0.5 * (2.0 * PI * i as f32 / n).cos();
        }
        self.reset();
    }

    /// Drop all buffered input and output
    pub fn reset(&mut self) {
        self.input_len = 0;
        self.nominal = 0.0;
        self.previous = None;
        self.overlap_l.fill(0.0);
        self.overlap_r.fill(0.0);
        self.ready_start = 0;
        self.ready_end = 0;
    }

    /// No audio is buffered on either side
    pub fn is_idle(&self) -> bool {
        self.input_len == 0 && self.previous.is_none() && self.ready_start == self.ready_end
    }

    /// Input frames that can be accepted right now
    pub fn free_frames(&self) -> usize {
        self.input_l.len() - self.input_len
    }

    /// Frames buffered on the input side
    pub fn buffered_frames(&self) -> usize {
        self.input_len
    }

    /// Push input frames; returns how many were accepted
    pub fn write(&mut self, left: &[f32], right: &[f32]) -> usize {
        self.compact();
        let count = left.len().min(right.len()).min(self.free_frames());
        let end = self.input_len + count;
        self.input_l[self.input_len..end].copy_from_slice(&left[..count]);
        self.input_r[self.input_len..end].copy_from_slice(&right[..count]);
        self.input_len = end;
        count
    }

    /// Pull stretched output; returns the number of frames written
    pub fn read(&mut self, left: &mut [f32], right: &mut [f32]) -> usize {
        let wanted = left.len().min(right.len());
        let mut written = 0;
        while written < wanted {
            if self.ready_start == self.ready_end {
                if !self.can_step() {
                    break;
                }
                self.step();
            }
            let count = (self.ready_end - self.ready_start).min(wanted - written);
            let range = self.ready_start..self.ready_start + count;
            left[written..written + count].copy_from_slice(&self.ready_l[range.clone()]);
            right[written..written + count].copy_from_slice(&self.ready_r[range]);
            self.ready_start += count;
            written += count;
        }
        written
    }

    fn can_step(&self) -> bool {
        let nominal = self.nominal.round() as usize;
        let frame_fits = nominal + self.search + self.frame_len <= self.input_len;
        let target_fits = self
            .previous
            .map_or(true, |prev| prev + self.hop + self.hop <= self.input_len);
        frame_fits && target_fits
    }

    /// Offset in the search range whose start best continues the previous frame
    fn best_start(&self, nominal: usize, previous: usize) -> usize {
        let target = previous + self.hop;
        let overlap = self.hop;
        let low = nominal.saturating_sub(self.search);
        let high = (nominal + self.search).min(self.input_len - self.frame_len);

        let mid = |i: usize| (self.input_l[i] + self.input_r[i]) * 0.5;
        let mut best = nominal.min(high);
        let mut best_score = f32::NEG_INFINITY;
        for start in low..=high {
            let mut correlation = 0.0;
            let mut energy = 1e-9;
            for k in 0..overlap {
                let candidate = mid(start + k);
                correlation += candidate * mid(target + k);
                energy += candidate * candidate;
            }
            let score = correlation / energy.sqrt();
            if score > best_score {
                best_score = score;
                best = start;
            }
        }
        best
    }

    fn step(&mut self) {
        let nominal = self.nominal.round() as usize;
        let start = match self.previous {
            Some(previous) => self.best_start(nominal, previous),
            None => nominal,
        };

        let n = self.frame_len;
        for i in 0..n {
            let w = self.window[i];
            self.overlap_l[i] += w * self.input_l[start + i];
            self.overlap_r[i] += w * self.input_r[start + i];
        }

        let hop = self.hop;
        self.ready_l[..hop].copy_from_slice(&self.overlap_l[..hop]);
        self.ready_r[..hop].copy_from_slice(&self.overlap_r[..hop]);
        self.ready_start = 0;
        self.ready_end = hop;

        self.overlap_l.copy_within(hop..n, 0);
        self.overlap_r.copy_within(hop..n, 0);
        self.overlap_l[n - hop..n].fill(0.0);
        self.overlap_r[n - hop..n].fill(0.0);

        self.nominal += hop as f64 * f64::from(self.tempo);
        self.previous = Some(start);
    }

    /// Drop input that no future frame or similarity target can reach
    fn compact(&mut self) {
        let Some(previous) = self.previous else {
            return;
        };
        let nominal = self.nominal.round() as usize;
        let keep_from = nominal
            .saturating_sub(self.search)
            .min(previous + self.hop)
            .min(self.input_len);
        if keep_from == 0 {
            return;
        }
        self.input_l.copy_within(keep_from..self.input_len, 0);
        self.input_r.copy_within(keep_from..self.input_len, 0);
        self.input_len -= keep_from;
        self.nominal -= keep_from as f64;
        self.previous = Some(previous - keep_from);
    }
}

fn frame_len_for(sample_rate: u32) -> usize {
    // Even, so the hop is exactly half a frame
    let frames = (FRAME_MS * sample_rate as f32 / 1000.0) as usize;
    (frames & !1).max(16)
}

fn search_len_for(sample_rate: u32) -> usize {
    (SEARCH_MS * sample_rate as f32 / 1000.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{generate_sine, rms, tone_magnitude};

    const SR: u32 = 48000;

    fn stretch(tempo: f32, input: &[f32]) -> Vec<f32> {
        let mut stretcher = TimeStretcher::new(SR, 1024);
        stretcher.set_sample_rate(SR);
        stretcher.set_tempo(tempo);

        let mut output = Vec::new();
        let mut out_l = vec![0.0; 1024];
        let mut out_r = vec![0.0; 1024];
        for block in input.chunks(512) {
            let mut offset = 0;
            while offset < block.len() {
                offset += stretcher.write(&block[offset..], &block[offset..]);
                loop {
                    let n = stretcher.read(&mut out_l, &mut out_r);
                    output.extend_from_slice(&out_l[..n]);
                    if n < out_l.len() {
                        break;
                    }
                }
            }
        }
        output
    }

    #[test]
    fn double_tempo_halves_length() {
        let input = generate_sine(440.0, SR, 2.0, 0.5);
        let output = stretch(2.0, &input);
        let expected = input.len() / 2;
        assert!(output.len().abs_diff(expected) < 4800, "{} vs {expected}", output.len());
    }

    #[test]
    fn half_tempo_doubles_length() {
        let input = generate_sine(440.0, SR, 1.0, 0.5);
        let output = stretch(0.5, &input);
        let expected = input.len() * 2;
        assert!(output.len().abs_diff(expected) < 4800, "{} vs {expected}", output.len());
    }

    #[test]
    fn pitch_is_preserved() {
        let input = generate_sine(440.0, SR, 2.0, 0.5);
        for tempo in [0.5, 1.5] {
            let output = stretch(tempo, &input);
            let body = &output[4800..output.len() - 4800];
            let at_source = tone_magnitude(body, 440.0, SR);
            let at_shifted = tone_magnitude(body, 440.0 * tempo, SR);
            assert!(at_source > 0.3, "tempo {tempo}: 440 Hz {at_source}");
            assert!(at_source > 3.0 * at_shifted);
        }
    }

    #[test]
    fn level_is_preserved() {
        let input = generate_sine(300.0, SR, 1.0, 0.5);
        let output = stretch(1.25, &input);
        let body = &output[4800..output.len() - 4800];
        assert!((rms(body) - rms(&input)).abs() < 0.05);
    }

    #[test]
    fn write_respects_capacity() {
        let mut stretcher = TimeStretcher::new(SR, 256);
        let big = vec![0.1; 100_000];
        let accepted = stretcher.write(&big, &big);
        assert_eq!(accepted, stretcher.buffered_frames());
        assert!(accepted < big.len());
        assert_eq!(stretcher.free_frames(), 0);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut stretcher = TimeStretcher::new(SR, 256);
        assert!(stretcher.is_idle());
        stretcher.write(&[0.1; 64], &[0.1; 64]);
        assert!(!stretcher.is_idle());
        stretcher.reset();
        assert!(stretcher.is_idle());
    }

    #[test]
    fn tempo_is_clamped() {
        let mut stretcher = TimeStretcher::new(SR, 256);
        stretcher.set_tempo(5.0);
        assert_eq!(stretcher.tempo(), MAX_TEMPO);
        stretcher.set_tempo(0.1);
        assert_eq!(stretcher.tempo(), MIN_TEMPO);
        stretcher.set_tempo(f32::NAN);
        assert_eq!(stretcher.tempo(), MIN_TEMPO);
    }
}
