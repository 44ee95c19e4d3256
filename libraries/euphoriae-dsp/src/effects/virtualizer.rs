//! Virtualizer
//!
//! Widens the perceived stereo image. Each output channel receives a delayed,
//! low-passed, polarity-inverted copy of the opposite channel (a crude
//! crosstalk canceller), then the side signal is lifted. Strength scales the
//! cross-feed coefficient, the inter-channel delay and the side gain.

use super::effect::AudioEffect;
use crate::filters::{DelayLine, OnePoleLowPass};

/// Longest inter-channel delay used at full strength (ms)
const MAX_DELAY_MS: f32 = 0.6;

/// Delay used as strength approaches zero (ms)
const MIN_DELAY_MS: f32 = 0.2;

/// Cross-feed low-pass corner (Hz)
const CROSSFEED_CUTOFF_HZ: f32 = 2500.0;

/// Stereo widening virtualizer
pub struct Virtualizer {
    strength: f32,
    delay_l: DelayLine,
    delay_r: DelayLine,
    lpf_l: OnePoleLowPass,
    lpf_r: OnePoleLowPass,
    crossfeed: f32,
    delay_samples: f32,
    side_gain: f32,
    compensation: f32,
    enabled: bool,
    sample_rate: u32,
    needs_update: bool,
}

impl Virtualizer {
    /// Create a virtualizer able to run at up to `max_sample_rate`
    pub fn new(max_sample_rate: u32) -> Self {
        let capacity = DelayLine::capacity_for(MAX_DELAY_MS, max_sample_rate);
        Self {
            strength: 0.0,
            delay_l: DelayLine::new(capacity),
            delay_r: DelayLine::new(capacity),
            lpf_l: OnePoleLowPass::new(CROSSFEED_CUTOFF_HZ, 44100),
            lpf_r: OnePoleLowPass::new(CROSSFEED_CUTOFF_HZ, 44100),
            crossfeed: 0.0,
            delay_samples: 0.0,
            side_gain: 1.0,
            compensation: 1.0,
            enabled: true,
            sample_rate: 44100,
            needs_update: true,
        }
    }

    /// Set strength in [0, 1]
    pub fn set_strength(&mut self, strength: f32) {
        let strength = strength.clamp(0.0, 1.0);
        if strength != self.strength {
            self.strength = strength;
            self.needs_update = true;
        }
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    fn update_parameters(&mut self) {
        if !self.needs_update {
            return;
        }
        let s = self.strength;
        self.crossfeed = 0.4 * s;
        let delay_ms = MIN_DELAY_MS + (MAX_DELAY_MS - MIN_DELAY_MS) * s;
        self.delay_samples = delay_ms * self.sample_rate as f32 / 1000.0;
        self.side_gain = 1.0 + 0.6 * s;
        self.compensation = 1.0 / (1.0 + 0.3 * s);
        self.lpf_l.set_cutoff(CROSSFEED_CUTOFF_HZ, self.sample_rate);
        self.lpf_r.set_cutoff(CROSSFEED_CUTOFF_HZ, self.sample_rate);
        self.needs_update = false;
    }
}

impl AudioEffect for Virtualizer {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], sample_rate: u32) {
        if !self.enabled || self.strength <= 0.0 {
            return;
        }
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.needs_update = true;
        }
        self.update_parameters();

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            self.delay_l.write(*l);
            self.delay_r.write(*r);

            let from_right = self.lpf_r.process(self.delay_r.read_fractional(self.delay_samples));
            let from_left = self.lpf_l.process(self.delay_l.read_fractional(self.delay_samples));

            let new_l = *l - self.crossfeed * from_right;
            let new_r = *r - self.crossfeed * from_left;

            let mid = (new_l + new_r) * 0.5;
            let side = (new_l - new_r) * 0.5 * self.side_gain;

            *l = (mid + side) * self.compensation;
            *r = (mid - side) * self.compensation;
        }
    }

    fn reset(&mut self) {
        self.delay_l.clear();
        self.delay_r.clear();
        self.lpf_l.reset();
        self.lpf_r.reset();
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Virtualizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{generate_sine, rms};

    fn side_to_mid(left: &[f32], right: &[f32]) -> f32 {
        let mid: Vec<f32> = left.iter().zip(right).map(|(l, r)| (l + r) * 0.5).collect();
        let side: Vec<f32> = left.iter().zip(right).map(|(l, r)| (l - r) * 0.5).collect();
        rms(&side) / rms(&mid)
    }

    #[test]
    fn zero_strength_is_transparent() {
        let mut virt = Virtualizer::new(48000);
        let mut left = vec![0.1, 0.2, 0.3];
        let mut right = vec![0.3, 0.2, 0.1];
        virt.process(&mut left, &mut right, 48000);
        assert_eq!(left, vec![0.1, 0.2, 0.3]);
        assert_eq!(right, vec![0.3, 0.2, 0.1]);
    }

    #[test]
    fn widens_stereo_image() {
        let left_in = generate_sine(440.0, 48000, 0.25, 0.3);
        let right_in = generate_sine(660.0, 48000, 0.25, 0.3);
        let before = side_to_mid(&left_in, &right_in);

        let mut virt = Virtualizer::new(48000);
        virt.set_strength(1.0);
        let (mut left, mut right) = (left_in.clone(), right_in.clone());
        virt.process(&mut left, &mut right, 48000);

        let after = side_to_mid(&left[2400..], &right[2400..]);
        assert!(after > before, "side/mid {before} -> {after}");
        assert!(left.iter().chain(&right).all(|s| s.is_finite() && s.abs() < 1.0));
    }
}
