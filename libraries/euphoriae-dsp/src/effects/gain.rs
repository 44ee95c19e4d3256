//! Output volume
use super::effect::AudioEffect;

/// Linear gain, interpolated per sample from the previous block's gain
pub struct OutputGain {
    target: f32,
    current: f32,
    enabled: bool,
}

impl OutputGain {
    pub fn new(gain: f32) -> Self {
        let gain = gain.clamp(0.0, 1.0);
        Self {
            target: gain,
            current: gain,
            enabled: true,
        }
    }

    /// Set gain in [0, 1]; takes effect over the next block
    pub fn set_gain(&mut self, gain: f32) {
        self.target = gain.clamp(0.0, 1.0);
    }

    pub fn gain(&self) -> f32 {
        self.target
    }

    /// Jump to the target without interpolating
    pub fn snap(&mut self) {
        self.current = self.target;
    }
}

impl Default for OutputGain {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl AudioEffect for OutputGain {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], _sample_rate: u32) {
        if !self.enabled || left.is_empty() {
            return;
        }
        if self.current == self.target {
            if self.target != 1.0 {
                let gain = self.target;
                left.iter_mut().chain(right.iter_mut()).for_each(|s| *s *= gain);
            }
            return;
        }

        let step = (self.target - self.current) / left.len() as f32;
        let mut gain = self.current;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            gain += step;
            *l *= gain;
            *r *= gain;
        }
        self.current = self.target;
    }

    fn reset(&mut self) {
        self.current = self.target;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Output Gain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_is_transparent() {
        let mut gain = OutputGain::default();
        let mut left = vec![0.3, -0.7];
        let mut right = vec![0.1, 0.9];
        gain.process(&mut left, &mut right, 48000);
        assert_eq!(left, vec![0.3, -0.7]);
    }

    #[test]
    fn gain_change_is_interpolated() {
        let mut gain = OutputGain::default();
        gain.set_gain(0.0);
        let mut left = vec![1.0; 4];
        let mut right = vec![1.0; 4];
        gain.process(&mut left, &mut right, 48000);
        assert_eq!(left, vec![0.75, 0.5, 0.25, 0.0]);

        let mut left = vec![1.0; 4];
        let mut right = vec![1.0; 4];
        gain.process(&mut left, &mut right, 48000);
        assert!(left.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn gain_is_clamped() {
        let mut gain = OutputGain::new(3.0);
        assert_eq!(gain.gain(), 1.0);
        gain.set_gain(-1.0);
        assert_eq!(gain.gain(), 0.0);
    }
}
