//! Stereo image: balance and channel separation
//!
//! Mid/Side processing:
//! - Mid = (L + R) / 2 (center/mono content)
//! - Side = (L - R) / 2 (stereo content)
//!
//! Separation 0.5 leaves the image unchanged, 0.0 folds to mono and 1.0
//! doubles the side signal. Balance attenuates the opposite channel only, so
//! the centered position is unity on both sides.

use super::effect::AudioEffect;

/// Neutral separation
pub const NEUTRAL_SEPARATION: f32 = 0.5;

/// Per-channel gains for a balance in [-1, 1]
pub fn balance_gains(balance: f32) -> (f32, f32) {
    let b = balance.clamp(-1.0, 1.0);
    ((1.0 - b).min(1.0), (1.0 + b).min(1.0))
}

/// Balance and width
pub struct StereoImage {
    balance: f32,
    separation: f32,
    gain_l: f32,
    gain_r: f32,
    width: f32,
    enabled: bool,
}

impl StereoImage {
    pub fn new() -> Self {
        Self {
            balance: 0.0,
            separation: NEUTRAL_SEPARATION,
            gain_l: 1.0,
            gain_r: 1.0,
            width: 1.0,
            enabled: true,
        }
    }

    /// Set balance (-1.0 = full left, 0.0 = center, 1.0 = full right)
    pub fn set_balance(&mut self, balance: f32) {
        self.balance = balance.clamp(-1.0, 1.0);
        (self.gain_l, self.gain_r) = balance_gains(self.balance);
    }

    pub fn balance(&self) -> f32 {
        self.balance
    }

    /// Set separation in [0, 1]
    pub fn set_separation(&mut self, separation: f32) {
        self.separation = separation.clamp(0.0, 1.0);
        self.width = 2.0 * self.separation;
    }

    pub fn separation(&self) -> f32 {
        self.separation
    }

    /// True when processing would not change the signal
    pub fn is_neutral(&self) -> bool {
        self.balance == 0.0 && self.width == 1.0
    }
}

impl Default for StereoImage {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEffect for StereoImage {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], _sample_rate: u32) {
        if !self.enabled || self.is_neutral() {
            return;
        }

        let width = self.width;
        let (gain_l, gain_r) = (self.gain_l, self.gain_r);
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mid = (*l + *r) * 0.5;
            let side = (*l - *r) * 0.5 * width;
            *l = (mid + side) * gain_l;
            *r = (mid - side) * gain_r;
        }
    }

    fn reset(&mut self) {}

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Stereo Image"
    }
}
