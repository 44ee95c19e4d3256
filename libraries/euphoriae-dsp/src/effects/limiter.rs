//! Lookahead peak limiter
//!
//! The output stage of the graph. The signal is delayed by the lookahead while
//! the detector looks at the undelayed input, so gain reduction can ramp down
//! ahead of a peak instead of clamping it:
//!
//! - attack: a linear ramp that reaches the required gain exactly when the
//!   peak leaves the lookahead window
//! - hold: the reduced gain stays until every flagged peak has left the window
//!   plus a short hold time
//! - release: exponential recovery toward unity
//!
//! A final clamp at the ceiling catches anything the ramp misses.

use super::effect::AudioEffect;
use crate::filters::{time_coefficient, DelayLine};

/// Default lookahead (ms)
pub const DEFAULT_LOOKAHEAD_MS: f32 = 3.0;

const HOLD_MS: f32 = 5.0;
const RELEASE_MS: f32 = 80.0;

/// Output ceiling (linear) for a normalized strength: 0.99 at 0, 0.5 at 1
pub fn ceiling_for_strength(strength: f32) -> f32 {
    0.99 - 0.49 * strength.clamp(0.0, 1.0)
}

/// Lookahead limiter with a strength-controlled ceiling
pub struct Limiter {
    strength: f32,
    ceiling: f32,
    enabled: bool,

    lookahead_ms: f32,
    lookahead: usize,
    delay_l: DelayLine,
    delay_r: DelayLine,

    gain: f32,
    /// Lowest gain any peak inside the window requires
    floor: f32,
    /// Per-sample gain change, zero or negative
    slope: f32,
    hold: usize,

    hold_samples: usize,
    release_coeff: f32,
    sample_rate: u32,
    needs_update: bool,
}

impl Limiter {
    /// Create a limiter whose lookahead fits any rate up to `max_sample_rate`
    pub fn new(lookahead_ms: f32, max_sample_rate: u32) -> Self {
        let lookahead_ms = lookahead_ms.clamp(0.1, 20.0);
        let capacity = DelayLine::capacity_for(lookahead_ms, max_sample_rate.max(8000));
        Self {
            strength: 0.0,
            ceiling: ceiling_for_strength(0.0),
            enabled: true,
            lookahead_ms,
            lookahead: 1,
            delay_l: DelayLine::new(capacity),
            delay_r: DelayLine::new(capacity),
            gain: 1.0,
            floor: 1.0,
            slope: 0.0,
            hold: 0,
            hold_samples: 0,
            release_coeff: 0.0,
            sample_rate: 44100,
            needs_update: true,
        }
    }

    /// Set strength in [0, 1]; only the ceiling depends on it
    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength.clamp(0.0, 1.0);
        self.ceiling = ceiling_for_strength(self.strength);
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Current ceiling (linear)
    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    /// Delay introduced at the current sample rate (frames)
    pub fn latency_frames(&self) -> usize {
        self.lookahead
    }

    /// Bind to a sample rate ahead of processing
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate != self.sample_rate && sample_rate > 0 {
            self.sample_rate = sample_rate;
            self.needs_update = true;
        }
        self.update_parameters();
    }

    /// Current gain reduction in dB (zero or negative)
    pub fn gain_reduction_db(&self) -> f32 {
        20.0 * self.gain.max(1e-6).log10()
    }

    fn update_parameters(&mut self) {
        if !self.needs_update {
            return;
        }
        let sr = self.sample_rate as f32;
        let wanted = (self.lookahead_ms * sr / 1000.0).round() as usize;
        self.lookahead = wanted.clamp(1, self.delay_l.max_delay());
        self.hold_samples = (HOLD_MS * sr / 1000.0) as usize;
        self.release_coeff = 1.0 - time_coefficient(RELEASE_MS, self.sample_rate);
        self.delay_l.clear();
        self.delay_r.clear();
        self.reset_gain();
        self.needs_update = false;
    }

    fn reset_gain(&mut self) {
        self.gain = 1.0;
        self.floor = 1.0;
        self.slope = 0.0;
        self.hold = 0;
    }

    #[inline]
    fn detect(&mut self, peak: f32) {
        if peak <= self.ceiling {
            return;
        }
        let required = self.ceiling / peak;
        self.hold = self.lookahead + self.hold_samples;
        self.floor = self.floor.min(required);
        if required < self.gain {
            let slope = (required - self.gain) / self.lookahead as f32;
            self.slope = self.slope.min(slope);
        }
    }

    #[inline]
    fn advance_gain(&mut self) {
        if self.slope < 0.0 {
            self.gain = (self.gain + self.slope).max(self.floor);
            if self.gain <= self.floor {
                self.slope = 0.0;
            }
        }

        if self.hold > 0 {
            self.hold -= 1;
        } else if self.gain < 1.0 {
            self.floor = 1.0;
            self.slope = 0.0;
            self.gain += (1.0 - self.gain) * self.release_coeff;
            if self.gain > 0.9999 {
                self.gain = 1.0;
            }
        }
    }
}

impl AudioEffect for Limiter {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], sample_rate: u32) {
        if !self.enabled {
            return;
        }
        self.set_sample_rate(sample_rate);

        let lookahead = self.lookahead;
        let ceiling = self.ceiling;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            self.detect(l.abs().max(r.abs()));
            self.advance_gain();

            self.delay_l.write(*l);
            self.delay_r.write(*r);
            let gain = self.gain;
            *l = (self.delay_l.read(lookahead) * gain).clamp(-ceiling, ceiling);
            *r = (self.delay_r.read(lookahead) * gain).clamp(-ceiling, ceiling);
        }
    }

    fn reset(&mut self) {
        self.delay_l.clear();
        self.delay_r.clear();
        self.reset_gain();
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Lookahead Limiter"
    }
}
