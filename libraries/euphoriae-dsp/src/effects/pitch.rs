//! Length-preserving pitch shifter
//!
//! Two read taps sweep through a short delay line at a rate set by the pitch
//! ratio, half a window apart. Each tap fades in and out with a sin² window so
//! the pair always sums to unity gain, hiding the jump when a tap wraps.
//!
//! The delay line is fed even while the shift is zero, and the wet signal fades
//! in and out over a few milliseconds, so engaging the shifter never starts
//! from an empty line.

use std::f32::consts::PI;

use super::effect::AudioEffect;
use crate::filters::DelayLine;

/// Sweep window (ms)
pub const WINDOW_MS: f32 = 40.0;

/// Shift range in semitones
pub const MAX_SEMITONES: f32 = 12.0;

const MIN_DELAY_SAMPLES: f32 = 1.0;
const ENGAGE_MS: f32 = 10.0;

/// Frequency ratio for a shift in semitones (`2^(st/12)`)
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    2.0_f32.powf(semitones.clamp(-MAX_SEMITONES, MAX_SEMITONES) / 12.0)
}

/// Delay-line pitch shifter
pub struct PitchShifter {
    semitones: f32,
    ratio: f32,
    delay_l: DelayLine,
    delay_r: DelayLine,
    /// Sweep position in [0, 1)
    phase: f32,
    window: f32,
    /// Dry/wet position of the engage fade
    wet: f32,
    wet_step: f32,
    enabled: bool,
    sample_rate: u32,
}

impl PitchShifter {
    pub fn new(max_sample_rate: u32) -> Self {
        let capacity = DelayLine::capacity_for(WINDOW_MS + 1.0, max_sample_rate);
        let mut shifter = Self {
            semitones: 0.0,
            ratio: 1.0,
            delay_l: DelayLine::new(capacity),
            delay_r: DelayLine::new(capacity),
            phase: 0.0,
            window: 0.0,
            wet: 0.0,
            wet_step: 0.0,
            enabled: true,
            sample_rate: 0,
        };
        shifter.set_sample_rate(44100);
        shifter
    }

    /// Shift in semitones, clamped to ±12
    pub fn set_semitones(&mut self, semitones: f32) {
        self.semitones = semitones.clamp(-MAX_SEMITONES, MAX_SEMITONES);
        self.ratio = semitones_to_ratio(self.semitones);
    }

    pub fn semitones(&self) -> f32 {
        self.semitones
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate == self.sample_rate || sample_rate == 0 {
            return;
        }
        self.sample_rate = sample_rate;
        let max_window = (self.delay_l.max_delay() - 2) as f32 - MIN_DELAY_SAMPLES;
        self.window = (WINDOW_MS * sample_rate as f32 / 1000.0).min(max_window);
        self.wet_step = 1000.0 / (ENGAGE_MS * sample_rate as f32);
        self.reset();
    }

    #[inline]
    fn shifted(&self, line: &DelayLine) -> f32 {
        let phase_b = (self.phase + 0.5).fract();
        let tap_a = line.read_fractional(MIN_DELAY_SAMPLES + self.phase * self.window);
        let tap_b = line.read_fractional(MIN_DELAY_SAMPLES + phase_b * self.window);
        let gain_a = (PI * self.phase).sin().powi(2);
        tap_a * gain_a + tap_b * (1.0 - gain_a)
    }
}

impl AudioEffect for PitchShifter {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], sample_rate: u32) {
        if !self.enabled {
            return;
        }
        self.set_sample_rate(sample_rate);

        let engaged = self.ratio != 1.0;
        if !engaged && self.wet == 0.0 {
            for (l, r) in left.iter().zip(right.iter()) {
                self.delay_l.write(*l);
                self.delay_r.write(*r);
            }
            return;
        }

        let target = if engaged { 1.0 } else { 0.0 };
        let phase_step = (1.0 - self.ratio) / self.window;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            self.delay_l.write(*l);
            self.delay_r.write(*r);

            let shifted_l = self.shifted(&self.delay_l);
            let shifted_r = self.shifted(&self.delay_r);

            self.phase = (self.phase + phase_step).rem_euclid(1.0);
            if self.wet < target {
                self.wet = (self.wet + self.wet_step).min(1.0);
            } else if self.wet > target {
                self.wet = (self.wet - self.wet_step).max(0.0);
            }

            *l += (shifted_l - *l) * self.wet;
            *r += (shifted_r - *r) * self.wet;
        }
    }

    fn reset(&mut self) {
        self.delay_l.clear();
        self.delay_r.clear();
        self.phase = 0.0;
        self.wet = if self.ratio != 1.0 { 1.0 } else { 0.0 };
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Pitch Shifter"
    }
}
