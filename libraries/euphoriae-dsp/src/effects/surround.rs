//! Surround simulator
//!
//! An 8-tap early reflection network per channel. Tap times spread with room
//! size; odd taps are taken from the opposite channel so reflections arrive
//! from both sides. The wet signal is panned by a slow LFO whose depth is the
//! 3D amount, then mixed onto the dry signal by the surround level.

use std::f32::consts::TAU;

use super::effect::AudioEffect;
use crate::filters::{DelayLine, OnePoleLowPass};

/// Base tap times (ms) at room size 0.5
const TAP_MS: [f32; 8] = [3.1, 5.3, 7.9, 11.2, 14.7, 19.1, 23.9, 29.3];

/// Tap gains, normalized so they sum to one
const TAP_GAINS: [f32; 8] = [0.22, 0.18, 0.15, 0.13, 0.11, 0.09, 0.07, 0.05];

/// Room size 0 scales taps by this much, room size 1 by `MIN + RANGE`
const SPREAD_MIN: f32 = 0.3;
const SPREAD_RANGE: f32 = 1.2;

const LFO_HZ: f32 = 0.25;

/// Reflections are darker than the direct sound
const REFLECTION_CUTOFF_HZ: f32 = 6000.0;

/// Spread factor for a room size in [0, 1]
pub fn tap_spread(room_size: f32) -> f32 {
    SPREAD_MIN + SPREAD_RANGE * room_size.clamp(0.0, 1.0)
}

/// Early-reflection surround with pseudo-binaural pan
pub struct Surround {
    level: f32,
    room_size: f32,
    depth: f32,
    /// Mix floor used when headphone surround forces the effect on
    minimum_mix: f32,

    delay_l: DelayLine,
    delay_r: DelayLine,
    tone_l: OnePoleLowPass,
    tone_r: OnePoleLowPass,
    tap_samples: [f32; 8],
    lfo_phase: f32,
    lfo_step: f32,

    enabled: bool,
    sample_rate: u32,
    needs_update: bool,
}

impl Surround {
    pub fn new(max_sample_rate: u32) -> Self {
        let longest = TAP_MS[7] * tap_spread(1.0);
        let capacity = DelayLine::capacity_for(longest, max_sample_rate);
        Self {
            level: 0.0,
            room_size: 0.5,
            depth: 0.0,
            minimum_mix: 0.0,
            delay_l: DelayLine::new(capacity),
            delay_r: DelayLine::new(capacity),
            tone_l: OnePoleLowPass::new(REFLECTION_CUTOFF_HZ, 44100),
            tone_r: OnePoleLowPass::new(REFLECTION_CUTOFF_HZ, 44100),
            tap_samples: [0.0; 8],
            lfo_phase: 0.0,
            lfo_step: 0.0,
            enabled: true,
            sample_rate: 44100,
            needs_update: true,
        }
    }

    /// Overall wet mix in [0, 1]
    pub fn set_level(&mut self, level: f32) {
        self.level = level.clamp(0.0, 1.0);
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Room size in [0, 1]
    pub fn set_room_size(&mut self, room_size: f32) {
        let room_size = room_size.clamp(0.0, 1.0);
        if room_size != self.room_size {
            self.room_size = room_size;
            self.needs_update = true;
        }
    }

    pub fn room_size(&self) -> f32 {
        self.room_size
    }

    /// Pan modulation depth (the 3D amount) in [0, 1]
    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Lower bound on the effective mix
    pub fn set_minimum_mix(&mut self, minimum: f32) {
        self.minimum_mix = minimum.clamp(0.0, 1.0);
    }

    /// Mix actually applied
    pub fn effective_mix(&self) -> f32 {
        self.level.max(self.minimum_mix)
    }

    fn update_parameters(&mut self) {
        if !self.needs_update {
            return;
        }
        let spread = tap_spread(self.room_size);
        let per_ms = self.sample_rate as f32 / 1000.0;
        let max_delay = (self.delay_l.max_delay() - 1) as f32;
        for (samples, ms) in self.tap_samples.iter_mut().zip(TAP_MS) {
            *samples = (ms * spread * per_ms).min(max_delay);
        }
        self.lfo_step = TAU * LFO_HZ / self.sample_rate as f32;
        self.tone_l.set_cutoff(REFLECTION_CUTOFF_HZ, self.sample_rate);
        self.tone_r.set_cutoff(REFLECTION_CUTOFF_HZ, self.sample_rate);
        self.needs_update = false;
    }

    #[inline]
    fn reflections(&self) -> (f32, f32) {
        let mut wet_l = 0.0;
        let mut wet_r = 0.0;
        for (tap, (&delay, &gain)) in self.tap_samples.iter().zip(&TAP_GAINS).enumerate() {
            let from_l = self.delay_l.read_fractional(delay) * gain;
            let from_r = self.delay_r.read_fractional(delay) * gain;
            if tap % 2 == 0 {
                wet_l += from_l;
                wet_r += from_r;
            } else {
                wet_l += from_r;
                wet_r += from_l;
            }
        }
        (wet_l, wet_r)
    }
}

impl AudioEffect for Surround {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], sample_rate: u32) {
        let mix = self.effective_mix();
        if !self.enabled || mix <= 0.0 {
            return;
        }
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.needs_update = true;
        }
        self.update_parameters();

        let amount = mix * 0.5;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            self.delay_l.write(*l);
            self.delay_r.write(*r);

            let (wet_l, wet_r) = self.reflections();
            let wet_l = self.tone_l.process(wet_l);
            let wet_r = self.tone_r.process(wet_r);

            let pan = 0.5 * self.depth * self.lfo_phase.sin();
            self.lfo_phase += self.lfo_step;
            if self.lfo_phase >= TAU {
                self.lfo_phase -= TAU;
            }

            *l += amount * wet_l * (1.0 - pan);
            *r += amount * wet_r * (1.0 + pan);
        }
    }

    fn reset(&mut self) {
        self.delay_l.clear();
        self.delay_r.clear();
        self.tone_l.reset();
        self.tone_r.reset();
        self.lfo_phase = 0.0;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Surround"
    }
}
