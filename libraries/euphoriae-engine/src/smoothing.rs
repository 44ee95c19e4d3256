//! Parameter smoothing
//!
//! Step changes of continuous parameters become linear ramps of a fixed
//! duration in time, whatever the host buffer size. The graph advances ramps in
//! control granules of [`CONTROL_GRANULE`] frames and refreshes module
//! settings once per granule.

use crate::params::{ParamId, ParamKind, PARAM_COUNT};
use crate::store::ParamSnapshot;

/// Frames between two control updates
pub const CONTROL_GRANULE: usize = 16;

/// Default ramp duration (ms)
pub const DEFAULT_RAMP_MS: f32 = 10.0;

/// Accepted ramp durations (ms)
pub const MIN_RAMP_MS: f32 = 5.0;
pub const MAX_RAMP_MS: f32 = 20.0;

/// Linear ramp toward a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRamp {
    current: f32,
    target: f32,
    step: f32,
    remaining: u32,
}

impl LinearRamp {
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
            remaining: 0,
        }
    }

    /// Start ramping toward `target` over `samples`
    ///
    /// Retargeting to the value already targeted keeps the running ramp.
    pub fn set_target(&mut self, target: f32, samples: u32) {
        if target == self.target {
            return;
        }
        self.target = target;
        if samples == 0 || target == self.current {
            self.snap();
            return;
        }
        self.remaining = samples;
        self.step = (target - self.current) / samples as f32;
    }

    /// Move forward by `samples` and return the new value
    pub fn advance(&mut self, samples: u32) -> f32 {
        if self.remaining == 0 {
            return self.current;
        }
        if samples >= self.remaining {
            self.snap();
        } else {
            self.current += self.step * samples as f32;
            self.remaining -= samples;
        }
        self.current
    }

    /// Jump to the target
    pub fn snap(&mut self) {
        self.current = self.target;
        self.step = 0.0;
        self.remaining = 0;
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_ramping(&self) -> bool {
        self.remaining > 0
    }
}

/// Ramps for every parameter
///
/// Continuous parameters ramp; structural parameters and settings follow
/// their target immediately.
#[derive(Debug, Clone)]
pub struct SmoothingController {
    ramps: [LinearRamp; PARAM_COUNT],
    ramp_ms: f32,
    ramp_samples: u32,
    sample_rate: u32,
}

impl SmoothingController {
    pub fn new(ramp_ms: f32, initial: &ParamSnapshot) -> Self {
        let ramp_ms = ramp_ms.clamp(MIN_RAMP_MS, MAX_RAMP_MS);
        let mut controller = Self {
            ramps: std::array::from_fn(|i| LinearRamp::new(initial.values()[i])),
            ramp_ms,
            ramp_samples: 0,
            sample_rate: 0,
        };
        controller.set_sample_rate(44100);
        controller
    }

    pub fn ramp_ms(&self) -> f32 {
        self.ramp_ms
    }

    /// Ramp length at the current sample rate
    pub fn ramp_samples(&self) -> u32 {
        self.ramp_samples
    }

    /// Ramps keep their progress; only future retargets use the new length
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate == 0 || sample_rate == self.sample_rate {
            return;
        }
        self.sample_rate = sample_rate;
        self.ramp_samples = (self.ramp_ms * sample_rate as f32 / 1000.0).round() as u32;
    }

    /// Retarget every ramp to the snapshot
    pub fn retarget(&mut self, snapshot: &ParamSnapshot) {
        for id in ParamId::ALL {
            let ramp = &mut self.ramps[id.index()];
            let target = snapshot.get(id);
            match id.spec().kind {
                ParamKind::Continuous => ramp.set_target(target, self.ramp_samples),
                ParamKind::Structural | ParamKind::Setting => ramp.set_target(target, 0),
            }
        }
    }

    /// Advance every ramp by `frames`
    pub fn advance(&mut self, frames: usize) {
        let frames = frames as u32;
        for ramp in &mut self.ramps {
            ramp.advance(frames);
        }
    }

    /// Current (audible) value
    #[inline]
    pub fn value(&self, id: ParamId) -> f32 {
        self.ramps[id.index()].value()
    }

    /// Value the ramp is heading for
    pub fn target(&self, id: ParamId) -> f32 {
        self.ramps[id.index()].target()
    }

    /// Jump every ramp to the snapshot's values
    pub fn snap_to(&mut self, snapshot: &ParamSnapshot) {
        for id in ParamId::ALL {
            let ramp = &mut self.ramps[id.index()];
            ramp.set_target(snapshot.get(id), 0);
            ramp.snap();
        }
    }

    pub fn is_settled(&self) -> bool {
        !self.ramps.iter().any(LinearRamp::is_ramping)
    }
}
