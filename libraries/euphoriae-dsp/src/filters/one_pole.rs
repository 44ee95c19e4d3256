//! Single-pole IIR filters and smoothers

use std::f32::consts::PI;

/// One-pole low pass: `y[n] = y[n-1] + k * (x[n] - y[n-1])`
#[derive(Debug, Clone, Copy)]
pub struct OnePoleLowPass {
    coefficient: f32,
    state: f32,
}

impl OnePoleLowPass {
    pub fn new(cutoff_hz: f32, sample_rate: u32) -> Self {
        let mut filter = Self {
            coefficient: 1.0,
            state: 0.0,
        };
        filter.set_cutoff(cutoff_hz, sample_rate);
        filter
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: u32) {
        if sample_rate == 0 {
            return;
        }
        let omega = 2.0 * PI * cutoff_hz.max(1.0) / sample_rate as f32;
        self.coefficient = omega / (omega + 1.0);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state += self.coefficient * (input - self.state);
        if self.state.abs() < 1e-15 {
            self.state = 0.0;
        }
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// One-pole high pass, the complement of [`OnePoleLowPass`]
#[derive(Debug, Clone, Copy)]
pub struct OnePoleHighPass {
    low: OnePoleLowPass,
}

impl OnePoleHighPass {
    pub fn new(cutoff_hz: f32, sample_rate: u32) -> Self {
        Self {
            low: OnePoleLowPass::new(cutoff_hz, sample_rate),
        }
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: u32) {
        self.low.set_cutoff(cutoff_hz, sample_rate);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        input - self.low.process(input)
    }

    pub fn reset(&mut self) {
        self.low.reset();
    }
}

/// Exponential follower with separate rise and fall times
///
/// Used for envelopes and slow gain trajectories. Coefficients follow
/// `exp(-1 / (time * sample_rate))`, which reaches 63% of a step after `time`.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeFollower {
    rise_coeff: f32,
    fall_coeff: f32,
    value: f32,
    initial: f32,
}

impl EnvelopeFollower {
    pub fn new(initial: f32) -> Self {
        Self {
            rise_coeff: 0.0,
            fall_coeff: 0.0,
            value: initial,
            initial,
        }
    }

    /// Configure time constants in milliseconds
    pub fn set_times(&mut self, rise_ms: f32, fall_ms: f32, sample_rate: u32) {
        self.rise_coeff = time_coefficient(rise_ms, sample_rate);
        self.fall_coeff = time_coefficient(fall_ms, sample_rate);
    }

    #[inline]
    pub fn process(&mut self, target: f32) -> f32 {
        let coeff = if target > self.value {
            self.rise_coeff
        } else {
            self.fall_coeff
        };
        self.value = coeff * self.value + (1.0 - coeff) * target;
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = self.initial;
    }
}

/// `exp(-1 / samples)` for a time constant in milliseconds
pub fn time_coefficient(time_ms: f32, sample_rate: u32) -> f32 {
    let samples = time_ms.max(0.01) * sample_rate as f32 / 1000.0;
    (-1.0 / samples.max(1.0)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_pass_converges_to_dc() {
        let mut lp = OnePoleLowPass::new(100.0, 48000);
        let mut out = 0.0;
        for _ in 0..48000 {
            out = lp.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-4);
    }

    #[test]
    fn high_pass_blocks_dc() {
        let mut hp = OnePoleHighPass::new(100.0, 48000);
        let mut out = 1.0;
        for _ in 0..48000 {
            out = hp.process(1.0);
        }
        assert!(out.abs() < 1e-4);
    }

    #[test]
    fn follower_rises_faster_than_it_falls() {
        let mut env = EnvelopeFollower::new(0.0);
        env.set_times(1.0, 100.0, 48000);
        for _ in 0..480 {
            env.process(1.0);
        }
        assert!(env.value() > 0.99);

        for _ in 0..480 {
            env.process(0.0);
        }
        assert!(env.value() > 0.8, "fall should be slow, got {}", env.value());

        env.reset();
        assert_eq!(env.value(), 0.0);
    }
}
