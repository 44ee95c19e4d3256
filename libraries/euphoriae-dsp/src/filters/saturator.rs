//! Memoryless soft-clip shaping

/// Soft clipper with unity small-signal gain
///
/// `drive` sets how early the curve bends; `bias` skews it so the positive and
/// negative halves saturate differently, which adds even harmonics.
#[derive(Debug, Clone, Copy)]
pub struct Saturator {
    drive: f32,
    bias: f32,
    offset: f32,
    slope_norm: f32,
}

impl Default for Saturator {
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}

impl Saturator {
    pub fn new(drive: f32, bias: f32) -> Self {
        let mut sat = Self {
            drive: 1.0,
            bias: 0.0,
            offset: 0.0,
            slope_norm: 1.0,
        };
        sat.set(drive, bias);
        sat
    }

    pub fn set(&mut self, drive: f32, bias: f32) {
        self.drive = drive.max(0.1);
        self.bias = bias.clamp(-0.9, 0.9);
        self.offset = (self.drive * self.bias).tanh();
        // d/dx tanh(d(x+b)) at x = 0 is d * sech^2(d b)
        let t = self.offset;
        self.slope_norm = 1.0 / (self.drive * (1.0 - t * t)).max(1e-6);
    }

    #[inline]
    pub fn process(&self, input: f32) -> f32 {
        ((self.drive * (input + self.bias)).tanh() - self.offset) * self.slope_norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_signals_pass_nearly_unchanged() {
        let sat = Saturator::new(3.0, 0.2);
        let out = sat.process(1e-4);
        assert!((out - 1e-4).abs() < 1e-6);
        assert_eq!(sat.process(0.0), 0.0);
    }

    #[test]
    fn large_signals_are_compressed() {
        let sat = Saturator::new(4.0, 0.0);
        assert!(sat.process(1.0) < 1.0);
        assert!(sat.process(-1.0) > -1.0);
    }

    #[test]
    fn bias_makes_curve_asymmetric() {
        let sat = Saturator::new(3.0, 0.3);
        assert!((sat.process(0.5) + sat.process(-0.5)).abs() > 1e-3);
    }
}
