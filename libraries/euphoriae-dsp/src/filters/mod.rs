//! Numerical building blocks shared by every effect module

mod biquad;
mod delay;
mod one_pole;
mod saturator;

pub use biquad::{BiquadCoefficients, BiquadState, StereoBiquad};
pub use delay::DelayLine;
pub use one_pole::{time_coefficient, EnvelopeFollower, OnePoleHighPass, OnePoleLowPass};
pub use saturator::Saturator;
