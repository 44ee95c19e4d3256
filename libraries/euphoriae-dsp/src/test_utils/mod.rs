//! Test utilities for audio testing
//!
//! Provides test signal generation and analysis tools for verifying
//! audio processing algorithms. Signals are mono; tests duplicate them into
//! both channels where needed.

pub mod analysis;
pub mod signals;

pub use analysis::*;
pub use signals::*;
