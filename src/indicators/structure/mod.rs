//! Price structure: Fibonacci retracements, swing support/resistance

pub mod fibonacci;
pub mod support_resistance;

pub use fibonacci::*;
pub use support_resistance::*;
