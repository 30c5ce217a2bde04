//! Volume indicators

pub mod trend;

pub use trend::*;
