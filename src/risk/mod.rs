//! Position sizing, stop-loss and profit targets for admitted candidates.

pub mod calculator;

pub use calculator::{RiskCalculator, RiskParameters};
