//! Trend indicators: Ichimoku

pub mod ichimoku;

pub use ichimoku::*;
