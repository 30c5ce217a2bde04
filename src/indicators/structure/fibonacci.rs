//! Fibonacci retracement levels

use crate::common::math;
use crate::models::indicators::{Candle, FibonacciLevels};

pub const RETRACEMENT_RATIOS: [f64; 3] = [0.382, 0.5, 0.618];

/// Retracement prices between the swing low and swing high of the trailing
/// `lookback` candles, ascending.
pub fn calculate_fibonacci(candles: &[Candle], lookback: usize) -> Option<FibonacciLevels> {
    if lookback == 0 || candles.len() < lookback {
        return None;
    }

    let window = &candles[candles.len() - lookback..];
    let highs: Vec<f64> = window.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = window.iter().map(|c| c.low).collect();
    let swing_high = math::highest(&highs)?;
    let swing_low = math::lowest(&lows)?;

    let diff = swing_high - swing_low;
    let levels = RETRACEMENT_RATIOS
        .iter()
        .map(|ratio| swing_low + ratio * diff)
        .collect();

    Some(FibonacciLevels {
        swing_high,
        swing_low,
        levels,
    })
}

/// Calculate Fibonacci levels over the default lookback (50)
pub fn calculate_fibonacci_default(candles: &[Candle]) -> Option<FibonacciLevels> {
    calculate_fibonacci(candles, 50)
}
