//! MACD (Moving Average Convergence Divergence) indicator

use crate::common::math;
use crate::models::indicators::{Candle, MacdIndicator};

/// Calculate MACD for the latest candle.
///
/// MACD = EMA(fast) - EMA(slow)
/// Signal = EMA(signal) of MACD
/// Histogram = MACD - Signal
///
/// Every EMA is seeded with the SMA of its first `period` inputs, so the
/// slice must be one contiguous run of candles.
pub fn calculate_macd(
    candles: &[Candle],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Option<MacdIndicator> {
    if fast_period == 0 || fast_period >= slow_period || signal_period == 0 {
        return None;
    }
    if candles.len() < slow_period + signal_period {
        return None;
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let fast = math::ema_series(&closes, fast_period)?;
    let slow = math::ema_series(&closes, slow_period)?;

    // fast[i] lines up with closes[fast - 1 + i], slow[j] with closes[slow - 1 + j]
    let offset = slow_period - fast_period;
    let macd_values: Vec<f64> = slow
        .iter()
        .enumerate()
        .map(|(j, slow_ema)| fast[j + offset] - slow_ema)
        .collect();

    let macd_line = *macd_values.last()?;
    let signal_line = math::ema(&macd_values, signal_period)?;

    Some(MacdIndicator {
        macd: macd_line,
        signal: signal_line,
        histogram: macd_line - signal_line,
    })
}

/// Calculate MACD with default periods (12, 26, 9)
pub fn calculate_macd_default(candles: &[Candle]) -> Option<MacdIndicator> {
    calculate_macd(candles, 12, 26, 9)
}
