//! Stochastic oscillator

use crate::common::math;
use crate::models::indicators::{Candle, StochasticIndicator};

/// Calculate %K and %D for the latest candle.
///
/// %K = 100 * (close - lowest low) / (highest high - lowest low) over
/// `k_period` candles, 50 when the range is flat. %D = SMA(`d_period`) of %K.
pub fn calculate_stochastic(
    candles: &[Candle],
    k_period: usize,
    d_period: usize,
) -> Option<StochasticIndicator> {
    if k_period == 0 || d_period == 0 || candles.len() < k_period + d_period - 1 {
        return None;
    }

    let k_values: Vec<f64> = (candles.len() - d_period..candles.len())
        .map(|end| percent_k(&candles[end + 1 - k_period..=end]))
        .collect::<Option<_>>()?;

    let k = *k_values.last()?;
    let d = math::sma(&k_values, d_period)?;

    Some(StochasticIndicator {
        k: k.clamp(0.0, 100.0),
        d: d.clamp(0.0, 100.0),
    })
}

fn percent_k(window: &[Candle]) -> Option<f64> {
    let highs: Vec<f64> = window.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = window.iter().map(|c| c.low).collect();
    let highest = math::highest(&highs)?;
    let lowest = math::lowest(&lows)?;
    let close = window.last()?.close;

    let range = highest - lowest;
    if range <= f64::EPSILON {
        return Some(50.0);
    }
    Some((100.0 * (close - lowest) / range).clamp(0.0, 100.0))
}

/// Calculate Stochastic with default periods (14, 3)
pub fn calculate_stochastic_default(candles: &[Candle]) -> Option<StochasticIndicator> {
    calculate_stochastic(candles, 14, 3)
}
