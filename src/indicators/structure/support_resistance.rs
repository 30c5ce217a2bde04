//! Support and Resistance levels detection

use crate::common::math;
use crate::models::indicators::{Candle, SupportResistanceIndicator};

/// Recent swing levels: the lowest low (support) and highest high
/// (resistance) of the `lookback` candles before the latest one.
pub fn calculate_support_resistance(
    candles: &[Candle],
    lookback: usize,
) -> Option<SupportResistanceIndicator> {
    if lookback == 0 || candles.len() < lookback + 1 {
        return None;
    }

    let recent = &candles[candles.len() - 1 - lookback..candles.len() - 1];
    let lows: Vec<f64> = recent.iter().map(|c| c.low).collect();
    let highs: Vec<f64> = recent.iter().map(|c| c.high).collect();

    Some(SupportResistanceIndicator {
        support: math::lowest(&lows)?,
        resistance: math::highest(&highs)?,
    })
}

/// Calculate support/resistance with default lookback (20)
pub fn calculate_support_resistance_default(
    candles: &[Candle],
) -> Option<SupportResistanceIndicator> {
    calculate_support_resistance(candles, 20)
}
