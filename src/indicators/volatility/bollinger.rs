//! Bollinger Bands indicator

use crate::common::math;
use crate::models::indicators::{BollingerBandsIndicator, Candle};

/// Calculate Bollinger Bands
///
/// Middle Band = SMA(period)
/// Upper Band = Middle + (multiplier * sample standard deviation)
/// Lower Band = Middle - (multiplier * sample standard deviation)
pub fn calculate_bollinger_bands(
    candles: &[Candle],
    period: usize,
    multiplier: f64,
) -> Option<BollingerBandsIndicator> {
    if candles.len() < period {
        return None;
    }

    let closes: Vec<f64> = candles[candles.len() - period..]
        .iter()
        .map(|c| c.close)
        .collect();
    let middle = math::sma(&closes, period)?;
    let std = math::standard_deviation(&closes, period)?;

    Some(BollingerBandsIndicator {
        upper: middle + multiplier * std,
        middle,
        lower: middle - multiplier * std,
        std_dev: std,
    })
}

/// Calculate Bollinger Bands with default parameters (20 SMA, 2σ)
pub fn calculate_bollinger_bands_default(candles: &[Candle]) -> Option<BollingerBandsIndicator> {
    calculate_bollinger_bands(candles, 20, 2.0)
}
