//! Ichimoku cloud

use crate::common::math;
use crate::models::indicators::{Candle, IchimokuIndicator, IchimokuState};

/// Leading spans as displayed under the latest candle, and where the latest
/// close sits relative to them.
///
/// Span A = (tenkan + kijun) / 2, Span B = midpoint over `span_b_period`,
/// both computed `displacement` candles back.
pub fn calculate_ichimoku(
    candles: &[Candle],
    conversion_period: usize,
    base_period: usize,
    span_b_period: usize,
    displacement: usize,
) -> Option<IchimokuIndicator> {
    let longest = conversion_period.max(base_period).max(span_b_period);
    if candles.len() < longest + displacement {
        return None;
    }

    let close = candles.last()?.close;
    let source = &candles[..candles.len() - displacement];
    let highs: Vec<f64> = source.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = source.iter().map(|c| c.low).collect();

    let tenkan = math::channel_midpoint(&highs, &lows, conversion_period)?;
    let kijun = math::channel_midpoint(&highs, &lows, base_period)?;
    let span_a = (tenkan + kijun) / 2.0;
    let span_b = math::channel_midpoint(&highs, &lows, span_b_period)?;

    let state = if close > span_a.max(span_b) {
        IchimokuState::AboveCloud
    } else if close < span_a.min(span_b) {
        IchimokuState::BelowCloud
    } else {
        IchimokuState::InsideCloud
    };

    Some(IchimokuIndicator {
        span_a,
        span_b,
        state,
    })
}

/// Calculate Ichimoku with default periods (9, 26, 52, displaced 26)
pub fn calculate_ichimoku_default(candles: &[Candle]) -> Option<IchimokuIndicator> {
    calculate_ichimoku(candles, 9, 26, 52, 26)
}
