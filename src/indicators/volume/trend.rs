//! Volume trend

use crate::common::math;
use crate::models::indicators::{Candle, VolumeTrend};

/// Compare the latest volume with the mean of the `period` volumes before it.
///
/// Within `tolerance` (relative to the mean) counts as flat.
pub fn calculate_volume_trend(
    candles: &[Candle],
    period: usize,
    tolerance: f64,
) -> Option<VolumeTrend> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let latest = candles.last()?.volume;
    let prior: Vec<f64> = candles[candles.len() - 1 - period..candles.len() - 1]
        .iter()
        .map(|c| c.volume)
        .collect();
    let baseline = math::sma(&prior, period)?;

    let band = baseline * tolerance;
    let trend = if latest > baseline + band {
        VolumeTrend::Rising
    } else if latest < baseline - band {
        VolumeTrend::Falling
    } else {
        VolumeTrend::Flat
    };
    Some(trend)
}
