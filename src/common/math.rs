//! Rolling-window math shared by the indicators.
//!
//! Every function looks at the *trailing* window of its input slice and
//! returns `None` when the slice is shorter than the window.

/// Simple moving average of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Sample standard deviation (n - 1) of the last `period` values.
pub fn standard_deviation(values: &[f64], period: usize) -> Option<f64> {
    if period < 2 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
    Some(variance.sqrt())
}

/// Smoothing factor for an EMA of the given period.
pub fn ema_alpha(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// Next EMA value from the previous one.
pub fn ema_from_previous(value: f64, previous: f64, period: usize) -> f64 {
    let alpha = ema_alpha(period);
    value * alpha + previous * (1.0 - alpha)
}

/// EMA series seeded with the SMA of the first `period` values.
///
/// Element `i` of the result corresponds to `values[period - 1 + i]`.
pub fn ema_series(values: &[f64], period: usize) -> Option<Vec<f64>> {
    if period == 0 || values.len() < period {
        return None;
    }
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    let mut series = Vec::with_capacity(values.len() - period + 1);
    series.push(seed);
    let mut previous = seed;
    for &value in &values[period..] {
        previous = ema_from_previous(value, previous, period);
        series.push(previous);
    }
    Some(series)
}

/// Latest value of the SMA-seeded EMA.
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    ema_series(values, period).and_then(|s| s.last().copied())
}

/// True range of a bar given the previous close.
pub fn true_range(high: f64, low: f64, previous_close: f64) -> f64 {
    let high_low = high - low;
    let high_close = (high - previous_close).abs();
    let low_close = (low - previous_close).abs();
    high_low.max(high_close).max(low_close)
}

/// Highest value in the slice, ignoring NaN.
pub fn highest(values: &[f64]) -> Option<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).reduce(f64::max)
}

/// Lowest value in the slice, ignoring NaN.
pub fn lowest(values: &[f64]) -> Option<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).reduce(f64::min)
}

/// Midpoint of the highest high and lowest low over the trailing `period`.
pub fn channel_midpoint(highs: &[f64], lows: &[f64], period: usize) -> Option<f64> {
    if period == 0 || highs.len() < period || lows.len() < period {
        return None;
    }
    let high = highest(&highs[highs.len() - period..])?;
    let low = lowest(&lows[lows.len() - period..])?;
    Some((high + low) / 2.0)
}
