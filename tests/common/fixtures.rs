//! Candle and snapshot builders shared by the unit and integration suites.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use signalbot::models::indicators::{
    Candle, IchimokuIndicator, IchimokuState, IndicatorSnapshot, SnapshotPair, VolumeTrend,
};

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single().expect("valid test timestamp")
}

/// Minute `i` after 2024-01-01T00:00:00Z.
pub fn minute(i: i64) -> DateTime<Utc> {
    utc(2024, 1, 1, 0, 0, 0) + Duration::minutes(i)
}

pub fn candle_at(i: i64, close: f64) -> Candle {
    Candle::new(close, close + 0.5, close - 0.5, close, 1000.0, minute(i))
}

pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| candle_at(i as i64, *close))
        .collect()
}

pub fn flat_candles(count: usize, price: f64) -> Vec<Candle> {
    candles_from_closes(&vec![price; count])
}

/// Candles at the given minute offsets, all at `price`.
pub fn candles_at(minutes: impl IntoIterator<Item = i64>, price: f64) -> Vec<Candle> {
    minutes.into_iter().map(|i| candle_at(i, price)).collect()
}

pub fn rising_closes(count: usize, start: f64, step: f64) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Every primary BUY rule holds, no secondary confirmation. Entry 98.5,
/// ATR 0.8.
pub fn buy_pair() -> SnapshotPair {
    let previous = IndicatorSnapshot::new(minute(0), 100.0)
        .with_rsi(28.0)
        .with_macd(-0.5, -0.2)
        .with_bollinger(104.0, 101.0, 98.0)
        .with_stochastic(10.0, 15.0)
        .with_atr(0.8);
    let current = IndicatorSnapshot::new(minute(1), 98.5)
        .with_rsi(32.0)
        .with_macd(0.1, -0.1)
        .with_bollinger(103.0, 100.8, 98.6)
        .with_stochastic(18.0, 15.0)
        .with_atr(0.8);
    SnapshotPair::new(previous, current)
}

/// RSI crosses up out of oversold while MACD crosses down.
pub fn mixed_pair() -> SnapshotPair {
    let mut pair = buy_pair();
    pair.previous = pair.previous.with_macd(0.5, 0.2);
    pair.current = pair.current.with_macd(-0.1, 0.1);
    pair
}

/// Every primary SELL rule holds, no secondary confirmation.
pub fn sell_pair() -> SnapshotPair {
    let previous = IndicatorSnapshot::new(minute(0), 100.0)
        .with_rsi(72.0)
        .with_macd(0.5, 0.2)
        .with_bollinger(102.0, 99.0, 96.0)
        .with_stochastic(90.0, 85.0)
        .with_atr(0.8);
    let current = IndicatorSnapshot::new(minute(1), 101.5)
        .with_rsi(68.0)
        .with_macd(-0.1, 0.1)
        .with_bollinger(101.4, 99.2, 97.0)
        .with_stochastic(82.0, 85.0)
        .with_atr(0.8);
    SnapshotPair::new(previous, current)
}

/// Adds rising volume and a favourable cloud to the current snapshot.
pub fn with_two_confirmations(mut pair: SnapshotPair, state: IchimokuState) -> SnapshotPair {
    pair.current = pair
        .current
        .with_volume_trend(VolumeTrend::Rising)
        .with_ichimoku(IchimokuIndicator {
            span_a: 90.0,
            span_b: 95.0,
            state,
        });
    pair
}

/// One-minute candles from minute 0 whose final bar completes an oversold
/// reversal: RSI leaves oversold, the close sits under the lower band, MACD
/// and stochastic cross up. The nearest support is closer than half an ATR,
/// so the stop falls back to the ATR distance. Each open is the previous
/// close.
pub fn oversold_reversal_candles() -> Vec<Candle> {
    REVERSAL_CLOSES
        .iter()
        .zip(REVERSAL_HIGHS.iter().zip(REVERSAL_LOWS.iter()))
        .enumerate()
        .map(|(i, (&close, (&high, &low)))| {
            let open = if i == 0 { close } else { REVERSAL_CLOSES[i - 1] };
            Candle::new(open, high, low, close, 1000.0, minute(i as i64))
        })
        .collect()
}

const REVERSAL_CLOSES: [f64; 46] = [
    83.08, 99.20, 119.83, 95.83, 104.63, 103.96, 110.92, 114.33,
    116.62, 121.09, 135.66, 123.20, 107.57, 133.78, 132.76, 102.28,
    90.74, 109.05, 106.45, 104.13, 98.80, 129.84, 102.81, 101.95,
    94.20, 82.91, 70.12, 67.06, 68.98, 67.94, 68.14, 65.85,
    66.98, 66.21, 68.54, 68.95, 67.30, 68.14, 67.58, 63.92,
    66.42, 61.98, 57.17, 58.57, 50.14, 53.49,
];

const REVERSAL_HIGHS: [f64; 46] = [
    112.54, 109.16, 137.38, 133.23, 109.42, 105.02, 129.99, 133.09,
    150.57, 129.11, 144.65, 140.89, 125.08, 148.02, 156.19, 164.14,
    115.16, 124.15, 112.44, 122.75, 110.60, 137.20, 143.65, 116.62,
    109.90, 98.72, 92.11, 80.25, 70.22, 73.73, 88.51, 77.79,
    70.65, 67.56, 78.92, 85.47, 78.06, 73.12, 87.62, 103.54,
    71.55, 69.06, 62.08, 64.34, 80.17, 64.53,
];

const REVERSAL_LOWS: [f64; 46] = [
    82.98, 82.98, 99.10, 95.73, 95.73, 103.86, 103.86, 110.82,
    114.23, 116.52, 120.99, 123.10, 107.47, 107.47, 132.66, 102.18,
    90.64, 90.64, 106.35, 104.03, 98.70, 98.70, 102.71, 101.85,
    94.10, 82.81, 70.02, 66.96, 66.96, 67.84, 67.84, 65.75,
    65.75, 66.11, 66.11, 68.44, 67.20, 67.20, 67.48, 63.82,
    63.82, 61.88, 57.07, 57.07, 50.04, 50.04,
];
