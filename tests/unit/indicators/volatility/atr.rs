//! Unit tests for ATR indicator

use crate::support::{candles_from_closes, flat_candles, minute};
use signalbot::indicators::volatility::{calculate_atr, calculate_atr_default};
use signalbot::models::indicators::Candle;

#[test]
fn test_atr_insufficient_data() {
    assert!(calculate_atr_default(&flat_candles(14, 100.0)).is_none());
    assert!(calculate_atr_default(&flat_candles(15, 100.0)).is_some());
}

#[test]
fn test_atr_constant_range() {
    // every bar spans 1.0 around an unchanged close
    let atr = calculate_atr(&flat_candles(30, 100.0), 14).unwrap();
    assert!((atr - 1.0).abs() < 1e-12);
}

#[test]
fn test_atr_counts_gaps_between_closes() {
    let mut candles = flat_candles(15, 100.0);
    candles.push(Candle::new(105.0, 105.5, 104.5, 105.0, 1000.0, minute(15)));
    // last true range is |105.5 - 100| = 5.5 instead of 1.0
    let atr = calculate_atr(&candles, 14).unwrap();
    assert!((atr - (13.0 + 5.5) / 14.0).abs() < 1e-12);
}

#[test]
fn test_atr_scales_with_volatility() {
    let calm = calculate_atr_default(&candles_from_closes(&[100.0; 20])).unwrap();
    let closes: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 100.0 } else { 104.0 }).collect();
    let wild = calculate_atr_default(&candles_from_closes(&closes)).unwrap();
    assert!(wild > calm);
}
