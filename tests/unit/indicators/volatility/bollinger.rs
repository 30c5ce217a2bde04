//! Unit tests for Bollinger Bands

use crate::support::{candles_from_closes, flat_candles, rising_closes};
use signalbot::indicators::volatility::{calculate_bollinger_bands, calculate_bollinger_bands_default};

#[test]
fn test_bollinger_insufficient_data() {
    let candles = flat_candles(19, 100.0);
    assert!(calculate_bollinger_bands_default(&candles).is_none());
}

#[test]
fn test_bollinger_sample_std_dev() {
    // closes 1..=20: mean 10.5, sample variance 35
    let candles = candles_from_closes(&rising_closes(20, 1.0, 1.0));
    let bands = calculate_bollinger_bands(&candles, 20, 2.0).unwrap();
    let std = 35.0f64.sqrt();
    assert!((bands.middle - 10.5).abs() < 1e-9);
    assert!((bands.std_dev - std).abs() < 1e-9);
    assert!((bands.upper - (10.5 + 2.0 * std)).abs() < 1e-9);
    assert!((bands.lower - (10.5 - 2.0 * std)).abs() < 1e-9);
}

#[test]
fn test_bollinger_flat_prices_degenerate() {
    let bands = calculate_bollinger_bands_default(&flat_candles(25, 100.0)).unwrap();
    assert!(bands.is_degenerate());
    assert_eq!(bands.upper, bands.middle);
    assert_eq!(bands.lower, bands.middle);
}

#[test]
fn test_bollinger_uses_trailing_window() {
    let mut closes = vec![1000.0; 5];
    closes.extend(vec![100.0; 20]);
    let bands = calculate_bollinger_bands_default(&candles_from_closes(&closes)).unwrap();
    assert_eq!(bands.middle, 100.0);
}
