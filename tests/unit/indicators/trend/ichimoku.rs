//! Unit tests for the Ichimoku cloud

use crate::support::{candles_from_closes, flat_candles, rising_closes};
use signalbot::indicators::trend::{calculate_ichimoku, calculate_ichimoku_default};
use signalbot::models::indicators::IchimokuState;

#[test]
fn test_ichimoku_insufficient_data() {
    assert!(calculate_ichimoku_default(&flat_candles(77, 100.0)).is_none());
    assert!(calculate_ichimoku_default(&flat_candles(78, 100.0)).is_some());
}

#[test]
fn test_ichimoku_uptrend_above_cloud() {
    let candles = candles_from_closes(&rising_closes(80, 100.0, 1.0));
    let cloud = calculate_ichimoku_default(&candles).unwrap();
    assert_eq!(cloud.state, IchimokuState::AboveCloud);
    assert!(cloud.cloud_top() < 179.0);
}

#[test]
fn test_ichimoku_downtrend_below_cloud() {
    let candles = candles_from_closes(&rising_closes(80, 200.0, -1.0));
    let cloud = calculate_ichimoku_default(&candles).unwrap();
    assert_eq!(cloud.state, IchimokuState::BelowCloud);
}

#[test]
fn test_ichimoku_flat_inside_cloud() {
    let cloud = calculate_ichimoku_default(&flat_candles(80, 100.0)).unwrap();
    assert_eq!(cloud.state, IchimokuState::InsideCloud);
    assert_eq!(cloud.span_a, 100.0);
    assert_eq!(cloud.span_b, 100.0);
}

#[test]
fn test_ichimoku_spans_are_displaced() {
    // 10 flat candles at 100 followed by a jump; spans still see only the
    // flat history with displacement 5
    let mut closes = vec![100.0; 10];
    closes.extend(vec![150.0; 5]);
    let cloud = calculate_ichimoku(&candles_from_closes(&closes), 3, 5, 10, 5).unwrap();
    assert_eq!(cloud.span_a, 100.0);
    assert_eq!(cloud.span_b, 100.0);
    assert_eq!(cloud.state, IchimokuState::AboveCloud);
}
