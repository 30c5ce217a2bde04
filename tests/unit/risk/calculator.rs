//! Unit tests for the risk calculator

use crate::support::{buy_pair, minute};
use signalbot::config::RiskConfig;
use signalbot::error::RiskError;
use signalbot::models::indicators::{FibonacciLevels, IndicatorSnapshot, SnapshotPair};
use signalbot::models::signal::{SignalDirection, SignalStrength, StopBasis};
use signalbot::risk::RiskCalculator;

fn calculator() -> RiskCalculator {
    RiskCalculator::new(RiskConfig::default())
}

/// Entry 100 with ATR 1: the ATR stop sits 1.5 away, levels closer than 0.5
/// are ignored.
fn pair_at_100(current: IndicatorSnapshot) -> SnapshotPair {
    let previous = IndicatorSnapshot::new(minute(0), 100.2).with_macd(-0.5, -0.2);
    SnapshotPair::new(previous, current)
}

fn snapshot() -> IndicatorSnapshot {
    IndicatorSnapshot::new(minute(1), 100.0).with_atr(1.0)
}

fn fib(levels: Vec<f64>) -> FibonacciLevels {
    FibonacciLevels {
        swing_high: 110.0,
        swing_low: 90.0,
        levels,
    }
}

#[test]
fn test_moderate_buy_with_atr_stop() {
    let risk = calculator()
        .calculate(SignalDirection::Buy, SignalStrength::Moderate, &buy_pair())
        .unwrap();
    assert_eq!(risk.entry_price, 98.5);
    assert!((risk.position_size_pct - 0.75).abs() < 1e-9);
    assert!((risk.stop_loss_price - 97.3).abs() < 1e-9);
    assert_eq!(risk.stop_basis, StopBasis::Atr);
    assert_eq!(risk.take_profit_pct, 1.0);
    assert!((risk.take_profit_price - 99.485).abs() < 1e-9);
    assert_eq!(risk.secondary_take_profit_pct, None);
}

#[test]
fn test_sell_targets_mirror_buy() {
    let pair = pair_at_100(snapshot());
    let risk = calculator()
        .calculate(SignalDirection::Sell, SignalStrength::Moderate, &pair)
        .unwrap();
    assert_eq!(risk.stop_loss_price, 101.5);
    assert!((risk.take_profit_price - 99.0).abs() < 1e-9);
}

#[test]
fn test_position_size_clamped() {
    let calc = calculator();
    // very quiet market pushes the adjustment to its ceiling
    assert_eq!(calc.volatility_adjustment(98.5, 0.05), 1.5);
    assert_eq!(calc.position_size_pct(SignalStrength::Strong, 98.5, 0.05), 2.0);
    // very volatile market hits the floor
    assert_eq!(calc.volatility_adjustment(100.0, 5.0), 0.5);
    assert_eq!(calc.position_size_pct(SignalStrength::Moderate, 100.0, 5.0), 0.75);
    assert_eq!(calc.volatility_adjustment(100.0, 0.0), 1.0);
}

#[test]
fn test_position_size_floor() {
    let calc = RiskCalculator::new(RiskConfig {
        base_position_pct: 0.5,
        ..RiskConfig::default()
    });
    assert_eq!(calc.position_size_pct(SignalStrength::Moderate, 100.0, 5.0), 0.5);
}

#[test]
fn test_missing_or_invalid_atr() {
    let mut pair = buy_pair();
    pair.current.atr = None;
    assert_eq!(
        calculator().calculate(SignalDirection::Buy, SignalStrength::Moderate, &pair),
        Err(RiskError::MissingAtr)
    );
    pair.current.atr = Some(f64::NAN);
    assert_eq!(
        calculator().calculate(SignalDirection::Buy, SignalStrength::Moderate, &pair),
        Err(RiskError::MissingAtr)
    );
}

#[test]
fn test_invalid_entry_price() {
    let pair = pair_at_100(IndicatorSnapshot::new(minute(1), 0.0).with_atr(1.0));
    assert_eq!(
        calculator().calculate(SignalDirection::Buy, SignalStrength::Moderate, &pair),
        Err(RiskError::InvalidEntryPrice(0.0))
    );
}

#[test]
fn test_tighter_support_becomes_stop() {
    let pair = pair_at_100(snapshot().with_support_resistance(99.0, 103.0));
    let risk = calculator()
        .calculate(SignalDirection::Buy, SignalStrength::Moderate, &pair)
        .unwrap();
    assert_eq!(risk.stop_loss_price, 99.0);
    assert_eq!(risk.stop_basis, StopBasis::TechnicalLevel);
}

#[test]
fn test_level_too_close_is_ignored() {
    let pair = pair_at_100(snapshot().with_support_resistance(99.8, 103.0));
    let risk = calculator()
        .calculate(SignalDirection::Buy, SignalStrength::Moderate, &pair)
        .unwrap();
    assert_eq!(risk.stop_loss_price, 98.5);
    assert_eq!(risk.stop_basis, StopBasis::Atr);
}

#[test]
fn test_level_equal_to_atr_stop_keeps_atr() {
    let pair = pair_at_100(snapshot().with_support_resistance(98.5, 103.0));
    let risk = calculator()
        .calculate(SignalDirection::Buy, SignalStrength::Moderate, &pair)
        .unwrap();
    assert_eq!(risk.stop_basis, StopBasis::Atr);
}

#[test]
fn test_nearest_fibonacci_level_wins() {
    let pair = pair_at_100(
        snapshot()
            .with_support_resistance(99.0, 103.0)
            .with_fibonacci(fib(vec![97.0, 99.25, 101.0])),
    );
    let risk = calculator()
        .calculate(SignalDirection::Buy, SignalStrength::Moderate, &pair)
        .unwrap();
    assert_eq!(risk.stop_loss_price, 99.25);
    assert_eq!(risk.stop_basis, StopBasis::TechnicalLevel);
}

#[test]
fn test_sell_uses_resistance() {
    let pair = pair_at_100(snapshot().with_support_resistance(97.0, 101.0));
    let risk = calculator()
        .calculate(SignalDirection::Sell, SignalStrength::Moderate, &pair)
        .unwrap();
    assert_eq!(risk.stop_loss_price, 101.0);
    assert_eq!(risk.stop_basis, StopBasis::TechnicalLevel);
}

#[test]
fn test_secondary_target_needs_strong_and_expanding_histogram() {
    let calc = calculator();
    // histogram -0.3 -> 0.4
    let pair = pair_at_100(snapshot().with_macd(0.5, 0.1));

    let strong = calc
        .calculate(SignalDirection::Buy, SignalStrength::Strong, &pair)
        .unwrap();
    assert_eq!(strong.secondary_take_profit_pct, Some(1.5));

    let moderate = calc
        .calculate(SignalDirection::Buy, SignalStrength::Moderate, &pair)
        .unwrap();
    assert_eq!(moderate.secondary_take_profit_pct, None);

    // histogram -0.3 -> 0.2 is not an expansion
    let shrinking = pair_at_100(snapshot().with_macd(0.1, -0.1));
    let risk = calc
        .calculate(SignalDirection::Buy, SignalStrength::Strong, &shrinking)
        .unwrap();
    assert_eq!(risk.secondary_take_profit_pct, None);

    // wrong side of zero for a sell
    let risk = calc
        .calculate(SignalDirection::Sell, SignalStrength::Strong, &pair)
        .unwrap();
    assert_eq!(risk.secondary_take_profit_pct, None);
}
