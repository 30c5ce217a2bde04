//! Indicator engine.
//!
//! Computes the full indicator set for the latest candle of an ordered slice.
//! The engine keeps no history: the previous snapshot of a pair is
//! recomputed from the slice without its last candle.

use crate::config::IndicatorConfig;
use crate::indicators::{momentum, structure, trend, volatility, volume};
use crate::models::indicators::{Candle, IndicatorSnapshot, SnapshotPair};
use chrono::Duration;

pub struct IndicatorEngine {
    config: IndicatorConfig,
    interval: Duration,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig, interval_secs: u64) -> Self {
        Self {
            config,
            interval: Duration::seconds(interval_secs as i64),
        }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Candles needed before every indicator of a pair is defined.
    pub fn required_lookback(&self) -> usize {
        self.config.required_lookback()
    }

    /// Contiguous candles needed by MACD and Stochastic on both snapshots.
    pub fn required_contiguous(&self) -> usize {
        let cfg = &self.config;
        (cfg.macd_slow + cfg.macd_signal).max(cfg.stochastic_k + cfg.stochastic_d - 1) + 1
    }

    /// Length of the trailing run with no gap wider than one interval.
    pub fn contiguous_len(&self, candles: &[Candle]) -> usize {
        contiguous_tail(candles, self.interval)
    }

    /// Snapshot for the last candle, `None` for an empty slice.
    pub fn compute(&self, candles: &[Candle]) -> Option<IndicatorSnapshot> {
        let latest = candles.last()?;
        let cfg = &self.config;
        let run = &candles[candles.len() - self.contiguous_len(candles)..];

        let mut snapshot = IndicatorSnapshot::new(latest.timestamp, latest.close);
        snapshot.rsi = momentum::calculate_rsi(candles, cfg.rsi_period);
        snapshot.macd =
            momentum::calculate_macd(run, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal);
        snapshot.bollinger = volatility::calculate_bollinger_bands(
            candles,
            cfg.bollinger_period,
            cfg.bollinger_std_dev,
        );
        snapshot.stochastic =
            momentum::calculate_stochastic(run, cfg.stochastic_k, cfg.stochastic_d);
        snapshot.atr = volatility::calculate_atr(candles, cfg.atr_period);
        snapshot.ichimoku = trend::calculate_ichimoku(
            candles,
            cfg.ichimoku_conversion,
            cfg.ichimoku_base,
            cfg.ichimoku_span_b,
            cfg.ichimoku_displacement,
        );
        snapshot.fibonacci = structure::calculate_fibonacci(candles, cfg.fib_lookback);
        snapshot.volume_trend =
            volume::calculate_volume_trend(candles, cfg.volume_period, cfg.volume_tolerance);
        snapshot.support_resistance =
            structure::calculate_support_resistance(candles, cfg.swing_lookback);
        Some(snapshot)
    }

    /// Snapshots for the last two candles, `None` with fewer than two.
    pub fn compute_pair(&self, candles: &[Candle]) -> Option<SnapshotPair> {
        if candles.len() < 2 {
            return None;
        }
        let previous = self.compute(&candles[..candles.len() - 1])?;
        let current = self.compute(candles)?;
        Some(SnapshotPair::new(previous, current))
    }
}

/// Trailing candles whose consecutive timestamps are at most `interval` apart.
pub fn contiguous_tail(candles: &[Candle], interval: Duration) -> usize {
    if candles.is_empty() {
        return 0;
    }
    let linked = candles
        .windows(2)
        .rev()
        .take_while(|pair| pair[1].timestamp - pair[0].timestamp <= interval)
        .count();
    linked + 1
}
