//! Risk calculator.

use crate::config::RiskConfig;
use crate::error::RiskError;
use crate::models::indicators::{IndicatorSnapshot, SnapshotPair};
use crate::models::signal::{SignalDirection, SignalStrength, StopBasis};

#[derive(Debug, Clone, PartialEq)]
pub struct RiskParameters {
    pub entry_price: f64,
    pub position_size_pct: f64,
    pub stop_loss_price: f64,
    pub stop_basis: StopBasis,
    pub take_profit_pct: f64,
    pub take_profit_price: f64,
    pub secondary_take_profit_pct: Option<f64>,
}

pub struct RiskCalculator {
    config: RiskConfig,
}

impl RiskCalculator {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Risk parameters for entering at the current close.
    pub fn calculate(
        &self,
        direction: SignalDirection,
        strength: SignalStrength,
        pair: &SnapshotPair,
    ) -> Result<RiskParameters, RiskError> {
        let current = &pair.current;
        let entry = current.close;
        if !entry.is_finite() || entry <= 0.0 {
            return Err(RiskError::InvalidEntryPrice(entry));
        }
        let atr = current
            .atr
            .filter(|atr| atr.is_finite() && *atr >= 0.0)
            .ok_or(RiskError::MissingAtr)?;

        let (stop_loss_price, stop_basis) = self.stop_loss(direction, entry, atr, current);
        let take_profit_pct = self.config.take_profit_pct;
        let take_profit_price = entry * (1.0 + direction.sign() * take_profit_pct / 100.0);
        let secondary_take_profit_pct = (strength == SignalStrength::Strong
            && histogram_expanding(direction, pair))
        .then_some(self.config.secondary_take_profit_pct);

        Ok(RiskParameters {
            entry_price: entry,
            position_size_pct: self.position_size_pct(strength, entry, atr),
            stop_loss_price,
            stop_basis,
            take_profit_pct,
            take_profit_price,
            secondary_take_profit_pct,
        })
    }

    /// Base size scaled by conviction and by volatility relative to baseline,
    /// clamped to the configured range.
    pub fn position_size_pct(&self, strength: SignalStrength, entry: f64, atr: f64) -> f64 {
        let cfg = &self.config;
        let multiplier = match strength {
            SignalStrength::Strong => cfg.strong_multiplier,
            SignalStrength::Moderate => cfg.moderate_multiplier,
        };
        let size = cfg.base_position_pct * multiplier * self.volatility_adjustment(entry, atr);
        size.clamp(cfg.min_position_pct, cfg.max_position_pct)
    }

    pub fn volatility_adjustment(&self, entry: f64, atr: f64) -> f64 {
        let cfg = &self.config;
        if atr <= 0.0 || entry <= 0.0 {
            return 1.0;
        }
        let atr_pct = atr / entry * 100.0;
        (cfg.baseline_atr_pct / atr_pct)
            .clamp(cfg.volatility_adjustment_min, cfg.volatility_adjustment_max)
    }

    /// ATR stop unless a technical level on the protective side is strictly
    /// tighter while still at least `min_stop_atr` ATRs from entry.
    fn stop_loss(
        &self,
        direction: SignalDirection,
        entry: f64,
        atr: f64,
        snapshot: &IndicatorSnapshot,
    ) -> (f64, StopBasis) {
        let sign = direction.sign();
        let atr_stop = entry - sign * atr * self.config.stop_atr_multiplier;
        let min_distance = atr * self.config.min_stop_atr;

        let swing = snapshot.support_resistance.map(|sr| match direction {
            SignalDirection::Buy => sr.support,
            SignalDirection::Sell => sr.resistance,
        });
        let fib_levels = snapshot
            .fibonacci
            .as_ref()
            .map(|fib| fib.levels.as_slice())
            .unwrap_or_default();

        // distance from entry on the protective side; smaller is tighter
        let nearest = swing
            .into_iter()
            .chain(fib_levels.iter().copied())
            .filter(|level| level.is_finite())
            .map(|level| (level, sign * (entry - level)))
            .filter(|(_, distance)| *distance > 0.0 && *distance >= min_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match nearest {
            Some((level, distance)) if distance < sign * (entry - atr_stop) => {
                (level, StopBasis::TechnicalLevel)
            }
            _ => (atr_stop, StopBasis::Atr),
        }
    }
}

/// The histogram grows in magnitude on the signal's side of zero.
fn histogram_expanding(direction: SignalDirection, pair: &SnapshotPair) -> bool {
    match (pair.previous.macd, pair.current.macd) {
        (Some(prev), Some(curr)) => {
            direction.sign() * curr.histogram > 0.0 && curr.histogram.abs() > prev.histogram.abs()
        }
        _ => false,
    }
}
