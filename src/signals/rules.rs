//! Primary and secondary signal rules.
//!
//! Each rule is evaluated for one direction against a [`SnapshotPair`];
//! crossovers compare the previous snapshot with the current one.

use crate::config::ClassifierConfig;
use crate::models::indicators::{IchimokuState, SnapshotPair, VolumeTrend};
use crate::models::signal::SignalDirection;
use std::fmt;

/// Rules that must all hold for a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryRule {
    RsiCross,
    BandTouch,
    MacdCross,
    StochasticCross,
}

impl PrimaryRule {
    pub const ALL: [PrimaryRule; 4] = [
        PrimaryRule::RsiCross,
        PrimaryRule::BandTouch,
        PrimaryRule::MacdCross,
        PrimaryRule::StochasticCross,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryRule::RsiCross => "rsi_cross",
            PrimaryRule::BandTouch => "band_touch",
            PrimaryRule::MacdCross => "macd_cross",
            PrimaryRule::StochasticCross => "stochastic_cross",
        }
    }

    /// `None` when an indicator the rule reads is undefined.
    pub fn evaluate(
        &self,
        pair: &SnapshotPair,
        direction: SignalDirection,
        config: &ClassifierConfig,
    ) -> Option<bool> {
        let (prev, curr) = (&pair.previous, &pair.current);
        let holds = match self {
            PrimaryRule::RsiCross => {
                let (before, now) = (prev.rsi?, curr.rsi?);
                match direction {
                    SignalDirection::Buy => {
                        before < config.rsi_oversold && now > config.rsi_oversold
                    }
                    SignalDirection::Sell => {
                        before > config.rsi_overbought && now < config.rsi_overbought
                    }
                }
            }
            PrimaryRule::BandTouch => {
                let bands = curr.bollinger?;
                if bands.is_degenerate() {
                    false
                } else {
                    match direction {
                        SignalDirection::Buy => curr.close <= bands.lower,
                        SignalDirection::Sell => curr.close >= bands.upper,
                    }
                }
            }
            PrimaryRule::MacdCross => {
                let (before, now) = (prev.macd?, curr.macd?);
                match direction {
                    SignalDirection::Buy => {
                        before.macd <= before.signal && now.macd > now.signal
                    }
                    SignalDirection::Sell => {
                        before.macd >= before.signal && now.macd < now.signal
                    }
                }
            }
            PrimaryRule::StochasticCross => {
                let (before, now) = (prev.stochastic?, curr.stochastic?);
                match direction {
                    SignalDirection::Buy => {
                        before.k <= before.d
                            && now.k > now.d
                            && now.k < config.stochastic_oversold
                            && now.d < config.stochastic_oversold
                    }
                    SignalDirection::Sell => {
                        before.k >= before.d
                            && now.k < now.d
                            && now.k > config.stochastic_overbought
                            && now.d > config.stochastic_overbought
                    }
                }
            }
        };
        Some(holds)
    }
}

impl fmt::Display for PrimaryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confirmations counted towards strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryRule {
    VolumeRising,
    IchimokuFavorable,
    FibonacciProximity,
}

impl SecondaryRule {
    pub const ALL: [SecondaryRule; 3] = [
        SecondaryRule::VolumeRising,
        SecondaryRule::IchimokuFavorable,
        SecondaryRule::FibonacciProximity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecondaryRule::VolumeRising => "volume_rising",
            SecondaryRule::IchimokuFavorable => "ichimoku_favorable",
            SecondaryRule::FibonacciProximity => "fibonacci_proximity",
        }
    }

    /// Undefined inputs count as not holding.
    pub fn evaluate(
        &self,
        pair: &SnapshotPair,
        direction: SignalDirection,
        config: &ClassifierConfig,
    ) -> bool {
        let (prev, curr) = (&pair.previous, &pair.current);
        match self {
            SecondaryRule::VolumeRising => curr.volume_trend == Some(VolumeTrend::Rising),
            SecondaryRule::IchimokuFavorable => {
                let Some(cloud) = curr.ichimoku else {
                    return false;
                };
                let crossed_span_a = prev.ichimoku.is_some_and(|before| match direction {
                    SignalDirection::Buy => prev.close <= before.span_a && curr.close > cloud.span_a,
                    SignalDirection::Sell => prev.close >= before.span_a && curr.close < cloud.span_a,
                });
                let favourable_side = match direction {
                    SignalDirection::Buy => cloud.state == IchimokuState::AboveCloud,
                    SignalDirection::Sell => cloud.state == IchimokuState::BelowCloud,
                };
                favourable_side || crossed_span_a
            }
            SecondaryRule::FibonacciProximity => {
                let Some(fib) = curr.fibonacci.as_ref() else {
                    return false;
                };
                curr.close > 0.0
                    && fib
                        .levels
                        .iter()
                        .any(|level| (curr.close - level).abs() / curr.close < config.fib_tolerance)
            }
        }
    }
}

impl fmt::Display for SecondaryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of every rule for one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSet {
    pub direction: SignalDirection,
    pub primary: Vec<(PrimaryRule, bool)>,
    pub secondary: Vec<(SecondaryRule, bool)>,
}

impl ConditionSet {
    /// `None` when any primary rule cannot be evaluated.
    pub fn evaluate(
        pair: &SnapshotPair,
        direction: SignalDirection,
        config: &ClassifierConfig,
    ) -> Option<Self> {
        let primary = PrimaryRule::ALL
            .iter()
            .map(|rule| rule.evaluate(pair, direction, config).map(|holds| (*rule, holds)))
            .collect::<Option<Vec<_>>>()?;
        let secondary = SecondaryRule::ALL
            .iter()
            .map(|rule| (*rule, rule.evaluate(pair, direction, config)))
            .collect();
        Some(Self {
            direction,
            primary,
            secondary,
        })
    }

    pub fn primary_count(&self) -> usize {
        self.primary.iter().filter(|(_, holds)| *holds).count()
    }

    pub fn secondary_count(&self) -> usize {
        self.secondary.iter().filter(|(_, holds)| *holds).count()
    }

    pub fn primaries_hold(&self, required: usize) -> bool {
        self.primary_count() >= required
    }

    pub fn met_secondary(&self) -> Vec<SecondaryRule> {
        self.secondary
            .iter()
            .filter(|(_, holds)| *holds)
            .map(|(rule, _)| *rule)
            .collect()
    }
}
