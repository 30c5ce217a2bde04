//! Signal classifier: direction and strength from a [`SnapshotPair`].

use crate::config::ClassifierConfig;
use crate::models::indicators::SnapshotPair;
use crate::models::signal::{SignalDirection, SignalStrength};
use crate::signals::rules::ConditionSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub direction: SignalDirection,
    pub strength: SignalStrength,
    pub conditions: ConditionSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Candidate(Candidate),
    /// Primary rules held for both directions on the same tick.
    Ambiguous { buy: ConditionSet, sell: ConditionSet },
    /// A primary indicator is undefined on one of the snapshots.
    Incomplete,
    NoSignal,
}

/// Stateless rule evaluation over a snapshot pair.
pub struct SignalClassifier {
    config: ClassifierConfig,
}

impl SignalClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classify(&self, pair: &SnapshotPair) -> Classification {
        if !pair.previous.has_primary_inputs() || !pair.current.has_primary_inputs() {
            return Classification::Incomplete;
        }
        let (Some(buy), Some(sell)) = (
            ConditionSet::evaluate(pair, SignalDirection::Buy, &self.config),
            ConditionSet::evaluate(pair, SignalDirection::Sell, &self.config),
        ) else {
            return Classification::Incomplete;
        };

        let required = self.config.primary_required;
        match (buy.primaries_hold(required), sell.primaries_hold(required)) {
            (true, true) => Classification::Ambiguous { buy, sell },
            (true, false) => Classification::Candidate(self.candidate(buy)),
            (false, true) => Classification::Candidate(self.candidate(sell)),
            (false, false) => Classification::NoSignal,
        }
    }

    /// Strength for a direction whose primaries hold.
    pub fn strength_for(&self, conditions: &ConditionSet) -> SignalStrength {
        if conditions.secondary_count() >= self.config.strong_secondary_min {
            SignalStrength::Strong
        } else {
            SignalStrength::Moderate
        }
    }

    fn candidate(&self, conditions: ConditionSet) -> Candidate {
        Candidate {
            direction: conditions.direction,
            strength: self.strength_for(&conditions),
            conditions,
        }
    }
}
