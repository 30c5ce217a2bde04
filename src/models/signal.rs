use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Buy,
    Sell,
}

impl SignalDirection {
    /// +1 for BUY, -1 for SELL.
    pub fn sign(self) -> f64 {
        match self {
            SignalDirection::Buy => 1.0,
            SignalDirection::Sell => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignalDirection::Buy => "BUY",
            SignalDirection::Sell => "SELL",
        }
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conviction attached to an emitted signal. Weak candidates never surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalStrength {
    Strong,
    Moderate,
}

impl SignalStrength {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalStrength::Strong => "STRONG",
            SignalStrength::Moderate => "MODERATE",
        }
    }
}

impl fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which candidate the stop-loss was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBasis {
    Atr,
    TechnicalLevel,
}

/// A finished, admitted signal handed to the notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// 1-based position within the local trading day.
    pub sequence: u32,
    pub symbol: String,
    pub direction: SignalDirection,
    pub strength: SignalStrength,
    pub generated_at: DateTime<Utc>,
    pub scheduled_entry_at: DateTime<Utc>,
    pub expiry: Duration,
    pub entry_price: f64,
    pub position_size_pct: f64,
    pub stop_loss_price: f64,
    pub stop_basis: StopBasis,
    pub take_profit_pct: f64,
    pub take_profit_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_take_profit_pct: Option<f64>,
}
