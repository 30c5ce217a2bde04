use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV price bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Prices are finite and positive, the range encloses open/close and
    /// volume is non-negative.
    pub fn is_valid(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p > 0.0)
            && self.volume.is_finite()
            && self.volume >= 0.0
            && self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdIndicator {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBandsIndicator {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub std_dev: f64,
}

impl BollingerBandsIndicator {
    /// Flat price collapses the bands onto the mean.
    pub fn is_degenerate(&self) -> bool {
        self.std_dev <= f64::EPSILON
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticIndicator {
    pub k: f64,
    pub d: f64,
}

/// Where the latest close sits relative to the Ichimoku cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IchimokuState {
    AboveCloud,
    InsideCloud,
    BelowCloud,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IchimokuIndicator {
    pub span_a: f64,
    pub span_b: f64,
    pub state: IchimokuState,
}

impl IchimokuIndicator {
    pub fn cloud_top(&self) -> f64 {
        self.span_a.max(self.span_b)
    }

    pub fn cloud_bottom(&self) -> f64 {
        self.span_a.min(self.span_b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevels {
    pub swing_high: f64,
    pub swing_low: f64,
    /// Retracement prices, ascending.
    pub levels: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    Rising,
    Flat,
    Falling,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistanceIndicator {
    pub support: f64,
    pub resistance: f64,
}

/// Every indicator computed for one candle. `None` means undefined: not
/// enough history, or not enough contiguous history after a data gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub rsi: Option<f64>,
    pub macd: Option<MacdIndicator>,
    pub bollinger: Option<BollingerBandsIndicator>,
    pub stochastic: Option<StochasticIndicator>,
    pub atr: Option<f64>,
    pub ichimoku: Option<IchimokuIndicator>,
    pub fibonacci: Option<FibonacciLevels>,
    pub volume_trend: Option<VolumeTrend>,
    pub support_resistance: Option<SupportResistanceIndicator>,
}

impl IndicatorSnapshot {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            timestamp,
            close,
            rsi: None,
            macd: None,
            bollinger: None,
            stochastic: None,
            atr: None,
            ichimoku: None,
            fibonacci: None,
            volume_trend: None,
            support_resistance: None,
        }
    }

    /// The four indicators the primary rules read.
    pub fn has_primary_inputs(&self) -> bool {
        self.rsi.is_some()
            && self.macd.is_some()
            && self.bollinger.is_some()
            && self.stochastic.is_some()
    }

    pub fn with_rsi(mut self, rsi: f64) -> Self {
        self.rsi = Some(rsi);
        self
    }

    pub fn with_macd(mut self, macd: f64, signal: f64) -> Self {
        self.macd = Some(MacdIndicator {
            macd,
            signal,
            histogram: macd - signal,
        });
        self
    }

    /// Bands are assumed to sit two standard deviations from the middle.
    pub fn with_bollinger(mut self, upper: f64, middle: f64, lower: f64) -> Self {
        self.bollinger = Some(BollingerBandsIndicator {
            upper,
            middle,
            lower,
            std_dev: (upper - middle) / 2.0,
        });
        self
    }

    pub fn with_stochastic(mut self, k: f64, d: f64) -> Self {
        self.stochastic = Some(StochasticIndicator { k, d });
        self
    }

    pub fn with_atr(mut self, atr: f64) -> Self {
        self.atr = Some(atr);
        self
    }

    pub fn with_ichimoku(mut self, ichimoku: IchimokuIndicator) -> Self {
        self.ichimoku = Some(ichimoku);
        self
    }

    pub fn with_fibonacci(mut self, fibonacci: FibonacciLevels) -> Self {
        self.fibonacci = Some(fibonacci);
        self
    }

    pub fn with_volume_trend(mut self, trend: VolumeTrend) -> Self {
        self.volume_trend = Some(trend);
        self
    }

    pub fn with_support_resistance(mut self, support: f64, resistance: f64) -> Self {
        self.support_resistance = Some(SupportResistanceIndicator {
            support,
            resistance,
        });
        self
    }
}

/// Snapshots for the previous and the latest candle, compared for crossovers.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotPair {
    pub previous: IndicatorSnapshot,
    pub current: IndicatorSnapshot,
}

impl SnapshotPair {
    pub fn new(previous: IndicatorSnapshot, current: IndicatorSnapshot) -> Self {
        Self { previous, current }
    }
}
