//! Error types for the engine and its collaborators.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Invalid or unloadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// A candle that cannot be appended to the buffer.
#[derive(Debug, Error, PartialEq)]
pub enum BufferError {
    #[error("candle at {candle} is not after the latest buffered candle at {latest}")]
    OutOfOrder {
        candle: DateTime<Utc>,
        latest: DateTime<Utc>,
    },
    #[error("candle at {0} has invalid prices")]
    InvalidCandle(DateTime<Utc>),
}

/// Failure surfaced by a market-data collector.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response from {source_name}: {reason}")]
    InvalidResponse {
        source_name: &'static str,
        reason: String,
    },
    #[error("no candles returned by {0}")]
    Empty(&'static str),
    #[error("fetch timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("all data sources failed; last error: {0}")]
    Exhausted(String),
}

/// Failure delivering a signal to a notifier.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notifier rejected message: {0}")]
    Rejected(String),
    #[error("notifier not configured: {0}")]
    NotConfigured(&'static str),
    #[error("failed to write signal archive: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode signal: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Risk parameters could not be derived for an admitted candidate.
#[derive(Debug, Error, PartialEq)]
pub enum RiskError {
    #[error("ATR is undefined for the current candle")]
    MissingAtr,
    #[error("entry price {0} is not a positive finite number")]
    InvalidEntryPrice(f64),
}
