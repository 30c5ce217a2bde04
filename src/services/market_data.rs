//! Market data collector interface.

use crate::error::DataSourceError;
use crate::models::indicators::Candle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A REST source of closed candles for the configured instrument.
///
/// Results are ordered oldest first and never include the candle that is
/// still forming.
#[async_trait]
pub trait CandleSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Up to `limit` most recent closed candles.
    async fn fetch_latest(&self, limit: usize) -> Result<Vec<Candle>, DataSourceError>;

    /// Closed candles opening within `[start, end]`.
    async fn fetch_historical(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, DataSourceError>;
}

/// Keep the newest `limit` candles of an ascending batch.
pub(crate) fn keep_latest(mut candles: Vec<Candle>, limit: usize) -> Vec<Candle> {
    if candles.len() > limit {
        candles.drain(..candles.len() - limit);
    }
    candles
}
