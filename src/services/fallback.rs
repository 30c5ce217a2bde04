//! Ordered fallback across candle sources with per-source retry.

use crate::error::DataSourceError;
use crate::models::indicators::Candle;
use crate::services::market_data::CandleSource;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub struct FallbackCandleSource {
    sources: Vec<Arc<dyn CandleSource>>,
    max_retries: usize,
    min_delay: Duration,
    source_timeout: Option<Duration>,
}

impl FallbackCandleSource {
    /// Sources are tried in order; each is retried `max_retries` times.
    pub fn new(sources: Vec<Arc<dyn CandleSource>>, max_retries: usize) -> Self {
        Self {
            sources,
            max_retries,
            min_delay: Duration::from_millis(500),
            source_timeout: None,
        }
    }

    /// Time allowed for one source, retries included, before moving on.
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = Some(timeout);
        self
    }

    /// First backoff delay; later ones double.
    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.min_delay * 8)
            .with_max_times(self.max_retries)
    }

    async fn first_success<'a, F, Fut>(&'a self, fetch: F) -> Result<Vec<Candle>, DataSourceError>
    where
        F: Fn(&'a Arc<dyn CandleSource>) -> Fut,
        Fut: std::future::Future<Output = Result<Vec<Candle>, DataSourceError>>,
    {
        let mut last_error = String::from("no data sources configured");
        for source in &self.sources {
            let attempts = (|| fetch(source))
                .retry(self.backoff())
                .when(is_transient)
                .notify(|err: &DataSourceError, delay: Duration| {
                    warn!(
                        source = source.name(),
                        error = %err,
                        retry_in_ms = delay.as_millis() as u64,
                        "Candle fetch failed, retrying"
                    );
                });
            let result = match self.source_timeout {
                Some(limit) => tokio::time::timeout(limit, attempts)
                    .await
                    .unwrap_or(Err(DataSourceError::Timeout(limit))),
                None => attempts.await,
            };

            match result {
                Ok(candles) => return Ok(candles),
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Candle source failed, falling back");
                    last_error = format!("{}: {}", source.name(), e);
                }
            }
        }
        Err(DataSourceError::Exhausted(last_error))
    }
}

/// Malformed payloads will not fix themselves on retry.
fn is_transient(err: &DataSourceError) -> bool {
    !matches!(err, DataSourceError::InvalidResponse { .. })
}

#[async_trait]
impl CandleSource for FallbackCandleSource {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn fetch_latest(&self, limit: usize) -> Result<Vec<Candle>, DataSourceError> {
        self.first_success(|source| source.fetch_latest(limit)).await
    }

    async fn fetch_historical(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, DataSourceError> {
        self.first_success(|source| source.fetch_historical(start, end))
            .await
    }
}
