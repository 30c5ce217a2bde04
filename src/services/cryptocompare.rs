//! CryptoCompare minute-history collector, used as the fallback source.

use crate::error::DataSourceError;
use crate::models::indicators::Candle;
use crate::services::market_data::{keep_latest, CandleSource};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tracing::debug;

const SOURCE: &str = "cryptocompare";
const MAX_LIMIT: usize = 2000;
const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

#[derive(Debug, Deserialize)]
struct HistoResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Data", default)]
    data: Option<HistoData>,
}

#[derive(Debug, Deserialize)]
struct HistoData {
    #[serde(rename = "Data", default)]
    data: Vec<HistoBar>,
}

#[derive(Debug, Deserialize)]
struct HistoBar {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volumefrom: f64,
}

pub struct CryptoCompareCandleSource {
    client: reqwest::Client,
    base_url: String,
    base_asset: String,
    quote_asset: String,
    interval_secs: u64,
    request_timeout: StdDuration,
}

impl CryptoCompareCandleSource {
    pub fn new(
        base_url: impl Into<String>,
        base_asset: impl Into<String>,
        quote_asset: impl Into<String>,
        interval_secs: u64,
    ) -> Self {
        Self::with_client(
            reqwest::Client::new(),
            base_url,
            base_asset,
            quote_asset,
            interval_secs,
        )
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        base_asset: impl Into<String>,
        quote_asset: impl Into<String>,
        interval_secs: u64,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            base_asset: base_asset.into(),
            quote_asset: quote_asset.into(),
            interval_secs,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: StdDuration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Minutes per bar; the endpoint only serves whole minutes.
    fn aggregate(&self) -> u64 {
        (self.interval_secs / 60).max(1)
    }

    async fn request(
        &self,
        limit: usize,
        to_ts: Option<i64>,
    ) -> Result<Vec<Candle>, DataSourceError> {
        let url = format!("{}/data/v2/histominute", self.base_url);
        let mut query = vec![
            ("fsym", self.base_asset.clone()),
            ("tsym", self.quote_asset.clone()),
            ("limit", limit.min(MAX_LIMIT).to_string()),
            ("aggregate", self.aggregate().to_string()),
        ];
        if let Some(ts) = to_ts {
            query.push(("toTs", ts.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::InvalidResponse {
                source_name: SOURCE,
                reason: format!("status {}", status),
            });
        }

        let body: HistoResponse = response.json().await?;
        if body.response != "Success" {
            return Err(DataSourceError::InvalidResponse {
                source_name: SOURCE,
                reason: body.message,
            });
        }

        let bar_length = Duration::seconds((self.aggregate() * 60) as i64);
        let now = Utc::now();
        let candles: Vec<Candle> = body
            .data
            .map(|d| d.data)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|bar| {
                let timestamp = DateTime::from_timestamp(bar.time, 0)?;
                (timestamp + bar_length <= now).then(|| {
                    Candle::new(bar.open, bar.high, bar.low, bar.close, bar.volumefrom, timestamp)
                })
            })
            .collect();

        debug!(
            source = SOURCE,
            pair = %format!("{}/{}", self.base_asset, self.quote_asset),
            closed = candles.len(),
            "Fetched minute history"
        );
        Ok(candles)
    }
}

#[async_trait]
impl CandleSource for CryptoCompareCandleSource {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch_latest(&self, limit: usize) -> Result<Vec<Candle>, DataSourceError> {
        let candles = self.request(limit + 1, None).await?;
        if candles.is_empty() {
            return Err(DataSourceError::Empty(SOURCE));
        }
        Ok(keep_latest(candles, limit))
    }

    async fn fetch_historical(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, DataSourceError> {
        let bar_secs = (self.aggregate() * 60) as i64;
        let span = (end - start).num_seconds().max(0) / bar_secs + 1;
        let mut to_ts = end.timestamp();
        let mut remaining = span as usize;
        let mut candles: Vec<Candle> = Vec::new();

        // the endpoint pages backwards from `toTs`
        while remaining > 0 {
            let page = self.request(remaining, Some(to_ts)).await?;
            let Some(first) = page.first().map(|c| c.timestamp) else {
                break;
            };
            let fetched = page.len();
            let mut older: Vec<Candle> = page.into_iter().filter(|c| c.timestamp >= start).collect();
            older.append(&mut candles);
            candles = older;
            if first <= start || fetched < remaining.min(MAX_LIMIT) {
                break;
            }
            remaining = remaining.saturating_sub(fetched);
            to_ts = first.timestamp() - bar_secs;
        }

        candles.dedup_by_key(|c| c.timestamp);
        if candles.is_empty() {
            return Err(DataSourceError::Empty(SOURCE));
        }
        Ok(candles)
    }
}
