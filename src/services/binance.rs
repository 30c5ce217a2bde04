//! Binance spot kline collector.

use crate::error::DataSourceError;
use crate::models::indicators::Candle;
use crate::services::market_data::{keep_latest, CandleSource};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::time::Duration as StdDuration;
use tracing::debug;

const SOURCE: &str = "binance";
const MAX_LIMIT: usize = 1000;
const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

pub struct BinanceCandleSource {
    client: reqwest::Client,
    base_url: String,
    symbol: String,
    interval_secs: u64,
    request_timeout: StdDuration,
}

impl BinanceCandleSource {
    pub fn new(base_url: impl Into<String>, symbol: impl Into<String>, interval_secs: u64) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, symbol, interval_secs)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        symbol: impl Into<String>,
        interval_secs: u64,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            symbol: symbol.into(),
            interval_secs,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Upper bound on a single HTTP request, response body included.
    pub fn with_request_timeout(mut self, timeout: StdDuration) -> Self {
        self.request_timeout = timeout;
        self
    }

    async fn request(&self, params: &[(&str, String)]) -> Result<Vec<Candle>, DataSourceError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let mut query = vec![
            ("symbol", self.symbol.clone()),
            ("interval", interval_code(self.interval_secs)),
        ];
        query.extend(params.iter().cloned());

        let response = self
            .client
            .get(&url)
            .query(&query)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataSourceError::InvalidResponse {
                source_name: SOURCE,
                reason: format!("status {}: {}", status, body),
            });
        }

        let rows: Vec<Vec<Value>> = response.json().await?;
        let now = Utc::now();
        let candles = rows
            .iter()
            .map(|row| parse_kline(row))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|(_, close_time)| *close_time <= now)
            .map(|(candle, _)| candle)
            .collect::<Vec<_>>();

        debug!(
            source = SOURCE,
            symbol = %self.symbol,
            received = rows.len(),
            closed = candles.len(),
            "Fetched klines"
        );
        Ok(candles)
    }
}

#[async_trait]
impl CandleSource for BinanceCandleSource {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch_latest(&self, limit: usize) -> Result<Vec<Candle>, DataSourceError> {
        // one extra for the candle that is still open
        let requested = (limit + 1).min(MAX_LIMIT);
        let candles = self.request(&[("limit", requested.to_string())]).await?;
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
        let step = Duration::seconds(self.interval_secs as i64);
        let mut cursor = start;
        let mut candles: Vec<Candle> = Vec::new();

        while cursor <= end {
            let page = self
                .request(&[
                    ("startTime", cursor.timestamp_millis().to_string()),
                    ("endTime", end.timestamp_millis().to_string()),
                    ("limit", MAX_LIMIT.to_string()),
                ])
                .await?;
            let Some(last) = page.last().map(|c| c.timestamp) else {
                break;
            };
            let full_page = page.len() >= MAX_LIMIT;
            candles.extend(page.into_iter().filter(|c| c.timestamp <= end));
            if !full_page {
                break;
            }
            cursor = last + step;
        }

        if candles.is_empty() {
            return Err(DataSourceError::Empty(SOURCE));
        }
        Ok(candles)
    }
}

/// Binance interval code for a candle length in seconds.
pub fn interval_code(interval_secs: u64) -> String {
    match interval_secs {
        s if s % 86_400 == 0 => format!("{}d", s / 86_400),
        s if s % 3_600 == 0 => format!("{}h", s / 3_600),
        s if s % 60 == 0 => format!("{}m", s / 60),
        s => format!("{}s", s),
    }
}

/// `[open_time, open, high, low, close, volume, close_time, ...]`
fn parse_kline(row: &[Value]) -> Result<(Candle, DateTime<Utc>), DataSourceError> {
    let invalid = |reason: &str| DataSourceError::InvalidResponse {
        source_name: SOURCE,
        reason: reason.to_string(),
    };
    if row.len() < 7 {
        return Err(invalid("kline row has fewer than 7 fields"));
    }

    let millis = |value: &Value| value.as_i64().and_then(DateTime::from_timestamp_millis);
    let price = |value: &Value| match value {
        Value::String(s) => s.parse::<f64>().ok(),
        other => other.as_f64(),
    };

    let open_time = millis(&row[0]).ok_or_else(|| invalid("bad open time"))?;
    let close_time = millis(&row[6]).ok_or_else(|| invalid("bad close time"))?;
    let field = |index: usize| price(&row[index]).ok_or_else(|| invalid("bad price field"));

    let candle = Candle::new(field(1)?, field(2)?, field(3)?, field(4)?, field(5)?, open_time);
    Ok((candle, close_time))
}
