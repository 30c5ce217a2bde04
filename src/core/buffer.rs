//! Fixed-capacity rolling window of the most recent candles.

use crate::error::BufferError;
use crate::indicators::contiguous_tail;
use crate::models::indicators::Candle;
use chrono::Duration;
use tracing::warn;

/// Result of appending one candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Appended,
    /// Appended, but `missing` intervals are absent before it.
    AppendedAfterGap { missing: i64 },
}

/// Summary of merging a fetched batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub appended: usize,
    /// Candles at or before the latest buffered timestamp.
    pub already_buffered: usize,
    pub rejected: usize,
    pub gaps: usize,
}

#[derive(Debug, Clone)]
pub struct CandleBuffer {
    candles: Vec<Candle>,
    capacity: usize,
    interval: Duration,
}

impl CandleBuffer {
    pub fn new(capacity: usize, interval_secs: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            candles: Vec::with_capacity(capacity),
            capacity,
            interval: Duration::seconds(interval_secs as i64),
        }
    }

    /// Append a candle strictly after the latest one, evicting the oldest
    /// when full.
    pub fn push(&mut self, candle: Candle) -> Result<PushOutcome, BufferError> {
        if !candle.is_valid() {
            return Err(BufferError::InvalidCandle(candle.timestamp));
        }

        let mut outcome = PushOutcome::Appended;
        if let Some(latest) = self.latest() {
            if candle.timestamp <= latest.timestamp {
                return Err(BufferError::OutOfOrder {
                    candle: candle.timestamp,
                    latest: latest.timestamp,
                });
            }
            let elapsed = candle.timestamp - latest.timestamp;
            if elapsed > self.interval {
                let step = self.interval.num_seconds().max(1);
                outcome = PushOutcome::AppendedAfterGap {
                    missing: elapsed.num_seconds() / step - 1,
                };
            }
        }

        if self.candles.len() == self.capacity {
            self.candles.remove(0);
        }
        self.candles.push(candle);
        Ok(outcome)
    }

    /// Merge a batch ordered oldest first. Candles already covered by the
    /// buffer are skipped; invalid ones are dropped with a warning.
    pub fn merge(&mut self, batch: &[Candle]) -> MergeReport {
        let mut report = MergeReport::default();
        let latest = self.latest().map(|c| c.timestamp);

        let fresh: Vec<&Candle> = batch
            .iter()
            .filter(|c| latest.map_or(true, |ts| c.timestamp > ts))
            .collect();
        report.already_buffered = batch.len() - fresh.len();
        // only the newest `capacity` candles can survive
        let skip = fresh.len().saturating_sub(self.capacity);

        for candle in fresh.into_iter().skip(skip) {
            match self.push(*candle) {
                Ok(PushOutcome::Appended) => report.appended += 1,
                Ok(PushOutcome::AppendedAfterGap { missing }) => {
                    report.appended += 1;
                    report.gaps += 1;
                    warn!(
                        timestamp = %candle.timestamp,
                        missing_candles = missing,
                        "Data gap detected in candle stream"
                    );
                }
                Err(e) => {
                    report.rejected += 1;
                    warn!(error = %e, "Dropping candle from fetched batch");
                }
            }
        }
        report
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.candles.len() == self.capacity
    }

    /// Candles since the most recent gap.
    pub fn contiguous_len(&self) -> usize {
        contiguous_tail(&self.candles, self.interval)
    }

    pub fn clear(&mut self) {
        self.candles.clear();
    }
}
