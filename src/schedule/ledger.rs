//! Per-day emission state carried between ticks.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Emission count for one local trading day.
///
/// Only the window gate produces new ledgers; the pipeline stores the latest
/// one and hands it back on the next call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLedger {
    pub date: NaiveDate,
    pub emitted_count: u32,
    pub last_admitted_at: Option<DateTime<Utc>>,
    /// Entry instants already used in discrete-instant mode.
    pub claimed_entries: Vec<DateTime<Utc>>,
}

impl DailyLedger {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            emitted_count: 0,
            last_admitted_at: None,
            claimed_entries: Vec::new(),
        }
    }

    /// Empty ledger for the local day containing `now`.
    pub fn for_instant(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self::new(now.with_timezone(&timezone).date_naive())
    }

    pub fn is_claimed(&self, entry: DateTime<Utc>) -> bool {
        self.claimed_entries.contains(&entry)
    }
}
