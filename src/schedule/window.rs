//! Local time-of-day windows and scheduled entry instants.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

/// `[start, end)` in local time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time < self.end
    }
}

/// A daily entry time with the lead time at which its check runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInstant {
    pub entry_at: NaiveTime,
    pub lead_time_secs: u64,
}

impl ScheduledInstant {
    pub fn new(entry_at: NaiveTime, lead_time_secs: u64) -> Self {
        Self {
            entry_at,
            lead_time_secs,
        }
    }

    pub fn lead_time(&self) -> Duration {
        Duration::seconds(self.lead_time_secs as i64)
    }
}
