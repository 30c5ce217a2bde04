//! Window gate.
//!
//! Decides whether a candidate produced at `now` may become a signal. The
//! gate holds only configuration; the per-day state lives in a
//! [`DailyLedger`] that the caller passes in and receives back.

use crate::config::{ScheduleConfig, WindowMode};
use crate::schedule::ledger::DailyLedger;
use crate::schedule::window::{ScheduledInstant, TimeWindow};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;

/// Why a candidate was not admitted. These are expected outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    OutsideWindow,
    CapReached,
    /// Every eligible scheduled instant was already used today.
    InstantClaimed,
    /// Not later than the last admission.
    Replay,
    /// On a local day before the ledger's.
    Stale,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::OutsideWindow => "outside_window",
            Rejection::CapReached => "cap_reached",
            Rejection::InstantClaimed => "instant_claimed",
            Rejection::Replay => "replay",
            Rejection::Stale => "stale",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The window or instant a candidate was attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSlot {
    Range { index: usize, window: TimeWindow },
    Instant { index: usize, instant: ScheduledInstant },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// 1-based position among today's admissions.
    pub sequence: u32,
    pub local_date: NaiveDate,
    pub slot: WindowSlot,
    pub scheduled_entry_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Admitted(Admission),
    Rejected(Rejection),
}

impl GateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, GateDecision::Admitted(_))
    }
}

#[derive(Debug, Clone)]
pub struct WindowGate {
    timezone: Tz,
    daily_cap: u32,
    mode: WindowMode,
    entry_delay: Duration,
}

impl WindowGate {
    pub fn new(config: &ScheduleConfig) -> Self {
        Self {
            timezone: config.timezone,
            daily_cap: config.daily_cap,
            mode: config.mode.clone(),
            entry_delay: Duration::seconds(config.entry_delay_secs as i64),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn daily_cap(&self) -> u32 {
        self.daily_cap
    }

    /// Local calendar day containing `now`.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    /// Empty ledger for the day containing `now`.
    pub fn ledger_for(&self, now: DateTime<Utc>) -> DailyLedger {
        DailyLedger::for_instant(now, self.timezone)
    }

    /// Admit or reject a candidate at `now`.
    ///
    /// A rejection hands back the ledger it was given. An admission hands
    /// back the ledger for `now`'s local day with the admission recorded,
    /// starting from an empty ledger when the day has rolled over.
    pub fn admit(&self, ledger: DailyLedger, now: DateTime<Utc>) -> (DailyLedger, GateDecision) {
        let today = self.local_date(now);
        if today < ledger.date {
            return (ledger, GateDecision::Rejected(Rejection::Stale));
        }

        let rolled_over = today > ledger.date;
        if !rolled_over {
            if let Some(last) = ledger.last_admitted_at {
                if now <= last {
                    return (ledger, GateDecision::Rejected(Rejection::Replay));
                }
            }
            if ledger.emitted_count >= self.daily_cap {
                return (ledger, GateDecision::Rejected(Rejection::CapReached));
            }
        }

        let current = if rolled_over {
            DailyLedger::new(today)
        } else {
            ledger.clone()
        };

        let (slot, scheduled_entry_at) = match self.select_slot(&current, now) {
            Ok(found) => found,
            Err(rejection) => return (ledger, GateDecision::Rejected(rejection)),
        };

        let mut next = current;
        next.emitted_count += 1;
        next.last_admitted_at = Some(now);
        if matches!(slot, WindowSlot::Instant { .. }) {
            next.claimed_entries.push(scheduled_entry_at);
        }

        let admission = Admission {
            sequence: next.emitted_count,
            local_date: today,
            slot,
            scheduled_entry_at,
        };
        (next, GateDecision::Admitted(admission))
    }

    fn select_slot(
        &self,
        ledger: &DailyLedger,
        now: DateTime<Utc>,
    ) -> Result<(WindowSlot, DateTime<Utc>), Rejection> {
        match &self.mode {
            WindowMode::Range { windows } => self.select_range(windows, now),
            WindowMode::Discrete {
                instants,
                tolerance_secs,
            } => self.select_instant(
                instants,
                Duration::seconds(*tolerance_secs as i64),
                ledger,
                now,
            ),
        }
    }

    fn select_range(
        &self,
        windows: &[TimeWindow],
        now: DateTime<Utc>,
    ) -> Result<(WindowSlot, DateTime<Utc>), Rejection> {
        let local_time = now.with_timezone(&self.timezone).time();

        // Overlapping windows: the one closing soonest takes the candidate.
        windows
            .iter()
            .enumerate()
            .filter(|(_, window)| window.contains(local_time))
            .min_by_key(|(index, window)| (window.end, *index))
            .map(|(index, window)| {
                (
                    WindowSlot::Range {
                        index,
                        window: *window,
                    },
                    now + self.entry_delay,
                )
            })
            .ok_or(Rejection::OutsideWindow)
    }

    fn select_instant(
        &self,
        instants: &[ScheduledInstant],
        tolerance: Duration,
        ledger: &DailyLedger,
        now: DateTime<Utc>,
    ) -> Result<(WindowSlot, DateTime<Utc>), Rejection> {
        let today = self.local_date(now);
        // An entry shortly after midnight is checked on the previous day.
        let days = [Some(today), today.succ_opt()];

        let mut eligible: Vec<(usize, ScheduledInstant, DateTime<Utc>)> = Vec::new();
        for day in days.into_iter().flatten() {
            for (index, instant) in instants.iter().enumerate() {
                let Some(entry) = self.resolve_local(day, instant.entry_at) else {
                    continue;
                };
                let check = entry - instant.lead_time();
                if (now - check).abs() <= tolerance {
                    eligible.push((index, *instant, entry));
                }
            }
        }
        if eligible.is_empty() {
            return Err(Rejection::OutsideWindow);
        }

        eligible
            .into_iter()
            .filter(|(_, _, entry)| !ledger.is_claimed(*entry))
            .min_by_key(|(index, _, entry)| (*entry < now, (*entry - now).abs(), *index))
            .map(|(index, instant, entry)| (WindowSlot::Instant { index, instant }, entry))
            .ok_or(Rejection::InstantClaimed)
    }

    /// UTC instant for a local wall-clock time. Ambiguous times (clocks going
    /// back) resolve to the earlier occurrence; skipped times have none.
    fn resolve_local(&self, day: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.timezone
            .from_local_datetime(&day.and_time(time))
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    }
}
