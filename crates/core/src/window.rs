//! Reporting window: an inclusive date range interpreted as full-day UTC bounds.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Inclusive `[start, end]` reporting window.
///
/// A timestamp is inside the window when its UTC calendar date falls on any
/// day from `start` through `end`. COGS and units-sold accumulation, turnover
/// day counts, and aging ages are all anchored to this window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl ReportWindow {
    /// Build a window, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if end < start {
            return Err(DomainError::validation(format!(
                "reporting window end ({end}) precedes start ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Single-day window.
    pub fn single_day(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `ts` falls inside the window (full-day UTC semantics).
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let day = ts.date_naive();
        self.start <= day && day <= self.end
    }

    /// Whether `ts` falls on or before the window's last day.
    ///
    /// Aging looks at the last replenishment known as of the window end, so
    /// it also cares about timestamps that precede the window entirely.
    pub fn on_or_before_end(&self, ts: DateTime<Utc>) -> bool {
        ts.date_naive() <= self.end
    }

    /// Number of days covered, inclusive (a single-day window is 1).
    pub fn days(&self) -> i64 {
        self.end.signed_duration_since(self.start).num_days() + 1
    }

    /// Days between `ts` and the window end, floored at zero.
    ///
    /// Used for aging: stock received after the window end is simply "age 0",
    /// not negative.
    pub fn age_in_days(&self, ts: DateTime<Utc>) -> i64 {
        self.end
            .signed_duration_since(ts.date_naive())
            .num_days()
            .max(0)
    }
}
