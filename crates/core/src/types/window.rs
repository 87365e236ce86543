//! Query windows for sales metrics.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

/// A half-open time window `[from, to)` used to select orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// Window start.
    pub from: DateTime<FixedOffset>,
    /// Window end.
    pub to: DateTime<FixedOffset>,
}

impl DateWindow {
    /// Create a window, swapping the bounds if they are reversed.
    #[must_use]
    pub fn new(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    /// The window ending at `now` and spanning the previous `days` days.
    #[must_use]
    pub fn last_days(days: u32, now: DateTime<FixedOffset>) -> Self {
        Self {
            from: now - TimeDelta::days(i64::from(days)),
            to: now,
        }
    }

    /// Window length.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.to.signed_duration_since(self.from)
    }

    /// True when the window spans exactly one day (hourly trend buckets).
    #[must_use]
    pub fn is_single_day(&self) -> bool {
        self.duration() == TimeDelta::days(1)
    }

    /// Calendar dates touched by the window, in the window's own offset.
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        let end = self.to.date_naive();
        self.from
            .date_naive()
            .iter_days()
            .take_while(|d| *d <= end)
            .collect()
    }
}
