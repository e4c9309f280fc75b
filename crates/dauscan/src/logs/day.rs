//! Day — the calendar-day key shared by file discovery and bitmap keys.

use std::fmt;

use chrono::{Duration, NaiveDate};

/// A date with no time component, in the system's local time zone.
///
/// Ordering follows the date, so maps keyed by `CalendarDay` iterate
/// ascending. The fixed-width [`key`](Self::key) form is what gets appended
/// to the bitmap key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The day `n` days before `today`.
    pub fn days_back(today: NaiveDate, n: i64) -> Self {
        Self(today - Duration::days(n))
    }

    /// Fixed-width `%Y%m%d` key, e.g. `20190416`.
    pub fn key(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// Render this day's log file name from a chrono format template,
    /// e.g. `pps.%Y%m%d.log` or `alert-image-%Y-%m-%d.log.gz`.
    pub fn file_name(&self, template: &str) -> String {
        self.0.format(template).to_string()
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d"))
    }
}
