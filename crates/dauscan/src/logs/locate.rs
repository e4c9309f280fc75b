//! Locate — resolve which (day, file) pairs exist for a source.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::day::CalendarDay;

/// Lazy sequence of `(day, path)` pairs going backward from yesterday.
///
/// Only existence is checked here; no file is opened. Daily files are
/// assumed contiguous, so the scan stops at the first missing day rather
/// than skipping it: the first gap is treated as the end of available
/// history. `lookback_days <= 0` yields an empty sequence.
pub fn locate<'a>(
    dir: &'a Path,
    file_template: &'a str,
    lookback_days: i64,
    today: NaiveDate,
) -> impl Iterator<Item = (CalendarDay, PathBuf)> + 'a {
    (1..=lookback_days.max(0))
        .map(move |i| {
            let day = CalendarDay::days_back(today, i);
            (day, dir.join(day.file_name(file_template)))
        })
        .take_while(|(_, path)| path.exists())
}

// ── Tests ───────────────────────────────────────────────────────
