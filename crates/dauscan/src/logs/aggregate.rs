//! Aggregate — per-day union of identifiers across a source's lookback
//! window.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use tracing::info;

use super::day::CalendarDay;
use super::extract::ExtractError;
use super::locate::locate;
use super::source::LogSource;

/// One day's deduplicated identifiers, plus the error if its file could not
/// be used. A failed day stays in the map with an empty set so the driver
/// can report it and move on.
#[derive(Debug, Default)]
pub struct DayActivity {
    pub users: HashSet<String>,
    pub failure: Option<ExtractError>,
}

/// Scan every located day for `source`. The map iterates ascending by day.
///
/// Days are independent: one unreadable or corrupt file yields an empty
/// entry for that day and does not disturb the others.
pub fn aggregate(source: &LogSource, today: NaiveDate) -> BTreeMap<CalendarDay, DayActivity> {
    let mut result = BTreeMap::new();
    for (day, path) in locate(&source.dir, &source.file_template, source.lookback_days, today) {
        info!("scanning {}", path.display());
        let activity = match source.extractor.scan(&path) {
            Ok(scan) => {
                info!(
                    "{}: {} lines, {} matches, {} unique users",
                    path.display(),
                    scan.lines_scanned,
                    scan.lines_matched,
                    scan.ids.len()
                );
                DayActivity {
                    users: scan.ids,
                    failure: None,
                }
            }
            Err(err) => DayActivity {
                users: HashSet::new(),
                failure: Some(err),
            },
        };
        result.insert(day, activity);
    }
    result
}

// ── Tests ───────────────────────────────────────────────────────
