//! Run — the task driver: aggregate each source, write bitmaps, report.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::logs::aggregate::aggregate;
use crate::logs::{CalendarDay, LogSource};
use crate::store::{BitmapWriter, Record, StoreError};

/// Per-day counts reported at the end of a run.
#[derive(Debug)]
pub struct DayCount {
    pub day: CalendarDay,
    pub users_seen: usize,
    pub new_active: u64,
}

#[derive(Debug)]
pub struct SourceReport {
    pub name: String,
    pub days: Vec<DayCount>,
    /// Days whose file could not be used; they were recorded with empty
    /// sets and the run moved on.
    pub file_failures: Vec<String>,
    /// Set when the store went away mid-source; the rest of the source was
    /// skipped because no further write could succeed.
    pub store_failure: Option<StoreError>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub sources: Vec<SourceReport>,
}

impl RunSummary {
    pub fn store_failed(&self) -> bool {
        self.sources.iter().any(|s| s.store_failure.is_some())
    }
}

/// Process every source against `writer`.
///
/// A store failure stops the affected source but the remaining sources are
/// still attempted; file failures only ever cost their own day.
pub async fn execute(
    sources: &[LogSource],
    writer: &BitmapWriter,
    today: NaiveDate,
) -> RunSummary {
    let mut summary = RunSummary::default();
    for source in sources {
        info!("source {}: scanning {}", source.name, source.dir.display());
        let mut report = SourceReport {
            name: source.name.clone(),
            days: Vec::new(),
            file_failures: Vec::new(),
            store_failure: None,
        };

        'days: for (day, activity) in aggregate(source, today) {
            if let Some(failure) = &activity.failure {
                warn!("source {}, day {}: {}", source.name, day, failure);
                report.file_failures.push(format!("{}: {}", day, failure));
            }

            let mut new_active = 0u64;
            for id in &activity.users {
                match writer.record_active(day, id).await {
                    Ok(Record::New) => new_active += 1,
                    Ok(Record::Repeat) | Ok(Record::Rejected) => {}
                    Err(err) => {
                        error!(
                            "source {}, day {}: store failure, skipping rest of source: {}",
                            source.name, day, err
                        );
                        report.store_failure = Some(err);
                        break 'days;
                    }
                }
            }
            info!(
                "source {}, day {}: {} users seen, {} newly active",
                source.name,
                day,
                activity.users.len(),
                new_active
            );
            report.days.push(DayCount {
                day,
                users_seen: activity.users.len(),
                new_active,
            });
        }
        summary.sources.push(report);
    }
    summary
}

/// Run to completion and turn the summary into the process outcome.
///
/// File-level failures never fail the run; a store failure does, but only
/// after every source was attempted. Re-running after either is safe.
pub async fn run(
    sources: &[LogSource],
    writer: &BitmapWriter,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let summary = execute(sources, writer, today).await;
    info!("finished in {:.1}s", started.elapsed().as_secs_f64());

    if summary.store_failed() {
        anyhow::bail!(
            "store became unavailable during the run; affected sources were cut short (re-running them is safe)"
        );
    }
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::{SourceConfig, StoreConfig};
    use crate::store::MockBitStore;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    const TEMPLATE: &str = "app.%Y%m%d.log";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 4, 18).unwrap()
    }

    fn source(dir: &Path, lookback: i64) -> LogSource {
        LogSource::compile(
            &SourceConfig {
                name: "device-api".to_string(),
                dir: dir.to_string_lossy().into_owned(),
                file_template: TEMPLATE.to_string(),
                lookback_days: lookback,
                line_filter: "<getDevice>".to_string(),
                id_pattern: r"<userID>(\d+)<userToken>".to_string(),
            },
            None,
        )
        .unwrap()
    }

    fn writer(store: &MockBitStore) -> BitmapWriter {
        BitmapWriter::new(
            Arc::new(store.clone()),
            &StoreConfig {
                redis_url: String::new(),
                key_prefix: "AU".to_string(),
                base_offset: 10_000_000,
                max_population: 100_000,
            },
        )
    }

    fn write_day(dir: &Path, n: i64, lines: &[&str]) {
        let day = CalendarDay::days_back(today(), n);
        fs::write(dir.join(day.file_name(TEMPLATE)), lines.join("\n") + "\n").unwrap();
    }

    /// Two days of logs, each with 3 matching lines (2 unique in-range
    /// identifiers, 1 duplicate) plus one identifier above the population
    /// bound. First run sets 2 bits per day; an immediate re-run adds
    /// nothing.
    #[tokio::test]
    async fn test_end_to_end_counts_and_idempotence() {
        let dir = tempfile::tempdir().unwrap();
        let lines = [
            "<getDevice><userID>10000001<userToken>a",
            "<getDevice><userID>10000002<userToken>b",
            "<getDevice><userID>10000001<userToken>c",
            "<getDevice><userID>10100001<userToken>d",
        ];
        write_day(dir.path(), 1, &lines);
        write_day(dir.path(), 2, &lines);

        let store = MockBitStore::new();
        let writer = writer(&store);
        let sources = vec![source(dir.path(), 5)];

        let summary = execute(&sources, &writer, today()).await;
        assert_eq!(summary.sources.len(), 1);
        let report = &summary.sources[0];
        assert!(report.store_failure.is_none());
        assert_eq!(report.days.len(), 2);
        for count in &report.days {
            assert_eq!(count.users_seen, 3);
            assert_eq!(count.new_active, 2);
        }
        assert_eq!(store.keys(), vec!["AU20190416", "AU20190417"]);
        assert_eq!(store.cardinality("AU20190416"), 2);
        assert_eq!(store.cardinality("AU20190417"), 2);

        // Re-running the same window is a no-op.
        let summary = execute(&sources, &writer, today()).await;
        for count in &summary.sources[0].days {
            assert_eq!(count.new_active, 0);
        }
        assert_eq!(store.cardinality("AU20190416"), 2);
        assert_eq!(store.cardinality("AU20190417"), 2);
    }

    #[tokio::test]
    async fn test_store_failure_cuts_source_short_but_later_sources_still_run() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        write_day(dir_a.path(), 1, &["<getDevice><userID>10000001<userToken>a"]);
        write_day(dir_b.path(), 1, &["<getDevice><userID>10000002<userToken>b"]);

        let store = MockBitStore::new();
        let writer = writer(&store);
        let sources = vec![source(dir_a.path(), 1), source(dir_b.path(), 1)];

        store.set_unavailable(true);
        let summary = execute(&sources, &writer, today()).await;

        // Both sources were attempted, both hit the store failure.
        assert_eq!(summary.sources.len(), 2);
        assert!(summary.sources[0].store_failure.is_some());
        assert!(summary.sources[1].store_failure.is_some());
        assert!(summary.store_failed());
    }

    #[tokio::test]
    async fn test_file_failure_is_reported_but_does_not_fail_the_run() {
        let dir = tempfile::tempdir().unwrap();
        // Yesterday is unreadable (a directory), two days ago is fine.
        let broken = CalendarDay::days_back(today(), 1);
        fs::create_dir(dir.path().join(broken.file_name(TEMPLATE))).unwrap();
        write_day(dir.path(), 2, &["<getDevice><userID>10000001<userToken>a"]);

        let store = MockBitStore::new();
        let writer = writer(&store);
        let sources = vec![source(dir.path(), 5)];

        let summary = execute(&sources, &writer, today()).await;
        let report = &summary.sources[0];
        assert_eq!(report.file_failures.len(), 1);
        assert!(report.store_failure.is_none());
        assert_eq!(report.days.len(), 2);
        assert_eq!(store.cardinality("AU20190416"), 1);
        assert_eq!(store.cardinality("AU20190417"), 0);
    }
}
