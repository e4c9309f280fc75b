//! Extract — stream one log file and pull unique identifiers out of it.
//!
//! Lines go through a cheap byte-level containment check before the capture
//! regex runs. In a typical log almost every line fails the filter, so the
//! regex only ever sees the handful of lines that can actually match.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use regex::Regex;
use thiserror::Error;
use tracing::warn;

use super::gzip::{self, GzipError};
use crate::conf::ConfigError;

/// Read buffer size. Log files can run to tens of gigabytes; memory use must
/// stay independent of file size.
const READ_BUF_SIZE: usize = 5 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("cannot read log file {}: {source}", .path.display())]
    FileRead { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Decompress(#[from] GzipError),
}

/// What one file contributed.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Unique identifiers captured from matching lines.
    pub ids: HashSet<String>,
    pub lines_scanned: u64,
    /// Lines where the capture pattern produced an identifier.
    pub lines_matched: u64,
}

/// Compiled line filter and capture pattern for one log category.
///
/// Both are built once, at source-compilation time; the per-line loop only
/// ever matches.
pub struct Extractor {
    filter: RegexMatcher,
    pattern: Regex,
}

impl Extractor {
    /// `pattern` must carry exactly one capture group; [`crate::conf`]
    /// validates that before sources are compiled.
    pub fn new(line_filter: &str, pattern: Regex) -> Result<Self, ConfigError> {
        let filter = RegexMatcherBuilder::new()
            .case_insensitive(false)
            .multi_line(false)
            .build(&regex::escape(line_filter))
            .map_err(|e| ConfigError::Invalid(format!("bad line filter: {}", e)))?;

        Ok(Self { filter, pattern })
    }

    /// Scan a log file, transparently decompressing `.gz` rotations.
    ///
    /// The decompressed temporary is removed on every exit path, success or
    /// failure; the compressed original is never touched.
    pub fn scan(&self, path: &Path) -> Result<ScanResult, ExtractError> {
        if gzip::is_gzip(path) {
            let plain = gzip::decompress(path)?;
            let _cleanup = RemoveOnDrop(plain.clone());
            self.scan_plain(&plain)
        } else {
            self.scan_plain(path)
        }
    }

    fn scan_plain(&self, path: &Path) -> Result<ScanResult, ExtractError> {
        let file = File::open(path).map_err(|source| ExtractError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::with_capacity(READ_BUF_SIZE, file);

        let mut result = ScanResult::default();
        let mut line = Vec::with_capacity(4 * 1024);
        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|source| ExtractError::FileRead {
                    path: path.to_path_buf(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            result.lines_scanned += 1;

            // Containment gate first; the capture regex never sees the rest.
            if !self.filter.is_match(&line).unwrap_or(false) {
                continue;
            }
            let text = String::from_utf8_lossy(&line);
            if let Some(captures) = self.pattern.captures(&text) {
                if let Some(id) = captures.get(1) {
                    result.lines_matched += 1;
                    result.ids.insert(id.as_str().to_string());
                }
            }
        }
        Ok(result)
    }
}

/// Deletes the wrapped path when dropped.
struct RemoveOnDrop(PathBuf);

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.0) {
            warn!(
                "could not remove decompressed file {}: {}",
                self.0.display(),
                err
            );
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn extractor() -> Extractor {
        Extractor::new(
            "<getDevice>",
            Regex::new(r"<userID>(\d+)<userToken>").unwrap(),
        )
        .unwrap()
    }

    fn matching_line(id: u64) -> String {
        format!("INFO req <getDevice><phoneType>ios<userID>{}<userToken>abc\n", id)
    }

    #[test]
    fn test_duplicate_identifiers_collapse_to_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut content = String::new();
        content.push_str(&matching_line(10000001));
        content.push_str(&matching_line(10000002));
        content.push_str(&matching_line(10000001));
        fs::write(&path, content).unwrap();

        let result = extractor().scan(&path).unwrap();
        assert_eq!(result.lines_scanned, 3);
        assert_eq!(result.lines_matched, 3);
        assert_eq!(result.ids.len(), 2);
        assert!(result.ids.contains("10000001"));
        assert!(result.ids.contains("10000002"));
    }

    #[test]
    fn test_lines_without_filter_are_never_captured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        // The second line would match the capture pattern, but it lacks the
        // filter substring, so the pattern must never run on it.
        let content = format!(
            "{}other endpoint <userID>10000009<userToken>zzz\nnoise line\n",
            matching_line(10000001)
        );
        fs::write(&path, content).unwrap();

        let result = extractor().scan(&path).unwrap();
        assert_eq!(result.lines_scanned, 3);
        assert_eq!(result.lines_matched, 1);
        assert_eq!(result.ids.len(), 1);
        assert!(!result.ids.contains("10000009"));
    }

    #[test]
    fn test_filtered_line_without_capture_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "something <getDevice> but no user id\n").unwrap();

        let result = extractor().scan(&path).unwrap();
        assert_eq!(result.lines_matched, 0);
        assert!(result.ids.is_empty());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = extractor()
            .scan(Path::new("/nonexistent/app.log"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::FileRead { .. }));
    }

    #[test]
    fn test_gzip_input_extracts_and_removes_temporary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(matching_line(10000003).as_bytes()).unwrap();
        encoder.finish().unwrap();

        let result = extractor().scan(&path).unwrap();
        assert!(result.ids.contains("10000003"));
        // Decompressed temporary gone, compressed original untouched.
        assert!(!dir.path().join("app.log").exists());
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_gzip_is_decompress_error_and_leaves_no_temporary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log.gz");
        fs::write(&path, b"not gzip at all").unwrap();

        let err = extractor().scan(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Decompress(_)));
        assert!(!dir.path().join("app.log").exists());
    }

    #[test]
    fn test_non_utf8_bytes_on_unfiltered_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut content = vec![0xff, 0xfe, b'\n'];
        content.extend_from_slice(matching_line(10000004).as_bytes());
        fs::write(&path, content).unwrap();

        let result = extractor().scan(&path).unwrap();
        assert_eq!(result.ids.len(), 1);
        assert!(result.ids.contains("10000004"));
    }
}
