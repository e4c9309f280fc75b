//! Gzip — transparent decompression of rotated `.gz` log files.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::bufread::GzDecoder;
use thiserror::Error;

/// Copy buffer size; keeps memory bounded regardless of archive size.
const COPY_BUF_SIZE: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum GzipError {
    #[error("cannot open compressed file {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("cannot decompress {}: {source}", .path.display())]
    Stream { path: PathBuf, source: io::Error },
}

/// Whether a path looks like a gzip-rotated file.
pub fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Decompress `path` next to itself, dropping the `.gz` suffix.
///
/// The input file is never deleted; the caller owns removing the returned
/// plain-text file once done with it. A partially written target is removed
/// before an error is returned, so a failed decompress leaves nothing
/// behind.
pub fn decompress(path: &Path) -> Result<PathBuf, GzipError> {
    let target = path.with_extension("");

    let input = File::open(path).map_err(|source| GzipError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut decoder = GzDecoder::new(BufReader::with_capacity(COPY_BUF_SIZE, input));

    let output = File::create(&target).map_err(|source| GzipError::Stream {
        path: target.clone(),
        source,
    })?;
    let mut writer = BufWriter::with_capacity(COPY_BUF_SIZE, output);

    if let Err(source) = io::copy(&mut decoder, &mut writer).and_then(|_| writer.flush()) {
        let _ = fs::remove_file(&target);
        return Err(GzipError::Stream {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(target)
}

// ── Tests ───────────────────────────────────────────────────────
