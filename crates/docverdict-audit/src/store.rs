//! File-backed `ResultSink`.
//!
//! Each result is written to `<dir>/<document>_<YYYYmmdd_HHMMSS>.json`, where
//! the timestamp is the result's own `created_at`. If that name already
//! holds a different result (same file name from another folder, same
//! second), a counter is appended: `..._<HHMMSS>_1.json`, `_2`, and so on.
//! Writes go through a temporary file in the same directory and an atomic
//! rename, so a reader never sees a half-written result. A successful write
//! appends one line to the run index.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use docverdict_contracts::{
    error::{VerdictError, VerdictResult},
    result::{AggregatedResult, RunId},
};
use docverdict_core::traits::ResultSink;

use crate::index::{IndexEntry, RunIndex};

/// Keep ASCII-safe file name characters: alphanumerics and `-`, `_`, `.`.
///
/// Falls back to `fallback` when nothing survives.
pub fn safe_name(name: &str, fallback: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if kept.is_empty() {
        fallback.to_string()
    } else {
        kept
    }
}

/// Disambiguating suffixes tried before a persist gives up.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Preferred file name of the result file for `result`.
pub fn result_file_name(result: &AggregatedResult) -> String {
    numbered_file_name(result, 0)
}

/// File name for the `attempt`-th candidate; attempt 0 has no counter.
fn numbered_file_name(result: &AggregatedResult, attempt: usize) -> String {
    let stem = format!(
        "{}_{}",
        safe_name(&result.document.name, "document"),
        result.created_at.format("%Y%m%d_%H%M%S")
    );
    match attempt {
        0 => format!("{stem}.json"),
        n => format!("{stem}_{n}.json"),
    }
}

/// Pretty JSON bytes for `value`.
pub(crate) fn to_json_bytes<T: Serialize>(value: &T) -> VerdictResult<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| VerdictError::PersistFailed {
        reason: format!("failed to serialize: {}", e),
    })
}

/// Replace `path` with `bytes` via a temporary sibling and a rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> VerdictResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let fail = |e: std::io::Error| VerdictError::PersistFailed {
        reason: format!("failed to write '{}': {}", path.display(), e),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

/// Like [`write_atomic`], but never replaces an existing file.
///
/// Returns `false` when `path` was taken.
fn write_new(path: &Path, bytes: &[u8]) -> VerdictResult<bool> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let fail = |e: std::io::Error| VerdictError::PersistFailed {
        reason: format!("failed to write '{}': {}", path.display(), e),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(fail(e.error)),
    }
}

/// Writes result files and the run index for one experiment run.
#[derive(Debug)]
pub struct JsonResultStore {
    dir: PathBuf,
    run_id: RunId,
    experiment: String,
    index: RunIndex,
}

impl JsonResultStore {
    /// Open (and create if needed) the output directory `dir`.
    ///
    /// The run index is created empty if it does not exist yet; an existing
    /// index is appended to.
    pub fn open(dir: impl Into<PathBuf>, run_id: RunId, experiment: impl Into<String>) -> VerdictResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| VerdictError::PersistFailed {
            reason: format!("failed to create output directory '{}': {}", dir.display(), e),
        })?;
        let index = RunIndex::create(dir.join(RunIndex::FILE_NAME))?;
        Ok(Self {
            dir,
            run_id,
            experiment: experiment.into(),
            index,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn index(&self) -> &RunIndex {
        &self.index
    }

    /// Preferred location of `result`. The actual file may carry a counter
    /// suffix; [`ResultSink::persist`] returns where it went.
    pub fn result_path(&self, result: &AggregatedResult) -> PathBuf {
        self.dir.join(result_file_name(result))
    }
}

impl ResultSink for JsonResultStore {
    /// Write `result` and index it.
    ///
    /// Writing a result whose file already holds identical bytes is a no-op,
    /// so repeating a persist never duplicates index lines. A different
    /// result is never overwritten.
    fn persist(&self, result: &AggregatedResult) -> VerdictResult<String> {
        let bytes = to_json_bytes(result)?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.dir.join(numbered_file_name(result, attempt));
            match std::fs::read(&path) {
                Ok(existing) if existing == bytes => {
                    debug!(document = %result.document.name, path = %path.display(), "result already stored");
                    return Ok(path.display().to_string());
                }
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(VerdictError::PersistFailed {
                        reason: format!("failed to read '{}': {}", path.display(), e),
                    })
                }
            }

            if !write_new(&path, &bytes)? {
                continue;
            }
            self.index
                .append(&IndexEntry::for_result(&self.run_id, &self.experiment, result, &path))?;

            debug!(
                document = %result.document.name,
                final_status = %result.final_status,
                path = %path.display(),
                "result stored"
            );
            return Ok(path.display().to_string());
        }

        Err(VerdictError::PersistFailed {
            reason: format!(
                "no free result file name for '{}' after {} attempts",
                result.document.name, MAX_NAME_ATTEMPTS
            ),
        })
    }
}
