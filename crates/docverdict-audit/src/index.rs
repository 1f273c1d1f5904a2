//! The append-only run index (`index.jsonl`).
//!
//! One JSON object per line, one line per persisted result. Downstream
//! metrics read it; the pipeline never does.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docverdict_contracts::{
    error::{VerdictError, VerdictResult},
    result::{AggregatedResult, DocumentRef, FinalStatus, RunId},
};

/// One line of the run index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub run_id: String,
    pub experiment: String,
    pub doc_type: String,
    pub document: DocumentRef,
    pub created_at: DateTime<Utc>,
    pub final_status: FinalStatus,
    pub result_file: PathBuf,
    pub summary: String,
}

impl IndexEntry {
    pub fn for_result(run_id: &RunId, experiment: &str, result: &AggregatedResult, result_file: &Path) -> Self {
        Self {
            run_id: run_id.to_string(),
            experiment: experiment.to_string(),
            doc_type: result.doc_type.clone(),
            document: result.document.clone(),
            created_at: result.created_at,
            final_status: result.final_status,
            result_file: result_file.to_path_buf(),
            summary: result.summary.clone(),
        }
    }
}

/// Handle on an index file.
#[derive(Debug, Clone)]
pub struct RunIndex {
    path: PathBuf,
}

impl RunIndex {
    pub const FILE_NAME: &'static str = "index.jsonl";

    /// Use the index at `path`, creating an empty file if it is missing.
    pub fn create(path: impl Into<PathBuf>) -> VerdictResult<Self> {
        let path = path.into();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| VerdictError::PersistFailed {
                reason: format!("failed to create index '{}': {}", path.display(), e),
            })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry as a single line.
    pub fn append(&self, entry: &IndexEntry) -> VerdictResult<()> {
        let fail = |reason: String| VerdictError::PersistFailed {
            reason: format!("failed to append to index '{}': {}", self.path.display(), reason),
        };

        let mut line = serde_json::to_string(entry).map_err(|e| fail(e.to_string()))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| fail(e.to_string()))?;
        file.write_all(line.as_bytes()).map_err(|e| fail(e.to_string()))
    }

    /// Every entry in file order. Blank lines are ignored.
    pub fn read(path: &Path) -> VerdictResult<Vec<IndexEntry>> {
        let contents = std::fs::read_to_string(path).map_err(|e| VerdictError::ConfigError {
            reason: format!("failed to read index '{}': {}", path.display(), e),
        })?;

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| VerdictError::ConfigError {
                    reason: format!("malformed index line {} in '{}': {}", n + 1, path.display(), e),
                })
            })
            .collect()
    }
}
