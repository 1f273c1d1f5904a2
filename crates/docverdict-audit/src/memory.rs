//! In-memory implementation of `ResultSink`.
//!
//! Keeps every persisted result in a `Vec` behind an `Arc<Mutex<_>>`. Used by
//! the demo scenarios and by tests that want to inspect what a batch run
//! produced without touching the filesystem.

use std::sync::{Arc, Mutex};

use docverdict_contracts::{
    error::{VerdictError, VerdictResult},
    result::AggregatedResult,
};
use docverdict_core::traits::ResultSink;

#[derive(Debug, Clone, Default)]
pub struct InMemoryResultSink {
    results: Arc<Mutex<Vec<AggregatedResult>>>,
}

impl InMemoryResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything persisted so far, in persist order.
    pub fn results(&self) -> Vec<AggregatedResult> {
        self.results
            .lock()
            .map(|results| results.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.results.lock().map(|results| results.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultSink for InMemoryResultSink {
    /// Returns `memory:<position>` as the location. An identical result
    /// that is already stored keeps its position.
    fn persist(&self, result: &AggregatedResult) -> VerdictResult<String> {
        let mut results = self.results.lock().map_err(|e| VerdictError::PersistFailed {
            reason: format!("result store lock poisoned: {}", e),
        })?;
        let position = match results.iter().position(|stored| stored == result) {
            Some(existing) => existing,
            None => {
                results.push(result.clone());
                results.len() - 1
            }
        };
        Ok(format!("memory:{position}"))
    }
}
