//! Batch processing over many documents.
//!
//! Documents are independent: a failure on one (unknown type, persistence
//! error) is logged with its reason and recorded as a skip, and the batch
//! moves on.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use docverdict_contracts::{
    error::{VerdictError, VerdictResult},
    result::{DocumentRef, FinalStatus},
};

use crate::{pipeline::DocumentPipeline, traits::ResultSink};

/// Image extensions picked up by [`discover_documents`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// A document that produced a persisted result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedDocument {
    pub document: DocumentRef,
    pub doc_type: String,
    pub final_status: FinalStatus,
    pub location: String,
}

/// A document that was skipped, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDocument {
    pub document: DocumentRef,
    pub reason: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub processed: Vec<ProcessedDocument>,
    pub skipped: Vec<SkippedDocument>,
}

impl BatchReport {
    /// Number of processed documents per final status.
    pub fn status_counts(&self) -> BTreeMap<FinalStatus, usize> {
        let mut counts = BTreeMap::new();
        for doc in &self.processed {
            *counts.entry(doc.final_status).or_insert(0) += 1;
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.processed.len() + self.skipped.len()
    }
}

/// Drives a pipeline over a list of documents and persists each result.
pub struct BatchRunner<'a> {
    pipeline: &'a DocumentPipeline,
    sink: &'a dyn ResultSink,
}

impl<'a> BatchRunner<'a> {
    pub fn new(pipeline: &'a DocumentPipeline, sink: &'a dyn ResultSink) -> Self {
        Self { pipeline, sink }
    }

    /// Process and persist every document in order.
    pub fn run(&self, documents: &[DocumentRef]) -> BatchReport {
        let mut report = BatchReport::default();

        for (index, document) in documents.iter().enumerate() {
            info!(
                document = %document.name,
                position = index + 1,
                total = documents.len(),
                "processing"
            );

            let outcome = self
                .pipeline
                .process(document)
                .and_then(|result| {
                    let location = self.sink.persist(&result)?;
                    Ok(ProcessedDocument {
                        document: document.clone(),
                        doc_type: result.doc_type,
                        final_status: result.final_status,
                        location,
                    })
                });

            match outcome {
                Ok(processed) => report.processed.push(processed),
                Err(e) => {
                    warn!(document = %document.name, reason = %e, "document skipped");
                    report.skipped.push(SkippedDocument {
                        document: document.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            "batch finished"
        );
        report
    }
}

/// All supported images below `dir`, sorted by path.
pub fn discover_documents(dir: &Path) -> VerdictResult<Vec<DocumentRef>> {
    let mut paths = Vec::new();
    collect_images(dir, &mut paths)?;
    paths.sort();
    Ok(paths.into_iter().map(DocumentRef::from_path).collect())
}

fn collect_images(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> VerdictResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| VerdictError::ConfigError {
        reason: format!("failed to read input directory '{}': {}", dir.display(), e),
    })?;
    for entry in entries {
        let path = entry
            .map_err(|e| VerdictError::ConfigError {
                reason: format!("failed to read entry in '{}': {}", dir.display(), e),
            })?
            .path();
        if path.is_dir() {
            collect_images(&path, out)?;
        } else if path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        {
            out.push(path);
        }
    }
    Ok(())
}
