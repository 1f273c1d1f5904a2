//! Run metrics over persisted results.
//!
//! Reads an experiment directory (its `index.jsonl` and the result files it
//! points to) and reports per-document and aggregate figures: final-status
//! distribution, audit readiness, semantic stability, cross-model conflict
//! totals and, where ground truth exists, field accuracy.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use docverdict_contracts::{
    error::{VerdictError, VerdictResult},
    result::{AggregatedResult, FinalStatus},
    semantic::{MergedSemanticResult, SemanticStatus},
    value::{record_from_json, Record, Value},
    violation::{Severity, SeverityCounts},
};
use docverdict_verify::reconcile::values_equal;

use crate::index::RunIndex;

/// Numeric tolerance when comparing against ground truth.
pub const GROUND_TRUTH_TOLERANCE: f64 = 0.01;

/// How many fields [`MetricsSummary::top_conflict_fields`] keeps.
pub const TOP_CONFLICT_FIELDS: usize = 5;

/// Ground-truth records keyed by `(doc_type, stem)`.
#[derive(Debug, Clone, Default)]
pub struct GroundTruth {
    records: BTreeMap<(String, String), Record>,
}

impl GroundTruth {
    /// Load `<root>/<doc_type>/<stem>.json` files.
    ///
    /// Files that are not JSON objects are skipped with a warning.
    pub fn load(root: &Path) -> VerdictResult<Self> {
        let read_dir = |dir: &Path| {
            std::fs::read_dir(dir).map_err(|e| VerdictError::ConfigError {
                reason: format!("failed to read ground truth directory '{}': {}", dir.display(), e),
            })
        };

        let mut truth = Self::default();
        for type_dir in read_dir(root)?.flatten().map(|e| e.path()).filter(|p| p.is_dir()) {
            let doc_type = file_label(&type_dir, |p| p.file_name()).to_lowercase();
            for file in read_dir(&type_dir)?.flatten().map(|e| e.path()) {
                if file.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let parsed = std::fs::read_to_string(&file)
                    .ok()
                    .and_then(|s| serde_json::from_str(&s).ok())
                    .and_then(record_from_json);
                match parsed {
                    Some(record) => {
                        truth.insert(&doc_type, &file_label(&file, |p| p.file_stem()), record);
                    }
                    None => warn!(path = %file.display(), "ignoring unreadable ground truth file"),
                }
            }
        }
        debug!(records = truth.len(), root = %root.display(), "ground truth loaded");
        Ok(truth)
    }

    pub fn insert(&mut self, doc_type: &str, stem: &str, record: Record) {
        self.records.insert((doc_type.to_string(), stem.to_string()), record);
    }

    pub fn get(&self, doc_type: &str, stem: &str) -> Option<&Record> {
        self.records.get(&(doc_type.to_string(), stem.to_string()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn file_label(path: &Path, part: impl Fn(&Path) -> Option<&std::ffi::OsStr>) -> String {
    part(path).map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Correct fields out of the ground-truth fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldAccuracy {
    pub correct: usize,
    pub total: usize,
}

impl FieldAccuracy {
    /// Share of correct fields; `1.0` when there is nothing to check.
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Compare `extracted` against every field of `truth`. A field missing from
/// the extraction counts as null.
pub fn field_accuracy(extracted: &Record, truth: &Record) -> FieldAccuracy {
    let correct = truth
        .iter()
        .filter(|(field, expected)| {
            let actual = extracted.get(field.as_str()).unwrap_or(&Value::Null);
            values_equal(expected, actual, GROUND_TRUTH_TOLERANCE)
        })
        .count();
    FieldAccuracy {
        correct,
        total: truth.len(),
    }
}

/// Share of semantic stages that agree with the first stage's status.
pub fn semantic_stability(semantic: &MergedSemanticResult) -> f64 {
    match semantic.stages.split_first() {
        Some((first, rest)) if !rest.is_empty() => {
            let agreeing = semantic.stages.iter().filter(|s| s.status == first.status).count();
            agreeing as f64 / semantic.stages.len() as f64
        }
        _ => 1.0,
    }
}

/// Schema valid, no rule errors, semantic status not `invalid`, and the
/// cross-model check (if it ran) consistent.
pub fn audit_ready(result: &AggregatedResult) -> bool {
    result.schema_validation.is_valid
        && result.rule_validation.is_valid
        && result.semantic_validation.status != SemanticStatus::Invalid
        && result
            .cross_model_validation
            .as_ref()
            .map_or(true, |cross| cross.is_consistent)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentMetrics {
    pub document: String,
    pub doc_type: String,
    pub final_status: FinalStatus,
    pub semantic_status: SemanticStatus,
    pub semantic_stability: f64,
    pub audit_ready: bool,
    /// `None` without ground truth for this document.
    pub field_accuracy: Option<FieldAccuracy>,
    pub cross_model_conflicts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCount {
    pub field: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub num_documents: usize,
    pub status_counts: BTreeMap<FinalStatus, usize>,
    pub audit_readiness_rate: f64,
    pub mean_semantic_stability: f64,
    /// Mean over documents that have ground truth.
    pub mean_field_accuracy: Option<f64>,
    pub documents_with_ground_truth: usize,
    pub cross_model: SeverityCounts,
    /// Fields with the most error or warning conflicts, most frequent first.
    pub top_conflict_fields: Vec<FieldCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentMetrics {
    pub experiment: String,
    pub documents: Vec<DocumentMetrics>,
    pub summary: MetricsSummary,
}

/// Metrics over results already in memory.
pub fn evaluate_results(experiment: &str, results: &[AggregatedResult], truth: &GroundTruth) -> ExperimentMetrics {
    let mut status_counts = BTreeMap::new();
    let mut cross_model = SeverityCounts::default();
    let mut conflict_fields: BTreeMap<&str, usize> = BTreeMap::new();
    let mut documents = Vec::with_capacity(results.len());

    for result in results {
        *status_counts.entry(result.final_status).or_insert(0) += 1;

        let conflicts = result
            .cross_model_validation
            .as_ref()
            .map(|c| c.conflicts.as_slice())
            .unwrap_or_default();
        for conflict in conflicts {
            cross_model.record(conflict.severity);
            if conflict.severity != Severity::Info {
                *conflict_fields.entry(conflict.field.as_str()).or_insert(0) += 1;
            }
        }

        documents.push(DocumentMetrics {
            document: result.document.stem(),
            doc_type: result.doc_type.clone(),
            final_status: result.final_status,
            semantic_status: result.semantic_validation.status,
            semantic_stability: round4(semantic_stability(&result.semantic_validation)),
            audit_ready: audit_ready(result),
            field_accuracy: truth
                .get(&result.doc_type, &result.document.stem())
                .map(|expected| field_accuracy(&result.extraction.primary, expected)),
            cross_model_conflicts: conflicts.len(),
        });
    }

    let mut top_conflict_fields: Vec<FieldCount> = conflict_fields
        .into_iter()
        .map(|(field, count)| FieldCount {
            field: field.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps ties in field-name order.
    top_conflict_fields.sort_by(|a, b| b.count.cmp(&a.count));
    top_conflict_fields.truncate(TOP_CONFLICT_FIELDS);

    let accuracies: Vec<f64> = documents
        .iter()
        .filter_map(|d| d.field_accuracy.map(|a| a.rate()))
        .collect();

    let summary = MetricsSummary {
        num_documents: documents.len(),
        status_counts,
        audit_readiness_rate: round4(mean(documents.iter().map(|d| if d.audit_ready { 1.0 } else { 0.0 }))),
        mean_semantic_stability: round4(mean(documents.iter().map(|d| d.semantic_stability))),
        mean_field_accuracy: (!accuracies.is_empty()).then(|| round4(mean(accuracies.iter().copied()))),
        documents_with_ground_truth: accuracies.len(),
        cross_model,
        top_conflict_fields,
    };

    ExperimentMetrics {
        experiment: experiment.to_string(),
        documents,
        summary,
    }
}

/// Metrics for the experiment output directory `dir`.
///
/// Reads `index.jsonl` and every result file it lists. The experiment name
/// is taken from the directory name.
pub fn evaluate_experiment(dir: &Path, truth: &GroundTruth) -> VerdictResult<ExperimentMetrics> {
    let entries = RunIndex::read(&dir.join(RunIndex::FILE_NAME))?;
    let results = entries
        .iter()
        .map(|entry| {
            let contents = std::fs::read_to_string(&entry.result_file).map_err(|e| VerdictError::ConfigError {
                reason: format!("failed to read result file '{}': {}", entry.result_file.display(), e),
            })?;
            serde_json::from_str::<AggregatedResult>(&contents).map_err(|e| VerdictError::ConfigError {
                reason: format!("malformed result file '{}': {}", entry.result_file.display(), e),
            })
        })
        .collect::<VerdictResult<Vec<_>>>()?;

    let experiment = file_label(dir, |p| p.file_name());
    Ok(evaluate_results(&experiment, &results, truth))
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
