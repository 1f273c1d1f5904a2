//! Cross-model reconciliation results.

use serde::{Deserialize, Serialize};

use crate::violation::{Severity, SeverityCounts};

/// What kind of disagreement two extractions have on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    MissingKey,
    TypeMismatch,
    Mismatch,
}

/// A disagreement on one field (or sub-field) between two extractions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub field: String,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub message: String,
}

/// Outcome of comparing a primary extraction against one or more others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossModelReport {
    /// True iff no conflict at `Error` or `Warning` level was found.
    pub is_consistent: bool,
    pub conflicts: Vec<Conflict>,
    pub stats: SeverityCounts,
}

impl CrossModelReport {
    pub fn from_conflicts(conflicts: Vec<Conflict>) -> Self {
        let stats = SeverityCounts::from_severities(conflicts.iter().map(|c| c.severity));
        Self {
            is_consistent: stats.errors == 0 && stats.warnings == 0,
            conflicts,
            stats,
        }
    }

    /// Combine the reports from several secondary extractors into one.
    pub fn merge_all(reports: impl IntoIterator<Item = CrossModelReport>) -> Self {
        Self::from_conflicts(reports.into_iter().flat_map(|r| r.conflicts).collect())
    }
}
