//! Per-document outcome types: extractions and the aggregated verdict.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cross_model::CrossModelReport;
use crate::semantic::MergedSemanticResult;
use crate::value::Record;
use crate::violation::{SeverityCounts, ValidationReport};

/// Unique identifier for one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the input document (an image on disk).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// File name including extension.
    pub name: String,
    pub path: PathBuf,
}

impl DocumentRef {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }

    /// File name without its extension.
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// What one extractor returned for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub extractor_id: String,
    pub provider: String,
    pub model: String,
    pub data: Record,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(default)]
    pub duration_seconds: f64,
    /// Set when the extractor failed and `data` is a placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Extraction {
    /// A placeholder for an extractor that produced nothing usable.
    pub fn failed(
        extractor_id: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
        data: Record,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            extractor_id: extractor_id.into(),
            provider: provider.into(),
            model: model.into(),
            data,
            raw_response: None,
            duration_seconds: 0.0,
            error: Some(reason.into()),
        }
    }
}

/// All extractions for a document, with the primary singled out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub primary_extractor: String,
    pub primary: Record,
    pub extractions: Vec<Extraction>,
}

/// The three-valued per-document decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    Valid,
    ReviewNeeded,
    Invalid,
}

impl FinalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalStatus::Valid => "valid",
            FinalStatus::ReviewNeeded => "review_needed",
            FinalStatus::Invalid => "invalid",
        }
    }
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity counts per signal, as used by the decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounts {
    pub schema: SeverityCounts,
    pub rules: SeverityCounts,
    pub semantic: SeverityCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_model: Option<SeverityCounts>,
}

impl SignalCounts {
    pub fn total(&self) -> SeverityCounts {
        let mut total = SeverityCounts::default();
        total.add(self.schema);
        total.add(self.rules);
        total.add(self.semantic);
        if let Some(cross) = self.cross_model {
            total.add(cross);
        }
        total
    }
}

/// Everything the decision function needs for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionInput {
    pub document: DocumentRef,
    pub doc_type: String,
    pub extraction: ExtractionRecord,
    pub schema_validation: ValidationReport,
    pub rule_validation: ValidationReport,
    pub semantic_validation: MergedSemanticResult,
    /// `None` when only one extractor ran.
    pub cross_model_validation: Option<CrossModelReport>,
}

/// The single auditable output record per document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub document: DocumentRef,
    pub doc_type: String,
    pub final_status: FinalStatus,
    pub summary: String,
    pub counts: SignalCounts,
    pub extraction: ExtractionRecord,
    pub schema_validation: ValidationReport,
    pub rule_validation: ValidationReport,
    pub semantic_validation: MergedSemanticResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_model_validation: Option<CrossModelReport>,
    pub created_at: DateTime<Utc>,
}
