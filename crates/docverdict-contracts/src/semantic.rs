//! Semantic-check results: one per checker stage, plus the merged view.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::violation::{Severity, SeverityCounts};

/// Verdict of a semantic checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticStatus {
    Valid,
    Invalid,
    Uncertain,
    /// The checker's own output could not be read.
    ParseError,
    /// No checker ran.
    Skipped,
}

impl SemanticStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticStatus::Valid => "valid",
            SemanticStatus::Invalid => "invalid",
            SemanticStatus::Uncertain => "uncertain",
            SemanticStatus::ParseError => "parse_error",
            SemanticStatus::Skipped => "skipped",
        }
    }

    /// True for statuses that call for a human look without being a hard failure.
    pub fn is_doubtful(&self) -> bool {
        matches!(self, SemanticStatus::Uncertain | SemanticStatus::ParseError)
    }
}

impl fmt::Display for SemanticStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding reported by a semantic checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticIssue {
    #[serde(default)]
    pub field: String,
    /// Free-form issue kind (`mismatch`, `missing`, ...).
    #[serde(rename = "type", default)]
    pub issue_type: String,
    #[serde(default = "default_issue_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
}

fn default_issue_severity() -> Severity {
    Severity::Warning
}

/// Result of one semantic checker invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub status: SemanticStatus,
    #[serde(default)]
    pub issues: Vec<SemanticIssue>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub duration_seconds: f64,
    pub model: String,
    pub provider: String,
    /// The raw checker output, kept for audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl StageResult {
    /// A stage whose output could not be parsed.
    pub fn parse_error(
        provider: impl Into<String>,
        model: impl Into<String>,
        comments: impl Into<String>,
        raw_response: Option<String>,
    ) -> Self {
        Self {
            status: SemanticStatus::ParseError,
            issues: Vec::new(),
            comments: comments.into(),
            duration_seconds: 0.0,
            model: model.into(),
            provider: provider.into(),
            raw_response,
        }
    }
}

/// Merged outcome of all semantic stages for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedSemanticResult {
    pub status: SemanticStatus,
    pub issues: Vec<SemanticIssue>,
    pub comments: String,
    pub stages: Vec<StageResult>,
    pub duration_seconds_total: f64,
    pub models_used: Vec<String>,
    pub providers_used: Vec<String>,
    pub stats: SeverityCounts,
}

impl MergedSemanticResult {
    /// Sentinel used when no semantic checker is configured.
    pub fn skipped(comments: impl Into<String>) -> Self {
        Self {
            status: SemanticStatus::Skipped,
            issues: Vec::new(),
            comments: comments.into(),
            stages: Vec::new(),
            duration_seconds_total: 0.0,
            models_used: Vec::new(),
            providers_used: Vec::new(),
            stats: SeverityCounts::default(),
        }
    }
}
