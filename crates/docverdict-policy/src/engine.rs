//! The decision function.
//!
//! `VerdictPolicy` folds the four signals for one document into a final
//! status:
//!
//! 1. `invalid` if the semantic status is `invalid` or any signal produced an
//!    error-level finding.
//! 2. Otherwise `review_needed` if the semantic status is `uncertain` or
//!    `parse_error`, or any signal produced a warning.
//! 3. Otherwise `valid`.
//!
//! Info-level findings never change the status.

use chrono::{DateTime, Utc};
use tracing::debug;

use docverdict_contracts::{
    result::{AggregatedResult, DecisionInput, FinalStatus, SignalCounts},
    semantic::SemanticStatus,
    violation::SeverityCounts,
};
use docverdict_core::traits::DecisionPolicy;

/// The three-level decision with a one-line summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerdictPolicy;

impl VerdictPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Decide with an explicit timestamp instead of the wall clock.
    pub fn decide_at(&self, input: DecisionInput, created_at: DateTime<Utc>) -> AggregatedResult {
        let counts = SignalCounts {
            schema: input.schema_validation.stats(),
            rules: input.rule_validation.stats(),
            semantic: SeverityCounts::from_severities(
                input.semantic_validation.issues.iter().map(|issue| issue.severity),
            ),
            cross_model: input
                .cross_model_validation
                .as_ref()
                .map(|report| SeverityCounts::from_severities(report.conflicts.iter().map(|c| c.severity))),
        };

        let semantic_status = input.semantic_validation.status;
        let final_status = final_status(semantic_status, &counts);
        let summary = summary(&input.document.name, semantic_status, &counts, final_status);

        debug!(
            document = %input.document.name,
            %final_status,
            errors = counts.total().errors,
            warnings = counts.total().warnings,
            "decision made"
        );

        AggregatedResult {
            document: input.document,
            doc_type: input.doc_type,
            final_status,
            summary,
            counts,
            extraction: input.extraction,
            schema_validation: input.schema_validation,
            rule_validation: input.rule_validation,
            semantic_validation: input.semantic_validation,
            cross_model_validation: input.cross_model_validation,
            created_at,
        }
    }
}

impl DecisionPolicy for VerdictPolicy {
    fn decide(&self, input: DecisionInput) -> AggregatedResult {
        self.decide_at(input, Utc::now())
    }
}

/// The strict `invalid` > `review_needed` > `valid` ordering.
pub fn final_status(semantic: SemanticStatus, counts: &SignalCounts) -> FinalStatus {
    let total = counts.total();
    if semantic == SemanticStatus::Invalid || total.errors > 0 {
        FinalStatus::Invalid
    } else if semantic.is_doubtful() || total.warnings > 0 {
        FinalStatus::ReviewNeeded
    } else {
        FinalStatus::Valid
    }
}

/// Per-signal counts in a fixed section order, joined with ` | `.
///
/// The cross-model section only appears when reconciliation ran.
pub fn summary(
    document_name: &str,
    semantic: SemanticStatus,
    counts: &SignalCounts,
    final_status: FinalStatus,
) -> String {
    let mut parts = vec![
        format!("Document: {document_name}"),
        format!("Schema: {}", render(counts.schema)),
        format!("Rules: {}", render(counts.rules)),
        format!("Semantic: status={semantic}, {}", render(counts.semantic)),
    ];
    if let Some(cross) = counts.cross_model {
        parts.push(format!("Cross-model: {}", render(cross)));
    }
    parts.push(format!("Final status: {final_status}"));
    parts.join(" | ")
}

fn render(counts: SeverityCounts) -> String {
    format!(
        "errors={}, warnings={}, infos={}",
        counts.errors, counts.warnings, counts.infos
    )
}
