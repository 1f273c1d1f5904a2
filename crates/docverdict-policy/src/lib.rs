//! # docverdict-policy
//!
//! The decision function and the pipeline configuration for docverdict.
//!
//! ## Overview
//!
//! [`VerdictPolicy`] implements the
//! [`DecisionPolicy`](docverdict_core::traits::DecisionPolicy) trait: it counts
//! findings per signal, applies the strict `invalid` > `review_needed` >
//! `valid` ordering and writes a one-line summary.
//!
//! [`PipelineConfig`] is read from TOML and names the experiments (extractors
//! and semantic validator stages) a batch run can use.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use docverdict_policy::{PipelineConfig, VerdictPolicy};
//!
//! let config = PipelineConfig::from_file(Path::new("config/experiments.toml"))?;
//! let experiment = config.experiment("gpt_vs_pixtral")?;
//! // Pass `VerdictPolicy` to `DocumentPipeline::builder(...)`.
//! ```

pub mod config;
pub mod engine;

pub use config::{ExperimentConfig, ExtractorConfig, PipelineConfig, ValidatorConfig};
pub use engine::VerdictPolicy;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use docverdict_contracts::{
        cross_model::{Conflict, ConflictType, CrossModelReport},
        error::VerdictError,
        result::{DecisionInput, DocumentRef, ExtractionRecord, FinalStatus},
        semantic::{MergedSemanticResult, SemanticIssue, SemanticStatus},
        value::Record,
        violation::{Severity, ValidationReport, Violation},
    };
    use docverdict_core::traits::DecisionPolicy;

    use crate::{PipelineConfig, VerdictPolicy};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn report(severities: &[Severity]) -> ValidationReport {
        ValidationReport::from_violations(
            severities
                .iter()
                .map(|s| Violation::new("feld", "regel", *s, "nachricht"))
                .collect(),
        )
    }

    fn semantic(status: SemanticStatus, severities: &[Severity]) -> MergedSemanticResult {
        MergedSemanticResult {
            status,
            issues: severities
                .iter()
                .map(|s| SemanticIssue {
                    field: "betrag".to_string(),
                    issue_type: "mismatch".to_string(),
                    severity: *s,
                    message: String::new(),
                })
                .collect(),
            ..MergedSemanticResult::skipped("")
        }
    }

    fn cross(severities: &[Severity]) -> CrossModelReport {
        CrossModelReport::from_conflicts(
            severities
                .iter()
                .map(|s| Conflict {
                    field: "datum".to_string(),
                    severity: *s,
                    conflict_type: ConflictType::Mismatch,
                    message: String::new(),
                })
                .collect(),
        )
    }

    fn input(
        schema: &[Severity],
        rules: &[Severity],
        semantic: MergedSemanticResult,
        cross_model: Option<CrossModelReport>,
    ) -> DecisionInput {
        DecisionInput {
            document: DocumentRef::from_path("input/INV_0001.png"),
            doc_type: "rechnung".to_string(),
            extraction: ExtractionRecord {
                primary_extractor: "gpt".to_string(),
                primary: Record::new(),
                extractions: vec![],
            },
            schema_validation: report(schema),
            rule_validation: report(rules),
            semantic_validation: semantic,
            cross_model_validation: cross_model,
        }
    }

    fn status_of(input: DecisionInput) -> FinalStatus {
        VerdictPolicy::new().decide(input).final_status
    }

    // ── 1. decision precedence ────────────────────────────────────────────────

    /// No findings at all and a valid semantic check is valid.
    #[test]
    fn test_clean_document_is_valid() {
        let status = status_of(input(&[], &[], semantic(SemanticStatus::Valid, &[]), None));
        assert_eq!(status, FinalStatus::Valid);
    }

    /// Skipped semantic validation does not block a valid verdict.
    #[test]
    fn test_skipped_semantic_is_neutral() {
        let status = status_of(input(&[], &[], MergedSemanticResult::skipped("none"), None));
        assert_eq!(status, FinalStatus::Valid);
    }

    /// An error from any one signal makes the document invalid.
    #[test]
    fn test_any_error_is_invalid() {
        let valid = || semantic(SemanticStatus::Valid, &[]);
        assert_eq!(status_of(input(&[Severity::Error], &[], valid(), None)), FinalStatus::Invalid);
        assert_eq!(status_of(input(&[], &[Severity::Error], valid(), None)), FinalStatus::Invalid);
        assert_eq!(
            status_of(input(&[], &[], semantic(SemanticStatus::Valid, &[Severity::Error]), None)),
            FinalStatus::Invalid
        );
        assert_eq!(
            status_of(input(&[], &[], valid(), Some(cross(&[Severity::Error])))),
            FinalStatus::Invalid
        );
    }

    /// An invalid semantic status is enough on its own, and beats warnings.
    #[test]
    fn test_semantic_invalid_wins() {
        let status = status_of(input(
            &[Severity::Warning],
            &[],
            semantic(SemanticStatus::Invalid, &[]),
            None,
        ));
        assert_eq!(status, FinalStatus::Invalid);
    }

    /// Warnings and doubtful semantic statuses call for review.
    #[test]
    fn test_warnings_and_doubt_need_review() {
        let valid = || semantic(SemanticStatus::Valid, &[]);
        assert_eq!(status_of(input(&[Severity::Warning], &[], valid(), None)), FinalStatus::ReviewNeeded);
        assert_eq!(
            status_of(input(&[], &[], valid(), Some(cross(&[Severity::Warning])))),
            FinalStatus::ReviewNeeded
        );
        assert_eq!(
            status_of(input(&[], &[], semantic(SemanticStatus::ParseError, &[]), None)),
            FinalStatus::ReviewNeeded
        );
        assert_eq!(
            status_of(input(&[], &[], semantic(SemanticStatus::Uncertain, &[]), None)),
            FinalStatus::ReviewNeeded
        );
    }

    /// Info-level findings never change the verdict.
    #[test]
    fn test_infos_are_neutral() {
        let status = status_of(input(
            &[Severity::Info],
            &[Severity::Info],
            semantic(SemanticStatus::Valid, &[Severity::Info]),
            Some(cross(&[Severity::Info])),
        ));
        assert_eq!(status, FinalStatus::Valid);
    }

    // ── 2. summary and counts ─────────────────────────────────────────────────

    #[test]
    fn test_summary_lists_sections_in_order() {
        let result = VerdictPolicy::new().decide(input(
            &[Severity::Warning],
            &[Severity::Error, Severity::Info],
            semantic(SemanticStatus::Uncertain, &[Severity::Warning]),
            Some(cross(&[Severity::Info])),
        ));
        assert_eq!(
            result.summary,
            "Document: INV_0001.png \
             | Schema: errors=0, warnings=1, infos=0 \
             | Rules: errors=1, warnings=0, infos=1 \
             | Semantic: status=uncertain, errors=0, warnings=1, infos=0 \
             | Cross-model: errors=0, warnings=0, infos=1 \
             | Final status: invalid"
        );
        assert_eq!(result.counts.total().errors, 1);
        assert_eq!(result.counts.total().warnings, 2);
    }

    #[test]
    fn test_summary_omits_cross_model_when_not_run() {
        let result = VerdictPolicy::new().decide(input(&[], &[], semantic(SemanticStatus::Valid, &[]), None));
        assert!(!result.summary.contains("Cross-model"));
        assert!(result.summary.ends_with("Final status: valid"));
        assert!(result.counts.cross_model.is_none());
    }

    #[test]
    fn test_decide_at_uses_given_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 1, 9, 12, 0, 0).unwrap();
        let result = VerdictPolicy::new().decide_at(input(&[], &[], semantic(SemanticStatus::Valid, &[]), None), at);
        assert_eq!(result.created_at, at);
        assert_eq!(result.doc_type, "rechnung");
    }

    // ── 3. configuration ──────────────────────────────────────────────────────

    const CONFIG: &str = r#"
        [validation]
        allow_extra_keys = false

        [reconcile]
        fuzzy_cutoff = 0.9

        [[experiments]]
        name = "gpt_only"
        [[experiments.extractors]]
        id = "gpt"
        provider = "openai"
        model = "gpt-4o"

        [[experiments]]
        name = "gpt_vs_pixtral"
        primary_extractor = "pixtral"
        [[experiments.extractors]]
        id = "gpt"
        provider = "openai"
        model = "gpt-4o"
        [[experiments.extractors]]
        id = "pixtral"
        provider = "mistral"
        model = "pixtral-large-latest"
        [[experiments.validators]]
        id = "gpt-check"
        provider = "openai"
        model = "gpt-4o"
        max_tokens = 800
        [[experiments.validators]]
        id = "pixtral-check"
        provider = "mistral"
        model = "pixtral-large-latest"
        retry_on_parse_error = 1
        [experiments.validator_defaults]
        temperature = 0.2
    "#;

    #[test]
    fn test_config_parses_experiments() {
        let config = PipelineConfig::from_toml_str(CONFIG).unwrap();
        assert!(!config.validation.allow_extra_keys);
        assert_eq!(config.reconcile.fuzzy_cutoff, 0.9);
        assert_eq!(config.reconcile.numeric_tolerance, 0.01);
        assert_eq!(config.experiment_names(), ["gpt_only", "gpt_vs_pixtral"]);

        assert_eq!(config.experiment("gpt_only").unwrap().primary(), "gpt");

        let exp = config.experiment("gpt_vs_pixtral").unwrap();
        assert_eq!(exp.primary(), "pixtral");
        let validators = exp.resolved_validators();
        assert_eq!(validators.len(), 2);
        assert_eq!(validators[0].max_tokens, 800);
        assert_eq!(validators[0].temperature, 0.2);
        assert_eq!(validators[0].retry_on_parse_error, 0);
        assert_eq!(validators[1].max_tokens, 1200);
        assert_eq!(validators[1].retry_on_parse_error, 1);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert!(config.validation.allow_extra_keys);
        assert_eq!(config.reconcile.fuzzy_cutoff, 0.92);
        assert!(config.experiments.is_empty());
    }

    #[test]
    fn test_unknown_experiment_lists_available() {
        let config = PipelineConfig::from_toml_str(CONFIG).unwrap();
        match config.experiment("claude_only") {
            Err(VerdictError::ConfigError { reason }) => {
                assert!(reason.contains("claude_only"), "{reason}");
                assert!(reason.contains("gpt_only, gpt_vs_pixtral"), "{reason}");
            }
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn test_primary_must_be_an_extractor() {
        let toml = r#"
            [[experiments]]
            name = "broken"
            primary_extractor = "claude"
            [[experiments.extractors]]
            id = "gpt"
            provider = "openai"
            model = "gpt-4o"
        "#;
        match PipelineConfig::from_toml_str(toml) {
            Err(VerdictError::ConfigError { reason }) => assert!(reason.contains("claude"), "{reason}"),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn test_experiment_without_extractors_is_rejected() {
        let toml = r#"
            [[experiments]]
            name = "empty"
            extractors = []
        "#;
        assert!(matches!(
            PipelineConfig::from_toml_str(toml),
            Err(VerdictError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = PipelineConfig::from_toml_str("[[experiments]\nname = ");
        match result {
            Err(VerdictError::ConfigError { reason }) => assert!(reason.contains("failed to parse")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiments.toml");
        std::fs::write(&path, CONFIG).unwrap();
        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.experiments.len(), 2);

        let missing = PipelineConfig::from_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(VerdictError::ConfigError { .. })));
    }
}
