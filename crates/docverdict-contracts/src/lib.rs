//! # docverdict-contracts
//!
//! Shared types and contracts for the docverdict validation engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions, registration-time consistency checks,
//! and the error type.

pub mod cross_model;
pub mod document;
pub mod error;
pub mod result;
pub mod rule;
pub mod schema;
pub mod semantic;
pub mod value;
pub mod violation;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use cross_model::{Conflict, ConflictType, CrossModelReport};
    use document::{alias_table, DocumentType};
    use error::VerdictError;
    use result::FinalStatus;
    use rule::RuleKind;
    use schema::{DType, FieldSpec, FieldSpecMap};
    use semantic::SemanticIssue;
    use value::{record_from_json, Value};
    use violation::{Severity, ValidationReport, Violation};

    fn invoice_schema() -> FieldSpecMap {
        FieldSpecMap::from_fields(
            "rechnung",
            [
                ("typ", FieldSpec::required(DType::String, "rechnung", "Dokumenttyp")),
                ("total_net", FieldSpec::required(DType::Float, 100.0, "Netto")),
                ("total_vat", FieldSpec::required(DType::Float, 19.0, "MwSt")),
                ("total_gross", FieldSpec::required(DType::Float, 119.0, "Brutto")),
                ("notiz", FieldSpec::optional(DType::String, "", "Notiz")),
            ],
        )
        .unwrap()
    }

    // ── Value ────────────────────────────────────────────────────────────────

    #[test]
    fn json_numbers_keep_integer_float_distinction() {
        let record = record_from_json(json!({ "a": 2, "b": 2.5, "c": true })).unwrap();
        assert_eq!(record["a"], Value::Integer(2));
        assert_eq!(record["b"], Value::Float(2.5));
        assert_eq!(record["c"], Value::Bool(true));
    }

    #[test]
    fn record_from_json_rejects_non_objects() {
        assert!(record_from_json(json!([1, 2])).is_none());
        assert!(record_from_json(json!("text")).is_none());
    }

    #[test]
    fn empty_values() {
        assert!(Value::Null.is_empty_value());
        assert!(Value::from("").is_empty_value());
        assert!(Value::List(vec![]).is_empty_value());
        assert!(Value::Object(Default::default()).is_empty_value());
        assert!(!Value::from(" ").is_empty_value());
        assert!(!Value::Integer(0).is_empty_value());
        assert!(!Value::Bool(false).is_empty_value());
    }

    #[test]
    fn value_serializes_as_plain_json() {
        let value = Value::List(vec![Value::Integer(1), Value::from("x"), Value::Null]);
        assert_eq!(serde_json::to_value(&value).unwrap(), json!([1, "x", null]));
    }

    #[test]
    fn booleans_are_not_numbers() {
        assert_eq!(Value::Bool(true).as_f64(), None);
        assert_eq!(Value::Integer(3).as_f64(), Some(3.0));
    }

    // ── DType ────────────────────────────────────────────────────────────────

    #[test]
    fn float_accepts_integers_but_integer_rejects_floats() {
        assert!(DType::Float.matches(&Value::Integer(100)));
        assert!(!DType::Integer.matches(&Value::Float(1.5)));
    }

    #[test]
    fn boolean_is_never_an_integer() {
        assert!(!DType::Integer.matches(&Value::Bool(true)));
        assert!(DType::Boolean.matches(&Value::Bool(true)));
    }

    // ── FieldSpecMap ─────────────────────────────────────────────────────────

    #[test]
    fn field_spec_map_preserves_declaration_order() {
        let schema = invoice_schema();
        let keys: Vec<&str> = schema.keys().collect();
        assert_eq!(keys, ["typ", "total_net", "total_vat", "total_gross", "notiz"]);
    }

    #[test]
    fn field_spec_map_rejects_duplicates() {
        let result = FieldSpecMap::from_fields(
            "rechnung",
            [
                ("datum", FieldSpec::required(DType::String, "01.01.2026", "Datum")),
                ("datum", FieldSpec::optional(DType::String, "01.01.2026", "Datum")),
            ],
        );
        match result {
            Err(VerdictError::InvalidSchema { reason, .. }) => assert!(reason.contains("datum")),
            other => panic!("expected InvalidSchema, got {other:?}"),
        }
    }

    #[test]
    fn field_spec_map_rejects_empty_names() {
        let result = FieldSpecMap::from_fields(
            "rechnung",
            [(" ", FieldSpec::required(DType::String, "", "leer"))],
        );
        assert!(matches!(result, Err(VerdictError::InvalidSchema { .. })));
    }

    #[test]
    fn required_fields_and_example_record() {
        let schema = invoice_schema();
        assert_eq!(
            schema.required_fields(),
            ["typ", "total_net", "total_vat", "total_gross"]
        );
        let example = schema.example_record();
        assert_eq!(example["total_gross"], Value::Float(119.0));
        assert_eq!(example.len(), 5);
    }

    // ── Severity and reports ─────────────────────────────────────────────────

    #[test]
    fn severity_labels() {
        assert_eq!(Severity::from_label(None), Severity::Warning);
        assert_eq!(Severity::from_label(Some("ERROR")), Severity::Error);
        assert_eq!(Severity::from_label(Some("warning")), Severity::Warning);
        assert_eq!(Severity::from_label(Some("critical")), Severity::Info);
    }

    #[test]
    fn report_validity_tracks_error_violations_only() {
        let warn_only = ValidationReport::from_violations(vec![Violation::new(
            "x",
            "type_mismatch",
            Severity::Warning,
            "w",
        )]);
        assert!(warn_only.is_valid);

        let with_error = ValidationReport::from_violations(vec![Violation::new(
            "x",
            "required",
            Severity::Error,
            "e",
        )]);
        assert!(!with_error.is_valid);
        assert_eq!(with_error.stats().errors, 1);
    }

    #[test]
    fn info_conflicts_keep_a_report_consistent() {
        let report = CrossModelReport::from_conflicts(vec![Conflict {
            field: "notiz".to_string(),
            severity: Severity::Info,
            conflict_type: ConflictType::MissingKey,
            message: "no value in either extraction".to_string(),
        }]);
        assert!(report.is_consistent);
        assert_eq!(report.stats.infos, 1);
    }

    #[test]
    fn merge_all_sums_conflicts() {
        let conflict = |severity| Conflict {
            field: "f".to_string(),
            severity,
            conflict_type: ConflictType::Mismatch,
            message: String::new(),
        };
        let merged = CrossModelReport::merge_all([
            CrossModelReport::from_conflicts(vec![conflict(Severity::Warning)]),
            CrossModelReport::from_conflicts(vec![conflict(Severity::Error)]),
        ]);
        assert_eq!(merged.conflicts.len(), 2);
        assert!(!merged.is_consistent);
    }

    #[test]
    fn semantic_issue_defaults_missing_severity_to_warning() {
        let issue: SemanticIssue =
            serde_json::from_value(json!({ "field": "datum", "type": "mismatch" })).unwrap();
        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(issue.issue_type, "mismatch");
    }

    #[test]
    fn final_status_serializes_snake_case() {
        let json = serde_json::to_string(&FinalStatus::ReviewNeeded).unwrap();
        assert_eq!(json, "\"review_needed\"");
    }

    // ── DocumentType ─────────────────────────────────────────────────────────

    #[test]
    fn document_type_rejects_alias_for_undeclared_field() {
        let result = DocumentType::new(
            "rechnung",
            "Rechnung",
            Some("inv"),
            invoice_schema(),
            vec![],
            alias_table(&[("anschrift", &["adresse"])]),
        );
        match result {
            Err(VerdictError::InvalidSchema { reason, .. }) => assert!(reason.contains("anschrift")),
            other => panic!("expected InvalidSchema, got {other:?}"),
        }
    }

    #[test]
    fn document_type_rejects_rule_on_undeclared_field() {
        let result = DocumentType::new(
            "rechnung",
            "Rechnung",
            None,
            invoice_schema(),
            vec![RuleKind::Positive {
                field: "betrag".to_string(),
                rule: "amount_nonpositive".to_string(),
            }],
            Default::default(),
        );
        assert!(matches!(result, Err(VerdictError::InvalidSchema { .. })));
    }

    #[test]
    fn rule_references_top_level_fields_only() {
        let sum = RuleKind::SumConsistency {
            parts: vec!["totals.net".to_string(), "totals.vat".to_string()],
            total: "total_gross".to_string(),
            tolerance: 0.02,
            require_all_parts: true,
            rule: "totals_mismatch".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(sum.referenced_fields(), ["totals", "totals", "total_gross"]);

        let required = RuleKind::RequiredNonEmpty {
            fields: vec!["absender.name".to_string(), "datum".to_string()],
        };
        assert_eq!(required.referenced_fields(), ["absender", "datum"]);
        assert!(RuleKind::Custom { name: "x".to_string() }.referenced_fields().is_empty());
    }

    #[test]
    fn document_type_normalizes_id_and_prefix() {
        let doc = DocumentType::new(
            " Rechnung ",
            "Rechnung",
            Some("inv"),
            invoice_schema(),
            vec![],
            alias_table(&[("total_gross", &["gesamt", "total"])]),
        )
        .unwrap();
        assert_eq!(doc.id, "rechnung");
        assert_eq!(doc.filename_prefix.as_deref(), Some("INV"));
        assert_eq!(doc.aliases_for("total_gross"), ["gesamt", "total"]);
        assert!(doc.aliases_for("typ").is_empty());
    }

    // ── VerdictError display messages ────────────────────────────────────────

    #[test]
    fn error_unknown_document_type_lists_available() {
        let err = VerdictError::UnknownDocumentType {
            doc_type: "lieferschein".to_string(),
            available: vec!["rechnung".to_string(), "bescheid".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("lieferschein"));
        assert!(msg.contains("rechnung, bescheid"));
    }

    #[test]
    fn error_persist_failed_display() {
        let err = VerdictError::PersistFailed {
            reason: "disk full".to_string(),
        };
        assert!(err.to_string().contains("disk full"));
    }
}
