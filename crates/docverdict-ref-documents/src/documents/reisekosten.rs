//! `reisekosten`: travel expense claim.

use docverdict_contracts::{
    document::{alias_table, AliasTable, DocumentType},
    error::VerdictResult,
    rule::RuleKind,
    schema::{DType, FieldSpec, FieldSpecMap},
    value::Value,
    violation::Severity,
};

use super::{date_format, date_order, object, required, TYP_ALIASES};

pub const DOC_TYPE: &str = "reisekosten";

pub fn schema() -> VerdictResult<FieldSpecMap> {
    let costs = object(&[
        ("transport", Value::Float(96.60)),
        ("hotel", Value::Float(258.07)),
        ("tagegeld", Value::Float(84.00)),
    ]);
    FieldSpecMap::from_fields(
        DOC_TYPE,
        [
            ("typ", FieldSpec::required(DType::String, DOC_TYPE, "Dokumenttyp")),
            ("mitarbeiter", FieldSpec::required(DType::String, "Herr Hans Dieter Conradi", "Mitarbeiter")),
            ("zielort", FieldSpec::required(DType::String, "Mittweida", "Reiseziel")),
            ("start", FieldSpec::required(DType::String, "03.01.2026", "Startdatum")),
            ("ende", FieldSpec::required(DType::String, "05.01.2026", "Enddatum")),
            (
                "kosten_details",
                FieldSpec::required(DType::Object, costs, "Kostenaufschlüsselung (transport/hotel/tagegeld)"),
            ),
            (
                "erstattungsbetrag",
                FieldSpec::required(DType::Float, 438.67, "Erstattungsbetrag (Summe)"),
            ),
        ],
    )
}

/// Cost parts summed against `erstattungsbetrag`. Missing parts are skipped.
const COST_PARTS: [&str; 3] = [
    "kosten_details.transport",
    "kosten_details.hotel",
    "kosten_details.tagegeld",
];

pub fn rules() -> Vec<RuleKind> {
    vec![
        required(&["mitarbeiter", "zielort", "start", "ende", "kosten_details", "erstattungsbetrag"]),
        date_format("start", Severity::Error),
        date_format("ende", Severity::Error),
        date_order("start", "ende", "start/ende", "date_range"),
        RuleKind::SumConsistency {
            parts: COST_PARTS.map(String::from).to_vec(),
            total: "erstattungsbetrag".to_string(),
            tolerance: 0.05,
            require_all_parts: false,
            rule: "sum_mismatch".to_string(),
            severity: Severity::Warning,
        },
    ]
}

pub fn aliases() -> AliasTable {
    alias_table(&[
        ("typ", TYP_ALIASES),
        ("mitarbeiter", &["mitarbeiter", "name", "employee", "traveler"]),
        ("zielort", &["zielort", "destination", "city", "reiseort"]),
        ("start", &["start", "von", "start_date", "reise_von"]),
        ("ende", &["ende", "bis", "end_date", "reise_bis"]),
        ("kosten_details", &["kosten_details", "kosten", "details", "breakdown"]),
        ("erstattungsbetrag", &["erstattungsbetrag", "total", "summe", "reimbursement", "total_amount"]),
    ])
}

pub fn document_type() -> VerdictResult<DocumentType> {
    DocumentType::new(DOC_TYPE, "Reisekostenabrechnung", Some("EXP"), schema()?, rules(), aliases())
}

#[cfg(test)]
mod tests {
    use docverdict_contracts::{value::Value, violation::Severity};
    use docverdict_verify::RuleEngine;

    use super::{document_type, object};

    #[test]
    fn example_claim_is_clean() {
        let doc = document_type().unwrap();
        let report = RuleEngine::new().validate(&doc.schema.example_record(), &doc.rules);
        assert!(report.violations.is_empty(), "{:?}", report.violations);
    }

    /// A missing hotel part is skipped, so 180.60 is compared with 438.67.
    #[test]
    fn partial_costs_are_still_summed() {
        let doc = document_type().unwrap();
        let mut data = doc.schema.example_record();
        data.insert(
            "kosten_details".to_string(),
            object(&[("transport", Value::Float(96.60)), ("tagegeld", Value::Float(84.00))]),
        );
        let report = RuleEngine::new().validate(&data, &doc.rules);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].rule, "sum_mismatch");
        assert_eq!(report.violations[0].severity, Severity::Warning);
    }

    #[test]
    fn small_rounding_difference_is_tolerated() {
        let doc = document_type().unwrap();
        let mut data = doc.schema.example_record();
        data.insert("erstattungsbetrag".to_string(), Value::Float(438.70));
        assert!(RuleEngine::new().validate(&data, &doc.rules).violations.is_empty());
    }
}
