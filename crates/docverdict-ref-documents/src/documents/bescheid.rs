//! `bescheid`: municipal fee notice.

use docverdict_contracts::{
    document::{alias_table, AliasTable, DocumentType},
    error::VerdictResult,
    rule::RuleKind,
    schema::{DType, FieldSpec, FieldSpecMap},
    violation::Severity,
};

use super::{date_format, date_order, required, TYP_ALIASES};

pub const DOC_TYPE: &str = "bescheid";

pub fn schema() -> VerdictResult<FieldSpecMap> {
    FieldSpecMap::from_fields(
        DOC_TYPE,
        [
            ("typ", FieldSpec::required(DType::String, DOC_TYPE, "Dokumenttyp")),
            ("behoerde", FieldSpec::required(DType::String, "Stadtverwaltung Aurich", "Behörde / Aussteller")),
            ("adressat", FieldSpec::optional(DType::String, "Dipl.-Ing. Nikolai Bien", "Adressat (Name)")),
            ("aktenzeichen", FieldSpec::required(DType::String, "AZ-325772", "Aktenzeichen")),
            ("datum", FieldSpec::required(DType::String, "11.01.2026", "Datum des Bescheids")),
            ("grund", FieldSpec::required(DType::String, "Meldebescheinigung", "Gebührenanlass / Grund")),
            ("betrag", FieldSpec::required(DType::Float, 77.22, "Festgesetzter Betrag")),
            ("zahlungsfrist", FieldSpec::required(DType::String, "06.02.2026", "Zahlungsfrist (Datum)")),
        ],
    )
}

pub fn rules() -> Vec<RuleKind> {
    vec![
        required(&["behoerde", "aktenzeichen", "datum", "grund", "betrag", "zahlungsfrist"]),
        date_format("datum", Severity::Error),
        date_format("zahlungsfrist", Severity::Error),
        date_order("datum", "zahlungsfrist", "zahlungsfrist", "deadline_before_date"),
        RuleKind::Positive {
            field: "betrag".to_string(),
            rule: "amount_nonpositive".to_string(),
        },
    ]
}

pub fn aliases() -> AliasTable {
    alias_table(&[
        ("typ", TYP_ALIASES),
        ("behoerde", &["behoerde", "behörde", "authority", "issuer", "aussteller"]),
        ("aktenzeichen", &["aktenzeichen", "reference", "reference_number", "ref", "az"]),
        ("betrag", &["betrag", "amount", "summe", "fee", "total"]),
        ("grund", &["grund", "betreff", "reason", "anlass", "beschreibung"]),
        ("datum", &["datum", "date"]),
        ("zahlungsfrist", &["zahlungsfrist", "frist", "faelligkeit", "due_date", "pay_until"]),
        ("adressat", &["adressat", "empfaenger", "recipient", "bürger", "person"]),
    ])
}

pub fn document_type() -> VerdictResult<DocumentType> {
    DocumentType::new(DOC_TYPE, "Gebührenbescheid", Some("NOT"), schema()?, rules(), aliases())
}
