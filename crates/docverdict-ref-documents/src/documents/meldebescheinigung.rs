//! `meldebescheinigung`: residence registration certificate.

use docverdict_contracts::{
    document::{alias_table, AliasTable, DocumentType},
    error::VerdictResult,
    rule::RuleKind,
    schema::{DType, FieldSpec, FieldSpecMap},
    violation::Severity,
};

use super::{date_format, date_order, required, TYP_ALIASES};

pub const DOC_TYPE: &str = "meldebescheinigung";

pub fn schema() -> VerdictResult<FieldSpecMap> {
    FieldSpecMap::from_fields(
        DOC_TYPE,
        [
            ("typ", FieldSpec::required(DType::String, DOC_TYPE, "Dokumenttyp")),
            ("behoerde", FieldSpec::required(DType::String, "Stadt Hoyerswerda", "Ausstellende Behörde")),
            ("name", FieldSpec::required(DType::String, "Hedda Stadelmann", "Name (Familienname, Vorname)")),
            ("geburtsdatum", FieldSpec::required(DType::String, "18.05.1945", "Geburtsdatum")),
            (
                "anschrift_aktuell",
                FieldSpec::required(DType::String, "Geißlerallee 32/14, 08607 Hoyerswerda", "Aktuelle Anschrift"),
            ),
            ("einzugsdatum", FieldSpec::required(DType::String, "13.10.2022", "Einzugsdatum")),
            (
                "anschrift_vorher",
                FieldSpec::optional(DType::String, "Hermannallee 77/60, 03397 Iserlohn", "Vorherige Anschrift"),
            ),
            ("datum", FieldSpec::required(DType::String, "26.01.2026", "Ausstellungsdatum")),
            ("siegel", FieldSpec::optional(DType::Boolean, true, "Siegel vorhanden (true/false)")),
        ],
    )
}

pub fn rules() -> Vec<RuleKind> {
    vec![
        required(&["behoerde", "name", "geburtsdatum", "anschrift_aktuell", "einzugsdatum", "datum"]),
        date_format("geburtsdatum", Severity::Error),
        date_format("einzugsdatum", Severity::Error),
        date_format("datum", Severity::Error),
        date_order("einzugsdatum", "datum", "einzugsdatum", "temporal_conflict"),
    ]
}

pub fn aliases() -> AliasTable {
    alias_table(&[
        ("typ", TYP_ALIASES),
        ("behoerde", &["behoerde", "behörde", "authority", "issuer"]),
        ("name", &["name", "bürger", "person", "full_name"]),
        ("geburtsdatum", &["geburtsdatum", "birth_date", "date_of_birth", "dob"]),
        ("anschrift_aktuell", &["anschrift_aktuell", "anschrift", "adresse", "address", "wohnort"]),
        ("datum", &["datum", "date", "ausstellungsdatum"]),
    ])
}

pub fn document_type() -> VerdictResult<DocumentType> {
    DocumentType::new(DOC_TYPE, "Meldebescheinigung", Some("MEL"), schema()?, rules(), aliases())
}
