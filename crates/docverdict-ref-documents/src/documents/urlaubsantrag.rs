//! `urlaubsantrag`: employee leave request.

use docverdict_contracts::{
    document::{alias_table, AliasTable, DocumentType},
    error::VerdictResult,
    rule::RuleKind,
    schema::{DType, FieldSpec, FieldSpecMap},
    violation::Severity,
};

use super::{date_format, date_order, required, TYP_ALIASES};

pub const DOC_TYPE: &str = "urlaubsantrag";

pub fn schema() -> VerdictResult<FieldSpecMap> {
    FieldSpecMap::from_fields(
        DOC_TYPE,
        [
            ("typ", FieldSpec::required(DType::String, DOC_TYPE, "Dokumenttyp")),
            ("personalnummer", FieldSpec::required(DType::String, "13278", "Personalnummer")),
            ("name", FieldSpec::required(DType::String, "Prof. Sandra Staude MBA.", "Name, Vorname")),
            ("abteilung", FieldSpec::required(DType::String, "Vertrieb", "Abteilung")),
            ("art", FieldSpec::required(DType::String, "Erholungsurlaub", "Urlaubsart")),
            ("von", FieldSpec::required(DType::String, "02.09.2026", "Urlaub von (Datum)")),
            ("bis", FieldSpec::required(DType::String, "06.09.2026", "Urlaub bis (Datum)")),
            ("tage", FieldSpec::required(DType::Integer, 4i64, "Anzahl Urlaubstage")),
            ("datum", FieldSpec::optional(DType::String, "18.01.2026", "Datum der Antragstellung")),
            (
                "unterschrift_arbeitnehmer",
                FieldSpec::optional(DType::String, "", "Unterschrift Arbeitnehmer (kann leer sein)"),
            ),
        ],
    )
}

pub fn rules() -> Vec<RuleKind> {
    vec![
        required(&["personalnummer", "name", "abteilung", "art", "von", "bis", "tage"]),
        date_format("von", Severity::Error),
        date_format("bis", Severity::Error),
        date_format("datum", Severity::Warning),
        date_order("von", "bis", "von/bis", "date_range"),
        RuleKind::DayCount {
            start: "von".to_string(),
            end: "bis".to_string(),
            days: "tage".to_string(),
        },
    ]
}

pub fn aliases() -> AliasTable {
    alias_table(&[
        ("typ", TYP_ALIASES),
        ("personalnummer", &["personalnummer", "personal_nr", "employee_id", "personnel_number"]),
        ("name", &["name", "employee", "mitarbeiter", "mitarbeiter_name", "full_name"]),
        ("abteilung", &["abteilung", "department"]),
        ("art", &["art", "urlaubsart", "leave_type", "vacation_type"]),
        ("von", &["von", "urlaub_von", "start", "start_date", "from"]),
        ("bis", &["bis", "urlaub_bis", "ende", "end_date", "to"]),
        ("tage", &["tage", "urlaubstage", "days", "day_count"]),
        ("datum", &["datum", "date", "antragsdatum"]),
        (
            "unterschrift_arbeitnehmer",
            &["unterschrift_arbeitnehmer", "signature_employee", "sign_employee"],
        ),
    ])
}

pub fn document_type() -> VerdictResult<DocumentType> {
    DocumentType::new(DOC_TYPE, "Urlaubsantrag", Some("REQ"), schema()?, rules(), aliases())
}
