//! The five reference document types.
//!
//! Each module declares one type's schema, its canonical rule list and the
//! key aliases extractors are known to produce. [`default_registry`]
//! registers all of them.

pub mod bescheid;
pub mod meldebescheinigung;
pub mod rechnung;
pub mod reisekosten;
pub mod urlaubsantrag;

use docverdict_contracts::{
    error::VerdictResult,
    rule::RuleKind,
    value::{Record, Value},
    violation::Severity,
};
use docverdict_core::DocumentRegistry;

/// Registry holding every reference document type.
pub fn default_registry() -> VerdictResult<DocumentRegistry> {
    DocumentRegistry::new()
        .with(urlaubsantrag::document_type()?)?
        .with(rechnung::document_type()?)?
        .with(reisekosten::document_type()?)?
        .with(bescheid::document_type()?)?
        .with(meldebescheinigung::document_type()?)
}

/// Aliases every type accepts for the `typ` field.
pub(crate) const TYP_ALIASES: &[&str] = &["typ", "document_type", "doctype"];

pub(crate) fn object(pairs: &[(&str, Value)]) -> Value {
    Value::Object(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect::<Record>())
}

pub(crate) fn required(fields: &[&str]) -> RuleKind {
    RuleKind::RequiredNonEmpty {
        fields: fields.iter().map(|f| f.to_string()).collect(),
    }
}

pub(crate) fn date_format(field: &str, severity: Severity) -> RuleKind {
    RuleKind::DateFormat {
        field: field.to_string(),
        severity,
    }
}

pub(crate) fn date_order(start: &str, end: &str, report_field: &str, rule: &str) -> RuleKind {
    RuleKind::DateOrder {
        start: start.to_string(),
        end: end.to_string(),
        report_field: report_field.to_string(),
        rule: rule.to_string(),
    }
}
