//! Fixed extractions and verdicts for the demo scenarios.
//!
//! Everything here is hardcoded and fictional. The collaborators answer
//! without looking at the document, standing in for model calls.

use docverdict_contracts::{
    document::DocumentType,
    error::VerdictResult,
    result::{DocumentRef, Extraction},
    semantic::{SemanticStatus, StageResult},
    value::{Record, Value},
};
use docverdict_core::traits::{Extractor, SemanticValidator};

use crate::documents::{object, rechnung, urlaubsantrag};

// ── Records ───────────────────────────────────────────────────────────────────

/// An invoice over 100.00 net plus 19 % VAT with one line item.
///
/// `total_gross` is left to the caller so mismatching totals can be shown.
pub fn invoice(total_gross: f64) -> Record {
    let item = object(&[
        ("description", Value::from("Beratung")),
        ("quantity", Value::Integer(2)),
        ("unit_price", Value::Float(10.0)),
        ("total", Value::Float(20.0)),
    ]);
    Record::from([
        ("typ".to_string(), Value::from(rechnung::DOC_TYPE)),
        ("sender".to_string(), Value::from("Jäkel Martin e.V.")),
        ("empfaenger".to_string(), Value::from("Iwona Martin")),
        ("rechnungsnummer".to_string(), Value::from("RE-2026-1520")),
        ("datum".to_string(), Value::from("09.01.2026")),
        ("items".to_string(), Value::List(vec![item])),
        ("total_net".to_string(), Value::Float(100.0)),
        ("total_vat".to_string(), Value::Float(19.0)),
        ("total_gross".to_string(), Value::Float(total_gross)),
    ])
}

/// A consistent leave request: 02.09. to 06.09.2026, four days.
pub fn leave_request() -> VerdictResult<Record> {
    Ok(urlaubsantrag::schema()?.example_record())
}

// ── Collaborators ─────────────────────────────────────────────────────────────

/// An extractor that always returns the same record.
pub struct FixedExtractor {
    id: String,
    provider: String,
    model: String,
    data: Record,
}

impl FixedExtractor {
    pub fn new(id: &str, provider: &str, model: &str, data: Record) -> Self {
        Self {
            id: id.to_string(),
            provider: provider.to_string(),
            model: model.to_string(),
            data,
        }
    }
}

impl Extractor for FixedExtractor {
    fn id(&self) -> &str {
        &self.id
    }

    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn extract(&self, _document: &DocumentRef, _doc_type: &DocumentType) -> VerdictResult<Extraction> {
        Ok(Extraction {
            extractor_id: self.id.clone(),
            provider: self.provider.clone(),
            model: self.model.clone(),
            data: self.data.clone(),
            raw_response: None,
            duration_seconds: 0.0,
            error: None,
        })
    }
}

/// A semantic checker that always agrees with the extraction.
pub struct ApprovingValidator {
    provider: String,
    model: String,
}

impl ApprovingValidator {
    pub fn new(provider: &str, model: &str) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
        }
    }
}

impl SemanticValidator for ApprovingValidator {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn check(&self, _document: &DocumentRef, _data: &Record) -> StageResult {
        StageResult {
            status: SemanticStatus::Valid,
            issues: Vec::new(),
            comments: "Alle Angaben stimmen mit dem Dokument überein.".to_string(),
            duration_seconds: 0.0,
            model: self.model.clone(),
            provider: self.provider.clone(),
            raw_response: None,
        }
    }
}
