//! Trait seams of the validation pipeline.
//!
//! The pipeline treats two kinds of component differently:
//!
//! - `Extractor` and `SemanticValidator` are **untrusted** collaborators,
//!   usually backed by a vision model. Their output is only ever data to be
//!   checked, and their failures are recovered, never propagated.
//! - `SchemaProvider`, `Verifier`, `Reconciler`, `DecisionPolicy` and
//!   `ResultSink` are **trusted**, deterministic components.
//!
//! `DocumentPipeline` wires them together in a fixed order.

use docverdict_contracts::{
    cross_model::CrossModelReport,
    document::DocumentType,
    error::VerdictResult,
    result::{AggregatedResult, DecisionInput, DocumentRef, Extraction},
    rule::RuleKind,
    schema::FieldSpecMap,
    semantic::StageResult,
    value::Record,
    violation::ValidationReport,
};

/// Turns a document image into a record shaped (ideally) like the schema.
pub trait Extractor: Send + Sync {
    /// Stable identifier from configuration, e.g. `gpt`.
    fn id(&self) -> &str;

    fn provider(&self) -> &str;

    fn model(&self) -> &str;

    /// Extract fields for `doc_type` from `document`.
    ///
    /// An `Err` means the collaborator failed outright; the pipeline records
    /// an all-null extraction in its place and keeps going.
    fn extract(&self, document: &DocumentRef, doc_type: &DocumentType)
        -> VerdictResult<Extraction>;

    /// A document type label this extractor can tell without a schema,
    /// such as the `typ` field of a recorded response.
    ///
    /// Used to detect the type when the file name does not give it away.
    fn type_hint(&self, _document: &DocumentRef) -> Option<String> {
        None
    }
}

/// One independent semantic check of extracted data against the document.
pub trait SemanticValidator: Send + Sync {
    fn provider(&self) -> &str;

    fn model(&self) -> &str;

    /// Check `data` against `document`.
    ///
    /// Never fails: unreadable checker output comes back as a stage with
    /// status `parse_error`.
    fn check(&self, document: &DocumentRef, data: &Record) -> StageResult;
}

/// Lookup of registered document types.
pub trait SchemaProvider: Send + Sync {
    /// The document type registered under `doc_type`.
    ///
    /// Returns `VerdictError::UnknownDocumentType` when none is.
    fn document_type(&self, doc_type: &str) -> VerdictResult<&DocumentType>;

    /// The schema registered under `doc_type`.
    fn get_schema(&self, doc_type: &str) -> VerdictResult<&FieldSpecMap> {
        self.document_type(doc_type).map(|doc| &doc.schema)
    }

    /// The canonical rule list for `doc_type`; empty for unknown types.
    fn rules_for(&self, doc_type: &str) -> &[RuleKind] {
        self.document_type(doc_type)
            .map(|doc| doc.rules.as_slice())
            .unwrap_or(&[])
    }
}

/// Deterministic schema and rule checks on a single record.
pub trait Verifier: Send + Sync {
    /// Check `data` against `schema`. Never fails.
    fn validate_schema(&self, data: &Record, schema: &FieldSpecMap) -> ValidationReport;

    /// Run every rule in `rules` against `data` and collect all violations.
    fn validate_rules(&self, data: &Record, rules: &[RuleKind]) -> ValidationReport;

    /// Reject rule lists this verifier cannot evaluate.
    ///
    /// Called once per document type when the pipeline is built.
    fn check_rules(&self, _rules: &[RuleKind]) -> VerdictResult<()> {
        Ok(())
    }
}

/// Field-by-field agreement check between two extractions.
pub trait Reconciler: Send + Sync {
    /// Compare `primary` against a raw `secondary` extraction of the same
    /// document. The secondary is forced into the schema's shape first.
    fn reconcile(
        &self,
        primary: &Record,
        secondary: &Record,
        doc_type: &DocumentType,
    ) -> CrossModelReport;
}

/// Folds all signals for one document into a final verdict.
pub trait DecisionPolicy: Send + Sync {
    fn decide(&self, input: DecisionInput) -> AggregatedResult;
}

/// Durable destination for aggregated results.
pub trait ResultSink: Send + Sync {
    /// Persist `result` and return where it went (a path or other locator).
    ///
    /// Writing the same result twice must not create a second record.
    fn persist(&self, result: &AggregatedResult) -> VerdictResult<String>;
}
