//! The per-document validation pipeline.
//!
//! Order of work for one document:
//!
//!   Detect type → Extract (all extractors) → Schema → Rules → Semantic
//!     → Cross-model (if ≥ 2 extractors) → Decide
//!
//! Collaborator failures never abort a document: an extractor that errors is
//! replaced by an all-null extraction and the remaining signals still run.
//! Only configuration problems (an unknown document type) are returned as
//! errors, and those affect the one document alone.

use tracing::{debug, info, warn};

use docverdict_contracts::{
    cross_model::CrossModelReport,
    document::DocumentType,
    error::{VerdictError, VerdictResult},
    result::{AggregatedResult, DecisionInput, DocumentRef, Extraction, ExtractionRecord},
    value::{Record, Value},
};

use crate::{
    registry::DocumentRegistry,
    semantic::multi_stage_semantic_validate,
    traits::{DecisionPolicy, Extractor, Reconciler, SchemaProvider, SemanticValidator, Verifier},
};

/// Runs every signal for a document and hands the result to the decision
/// policy. Built through [`PipelineBuilder`].
pub struct DocumentPipeline {
    registry: DocumentRegistry,
    extractors: Vec<Box<dyn Extractor>>,
    primary: String,
    validators: Vec<Box<dyn SemanticValidator>>,
    verifier: Box<dyn Verifier>,
    reconciler: Box<dyn Reconciler>,
    decision: Box<dyn DecisionPolicy>,
}

/// Collects pipeline components and checks them together in `build()`.
pub struct PipelineBuilder {
    registry: DocumentRegistry,
    verifier: Box<dyn Verifier>,
    reconciler: Box<dyn Reconciler>,
    decision: Box<dyn DecisionPolicy>,
    extractors: Vec<Box<dyn Extractor>>,
    primary: Option<String>,
    validators: Vec<Box<dyn SemanticValidator>>,
}

impl PipelineBuilder {
    pub fn extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Id of the extractor whose output is validated. Defaults to the first
    /// extractor added.
    pub fn primary(mut self, id: impl Into<String>) -> Self {
        self.primary = Some(id.into());
        self
    }

    pub fn semantic_validator(mut self, validator: Box<dyn SemanticValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Check the assembled components.
    ///
    /// Fails with `ConfigError` when there is no extractor, the primary id
    /// is not among the extractors, extractor ids repeat, or the verifier
    /// rejects a registered rule list.
    pub fn build(self) -> VerdictResult<DocumentPipeline> {
        let first = self.extractors.first().ok_or_else(|| VerdictError::ConfigError {
            reason: "at least one extractor is required".to_string(),
        })?;
        let primary = self.primary.unwrap_or_else(|| first.id().to_string());

        let ids: Vec<&str> = self.extractors.iter().map(|e| e.id()).collect();
        if !ids.contains(&primary.as_str()) {
            return Err(VerdictError::ConfigError {
                reason: format!("primary extractor '{primary}' not in extractors: {ids:?}"),
            });
        }
        if let Some(dup) = ids.iter().enumerate().find(|(i, id)| ids[..*i].contains(*id)) {
            return Err(VerdictError::ConfigError {
                reason: format!("extractor id '{}' used twice", dup.1),
            });
        }

        for doc in self.registry.iter() {
            self.verifier.check_rules(&doc.rules)?;
        }

        debug!(
            primary = %primary,
            extractors = ids.len(),
            validators = self.validators.len(),
            doc_types = self.registry.len(),
            "pipeline assembled"
        );

        Ok(DocumentPipeline {
            registry: self.registry,
            extractors: self.extractors,
            primary,
            validators: self.validators,
            verifier: self.verifier,
            reconciler: self.reconciler,
            decision: self.decision,
        })
    }
}

impl DocumentPipeline {
    /// Start building a pipeline around its trusted components.
    pub fn builder(
        registry: DocumentRegistry,
        verifier: Box<dyn Verifier>,
        reconciler: Box<dyn Reconciler>,
        decision: Box<dyn DecisionPolicy>,
    ) -> PipelineBuilder {
        PipelineBuilder {
            registry,
            verifier,
            reconciler,
            decision,
            extractors: Vec::new(),
            primary: None,
            validators: Vec::new(),
        }
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn primary_extractor(&self) -> &str {
        &self.primary
    }

    /// Detect the document type of `document` and process it.
    ///
    /// The primary extractor's type hint is only asked for when the file
    /// name does not identify the type.
    pub fn process(&self, document: &DocumentRef) -> VerdictResult<AggregatedResult> {
        let doc_type = self
            .registry
            .detect_from_filename(&document.name)
            .map(|doc| doc.id.clone())
            .or_else(|| {
                let hint = self.primary_type_hint(document);
                self.registry.detect_doc_type(document, hint.as_deref())
            })
            .ok_or_else(|| VerdictError::UnknownDocumentType {
                doc_type: document.name.clone(),
                available: self.registry.available(),
            })?;
        self.process_as(document, &doc_type)
    }

    fn primary_type_hint(&self, document: &DocumentRef) -> Option<String> {
        self.extractors
            .iter()
            .find(|e| e.id() == self.primary)
            .and_then(|e| e.type_hint(document))
    }

    /// Process `document` as `doc_type`, running every extractor.
    pub fn process_as(&self, document: &DocumentRef, doc_type: &str) -> VerdictResult<AggregatedResult> {
        let doc = self.registry.document_type(doc_type)?;

        debug!(document = %document.name, doc_type = %doc.id, "processing document");

        let extractions = self
            .extractors
            .iter()
            .map(|extractor| self.run_extractor(extractor.as_ref(), document, doc))
            .collect();

        Ok(self.assess(document, doc, extractions))
    }

    /// Validate extractions that already exist (e.g. recorded earlier).
    ///
    /// Extractions whose id does not match the configured primary are
    /// treated as secondaries; if none matches, the first one is primary.
    pub fn process_extractions(
        &self,
        document: &DocumentRef,
        doc_type: &str,
        extractions: Vec<Extraction>,
    ) -> VerdictResult<AggregatedResult> {
        let doc = self.registry.document_type(doc_type)?;
        if extractions.is_empty() {
            return Err(VerdictError::ConfigError {
                reason: format!("no extraction supplied for '{}'", document.name),
            });
        }
        Ok(self.assess(document, doc, extractions))
    }

    fn run_extractor(
        &self,
        extractor: &dyn Extractor,
        document: &DocumentRef,
        doc: &DocumentType,
    ) -> Extraction {
        match extractor.extract(document, doc) {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!(
                    document = %document.name,
                    extractor = %extractor.id(),
                    error = %e,
                    "extractor failed, continuing with empty extraction"
                );
                Extraction::failed(
                    extractor.id(),
                    extractor.provider(),
                    extractor.model(),
                    null_record(doc),
                    e.to_string(),
                )
            }
        }
    }

    fn assess(
        &self,
        document: &DocumentRef,
        doc: &DocumentType,
        extractions: Vec<Extraction>,
    ) -> AggregatedResult {
        let primary_id = extractions
            .iter()
            .find(|e| e.extractor_id == self.primary)
            .or_else(|| extractions.first())
            .map(|e| e.extractor_id.clone())
            .unwrap_or_else(|| self.primary.clone());
        let primary: Record = extractions
            .iter()
            .find(|e| e.extractor_id == primary_id)
            .map(|e| e.data.clone())
            .unwrap_or_default();

        // ── Deterministic checks on the primary extraction ───────────────────
        let schema_validation = self.verifier.validate_schema(&primary, &doc.schema);
        let rule_validation = self.verifier.validate_rules(&primary, &doc.rules);

        // ── Independent semantic stages ──────────────────────────────────────
        let semantic_validation = multi_stage_semantic_validate(&self.validators, document, &primary);

        // ── Cross-model redundancy ───────────────────────────────────────────
        let cross_model_validation = if extractions.len() >= 2 {
            let reports = extractions
                .iter()
                .filter(|e| e.extractor_id != primary_id)
                .map(|secondary| self.reconciler.reconcile(&primary, &secondary.data, doc));
            Some(CrossModelReport::merge_all(reports.collect::<Vec<_>>()))
        } else {
            None
        };

        let result = self.decision.decide(DecisionInput {
            document: document.clone(),
            doc_type: doc.id.clone(),
            extraction: ExtractionRecord {
                primary_extractor: primary_id,
                primary,
                extractions,
            },
            schema_validation,
            rule_validation,
            semantic_validation,
            cross_model_validation,
        });

        info!(
            document = %document.name,
            doc_type = %doc.id,
            final_status = %result.final_status,
            "document assessed"
        );

        result
    }
}

/// A record with every schema field set to null.
pub fn null_record(doc: &DocumentType) -> Record {
    doc.schema.keys().map(|k| (k.to_string(), Value::Null)).collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use docverdict_contracts::{
        cross_model::{Conflict, ConflictType, CrossModelReport},
        document::DocumentType,
        error::{VerdictError, VerdictResult},
        result::{
            AggregatedResult, DecisionInput, DocumentRef, Extraction, FinalStatus, SignalCounts,
        },
        rule::RuleKind,
        schema::{DType, FieldSpec, FieldSpecMap},
        semantic::{SemanticStatus, StageResult},
        value::{Record, Value},
        violation::{Severity, ValidationReport, Violation},
    };

    use super::DocumentPipeline;
    use crate::{
        registry::DocumentRegistry,
        traits::{DecisionPolicy, Extractor, Reconciler, SemanticValidator, Verifier},
    };

    // ── Mock helpers ─────────────────────────────────────────────────────────

    fn registry() -> DocumentRegistry {
        let schema = FieldSpecMap::from_fields(
            "bescheid",
            [
                ("typ", FieldSpec::required(DType::String, "bescheid", "Dokumenttyp")),
                ("betrag", FieldSpec::required(DType::Float, 77.22, "Betrag")),
            ],
        )
        .unwrap();
        let doc = DocumentType::new(
            "bescheid",
            "Gebührenbescheid",
            Some("NOT"),
            schema,
            vec![RuleKind::Positive {
                field: "betrag".to_string(),
                rule: "amount_nonpositive".to_string(),
            }],
            Default::default(),
        )
        .unwrap();
        DocumentRegistry::new().with(doc).unwrap()
    }

    fn record(betrag: f64) -> Record {
        let mut r = Record::new();
        r.insert("typ".to_string(), Value::from("bescheid"));
        r.insert("betrag".to_string(), Value::Float(betrag));
        r
    }

    /// Returns a fixed record, or fails when `data` is `None`.
    struct MockExtractor {
        id: String,
        data: Option<Record>,
        calls: Arc<Mutex<usize>>,
    }

    impl MockExtractor {
        fn new(id: &str, data: Option<Record>) -> Self {
            Self {
                id: id.to_string(),
                data,
                calls: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl Extractor for MockExtractor {
        fn id(&self) -> &str {
            &self.id
        }
        fn provider(&self) -> &str {
            "mock"
        }
        fn model(&self) -> &str {
            "mock-model"
        }
        fn extract(&self, _document: &DocumentRef, _doc: &DocumentType) -> VerdictResult<Extraction> {
            *self.calls.lock().unwrap() += 1;
            match &self.data {
                Some(data) => Ok(Extraction {
                    extractor_id: self.id.clone(),
                    provider: "mock".to_string(),
                    model: "mock-model".to_string(),
                    data: data.clone(),
                    raw_response: None,
                    duration_seconds: 0.1,
                    error: None,
                }),
                None => Err(VerdictError::CollaboratorFailed {
                    collaborator: self.id.clone(),
                    reason: "connection reset".to_string(),
                }),
            }
        }
    }

    /// Flags a non-positive or missing `betrag`.
    struct MockVerifier {
        reject_rules: bool,
    }

    impl Verifier for MockVerifier {
        fn validate_schema(&self, data: &Record, _schema: &FieldSpecMap) -> ValidationReport {
            let violations = match data.get("betrag") {
                Some(Value::Null) | None => vec![Violation::new(
                    "betrag",
                    "required_field_empty",
                    Severity::Error,
                    "empty",
                )],
                _ => vec![],
            };
            ValidationReport::from_violations(violations)
        }

        fn validate_rules(&self, data: &Record, _rules: &[RuleKind]) -> ValidationReport {
            let violations = match data.get("betrag").and_then(Value::as_f64) {
                Some(b) if b <= 0.0 => vec![Violation::new(
                    "betrag",
                    "amount_nonpositive",
                    Severity::Error,
                    "not positive",
                )],
                _ => vec![],
            };
            ValidationReport::from_violations(violations)
        }

        fn check_rules(&self, _rules: &[RuleKind]) -> VerdictResult<()> {
            if self.reject_rules {
                Err(VerdictError::ConfigError {
                    reason: "unsupported rule".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    /// Reports one warning per call when the records differ.
    struct MockReconciler {
        calls: Arc<Mutex<usize>>,
    }

    impl Reconciler for MockReconciler {
        fn reconcile(&self, primary: &Record, secondary: &Record, _doc: &DocumentType) -> CrossModelReport {
            *self.calls.lock().unwrap() += 1;
            let conflicts = if primary == secondary {
                vec![]
            } else {
                vec![Conflict {
                    field: "betrag".to_string(),
                    severity: Severity::Warning,
                    conflict_type: ConflictType::Mismatch,
                    message: "differs".to_string(),
                }]
            };
            CrossModelReport::from_conflicts(conflicts)
        }
    }

    /// Errors → invalid, warnings → review_needed, else valid.
    struct MockDecision;

    impl DecisionPolicy for MockDecision {
        fn decide(&self, input: DecisionInput) -> AggregatedResult {
            let counts = SignalCounts {
                schema: input.schema_validation.stats(),
                rules: input.rule_validation.stats(),
                semantic: input.semantic_validation.stats,
                cross_model: input.cross_model_validation.as_ref().map(|c| c.stats),
            };
            let total = counts.total();
            let final_status = if total.errors > 0 {
                FinalStatus::Invalid
            } else if total.warnings > 0 {
                FinalStatus::ReviewNeeded
            } else {
                FinalStatus::Valid
            };
            AggregatedResult {
                document: input.document,
                doc_type: input.doc_type,
                final_status,
                summary: String::new(),
                counts,
                extraction: input.extraction,
                schema_validation: input.schema_validation,
                rule_validation: input.rule_validation,
                semantic_validation: input.semantic_validation,
                cross_model_validation: input.cross_model_validation,
                created_at: Utc::now(),
            }
        }
    }

    struct ValidStage;

    impl SemanticValidator for ValidStage {
        fn provider(&self) -> &str {
            "mock"
        }
        fn model(&self) -> &str {
            "checker"
        }
        fn check(&self, _document: &DocumentRef, _data: &Record) -> StageResult {
            StageResult {
                status: SemanticStatus::Valid,
                issues: vec![],
                comments: "ok".to_string(),
                duration_seconds: 0.2,
                model: "checker".to_string(),
                provider: "mock".to_string(),
                raw_response: None,
            }
        }
    }

    fn builder(reconciler_calls: Arc<Mutex<usize>>) -> super::PipelineBuilder {
        DocumentPipeline::builder(
            registry(),
            Box::new(MockVerifier { reject_rules: false }),
            Box::new(MockReconciler { calls: reconciler_calls }),
            Box::new(MockDecision),
        )
    }

    // ── Construction ─────────────────────────────────────────────────────────

    #[test]
    fn build_requires_an_extractor() {
        let result = builder(Arc::default()).build();
        assert!(matches!(result, Err(VerdictError::ConfigError { .. })));
    }

    #[test]
    fn build_rejects_unknown_primary() {
        let result = builder(Arc::default())
            .extractor(Box::new(MockExtractor::new("gpt", Some(record(1.0)))))
            .primary("pixtral")
            .build();
        match result {
            Err(VerdictError::ConfigError { reason }) => assert!(reason.contains("pixtral")),
            Ok(_) => panic!("expected ConfigError"),
            Err(other) => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn build_rejects_duplicate_extractor_ids() {
        let result = builder(Arc::default())
            .extractor(Box::new(MockExtractor::new("gpt", Some(record(1.0)))))
            .extractor(Box::new(MockExtractor::new("gpt", Some(record(1.0)))))
            .build();
        assert!(matches!(result, Err(VerdictError::ConfigError { .. })));
    }

    #[test]
    fn build_surfaces_rule_check_failures() {
        let result = DocumentPipeline::builder(
            registry(),
            Box::new(MockVerifier { reject_rules: true }),
            Box::new(MockReconciler { calls: Arc::default() }),
            Box::new(MockDecision),
        )
        .extractor(Box::new(MockExtractor::new("gpt", Some(record(1.0)))))
        .build();
        assert!(matches!(result, Err(VerdictError::ConfigError { .. })));
    }

    // ── Processing ───────────────────────────────────────────────────────────

    #[test]
    fn unknown_document_type_never_calls_extractors() {
        let extractor = MockExtractor::new("gpt", Some(record(1.0)));
        let calls = extractor.calls.clone();
        let pipeline = builder(Arc::default()).extractor(Box::new(extractor)).build().unwrap();

        let result = pipeline.process(&DocumentRef::from_path("input/XYZ_0001.png"));

        assert!(matches!(result, Err(VerdictError::UnknownDocumentType { .. })));
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn single_extractor_skips_cross_model() {
        let reconciler_calls = Arc::new(Mutex::new(0));
        let pipeline = builder(reconciler_calls.clone())
            .extractor(Box::new(MockExtractor::new("gpt", Some(record(77.22)))))
            .semantic_validator(Box::new(ValidStage))
            .build()
            .unwrap();

        let result = pipeline.process(&DocumentRef::from_path("NOT_0001.png")).unwrap();

        assert_eq!(result.final_status, FinalStatus::Valid);
        assert_eq!(result.doc_type, "bescheid");
        assert!(result.cross_model_validation.is_none());
        assert_eq!(*reconciler_calls.lock().unwrap(), 0);
        assert_eq!(result.semantic_validation.status, SemanticStatus::Valid);
    }

    #[test]
    fn every_secondary_is_reconciled_against_primary() {
        let reconciler_calls = Arc::new(Mutex::new(0));
        let pipeline = builder(reconciler_calls.clone())
            .extractor(Box::new(MockExtractor::new("gpt", Some(record(77.22)))))
            .extractor(Box::new(MockExtractor::new("pixtral", Some(record(72.22)))))
            .extractor(Box::new(MockExtractor::new("claude", Some(record(77.22)))))
            .primary("gpt")
            .build()
            .unwrap();

        let result = pipeline.process(&DocumentRef::from_path("NOT_0001.png")).unwrap();

        assert_eq!(*reconciler_calls.lock().unwrap(), 2);
        let cross = result.cross_model_validation.unwrap();
        assert_eq!(cross.conflicts.len(), 1);
        assert!(!cross.is_consistent);
        assert_eq!(result.final_status, FinalStatus::ReviewNeeded);
        assert_eq!(result.extraction.primary_extractor, "gpt");
        assert_eq!(result.extraction.extractions.len(), 3);
    }

    #[test]
    fn failed_extractor_degrades_to_null_record() {
        let pipeline = builder(Arc::default())
            .extractor(Box::new(MockExtractor::new("gpt", None)))
            .build()
            .unwrap();

        let result = pipeline.process(&DocumentRef::from_path("NOT_0001.png")).unwrap();

        let extraction = &result.extraction.extractions[0];
        assert!(extraction.error.as_deref().unwrap().contains("connection reset"));
        assert_eq!(result.extraction.primary["betrag"], Value::Null);
        assert_eq!(result.final_status, FinalStatus::Invalid);
    }

    #[test]
    fn recorded_extractions_can_be_assessed_directly() {
        let pipeline = builder(Arc::default())
            .extractor(Box::new(MockExtractor::new("gpt", Some(record(1.0)))))
            .build()
            .unwrap();
        let recorded = Extraction {
            extractor_id: "archive".to_string(),
            provider: "file".to_string(),
            model: "n/a".to_string(),
            data: record(-5.0),
            raw_response: None,
            duration_seconds: 0.0,
            error: None,
        };

        let result = pipeline
            .process_extractions(&DocumentRef::from_path("scan.png"), "Bescheid", vec![recorded])
            .unwrap();

        assert_eq!(result.extraction.primary_extractor, "archive");
        assert_eq!(result.final_status, FinalStatus::Invalid);
        assert_eq!(result.rule_validation.violations[0].rule, "amount_nonpositive");
    }

    #[test]
    fn assessing_nothing_is_a_config_error() {
        let pipeline = builder(Arc::default())
            .extractor(Box::new(MockExtractor::new("gpt", Some(record(1.0)))))
            .build()
            .unwrap();
        let result = pipeline.process_extractions(&DocumentRef::from_path("scan.png"), "bescheid", vec![]);
        assert!(matches!(result, Err(VerdictError::ConfigError { .. })));
    }
}
