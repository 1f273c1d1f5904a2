//! Collaborators that replay recorded model responses.
//!
//! A live deployment calls vision models; these read what such a model
//! answered earlier, so whole batches can be re-validated offline:
//!
//! - extractor `gpt` on `INV_0001.png` reads `INV_0001.gpt.json`
//! - validator `pixtral-check` reads `INV_0001.pixtral-check.semantic.json`
//!
//! Responses are raw model text and go through the same parsing a live
//! response would (code fences and chatter are tolerated).

use std::path::{Path, PathBuf};

use tracing::debug;

use docverdict_contracts::{
    document::DocumentType,
    error::{VerdictError, VerdictResult},
    result::{DocumentRef, Extraction},
    semantic::StageResult,
    value::Record,
};
use docverdict_core::{
    response::{parse_record_response, parse_semantic_response},
    traits::{Extractor, SemanticValidator},
};
use docverdict_policy::{config::ResolvedValidator, ExtractorConfig};
use docverdict_verify::{keys::normalize_key, reconcile::force_schema_shape};

use crate::documents::TYP_ALIASES;

fn recorded_path(dir: &Path, document: &DocumentRef, id: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{}.{}{}", document.stem(), id, suffix))
}

/// Replays `<stem>.<id>.json` as an extraction.
#[derive(Debug, Clone)]
pub struct ReplayExtractor {
    id: String,
    provider: String,
    model: String,
    dir: PathBuf,
    /// Fuzzy cutoff for schema shape forcing; `None` keeps the raw keys.
    shape_cutoff: Option<f64>,
}

impl ReplayExtractor {
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
        dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            model: model.into(),
            dir: dir.into(),
            shape_cutoff: None,
        }
    }

    /// Force replayed records into the schema's shape.
    pub fn forcing_shape(mut self, fuzzy_cutoff: f64) -> Self {
        self.shape_cutoff = Some(fuzzy_cutoff);
        self
    }

    pub fn from_config(config: &ExtractorConfig, dir: &Path, fuzzy_cutoff: f64) -> Self {
        let extractor = Self::new(&config.id, &config.provider, &config.model, dir);
        if config.force_schema_shape {
            extractor.forcing_shape(fuzzy_cutoff)
        } else {
            extractor
        }
    }

    fn read(&self, document: &DocumentRef) -> VerdictResult<(String, Record)> {
        let path = recorded_path(&self.dir, document, &self.id, ".json");
        let text = std::fs::read_to_string(&path).map_err(|e| VerdictError::CollaboratorFailed {
            collaborator: self.id.clone(),
            reason: format!("no recorded response at '{}': {}", path.display(), e),
        })?;
        let record = parse_record_response(&text).ok_or_else(|| VerdictError::CollaboratorFailed {
            collaborator: self.id.clone(),
            reason: format!("recorded response '{}' holds no JSON object", path.display()),
        })?;
        Ok((text, record))
    }
}

impl Extractor for ReplayExtractor {
    fn id(&self) -> &str {
        &self.id
    }

    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn extract(&self, document: &DocumentRef, doc_type: &DocumentType) -> VerdictResult<Extraction> {
        let (text, raw) = self.read(document)?;
        let data = match self.shape_cutoff {
            Some(cutoff) => force_schema_shape(&raw, doc_type, cutoff),
            None => raw,
        };
        debug!(document = %document.name, extractor = %self.id, fields = data.len(), "replayed extraction");
        Ok(Extraction {
            extractor_id: self.id.clone(),
            provider: self.provider.clone(),
            model: self.model.clone(),
            data,
            raw_response: Some(text),
            duration_seconds: 0.0,
            error: None,
        })
    }

    fn type_hint(&self, document: &DocumentRef) -> Option<String> {
        let (_, record) = self.read(document).ok()?;
        record
            .iter()
            .find(|(key, _)| TYP_ALIASES.contains(&normalize_key(key).as_str()))
            .and_then(|(_, value)| value.as_str())
            .map(str::to_string)
    }
}

/// Replays `<stem>.<id>.semantic.json` as a semantic stage.
///
/// A missing recording is a `parse_error` stage, like an unreadable answer.
#[derive(Debug, Clone)]
pub struct ReplaySemanticValidator {
    id: String,
    provider: String,
    model: String,
    dir: PathBuf,
}

impl ReplaySemanticValidator {
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
        dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            model: model.into(),
            dir: dir.into(),
        }
    }

    pub fn from_config(config: &ResolvedValidator, dir: &Path) -> Self {
        Self::new(&config.id, &config.provider, &config.model, dir)
    }
}

impl SemanticValidator for ReplaySemanticValidator {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn check(&self, document: &DocumentRef, _data: &Record) -> StageResult {
        let path = recorded_path(&self.dir, document, &self.id, ".semantic.json");
        match std::fs::read_to_string(&path) {
            Ok(text) => parse_semantic_response(&text, &self.provider, &self.model, 0.0),
            Err(e) => StageResult::parse_error(
                &self.provider,
                &self.model,
                format!("no recorded response at '{}': {}", path.display(), e),
                None,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use docverdict_contracts::{
        error::VerdictError, result::DocumentRef, semantic::SemanticStatus, value::Record, value::Value,
    };
    use docverdict_core::traits::{Extractor, SemanticValidator};

    use super::{ReplayExtractor, ReplaySemanticValidator};
    use crate::documents::rechnung;

    // ── Extraction ────────────────────────────────────────────────────────────

    #[test]
    fn replays_fenced_extraction() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("INV_0001.gpt.json"),
            "```json\n{\"typ\": \"rechnung\", \"total_gross\": 119.0}\n```",
        )
        .unwrap();
        let extractor = ReplayExtractor::new("gpt", "openai", "gpt-4o", dir.path());
        let doc = rechnung::document_type().unwrap();

        let extraction = extractor
            .extract(&DocumentRef::from_path("input/INV_0001.png"), &doc)
            .unwrap();

        assert_eq!(extraction.data.len(), 2);
        assert_eq!(extraction.data["total_gross"], Value::Float(119.0));
        assert!(extraction.raw_response.unwrap().starts_with("```json"));
    }

    #[test]
    fn shape_forcing_maps_aliases() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("INV_0001.pixtral.json"),
            r#"{"Rechnungsnummer": "RE-7", "Gesamt": "119,00 €"}"#,
        )
        .unwrap();
        let extractor =
            ReplayExtractor::new("pixtral", "mistral", "pixtral-large-latest", dir.path()).forcing_shape(0.92);
        let doc = rechnung::document_type().unwrap();

        let data = extractor
            .extract(&DocumentRef::from_path("INV_0001.png"), &doc)
            .unwrap()
            .data;

        assert_eq!(data.len(), doc.schema.len());
        assert_eq!(data["rechnungsnummer"], Value::from("RE-7"));
        assert_eq!(data["total_gross"], Value::Float(119.0));
        assert_eq!(data["typ"], Value::from("rechnung"));
    }

    #[test]
    fn missing_recording_is_a_collaborator_failure() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = ReplayExtractor::new("gpt", "openai", "gpt-4o", dir.path());
        let result = extractor.extract(
            &DocumentRef::from_path("INV_0009.png"),
            &rechnung::document_type().unwrap(),
        );
        assert!(matches!(result, Err(VerdictError::CollaboratorFailed { .. })));
    }

    #[test]
    fn type_hint_reads_the_typ_field() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scan_7.gpt.json"), r#"{"documentType": "Gebührenbescheid"}"#).unwrap();
        let extractor = ReplayExtractor::new("gpt", "openai", "gpt-4o", dir.path());

        assert_eq!(
            extractor.type_hint(&DocumentRef::from_path("scan_7.png")).as_deref(),
            Some("Gebührenbescheid")
        );
        assert_eq!(extractor.type_hint(&DocumentRef::from_path("scan_8.png")), None);
    }

    // ── Semantic ──────────────────────────────────────────────────────────────

    #[test]
    fn replays_semantic_verdict() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("NOT_0001.pixtral-check.semantic.json"),
            r#"{"status": "invalid", "issues": [{"field": "betrag", "type": "mismatch", "severity": "error", "message": "77,22 statt 72,22"}], "comments": ""}"#,
        )
        .unwrap();
        let validator = ReplaySemanticValidator::new("pixtral-check", "mistral", "pixtral-large-latest", dir.path());

        let stage = validator.check(&DocumentRef::from_path("NOT_0001.png"), &Record::new());

        assert_eq!(stage.status, SemanticStatus::Invalid);
        assert_eq!(stage.issues[0].field, "betrag");
        assert_eq!(stage.provider, "mistral");
    }

    #[test]
    fn missing_semantic_recording_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let validator = ReplaySemanticValidator::new("gpt-check", "openai", "gpt-4o", dir.path());
        let stage = validator.check(&DocumentRef::from_path("NOT_0001.png"), &Record::new());
        assert_eq!(stage.status, SemanticStatus::ParseError);
        assert!(stage.comments.contains("NOT_0001.gpt-check.semantic.json"));
    }
}
