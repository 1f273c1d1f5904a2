//! The document-type registry.
//!
//! Built once at startup and passed to the pipeline; never a global.
//! Registration validates everything up front so lookups cannot fail on
//! malformed data later.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use docverdict_contracts::{
    document::DocumentType,
    error::{VerdictError, VerdictResult},
    result::DocumentRef,
};

use crate::traits::SchemaProvider;

/// Registered document types keyed by lowercase id.
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    types: BTreeMap<String, DocumentType>,
}

/// Canonical form of a document type name: trimmed and lowercase.
pub fn normalize_doc_type(doc_type: &str) -> String {
    doc_type.trim().to_lowercase()
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `doc`.
    ///
    /// Fails with `InvalidSchema` if the id or filename prefix is already
    /// taken.
    pub fn register(&mut self, doc: DocumentType) -> VerdictResult<()> {
        if self.types.contains_key(&doc.id) {
            return Err(VerdictError::InvalidSchema {
                doc_type: doc.id.clone(),
                reason: "document type registered twice".to_string(),
            });
        }
        if let Some(prefix) = &doc.filename_prefix {
            if let Some(other) = self
                .types
                .values()
                .find(|t| t.filename_prefix.as_deref() == Some(prefix.as_str()))
            {
                return Err(VerdictError::InvalidSchema {
                    doc_type: doc.id.clone(),
                    reason: format!("filename prefix '{prefix}' already used by '{}'", other.id),
                });
            }
        }
        debug!(doc_type = %doc.id, fields = doc.schema.len(), rules = doc.rules.len(), "registered document type");
        self.types.insert(doc.id.clone(), doc);
        Ok(())
    }

    /// Chaining form of [`register`](Self::register).
    pub fn with(mut self, doc: DocumentType) -> VerdictResult<Self> {
        self.register(doc)?;
        Ok(self)
    }

    /// Registered ids in sorted order.
    pub fn available(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The type whose filename prefix matches the part of the file stem
    /// before the first `_` (`INV_0001.png` → prefix `INV`).
    pub fn detect_from_filename(&self, file_name: &str) -> Option<&DocumentType> {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())?;
        let prefix = stem.split('_').next()?.trim().to_uppercase();
        if prefix.is_empty() {
            return None;
        }
        self.types
            .values()
            .find(|t| t.filename_prefix.as_deref() == Some(prefix.as_str()))
    }

    /// Resolve a free-text type label such as an extracted `typ` field.
    ///
    /// An exact id wins; otherwise the first registered id contained in
    /// the label (`Gebührenbescheid` → `bescheid`).
    pub fn detect_from_label(&self, label: &str) -> Option<&DocumentType> {
        let label = normalize_doc_type(label);
        if label.is_empty() {
            return None;
        }
        self.types
            .get(&label)
            .or_else(|| self.types.values().find(|t| label.contains(t.id.as_str())))
    }

    /// Work out the document type of `document`.
    ///
    /// Tries, in order: the filename prefix, the `typ_hint` (usually the
    /// primary extraction's `typ` field), and the parent directory name.
    pub fn detect_doc_type(&self, document: &DocumentRef, typ_hint: Option<&str>) -> Option<String> {
        if let Some(doc) = self.detect_from_filename(&document.name) {
            return Some(doc.id.clone());
        }
        if let Some(doc) = typ_hint.and_then(|hint| self.detect_from_label(hint)) {
            return Some(doc.id.clone());
        }
        document
            .path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| normalize_doc_type(&n.to_string_lossy()))
            .filter(|name| self.types.contains_key(name))
    }
}

impl SchemaProvider for DocumentRegistry {
    fn document_type(&self, doc_type: &str) -> VerdictResult<&DocumentType> {
        self.types
            .get(&normalize_doc_type(doc_type))
            .ok_or_else(|| VerdictError::UnknownDocumentType {
                doc_type: doc_type.to_string(),
                available: self.available(),
            })
    }
}
