//! Error types for the docverdict pipeline.
//!
//! Validators never fail: a malformed record produces violations, not errors.
//! `VerdictError` covers the cases where the pipeline itself cannot proceed:
//! bad configuration, broken registrations, failed collaborators, and
//! persistence failures.

use thiserror::Error;

/// The unified error type for the docverdict crates.
#[derive(Debug, Error)]
pub enum VerdictError {
    /// The requested document type is not registered.
    ///
    /// Fatal for the affected document only; batch runs skip it and continue.
    #[error("unknown document type '{doc_type}' (available: {})", .available.join(", "))]
    UnknownDocumentType {
        doc_type: String,
        available: Vec<String>,
    },

    /// A configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A field specification or document-type registration is malformed.
    ///
    /// Raised at registry construction, never while validating a record.
    #[error("invalid schema for '{doc_type}': {reason}")]
    InvalidSchema { doc_type: String, reason: String },

    /// An external collaborator (extractor, semantic checker) failed outright.
    #[error("collaborator '{collaborator}' failed: {reason}")]
    CollaboratorFailed { collaborator: String, reason: String },

    /// A result file, index line, or manifest could not be written.
    #[error("persistence failed: {reason}")]
    PersistFailed { reason: String },
}

/// Convenience alias used throughout the docverdict crates.
pub type VerdictResult<T> = Result<T, VerdictError>;
