//! # docverdict-core
//!
//! The validation runtime for docverdict.
//!
//! This crate provides:
//! - The collaborator traits (`Extractor`, `SemanticValidator`, `Verifier`,
//!   `Reconciler`, `DecisionPolicy`, `ResultSink`, `SchemaProvider`)
//! - The `DocumentRegistry` of known document types
//! - The `DocumentPipeline` that runs every signal for one document
//! - The `BatchRunner` that drives the pipeline over many documents
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docverdict_core::{DocumentPipeline, DocumentRegistry, traits::{Extractor, Verifier}};
//! ```

pub mod batch;
pub mod pipeline;
pub mod registry;
pub mod response;
pub mod semantic;
pub mod traits;

pub use batch::{discover_documents, BatchReport, BatchRunner};
pub use pipeline::DocumentPipeline;
pub use registry::DocumentRegistry;
