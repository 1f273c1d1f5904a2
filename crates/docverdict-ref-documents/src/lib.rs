//! # docverdict-ref-documents
//!
//! Reference document types and runtime pieces for docverdict.
//!
//! ## Overview
//!
//! - [`documents`] declares five German administrative documents
//!   (`urlaubsantrag`, `rechnung`, `reisekosten`, `bescheid`,
//!   `meldebescheinigung`) with their schemas, rule lists and key aliases.
//! - [`replay`] provides an extractor and a semantic validator that read
//!   recorded model responses from disk, so a batch can be re-validated
//!   without network access.
//! - [`runtime`] assembles a pipeline from a [`PipelineConfig`](docverdict_policy::PipelineConfig).
//! - [`scenarios`] are three self-contained demos built on [`fixtures`].
//!
//! All fixture data is fictional.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use docverdict_ref_documents::runtime::replay_pipeline;
//!
//! let config = PipelineConfig::from_file(Path::new("experiments.toml"))?;
//! let experiment = config.experiment("gpt_vs_pixtral")?;
//! let pipeline = replay_pipeline(&config, experiment, Path::new("responses"))?;
//!
//! let result = pipeline.process(&DocumentRef::from_path("input/INV_0001.png"))?;
//! println!("{}", result.summary);
//! ```

pub mod documents;
pub mod fixtures;
pub mod replay;
pub mod runtime;
pub mod scenarios;

// ── Tests ─────────────────────────────────────────────────────────────────────
