//! # docverdict-audit
//!
//! Durable artifacts of a docverdict run.
//!
//! ## Overview
//!
//! - [`JsonResultStore`] writes one pretty-printed JSON file per document
//!   (atomically, via a temporary file and rename) and appends a line to the
//!   run's `index.jsonl`.
//! - [`RunManifest`] records what produced the directory: experiment,
//!   extractors, validators, timestamps and a `sha256:` hash of the config.
//! - [`InMemoryResultSink`] keeps results in memory for demos and tests.
//! - [`metrics`] reads a finished run back and reports status distribution,
//!   audit readiness, semantic stability and ground-truth field accuracy.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docverdict_audit::{JsonResultStore, RunManifest};
//! use docverdict_core::BatchRunner;
//!
//! let store = JsonResultStore::open(&output_dir, run_id.clone(), &experiment.name)?;
//! let mut manifest = RunManifest::start(run_id, experiment, &config_path, &input, &output_dir, docs.len())?;
//! manifest.write(store.dir())?;
//!
//! let report = BatchRunner::new(&pipeline, &store).run(&docs);
//!
//! manifest.finish(chrono::Utc::now());
//! manifest.write(store.dir())?;
//! ```

pub mod index;
pub mod manifest;
pub mod memory;
pub mod metrics;
pub mod store;

pub use index::{IndexEntry, RunIndex};
pub use manifest::{config_hash, RunManifest};
pub use memory::InMemoryResultSink;
pub use metrics::{evaluate_experiment, ExperimentMetrics, GroundTruth};
pub use store::{safe_name, JsonResultStore};

// ── Tests ─────────────────────────────────────────────────────────────────────
