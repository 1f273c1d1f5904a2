//! # docverdict-verify
//!
//! Deterministic checks on extracted records.
//!
//! - [`schema::validate_schema`]: presence, emptiness and declared type.
//! - [`rules::RuleEngine`]: the rule families (`RuleKind`) plus custom rules
//!   registered by name.
//! - [`reconcile::CrossModelReconciler`]: shape forcing with aliases and fuzzy
//!   key matching, then field-by-field comparison of two extractions.
//! - [`verifier::RecordVerifier`]: the pipeline's `Verifier`.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use docverdict_verify::{rules::RuleEngine, verifier::RecordVerifier};
//!
//! let mut engine = RuleEngine::new();
//! engine.register_rule("siegel_required", Box::new(|data| {
//!     match data.get("siegel") {
//!         Some(Value::Bool(true)) => vec![],
//!         _ => vec![Violation::new("siegel", "siegel_missing", Severity::Warning, "no seal")],
//!     }
//! }));
//! let verifier = RecordVerifier::new(true, engine);
//! ```

pub mod dates;
pub mod keys;
pub mod reconcile;
pub mod rules;
pub mod schema;
pub mod verifier;

pub use reconcile::{CrossModelReconciler, ReconcileConfig};
pub use rules::RuleEngine;
pub use verifier::RecordVerifier;
