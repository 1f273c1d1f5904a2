//! The [`Verifier`] used by the pipeline.

use docverdict_contracts::{
    error::VerdictResult,
    rule::RuleKind,
    schema::FieldSpecMap,
    value::Record,
    violation::ValidationReport,
};
use docverdict_core::traits::Verifier;

use crate::{rules::RuleEngine, schema::validate_schema};

/// Schema validation plus rule evaluation on one record.
pub struct RecordVerifier {
    allow_extra_keys: bool,
    engine: RuleEngine,
}

impl RecordVerifier {
    pub fn new(allow_extra_keys: bool, engine: RuleEngine) -> Self {
        Self {
            allow_extra_keys,
            engine,
        }
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }
}

impl Default for RecordVerifier {
    /// Extra keys allowed, built-in rules only.
    fn default() -> Self {
        Self::new(true, RuleEngine::new())
    }
}

impl Verifier for RecordVerifier {
    fn validate_schema(&self, data: &Record, schema: &FieldSpecMap) -> ValidationReport {
        validate_schema(data, schema, self.allow_extra_keys)
    }

    fn validate_rules(&self, data: &Record, rules: &[RuleKind]) -> ValidationReport {
        self.engine.validate(data, rules)
    }

    fn check_rules(&self, rules: &[RuleKind]) -> VerdictResult<()> {
        self.engine.check_rules(rules)
    }
}
