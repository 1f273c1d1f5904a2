//! Merging independent semantic checks into one verdict.
//!
//! Stages run one after another and never see each other's output. The
//! merged status follows a strict precedence that does not depend on stage
//! order:
//!
//!   invalid  >  uncertain / parse_error  >  valid
//!
//! A skipped stage raises no doubt, so stages that were all skipped merge
//! to `valid`. Only an empty stage list yields the `skipped` sentinel.

use tracing::{debug, warn};

use docverdict_contracts::{
    result::DocumentRef,
    semantic::{MergedSemanticResult, SemanticStatus, StageResult},
    value::Record,
    violation::SeverityCounts,
};

use crate::traits::SemanticValidator;

/// Comment used when the validator list is empty.
pub const NO_VALIDATORS_COMMENT: &str = "No semantic validators configured.";

/// Status precedence across a non-empty list of stages.
pub fn merged_status<'a>(statuses: impl IntoIterator<Item = &'a SemanticStatus>) -> SemanticStatus {
    let mut any_doubtful = false;
    for status in statuses {
        match status {
            SemanticStatus::Invalid => return SemanticStatus::Invalid,
            SemanticStatus::Uncertain | SemanticStatus::ParseError => any_doubtful = true,
            SemanticStatus::Valid | SemanticStatus::Skipped => {}
        }
    }
    if any_doubtful {
        SemanticStatus::Uncertain
    } else {
        SemanticStatus::Valid
    }
}

/// Combine per-stage results.
///
/// Issues are concatenated in stage order, comments joined with `" | "`,
/// durations summed and rounded to milliseconds, models and providers
/// deduplicated in first-seen order. Zero stages yields the `skipped`
/// sentinel.
pub fn merge_stage_results(stages: Vec<StageResult>) -> MergedSemanticResult {
    if stages.is_empty() {
        return MergedSemanticResult::skipped(NO_VALIDATORS_COMMENT);
    }

    let status = merged_status(stages.iter().map(|s| &s.status));

    let issues: Vec<_> = stages.iter().flat_map(|s| s.issues.iter().cloned()).collect();
    let stats = SeverityCounts::from_severities(issues.iter().map(|i| i.severity));

    let comments = stages
        .iter()
        .map(|s| s.comments.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");

    let total: f64 = stages.iter().map(|s| s.duration_seconds).sum();
    let duration_seconds_total = (total * 1000.0).round() / 1000.0;

    let mut models_used: Vec<String> = Vec::new();
    let mut providers_used: Vec<String> = Vec::new();
    for stage in &stages {
        if !stage.model.is_empty() && !models_used.contains(&stage.model) {
            models_used.push(stage.model.clone());
        }
        if !stage.provider.is_empty() && !providers_used.contains(&stage.provider) {
            providers_used.push(stage.provider.clone());
        }
    }

    MergedSemanticResult {
        status,
        issues,
        comments,
        stages,
        duration_seconds_total,
        models_used,
        providers_used,
        stats,
    }
}

/// Wraps a checker and asks again when its output cannot be parsed.
///
/// Durations of all attempts add up on the returned stage.
pub struct RetryOnParseError {
    inner: Box<dyn SemanticValidator>,
    retries: u32,
}

impl RetryOnParseError {
    pub fn new(inner: Box<dyn SemanticValidator>, retries: u32) -> Self {
        Self { inner, retries }
    }
}

impl SemanticValidator for RetryOnParseError {
    fn provider(&self) -> &str {
        self.inner.provider()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn check(&self, document: &DocumentRef, data: &Record) -> StageResult {
        let mut stage = self.inner.check(document, data);
        let mut attempt = 0;
        while stage.status == SemanticStatus::ParseError && attempt < self.retries {
            attempt += 1;
            debug!(
                document = %document.name,
                model = %self.inner.model(),
                attempt,
                "retrying semantic check after parse error"
            );
            let elapsed = stage.duration_seconds;
            stage = self.inner.check(document, data);
            stage.duration_seconds += elapsed;
        }
        stage
    }
}

/// Run every validator on `data` in sequence and merge the results.
pub fn multi_stage_semantic_validate(
    validators: &[Box<dyn SemanticValidator>],
    document: &DocumentRef,
    data: &Record,
) -> MergedSemanticResult {
    if validators.is_empty() {
        return MergedSemanticResult::skipped(NO_VALIDATORS_COMMENT);
    }

    let stages: Vec<StageResult> = validators
        .iter()
        .enumerate()
        .map(|(index, validator)| {
            let stage = validator.check(document, data);
            if stage.status == SemanticStatus::ParseError {
                warn!(
                    document = %document.name,
                    stage = index + 1,
                    provider = %stage.provider,
                    model = %stage.model,
                    "semantic checker output could not be parsed"
                );
            } else {
                debug!(
                    document = %document.name,
                    stage = index + 1,
                    status = %stage.status,
                    issues = stage.issues.len(),
                    "semantic stage finished"
                );
            }
            stage
        })
        .collect();

    merge_stage_results(stages)
}
