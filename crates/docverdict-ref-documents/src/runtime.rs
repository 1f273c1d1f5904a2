//! Assembling a pipeline from configuration.

use std::path::Path;

use tracing::info;

use docverdict_contracts::error::VerdictResult;
use docverdict_core::{
    pipeline::PipelineBuilder, semantic::RetryOnParseError, traits::SemanticValidator,
    DocumentPipeline,
};
use docverdict_policy::{ExperimentConfig, PipelineConfig, VerdictPolicy};
use docverdict_verify::{CrossModelReconciler, RecordVerifier, RuleEngine};

use crate::{
    documents::default_registry,
    replay::{ReplayExtractor, ReplaySemanticValidator},
};

/// A builder holding the reference registry and the trusted components
/// configured by `config`. Collaborators still have to be added.
pub fn pipeline_builder(config: &PipelineConfig) -> VerdictResult<PipelineBuilder> {
    Ok(DocumentPipeline::builder(
        default_registry()?,
        Box::new(RecordVerifier::new(
            config.validation.allow_extra_keys,
            RuleEngine::new(),
        )),
        Box::new(CrossModelReconciler::new(config.reconcile)),
        Box::new(VerdictPolicy::new()),
    ))
}

/// A pipeline for `experiment` whose collaborators replay the recorded
/// responses in `responses`.
pub fn replay_pipeline(
    config: &PipelineConfig,
    experiment: &ExperimentConfig,
    responses: &Path,
) -> VerdictResult<DocumentPipeline> {
    experiment.check()?;
    let mut builder = pipeline_builder(config)?.primary(experiment.primary());

    for extractor in &experiment.extractors {
        builder = builder.extractor(Box::new(ReplayExtractor::from_config(
            extractor,
            responses,
            config.reconcile.fuzzy_cutoff,
        )));
    }

    for validator in experiment.resolved_validators() {
        let replay: Box<dyn SemanticValidator> =
            Box::new(ReplaySemanticValidator::from_config(&validator, responses));
        builder = builder.semantic_validator(match validator.retry_on_parse_error {
            0 => replay,
            retries => Box::new(RetryOnParseError::new(replay, retries)),
        });
    }

    info!(
        experiment = %experiment.name,
        extractors = experiment.extractors.len(),
        validators = experiment.validators.len(),
        responses = %responses.display(),
        "replay pipeline assembled"
    );
    builder.build()
}
