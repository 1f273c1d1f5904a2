//! Demo scenarios.
//!
//! Each scenario wires the real verifier, reconciler and decision policy
//! from the embedded `experiments.toml` to fixed collaborators and pushes a
//! single document through the pipeline.

pub mod leave_conflict;
pub mod totals_mismatch;
pub mod valid_invoice;

use docverdict_audit::InMemoryResultSink;
use docverdict_contracts::{
    error::VerdictResult,
    result::{AggregatedResult, DocumentRef},
    value::Record,
};
use docverdict_core::{traits::ResultSink, DocumentPipeline};
use docverdict_policy::PipelineConfig;

use crate::{
    fixtures::{ApprovingValidator, FixedExtractor},
    runtime::pipeline_builder,
};

/// Embedded configuration shared by all scenarios.
pub const EXPERIMENTS: &str = include_str!("../../config/experiments.toml");

/// Experiment the scenarios run under: two extractors, one checker.
const EXPERIMENT: &str = "gpt_vs_pixtral";

/// A pipeline whose primary extractor returns `primary` and whose second
/// extractor returns `secondary`.
fn demo_pipeline(primary: Record, secondary: Record) -> VerdictResult<DocumentPipeline> {
    let config = PipelineConfig::from_toml_str(EXPERIMENTS)?;
    let experiment = config.experiment(EXPERIMENT)?;

    let mut builder = pipeline_builder(&config)?.primary(experiment.primary());
    for (extractor, data) in experiment.extractors.iter().zip([primary, secondary]) {
        builder = builder.extractor(Box::new(FixedExtractor::new(
            &extractor.id,
            &extractor.provider,
            &extractor.model,
            data,
        )));
    }
    for validator in experiment.resolved_validators() {
        builder = builder.semantic_validator(Box::new(ApprovingValidator::new(
            &validator.provider,
            &validator.model,
        )));
    }
    builder.build()
}

/// Process `file_name` and keep the result in memory.
fn process(file_name: &str, primary: Record, secondary: Record) -> VerdictResult<AggregatedResult> {
    let pipeline = demo_pipeline(primary, secondary)?;
    let sink = InMemoryResultSink::new();

    let result = pipeline.process(&DocumentRef::from_path(file_name))?;
    let location = sink.persist(&result)?;
    println!("  Stored as:              {location}");
    Ok(result)
}

fn print_result(result: &AggregatedResult) {
    println!("  Document type:          {}", result.doc_type);
    for violation in result
        .schema_validation
        .violations
        .iter()
        .chain(&result.rule_validation.violations)
    {
        println!(
            "  [{}] {} on '{}': {}",
            violation.severity, violation.rule, violation.field, violation.message
        );
    }
    if let Some(report) = &result.cross_model_validation {
        for conflict in &report.conflicts {
            println!(
                "  [{}] cross-model '{}': {}",
                conflict.severity, conflict.field, conflict.message
            );
        }
    }
    println!("  Semantic status:        {}", result.semantic_validation.status);
    println!("  Final status:           {}", result.final_status);
    println!();
    println!("  {}", result.summary);
    println!();
}
