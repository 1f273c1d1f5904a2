//! docverdict: validate extracted document data and decide per document.
//!
//! Runs an experiment over a folder of document images, replaying recorded
//! extractor and checker responses, and writes one result file per document
//! plus a run index and manifest.
//!
//! Usage:
//!   docverdict run --config experiments.toml --experiment gpt_vs_pixtral \
//!       --input input/ --responses responses/ --output results/
//!   docverdict list-experiments --config experiments.toml
//!   docverdict list-types
//!   docverdict validate --doc-type rechnung extraction.json
//!   docverdict metrics results/gpt_vs_pixtral --ground-truth ground_truth/
//!   docverdict scenarios all

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use docverdict_audit::{evaluate_experiment, safe_name, GroundTruth, JsonResultStore, RunManifest};
use docverdict_contracts::{
    error::{VerdictError, VerdictResult},
    result::RunId,
    violation::ValidationReport,
};
use docverdict_core::{
    discover_documents,
    response::parse_record_response,
    traits::{SchemaProvider, Verifier},
    BatchRunner,
};
use docverdict_policy::PipelineConfig;
use docverdict_ref_documents::{
    documents::default_registry,
    runtime::replay_pipeline,
    scenarios::{leave_conflict, totals_mismatch, valid_invoice},
};
use docverdict_verify::{RecordVerifier, RuleEngine};

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "docverdict",
    about = "Multi-signal validation of extracted document data",
    long_about = "Checks extracted document data against schemas, deterministic rules,\n\
                  semantic checker verdicts and a second extractor, and folds the\n\
                  signals into valid / review_needed / invalid per document."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an experiment over a folder of document images.
    Run {
        /// Experiment configuration (TOML).
        #[arg(long)]
        config: PathBuf,
        /// Experiment name from the configuration.
        #[arg(long)]
        experiment: String,
        /// Folder of document images, searched recursively.
        #[arg(long)]
        input: PathBuf,
        /// Folder of recorded collaborator responses.
        #[arg(long)]
        responses: PathBuf,
        /// Results go to `<output>/<experiment>/`.
        #[arg(long, default_value = "results")]
        output: PathBuf,
    },
    /// List the experiments in a configuration file.
    ListExperiments {
        #[arg(long)]
        config: PathBuf,
    },
    /// List the registered document types.
    ListTypes,
    /// Check one extracted record against a document type.
    Validate {
        #[arg(long)]
        doc_type: String,
        /// Report keys outside the schema.
        #[arg(long)]
        strict: bool,
        /// JSON file holding the extracted record.
        record: PathBuf,
    },
    /// Compute metrics for a finished experiment directory.
    Metrics {
        dir: PathBuf,
        /// Root of `<doc_type>/<stem>.json` ground-truth files.
        #[arg(long)]
        ground_truth: Option<PathBuf>,
    },
    /// Run the built-in demo scenarios.
    Scenarios {
        #[arg(value_enum, default_value_t = Scenario::All)]
        which: Scenario,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Scenario {
    All,
    ValidInvoice,
    TotalsMismatch,
    LeaveConflict,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            config,
            experiment,
            input,
            responses,
            output,
        } => run(&config, &experiment, &input, &responses, &output),
        Command::ListExperiments { config } => list_experiments(&config),
        Command::ListTypes => list_types(),
        Command::Validate {
            doc_type,
            strict,
            record,
        } => validate(&doc_type, strict, &record),
        Command::Metrics { dir, ground_truth } => metrics(&dir, ground_truth.as_deref()),
        Command::Scenarios { which } => scenarios(which),
    };

    if let Err(e) = result {
        eprintln!("docverdict error: {}", e);
        std::process::exit(1);
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run(
    config_path: &Path,
    experiment: &str,
    input: &Path,
    responses: &Path,
    output: &Path,
) -> VerdictResult<()> {
    let config = PipelineConfig::from_file(config_path)?;
    let experiment = config.experiment(experiment)?;
    let pipeline = replay_pipeline(&config, experiment, responses)?;
    let documents = discover_documents(input)?;

    let output_dir = output.join(safe_name(&experiment.name, "experiment"));
    let run_id = RunId::new();
    let store = JsonResultStore::open(&output_dir, run_id.clone(), &experiment.name)?;
    let mut manifest = RunManifest::start(
        run_id.clone(),
        experiment,
        config_path,
        input,
        &output_dir,
        documents.len(),
    )?;
    manifest.write(store.dir())?;
    info!(run_id = %run_id, experiment = %experiment.name, documents = documents.len(), "run started");

    let report = BatchRunner::new(&pipeline, &store).run(&documents);

    manifest.finish(Utc::now());
    manifest.write(store.dir())?;

    println!("Run {run_id} ({})", experiment.name);
    for processed in &report.processed {
        println!(
            "  {:<14} {:<20} {}",
            processed.final_status.as_str(),
            processed.doc_type,
            processed.document.name
        );
    }
    for skipped in &report.skipped {
        println!("  {:<14} {:<20} {} ({})", "skipped", "-", skipped.document.name, skipped.reason);
    }
    println!();
    for (status, count) in report.status_counts() {
        println!("  {status}: {count}");
    }
    println!("  skipped: {}", report.skipped.len());
    println!("Results in {}", store.dir().display());
    Ok(())
}

fn list_experiments(config_path: &Path) -> VerdictResult<()> {
    let config = PipelineConfig::from_file(config_path)?;
    for experiment in &config.experiments {
        let validators: Vec<&str> = experiment.validators.iter().map(|v| v.id.as_str()).collect();
        println!(
            "{}: primary={}, extractors=[{}], validators=[{}]",
            experiment.name,
            experiment.primary(),
            experiment.extractor_ids().join(", "),
            validators.join(", ")
        );
    }
    Ok(())
}

fn list_types() -> VerdictResult<()> {
    let registry = default_registry()?;
    for doc in registry.iter() {
        println!(
            "{:<20} {:<4} {} ({} fields, {} rules)",
            doc.id,
            doc.filename_prefix.as_deref().unwrap_or("-"),
            doc.display_name,
            doc.schema.len(),
            doc.rules.len()
        );
    }
    Ok(())
}

fn validate(doc_type: &str, strict: bool, record_path: &Path) -> VerdictResult<()> {
    let registry = default_registry()?;
    let doc = registry.document_type(doc_type)?;

    let text = std::fs::read_to_string(record_path).map_err(|e| VerdictError::ConfigError {
        reason: format!("failed to read record '{}': {}", record_path.display(), e),
    })?;
    let record = parse_record_response(&text).ok_or_else(|| VerdictError::ConfigError {
        reason: format!("'{}' holds no JSON object", record_path.display()),
    })?;

    let verifier = RecordVerifier::new(!strict, RuleEngine::new());
    print_report("Schema", &verifier.validate_schema(&record, &doc.schema));
    print_report("Rules", &verifier.validate_rules(&record, &doc.rules));
    Ok(())
}

fn print_report(label: &str, report: &ValidationReport) {
    let stats = report.stats();
    println!(
        "{label}: {} (errors={}, warnings={}, infos={})",
        if report.is_valid { "valid" } else { "invalid" },
        stats.errors,
        stats.warnings,
        stats.infos
    );
    for violation in &report.violations {
        println!(
            "  [{}] {} on '{}': {}",
            violation.severity, violation.rule, violation.field, violation.message
        );
    }
}

fn metrics(dir: &Path, ground_truth: Option<&Path>) -> VerdictResult<()> {
    let truth = match ground_truth {
        Some(root) => GroundTruth::load(root)?,
        None => GroundTruth::default(),
    };
    let metrics = evaluate_experiment(dir, &truth)?;
    let json = serde_json::to_string_pretty(&metrics).map_err(|e| VerdictError::ConfigError {
        reason: format!("failed to render metrics: {e}"),
    })?;
    println!("{json}");
    Ok(())
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn scenarios(which: Scenario) -> VerdictResult<()> {
    match which {
        Scenario::All => {
            valid_invoice::run_scenario()?;
            totals_mismatch::run_scenario()?;
            leave_conflict::run_scenario()?;
        }
        Scenario::ValidInvoice => valid_invoice::run_scenario()?,
        Scenario::TotalsMismatch => totals_mismatch::run_scenario()?,
        Scenario::LeaveConflict => leave_conflict::run_scenario()?,
    }
    println!("All selected scenarios completed successfully.");
    Ok(())
}
