//! Scenario 3: Leave Request Cross-Model Conflict
//!
//! Two extractors read the same leave request and agree on everything except
//! the optional application date. Each extraction passes schema and rule
//! checks on its own; the disagreement surfaces only as a cross-model
//! warning, which sends the document to `review_needed`.

use docverdict_contracts::{error::VerdictResult, result::AggregatedResult, value::Value};

use super::{print_result, process};
use crate::fixtures::leave_request;

pub const DOCUMENT: &str = "REQ_0001.png";

pub fn run() -> VerdictResult<AggregatedResult> {
    let primary = leave_request()?;
    let mut secondary = primary.clone();
    secondary.insert("datum".to_string(), Value::from("19.01.2026"));
    process(DOCUMENT, primary, secondary)
}

pub fn run_scenario() -> VerdictResult<()> {
    println!("=== Scenario 3: Leave Request Cross-Model Conflict ===");
    println!();
    println!("  Leave request:          {DOCUMENT}");
    println!("  gpt reads datum:        18.01.2026");
    println!("  pixtral reads datum:    19.01.2026");
    println!();

    let result = run()?;
    print_result(&result);

    println!("  Scenario 3 complete.");
    println!();
    Ok(())
}
