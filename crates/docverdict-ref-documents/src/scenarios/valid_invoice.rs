//! Scenario 1: Valid Invoice
//!
//! Both extractors read the same invoice: 100.00 net, 19.00 VAT, 119.00
//! gross, one line item of 2 × 10.00. Totals and item arithmetic agree, the
//! extractors agree and the semantic checker approves, so the document is
//! `valid`.

use docverdict_contracts::{error::VerdictResult, result::AggregatedResult};

use super::{print_result, process};
use crate::fixtures::invoice;

pub const DOCUMENT: &str = "INV_0001.png";

/// Process the invoice without printing.
pub fn run() -> VerdictResult<AggregatedResult> {
    process(DOCUMENT, invoice(119.0), invoice(119.0))
}

pub fn run_scenario() -> VerdictResult<()> {
    println!("=== Scenario 1: Valid Invoice ===");
    println!();
    println!("  Invoice:                {DOCUMENT}");
    println!("  Totals:                 100.00 + 19.00 = 119.00");
    println!();

    let result = run()?;
    print_result(&result);

    println!("  Scenario 1 complete.");
    println!();
    Ok(())
}
