//! Scenario 2: Invoice Totals Mismatch
//!
//! The same invoice, but both extractors read a gross total of 130.00.
//! Net plus VAT is 119.00, so the rule engine reports `totals_mismatch` on
//! `total_gross` as an error and the document is `invalid`, even though
//! the extractors agree with each other.

use docverdict_contracts::{error::VerdictResult, result::AggregatedResult};

use super::{print_result, process};
use crate::fixtures::invoice;

pub const DOCUMENT: &str = "INV_0002.png";

pub fn run() -> VerdictResult<AggregatedResult> {
    process(DOCUMENT, invoice(130.0), invoice(130.0))
}

pub fn run_scenario() -> VerdictResult<()> {
    println!("=== Scenario 2: Invoice Totals Mismatch ===");
    println!();
    println!("  Invoice:                {DOCUMENT}");
    println!("  Totals:                 100.00 + 19.00 vs. 130.00");
    println!();

    let result = run()?;
    print_result(&result);

    println!("  Scenario 2 complete.");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use docverdict_contracts::{result::FinalStatus, violation::Severity};

    use super::run;

    #[test]
    fn mismatching_totals_make_the_invoice_invalid() {
        let result = run().unwrap();

        let errors: Vec<_> = result
            .rule_validation
            .violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "totals_mismatch");
        assert_eq!(errors[0].field, "total_gross");
        assert!(!result.rule_validation.is_valid);
        assert_eq!(result.final_status, FinalStatus::Invalid);
    }
}
