//! Declarative business-rule variants.
//!
//! Each document type carries an ordered list of `RuleKind`s. The rule
//! engine in `docverdict-verify` evaluates them; this module only defines
//! the data. Field references are top-level keys or dotted paths into
//! nested objects (`kosten_details.transport`).

use serde::{Deserialize, Serialize};

use crate::violation::Severity;

/// The rule families the engine supports.
///
/// `Custom` hands off to a function registered on the engine by name, so
/// document-specific logic can live outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Every listed field must be present and non-empty. Error `required`.
    RequiredNonEmpty { fields: Vec<String> },

    /// A non-empty value must parse under one of the accepted date patterns.
    DateFormat { field: String, severity: Severity },

    /// When both dates parse, `start` must not be after `end`.
    DateOrder {
        start: String,
        end: String,
        /// Field name reported on the violation (may be composite, `von/bis`).
        report_field: String,
        /// Rule identifier reported on the violation.
        rule: String,
    },

    /// An integer day count must be positive and fit the inclusive span
    /// between two dates.
    DayCount {
        start: String,
        end: String,
        days: String,
    },

    /// The numeric parts must add up to the total within `tolerance`
    /// (boundary inclusive).
    SumConsistency {
        parts: Vec<String>,
        total: String,
        tolerance: f64,
        /// Skip the check unless every part is numeric. Otherwise the
        /// numeric parts that are present are summed.
        require_all_parts: bool,
        rule: String,
        severity: Severity,
    },

    /// A list of line items where each item is an object carrying `item_keys`.
    ItemsStructure { field: String, item_keys: Vec<String> },

    /// Each line item's `quantity * unit_price` must match its `total`.
    ItemTotals {
        field: String,
        quantity: String,
        unit_price: String,
        total: String,
        tolerance: f64,
    },

    /// A numeric field must be greater than zero.
    Positive { field: String, rule: String },

    /// Delegate to a function registered on the rule engine.
    Custom { name: String },
}

impl RuleKind {
    /// Short family name for logs.
    pub fn family(&self) -> &'static str {
        match self {
            RuleKind::RequiredNonEmpty { .. } => "required_non_empty",
            RuleKind::DateFormat { .. } => "date_format",
            RuleKind::DateOrder { .. } => "date_order",
            RuleKind::DayCount { .. } => "day_count",
            RuleKind::SumConsistency { .. } => "sum_consistency",
            RuleKind::ItemsStructure { .. } => "items_structure",
            RuleKind::ItemTotals { .. } => "item_totals",
            RuleKind::Positive { .. } => "positive",
            RuleKind::Custom { .. } => "custom",
        }
    }

    /// Top-level field names this rule reads.
    ///
    /// Used at registration to reject rules that point at undeclared fields.
    pub fn referenced_fields(&self) -> Vec<&str> {
        fn top(path: &str) -> &str {
            path.split('.').next().unwrap_or(path)
        }
        match self {
            RuleKind::RequiredNonEmpty { fields } => fields.iter().map(|f| top(f)).collect(),
            RuleKind::DateFormat { field, .. } | RuleKind::Positive { field, .. } => {
                vec![top(field)]
            }
            RuleKind::DateOrder { start, end, .. } => vec![top(start), top(end)],
            RuleKind::DayCount { start, end, days } => vec![top(start), top(end), top(days)],
            RuleKind::SumConsistency { parts, total, .. } => parts
                .iter()
                .map(|p| top(p))
                .chain(std::iter::once(top(total)))
                .collect(),
            RuleKind::ItemsStructure { field, .. } | RuleKind::ItemTotals { field, .. } => {
                vec![top(field)]
            }
            RuleKind::Custom { .. } => Vec::new(),
        }
    }
}
