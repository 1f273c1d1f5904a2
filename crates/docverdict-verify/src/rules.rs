//! The rule engine.
//!
//! Each [`RuleKind`] is a pure function from a record to a list of
//! violations. Rules never fail: when a value they need is absent or has the
//! wrong type they have no opinion and report nothing. Presence and type are
//! the schema validator's business.
//!
//! Document-specific checks that do not fit a built-in family are registered
//! by name with [`RuleEngine::register_rule`] and referenced from a rule list
//! through `RuleKind::Custom`.

use std::collections::HashMap;

use tracing::{debug, warn};

use docverdict_contracts::{
    error::{VerdictError, VerdictResult},
    rule::RuleKind,
    value::{Record, Value},
    violation::{Severity, ValidationReport, Violation},
};

use crate::dates::parse_date;

/// A caller-supplied rule.
///
/// Receives the whole record and returns its findings (empty on success).
pub type CustomRuleFn = Box<dyn Fn(&Record) -> Vec<Violation> + Send + Sync>;

/// Slack added to tolerance comparisons so that the boundary itself passes
/// despite binary rounding.
const EPSILON: f64 = 1e-9;

/// Evaluates rule lists against records.
pub struct RuleEngine {
    custom_rules: HashMap<String, CustomRuleFn>,
}

impl RuleEngine {
    /// An engine with only the built-in rule families.
    pub fn new() -> Self {
        Self {
            custom_rules: HashMap::new(),
        }
    }

    /// Register `f` under `name`, replacing any earlier registration.
    pub fn register_rule(&mut self, name: impl Into<String>, f: CustomRuleFn) {
        self.custom_rules.insert(name.into(), f);
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.custom_rules.contains_key(name)
    }

    /// Fail if `rules` references a custom rule that is not registered.
    pub fn check_rules(&self, rules: &[RuleKind]) -> VerdictResult<()> {
        for rule in rules {
            if let RuleKind::Custom { name } = rule {
                if !self.has_rule(name) {
                    return Err(VerdictError::ConfigError {
                        reason: format!("no custom rule registered under '{name}'"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Run every rule and collect all violations in rule order.
    pub fn validate(&self, data: &Record, rules: &[RuleKind]) -> ValidationReport {
        let mut violations = Vec::new();
        for rule in rules {
            let found = self.evaluate(rule, data);
            if !found.is_empty() {
                debug!(rule = rule.family(), count = found.len(), "rule reported violations");
            }
            violations.extend(found);
        }
        ValidationReport::from_violations(violations)
    }

    /// Findings of a single rule.
    pub fn evaluate(&self, rule: &RuleKind, data: &Record) -> Vec<Violation> {
        match rule {
            // ── Required core ─────────────────────────────────────────────────
            RuleKind::RequiredNonEmpty { fields } => fields
                .iter()
                .filter(|field| resolve(data, field).map_or(true, Value::is_empty_value))
                .map(|field| {
                    Violation::new(
                        field.as_str(),
                        "required",
                        Severity::Error,
                        format!("Required field '{field}' is missing or empty."),
                    )
                })
                .collect(),

            // ── Date format ───────────────────────────────────────────────────
            RuleKind::DateFormat { field, severity } => match resolve(data, field) {
                None | Some(Value::Null) => vec![],
                Some(Value::String(s)) if s.is_empty() => vec![],
                Some(value) if parse_date(value).is_none() => vec![Violation::new(
                    field.as_str(),
                    "date_format",
                    *severity,
                    format!("Date '{value}' is not in an accepted format (DD.MM.YYYY or DD.MM.YY)."),
                )],
                Some(_) => vec![],
            },

            // ── Date order ────────────────────────────────────────────────────
            RuleKind::DateOrder {
                start,
                end,
                report_field,
                rule,
            } => match (date_at(data, start), date_at(data, end)) {
                (Some(from), Some(to)) if from > to => vec![Violation::new(
                    report_field.as_str(),
                    rule.as_str(),
                    Severity::Error,
                    format!(
                        "'{start}' ({}) is after '{end}' ({}).",
                        from.format("%d.%m.%Y"),
                        to.format("%d.%m.%Y")
                    ),
                )],
                _ => vec![],
            },

            // ── Day count ─────────────────────────────────────────────────────
            RuleKind::DayCount { start, end, days } => {
                let (Some(from), Some(to)) = (date_at(data, start), date_at(data, end)) else {
                    return vec![];
                };
                let Some(count) = resolve(data, days).and_then(Value::as_i64) else {
                    return vec![];
                };
                let span = (to - from).num_days() + 1;
                if count <= 0 {
                    vec![Violation::new(
                        days.as_str(),
                        "days_nonpositive",
                        Severity::Error,
                        format!("Day count {count} is not positive."),
                    )]
                } else if count > span {
                    vec![Violation::new(
                        days.as_str(),
                        "days_inconsistent",
                        Severity::Warning,
                        format!("Day count ({count}) exceeds the period of {span} days."),
                    )]
                } else {
                    vec![]
                }
            }

            // ── Sum consistency ───────────────────────────────────────────────
            RuleKind::SumConsistency {
                parts,
                total,
                tolerance,
                require_all_parts,
                rule,
                severity,
            } => {
                let Some(declared) = resolve(data, total).and_then(Value::as_f64) else {
                    return vec![];
                };
                let values: Vec<Option<f64>> = parts
                    .iter()
                    .map(|part| resolve(data, part).and_then(Value::as_f64))
                    .collect();
                if *require_all_parts && values.iter().any(Option::is_none) {
                    return vec![];
                }
                let present: Vec<f64> = values.into_iter().flatten().collect();
                if present.is_empty() {
                    return vec![];
                }
                let computed = round2(present.iter().sum());
                if exceeds(computed, declared, *tolerance) {
                    vec![Violation::new(
                        total.as_str(),
                        rule.as_str(),
                        *severity,
                        format!(
                            "Sum of {} ({computed:.2}) differs from '{total}' ({declared}).",
                            parts.join(" + ")
                        ),
                    )]
                } else {
                    vec![]
                }
            }

            // ── Line items ────────────────────────────────────────────────────
            RuleKind::ItemsStructure { field, item_keys } => match resolve(data, field) {
                None | Some(Value::Null) => vec![],
                Some(Value::List(items)) => items
                    .iter()
                    .enumerate()
                    .flat_map(|(i, item)| match item.as_object() {
                        None => vec![Violation::new(
                            format!("{field}[{i}]"),
                            "type",
                            Severity::Error,
                            format!("Item {i} is not an object."),
                        )],
                        Some(map) => item_keys
                            .iter()
                            .filter(|key| !map.contains_key(key.as_str()))
                            .map(|key| {
                                Violation::new(
                                    format!("{field}[{i}].{key}"),
                                    "missing_key",
                                    Severity::Warning,
                                    format!("Item {i} has no '{key}'."),
                                )
                            })
                            .collect(),
                    })
                    .collect(),
                Some(other) => vec![Violation::new(
                    field.as_str(),
                    "type",
                    Severity::Error,
                    format!("'{field}' is a {}, not a list.", other.type_name()),
                )],
            },

            RuleKind::ItemTotals {
                field,
                quantity,
                unit_price,
                total,
                tolerance,
            } => {
                let Some(items) = resolve(data, field).and_then(Value::as_list) else {
                    return vec![];
                };
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| {
                        let q = item.get(quantity)?.as_f64()?;
                        let price = item.get(unit_price)?.as_f64()?;
                        let declared = item.get(total)?.as_f64()?;
                        let computed = round2(q * price);
                        exceeds(computed, declared, *tolerance).then(|| {
                            Violation::new(
                                format!("{field}[{i}].{total}"),
                                "item_total_mismatch",
                                Severity::Warning,
                                format!(
                                    "Item {i}: {quantity} * {unit_price} = {computed:.2}, but {total} is {declared}."
                                ),
                            )
                        })
                    })
                    .collect()
            }

            // ── Positivity ────────────────────────────────────────────────────
            RuleKind::Positive { field, rule } => match resolve(data, field).and_then(Value::as_f64) {
                Some(amount) if amount <= 0.0 => vec![Violation::new(
                    field.as_str(),
                    rule.as_str(),
                    Severity::Error,
                    format!("'{field}' must be greater than zero, found {amount}."),
                )],
                _ => vec![],
            },

            // ── Custom ────────────────────────────────────────────────────────
            RuleKind::Custom { name } => match self.custom_rules.get(name.as_str()) {
                Some(f) => f(data),
                None => {
                    warn!(rule = %name, "custom rule not registered");
                    vec![Violation::new(
                        name.as_str(),
                        "unregistered_rule",
                        Severity::Error,
                        format!("No custom rule registered under '{name}'."),
                    )]
                }
            },
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a top-level key or a dotted path into nested objects.
pub fn resolve<'a>(data: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = data.get(segments.next()?)?;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}

fn date_at(data: &Record, path: &str) -> Option<chrono::NaiveDate> {
    resolve(data, path).and_then(parse_date)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// True if `a` and `b` differ by more than `tolerance` (boundary inclusive).
fn exceeds(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() > tolerance + EPSILON
}
