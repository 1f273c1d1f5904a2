//! Cross-model reconciliation.
//!
//! Two extractors read the same document; where they disagree, at least one
//! of them is wrong. A secondary extractor may answer with its own key names,
//! so its raw output is first forced into the schema's shape (exact key, then
//! alias, then fuzzy match), numeric strings are coerced, and the two records
//! are compared field by field.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use docverdict_contracts::{
    cross_model::{Conflict, ConflictType, CrossModelReport},
    document::DocumentType,
    schema::{DType, FieldSpecMap},
    value::{Record, Value},
    violation::Severity,
};
use docverdict_core::traits::Reconciler;

use crate::keys::{close_match, coerce_number, normalize_key};

/// Tuning for shape forcing and value comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Minimum similarity for a fuzzy key match.
    pub fuzzy_cutoff: f64,
    /// Absolute tolerance for numeric comparison.
    pub numeric_tolerance: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            fuzzy_cutoff: 0.92,
            numeric_tolerance: 0.01,
        }
    }
}

/// Return a record with exactly the schema's keys, filled from `raw`.
///
/// Each schema key is looked up by normalised name, then through the
/// document type's alias list, then by fuzzy match. Keys that cannot be
/// matched are null. An empty `typ` is filled with the document type id,
/// and numeric fields holding a parseable string are converted.
pub fn force_schema_shape(raw: &Record, doc: &DocumentType, fuzzy_cutoff: f64) -> Record {
    let normalized = normalized_keys(raw);

    let mut out = Record::new();
    for (key, field) in doc.schema.iter() {
        let found = lookup(&normalized, key, doc, fuzzy_cutoff)
            .cloned()
            .unwrap_or_default();
        out.insert(key.to_string(), coerce_field(found, field.dtype));
    }

    if let Some(typ) = out.get_mut("typ") {
        if typ.is_null() || typ.as_str().is_some_and(|s| s.trim().is_empty()) {
            *typ = Value::String(doc.id.clone());
        }
    }

    out
}

/// Schema keys that [`force_schema_shape`] would fill from `raw` rather
/// than default to null.
pub fn matched_keys(raw: &Record, doc: &DocumentType, fuzzy_cutoff: f64) -> BTreeSet<String> {
    let normalized = normalized_keys(raw);
    doc.schema
        .keys()
        .filter(|key| lookup(&normalized, key, doc, fuzzy_cutoff).is_some())
        .map(|key| key.to_string())
        .collect()
}

fn normalized_keys(raw: &Record) -> BTreeMap<String, &Value> {
    raw.iter().map(|(k, v)| (normalize_key(k), v)).collect()
}

/// Exact key, then alias, then fuzzy match.
fn lookup<'a>(
    normalized: &BTreeMap<String, &'a Value>,
    key: &str,
    doc: &DocumentType,
    fuzzy_cutoff: f64,
) -> Option<&'a Value> {
    let wanted = normalize_key(key);
    normalized
        .get(&wanted)
        .or_else(|| {
            doc.aliases_for(key)
                .iter()
                .find_map(|alias| normalized.get(&normalize_key(alias)))
        })
        .or_else(|| {
            close_match(&wanted, normalized.keys().map(String::as_str), fuzzy_cutoff)
                .and_then(|candidate| normalized.get(candidate))
        })
        .copied()
}

/// Convert a numeric string for a numeric field; leave everything else.
///
/// Integer fields get an integer only when the number is integral.
fn coerce_field(value: Value, dtype: DType) -> Value {
    if !dtype.is_numeric() || value.as_str().is_none() {
        return value;
    }
    match coerce_number(&value) {
        Some(n) if dtype == DType::Integer && n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            Value::Integer(n as i64)
        }
        Some(n) => Value::Float(n),
        None => value,
    }
}

/// Compare two schema-shaped records field by field.
///
/// Severity of a conflict follows the field: `error` for required fields,
/// `warning` for optional ones. Null and the empty string are the same
/// blank value, so two blank sides agree. A key that neither record
/// carries at all is a single `info` finding.
pub fn compare(primary: &Record, secondary: &Record, spec: &FieldSpecMap, tolerance: f64) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for (key, field) in spec.iter() {
        let severity = if field.required { Severity::Error } else { Severity::Warning };
        let a = primary.get(key).unwrap_or(&Value::Null);
        let b = secondary.get(key).unwrap_or(&Value::Null);

        match (is_blank(a), is_blank(b)) {
            (true, true) => {
                if !primary.contains_key(key) && !secondary.contains_key(key) {
                    conflicts.push(conflict(
                        key,
                        Severity::Info,
                        ConflictType::MissingKey,
                        "No value from either extractor.".to_string(),
                    ));
                }
            }
            (false, false) => compare_values(key, a, b, field.dtype.is_numeric(), tolerance, severity, &mut conflicts),
            (a_blank, _) => {
                let side = if a_blank { "primary" } else { "secondary" };
                conflicts.push(conflict(
                    key,
                    severity,
                    ConflictType::MissingKey,
                    format!("No value from the {side} extractor."),
                ));
            }
        }
    }

    conflicts
}

fn compare_values(
    path: &str,
    a: &Value,
    b: &Value,
    numeric: bool,
    tolerance: f64,
    severity: Severity,
    out: &mut Vec<Conflict>,
) {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => {
            let keys: std::collections::BTreeSet<&String> = x.keys().chain(y.keys()).collect();
            for sub in keys {
                let sa = x.get(sub).unwrap_or(&Value::Null);
                let sb = y.get(sub).unwrap_or(&Value::Null);
                if is_blank(sa) && is_blank(sb) {
                    continue;
                }
                compare_values(&format!("{path}.{sub}"), sa, sb, false, tolerance, severity, out);
            }
        }
        (Value::List(x), Value::List(y)) => {
            if x.len() != y.len() {
                out.push(conflict(
                    path,
                    severity,
                    ConflictType::Mismatch,
                    format!("Length mismatch at {path}: {} vs {} entries.", x.len(), y.len()),
                ));
                return;
            }
            for (i, (ea, eb)) in x.iter().zip(y).enumerate() {
                compare_values(&format!("{path}[{i}]"), ea, eb, false, tolerance, severity, out);
            }
        }
        (Value::Object(_) | Value::List(_), _) | (_, Value::Object(_) | Value::List(_)) => {
            out.push(conflict(
                path,
                severity,
                ConflictType::TypeMismatch,
                format!("Type mismatch at {path}: {} vs {}.", a.type_name(), b.type_name()),
            ))
        }
        _ => {
            if !scalars_equal(a, b, numeric, tolerance) {
                out.push(conflict(
                    path,
                    severity,
                    ConflictType::Mismatch,
                    format!("Mismatch at {path}: {} vs {}.", quoted(a), quoted(b)),
                ));
            }
        }
    }
}

fn conflict(path: &str, severity: Severity, conflict_type: ConflictType, message: String) -> Conflict {
    Conflict {
        field: path.to_string(),
        severity,
        conflict_type,
        message,
    }
}

/// Structural equality with string normalisation and numeric tolerance.
///
/// Objects compare key by key, lists element by element. Null and the empty
/// string are the same thing.
pub fn values_equal(a: &Value, b: &Value, tolerance: f64) -> bool {
    if is_blank(a) && is_blank(b) {
        return true;
    }
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => x
            .keys()
            .chain(y.keys())
            .all(|k| values_equal(x.get(k).unwrap_or(&Value::Null), y.get(k).unwrap_or(&Value::Null), tolerance)),
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(ea, eb)| values_equal(ea, eb, tolerance))
        }
        (Value::Object(_) | Value::List(_), _) | (_, Value::Object(_) | Value::List(_)) => false,
        _ => scalars_equal(a, b, false, tolerance),
    }
}

/// Scalars are equal within `tolerance` when both read as numbers (always
/// tried for numeric fields, otherwise only if one side already is a
/// number), else when their trimmed lowercase text is equal.
fn scalars_equal(a: &Value, b: &Value, numeric: bool, tolerance: f64) -> bool {
    if numeric || a.is_numeric() || b.is_numeric() {
        if let (Some(x), Some(y)) = (coerce_number(a), coerce_number(b)) {
            return (x - y).abs() <= tolerance + 1e-9;
        }
    }
    normalized_text(a) == normalized_text(b)
}

fn normalized_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string().trim().to_lowercase(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

/// [`Reconciler`] that forces both extractions into the schema's shape and
/// compares them.
///
/// The primary is normally in shape already; forcing it too keeps the
/// comparison symmetric in how values are read. Schema keys that neither
/// raw extraction carried are dropped again before comparing, so only
/// those surface as missing.
#[derive(Debug, Clone, Default)]
pub struct CrossModelReconciler {
    config: ReconcileConfig,
}

impl CrossModelReconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// The forced shape of `raw`, minus the keys it never carried.
    fn comparable_shape(&self, raw: &Record, doc_type: &DocumentType) -> Record {
        let matched = matched_keys(raw, doc_type, self.config.fuzzy_cutoff);
        let mut shaped = force_schema_shape(raw, doc_type, self.config.fuzzy_cutoff);
        shaped.retain(|key, value| matched.contains(key) || !value.is_null());
        shaped
    }
}

impl Reconciler for CrossModelReconciler {
    fn reconcile(&self, primary: &Record, secondary: &Record, doc_type: &DocumentType) -> CrossModelReport {
        let a = self.comparable_shape(primary, doc_type);
        let b = self.comparable_shape(secondary, doc_type);
        let report = CrossModelReport::from_conflicts(compare(
            &a,
            &b,
            &doc_type.schema,
            self.config.numeric_tolerance,
        ));
        debug!(
            doc_type = %doc_type.id,
            consistent = report.is_consistent,
            conflicts = report.conflicts.len(),
            "cross-model reconciliation complete"
        );
        report
    }
}
