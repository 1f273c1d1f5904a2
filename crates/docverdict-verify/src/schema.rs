//! Schema validation: presence, emptiness and declared type of each field.

use std::collections::BTreeSet;

use tracing::debug;

use docverdict_contracts::{
    schema::FieldSpecMap,
    value::Record,
    violation::{Severity, ValidationReport, Violation},
};

/// Check `data` against `spec`.
///
/// Findings come in a fixed order: missing keys (sorted), unexpected keys
/// (sorted, only when `allow_extra_keys` is false), empty required fields
/// and then type mismatches (both in schema order). A type mismatch is only
/// ever a warning.
pub fn validate_schema(data: &Record, spec: &FieldSpecMap, allow_extra_keys: bool) -> ValidationReport {
    let mut violations = Vec::new();

    let spec_keys: BTreeSet<&str> = spec.keys().collect();
    let data_keys: BTreeSet<&str> = data.keys().map(String::as_str).collect();

    for key in spec_keys.difference(&data_keys) {
        let required = spec.get(key).is_some_and(|field| field.required);
        let severity = if required { Severity::Error } else { Severity::Warning };
        violations.push(Violation::new(
            *key,
            "missing_key",
            severity,
            format!("Field '{key}' is missing from the extracted record."),
        ));
    }

    if !allow_extra_keys {
        for key in data_keys.difference(&spec_keys) {
            violations.push(Violation::new(
                *key,
                "unexpected_key",
                Severity::Warning,
                format!("Unexpected key '{key}' in the extracted record."),
            ));
        }
    }

    for (key, field) in spec.iter() {
        match data.get(key) {
            Some(value) if field.required && value.is_empty_value() => {
                violations.push(Violation::new(
                    key,
                    "required_field_empty",
                    Severity::Error,
                    format!("Required field '{key}' is empty."),
                ));
            }
            _ => {}
        }
    }

    for (key, field) in spec.iter() {
        match data.get(key) {
            Some(value) if !value.is_null() && !field.dtype.matches(value) => {
                violations.push(Violation::new(
                    key,
                    "type_mismatch",
                    Severity::Warning,
                    format!(
                        "Field '{key}' has the wrong type. Expected: {}, found: {}.",
                        field.dtype.name(),
                        value.type_name()
                    ),
                ));
            }
            _ => {}
        }
    }

    let report = ValidationReport::from_violations(violations);
    debug!(
        is_valid = report.is_valid,
        violations = report.violations.len(),
        "schema validation complete"
    );
    report
}
