//! Violations and the reports that carry them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How serious a finding is.
///
/// Ordering runs `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Map a free-form severity label onto the closed set.
    ///
    /// A missing label means `Warning`; anything that is neither
    /// `error` nor `warning` counts as `Info`.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|s| s.trim().to_lowercase()) {
            None => Severity::Warning,
            Some(s) if s == "error" => Severity::Error,
            Some(s) if s == "warning" => Severity::Warning,
            Some(_) => Severity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-severity counts for one signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl SeverityCounts {
    pub fn from_severities(severities: impl IntoIterator<Item = Severity>) -> Self {
        let mut counts = Self::default();
        for severity in severities {
            counts.record(severity);
        }
        counts
    }

    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info => self.infos += 1,
        }
    }

    pub fn add(&mut self, other: SeverityCounts) {
        self.errors += other.errors;
        self.warnings += other.warnings;
        self.infos += other.infos;
    }
}

/// A single finding from the schema validator or the rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Field name, a dotted/indexed path (`items[0].total`), or a
    /// composite like `von/bis`.
    pub field: String,
    /// Stable rule identifier, e.g. `missing_key` or `totals_mismatch`.
    pub rule: String,
    pub severity: Severity,
    pub message: String,
}

impl Violation {
    pub fn new(
        field: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            severity,
            message: message.into(),
        }
    }
}

/// Outcome of a schema or rule validation pass.
///
/// `is_valid` is false exactly when some violation has severity `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        let is_valid = !violations.iter().any(|v| v.severity == Severity::Error);
        Self { is_valid, violations }
    }

    pub fn stats(&self) -> SeverityCounts {
        SeverityCounts::from_severities(self.violations.iter().map(|v| v.severity))
    }

    /// Violations for `field`, in report order.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations.iter().filter(move |v| v.field == field)
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::from_violations(Vec::new())
    }
}
