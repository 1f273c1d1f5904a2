//! Reading raw collaborator responses.
//!
//! Vision models wrap JSON in markdown fences or chatter. These helpers cut
//! the response down to the outermost JSON object and, for semantic checkers,
//! check it against the expected shape. Nothing here fails: unreadable input
//! becomes an empty record or a `parse_error` stage.

use lazy_static::lazy_static;
use serde_json::json;
use tracing::debug;

use docverdict_contracts::{
    semantic::{SemanticIssue, SemanticStatus, StageResult},
    value::{record_from_json, Record, Value},
    violation::Severity,
};

lazy_static! {
    /// Expected shape of a semantic checker's answer.
    static ref SEMANTIC_RESPONSE_SCHEMA: serde_json::Value = json!({
        "type": "object",
        "properties": {
            "status": { "enum": ["valid", "invalid", "uncertain"] },
            "issues": {
                "type": "array",
                "items": { "type": "object" }
            },
            "comments": { "type": ["string", "null"] }
        }
    });
}

/// Strip code fences and surrounding text, keeping the outermost `{...}`.
pub fn extract_json_object(text: &str) -> &str {
    let mut cleaned = text.trim();

    if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest.strip_prefix("json").unwrap_or(rest).trim();
        if let Some(body) = cleaned.strip_suffix("```") {
            cleaned = body.trim();
        }
    }

    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if end > start => &cleaned[start..=end],
        _ => cleaned,
    }
}

/// Parse an extractor's raw answer into a record.
///
/// Returns `None` when no JSON object can be recovered.
pub fn parse_record_response(text: &str) -> Option<Record> {
    serde_json::from_str::<serde_json::Value>(extract_json_object(text))
        .ok()
        .and_then(record_from_json)
}

/// Parse a semantic checker's raw answer into a stage result.
///
/// A missing status is read as `uncertain`, a missing issue severity as
/// `warning`. Anything that is not JSON of the expected shape yields a
/// `parse_error` stage carrying the raw text.
pub fn parse_semantic_response(
    text: &str,
    provider: &str,
    model: &str,
    duration_seconds: f64,
) -> StageResult {
    let parsed: serde_json::Value = match serde_json::from_str(extract_json_object(text)) {
        Ok(v) => v,
        Err(e) => {
            debug!(provider, model, error = %e, "semantic response is not JSON");
            return StageResult {
                duration_seconds,
                ..StageResult::parse_error(
                    provider,
                    model,
                    format!("Failed to parse checker response as JSON: {e}"),
                    Some(text.to_string()),
                )
            };
        }
    };

    if let Some(reason) = shape_violation(&parsed) {
        debug!(provider, model, %reason, "semantic response has unexpected shape");
        return StageResult {
            duration_seconds,
            ..StageResult::parse_error(
                provider,
                model,
                format!("Checker response has unexpected shape: {reason}"),
                Some(text.to_string()),
            )
        };
    }

    let status = match parsed.get("status").and_then(|s| s.as_str()) {
        Some("valid") => SemanticStatus::Valid,
        Some("invalid") => SemanticStatus::Invalid,
        _ => SemanticStatus::Uncertain,
    };

    let issues = parsed
        .get("issues")
        .and_then(|i| i.as_array())
        .map(|items| items.iter().map(issue_from_json).collect())
        .unwrap_or_default();

    let comments = parsed
        .get("comments")
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string();

    StageResult {
        status,
        issues,
        comments,
        duration_seconds,
        model: model.to_string(),
        provider: provider.to_string(),
        raw_response: Some(text.to_string()),
    }
}

/// First schema violation in `parsed`, if any.
fn shape_violation(parsed: &serde_json::Value) -> Option<String> {
    match jsonschema::validator_for(&SEMANTIC_RESPONSE_SCHEMA) {
        Ok(validator) => validator
            .iter_errors(parsed)
            .next()
            .map(|error| format!("{} at '{}'", error, error.instance_path)),
        Err(e) => Some(format!("response schema does not compile: {e}")),
    }
}

fn issue_from_json(item: &serde_json::Value) -> SemanticIssue {
    let text = |key: &str| -> String {
        match item.get(key).map(|v| Value::from(v.clone())) {
            None | Some(Value::Null) => String::new(),
            Some(v) => v.to_string(),
        }
    };
    SemanticIssue {
        field: text("field"),
        issue_type: text("type"),
        severity: Severity::from_label(item.get("severity").and_then(|s| s.as_str())),
        message: text("message"),
    }
}
