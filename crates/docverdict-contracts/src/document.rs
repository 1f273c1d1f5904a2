//! Document types: schema, canonical rules, and key aliases in one place.

use std::collections::BTreeMap;

use crate::error::{VerdictError, VerdictResult};
use crate::rule::RuleKind;
use crate::schema::FieldSpecMap;

/// Schema key → alternative key spellings an extractor might produce.
pub type AliasTable = BTreeMap<String, Vec<String>>;

/// Everything the pipeline knows about one kind of document.
#[derive(Debug, Clone)]
pub struct DocumentType {
    /// Lowercase identifier, e.g. `rechnung`.
    pub id: String,
    /// Human-readable name for listings.
    pub display_name: String,
    /// Filename prefix that identifies this type (`INV` for `INV_0001.png`).
    pub filename_prefix: Option<String>,
    pub schema: FieldSpecMap,
    /// Canonical rule list, evaluated in order.
    pub rules: Vec<RuleKind>,
    pub aliases: AliasTable,
}

impl DocumentType {
    /// Assemble a document type and check its internal consistency.
    ///
    /// Fails when the id is empty, an alias entry names an undeclared field,
    /// or a rule reads an undeclared field.
    pub fn new(
        id: &str,
        display_name: &str,
        filename_prefix: Option<&str>,
        schema: FieldSpecMap,
        rules: Vec<RuleKind>,
        aliases: AliasTable,
    ) -> VerdictResult<Self> {
        let id = id.trim().to_lowercase();
        if id.is_empty() {
            return Err(VerdictError::InvalidSchema {
                doc_type: id,
                reason: "document type id must not be empty".to_string(),
            });
        }

        if let Some(key) = aliases.keys().find(|k| !schema.contains_key(k)) {
            return Err(VerdictError::InvalidSchema {
                doc_type: id,
                reason: format!("alias entry for undeclared field '{key}'"),
            });
        }

        for rule in &rules {
            if let Some(field) = rule
                .referenced_fields()
                .into_iter()
                .find(|f| !schema.contains_key(f))
            {
                return Err(VerdictError::InvalidSchema {
                    doc_type: id,
                    reason: format!(
                        "{} rule references undeclared field '{field}'",
                        rule.family()
                    ),
                });
            }
        }

        Ok(Self {
            id,
            display_name: display_name.to_string(),
            filename_prefix: filename_prefix.map(|p| p.to_uppercase()),
            schema,
            rules,
            aliases,
        })
    }

    /// Aliases declared for `field`, or an empty slice.
    pub fn aliases_for(&self, field: &str) -> &[String] {
        self.aliases.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Build an [`AliasTable`] from string slices.
pub fn alias_table(entries: &[(&str, &[&str])]) -> AliasTable {
    entries
        .iter()
        .map(|(key, aliases)| {
            (
                key.to_string(),
                aliases.iter().map(|a| a.to_string()).collect(),
            )
        })
        .collect()
}
