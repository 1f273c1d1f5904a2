//! Field specifications: the declared shape of a document type.
//!
//! A `FieldSpecMap` is built once at registration and treated as immutable
//! afterwards. Construction rejects empty or duplicate keys, so every
//! validator can assume field names are unique.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{VerdictError, VerdictResult};
use crate::value::{Record, Value};

/// The declared runtime type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    String,
    Integer,
    Float,
    Boolean,
    Object,
    List,
}

impl DType {
    /// True if `value` has this declared type.
    ///
    /// Floats accept integers. Booleans never count as integers. Null is not
    /// matched here; callers decide what an absent value means.
    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (DType::String, Value::String(_))
                | (DType::Integer, Value::Integer(_))
                | (DType::Float, Value::Float(_) | Value::Integer(_))
                | (DType::Boolean, Value::Bool(_))
                | (DType::Object, Value::Object(_))
                | (DType::List, Value::List(_))
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DType::Integer | DType::Float)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DType::String => "string",
            DType::Integer => "integer",
            DType::Float => "float",
            DType::Boolean => "boolean",
            DType::Object => "object",
            DType::List => "list",
        }
    }
}

/// Declaration of one field of a document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub required: bool,
    pub dtype: DType,
    /// A representative value, used for example records and prompts.
    pub example: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn required(dtype: DType, example: impl Into<Value>, description: &str) -> Self {
        Self {
            required: true,
            dtype,
            example: example.into(),
            description: Some(description.to_string()),
        }
    }

    pub fn optional(dtype: DType, example: impl Into<Value>, description: &str) -> Self {
        Self {
            required: false,
            dtype,
            example: example.into(),
            description: Some(description.to_string()),
        }
    }
}

/// Ordered mapping from field name to [`FieldSpec`].
///
/// Declaration order is preserved; it drives the order of schema
/// violations and of example records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSpecMap {
    fields: Vec<(String, FieldSpec)>,
}

impl FieldSpecMap {
    /// Build a map from `(name, spec)` pairs.
    ///
    /// Returns `VerdictError::InvalidSchema` for an empty or duplicate name.
    pub fn from_fields<I, K>(doc_type: &str, fields: I) -> VerdictResult<Self>
    where
        I: IntoIterator<Item = (K, FieldSpec)>,
        K: Into<String>,
    {
        let mut map = Self::default();
        for (name, spec) in fields {
            let name: String = name.into();
            if name.trim().is_empty() {
                return Err(VerdictError::InvalidSchema {
                    doc_type: doc_type.to_string(),
                    reason: "field name must not be empty".to_string(),
                });
            }
            if map.contains_key(&name) {
                return Err(VerdictError::InvalidSchema {
                    doc_type: doc_type.to_string(),
                    reason: format!("duplicate field '{name}'"),
                });
            }
            map.fields.push((name, spec));
        }
        Ok(map)
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, spec)| spec)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, spec)| (k.as_str(), spec))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of all required fields, in declaration order.
    pub fn required_fields(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, spec)| spec.required)
            .map(|(k, _)| k)
            .collect()
    }

    /// A record filled with every field's example value.
    pub fn example_record(&self) -> Record {
        self.iter()
            .map(|(k, spec)| (k.to_string(), spec.example.clone()))
            .collect()
    }
}

impl Serialize for FieldSpecMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, spec) in &self.fields {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}
