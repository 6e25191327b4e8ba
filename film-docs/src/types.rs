use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Unique identifier for a document, assigned by the store on create
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocId(pub String);

impl DocId {
    /// Generate a new unique document ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a document ID from a string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DocId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A stored document: its id plus resolved field values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Get a raw field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a field as a string slice
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Get a field as a bool
    pub fn bool_field(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }

    /// Get a field as an array
    pub fn array_field(&self, field: &str) -> Option<&Vec<Value>> {
        self.fields.get(field).and_then(Value::as_array)
    }
}

/// Write-side value for a single field
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// A literal JSON value
    Json(Value),
    /// Resolved to the store's clock when the write is applied
    ServerTimestamp,
}

/// Write-side field set, built up builder-style
#[derive(Debug, Clone, Default)]
pub struct Fields {
    values: BTreeMap<String, FieldValue>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to a serializable value
    pub fn set<K: Into<String>, V: Serialize>(mut self, field: K, value: V) -> Self {
        self.values.insert(
            field.into(),
            FieldValue::Json(serde_json::to_value(value).unwrap_or(Value::Null)),
        );
        self
    }

    /// Set a field to the server-assigned write time
    pub fn set_server_timestamp<K: Into<String>>(mut self, field: K) -> Self {
        self.values.insert(field.into(), FieldValue::ServerTimestamp);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolve server timestamps against `now` and produce concrete values
    pub fn resolve(self, now: DateTime<Utc>) -> Map<String, Value> {
        self.values
            .into_iter()
            .map(|(field, value)| {
                let resolved = match value {
                    FieldValue::Json(value) => value,
                    FieldValue::ServerTimestamp => {
                        serde_json::to_value(now).unwrap_or(Value::Null)
                    }
                };
                (field, resolved)
            })
            .collect()
    }
}

/// Query filter over a collection
#[derive(Debug, Clone)]
pub enum Filter {
    /// Match every document
    All,
    /// Field equals the given value
    FieldEq { field: String, value: Value },
    /// Array field contains the given value
    ArrayContains { field: String, value: Value },
    /// All sub-filters match
    And(Vec<Filter>),
}

impl Filter {
    pub fn field_eq<K: Into<String>, V: Serialize>(field: K, value: V) -> Self {
        Self::FieldEq {
            field: field.into(),
            value: serde_json::to_value(value).unwrap_or(Value::Null),
        }
    }

    pub fn array_contains<K: Into<String>, V: Serialize>(field: K, value: V) -> Self {
        Self::ArrayContains {
            field: field.into(),
            value: serde_json::to_value(value).unwrap_or(Value::Null),
        }
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Self::And(filters)
    }

    /// Check whether a document matches this filter
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::All => true,
            Self::FieldEq { field, value } => doc.get(field) == Some(value),
            Self::ArrayContains { field, value } => doc
                .array_field(field)
                .map(|items| items.contains(value))
                .unwrap_or(false),
            Self::And(filters) => filters.iter().all(|filter| filter.matches(doc)),
        }
    }
}
