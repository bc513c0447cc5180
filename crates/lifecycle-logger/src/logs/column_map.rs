//! Remapping of document fields to storage columns.
//!
//! A column map names, for every field that should reach the sink, the column it is
//! stored under. Nested fields (objects such as `extra`) are mapped per sub-key. Fields
//! without an entry are dropped.
//!
//! ```yaml
//! column_map:
//!   timestamp: ts        # scalar field → column
//!   message: msg
//!   extra:               # nested field → one column per sub-key
//!     request_id: request
//! ```

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Target of a single document field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColumnMapping {
    /// The whole field goes to one column.
    Column(String),
    /// Each listed sub-key of an object field goes to its own column.
    Nested(HashMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct ColumnMap(HashMap<String, ColumnMapping>);

impl ColumnMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_column(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.0
            .insert(field.into(), ColumnMapping::Column(column.into()));
        self
    }

    #[must_use]
    pub fn with_nested<I, K, V>(mut self, field: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let columns = columns
            .into_iter()
            .map(|(key, column)| (key.into(), column.into()))
            .collect();
        self.0.insert(field.into(), ColumnMapping::Nested(columns));
        self
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&ColumnMapping> {
        self.0.get(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Maps a document into columns.
    ///
    /// - Scalar fields with a [`ColumnMapping::Column`] entry are copied as they are.
    /// - Object fields with a [`ColumnMapping::Nested`] entry contribute one column per
    ///   mapped sub-key. Scalar sub-values are copied, anything else is rendered as a
    ///   debug string.
    /// - Everything else is dropped.
    #[must_use]
    pub fn apply(&self, document: &Map<String, Value>) -> Map<String, Value> {
        let mut data = Map::new();
        for (name, value) in document {
            match (value, self.0.get(name)) {
                (Value::Object(fields), Some(ColumnMapping::Nested(columns))) => {
                    for (key, sub_value) in fields {
                        if let Some(column) = columns.get(key) {
                            data.insert(column.clone(), render_sub_value(sub_value));
                        }
                    }
                }
                (Value::Object(_), _) => {}
                (_, Some(ColumnMapping::Column(column))) => {
                    data.insert(column.clone(), value.clone());
                }
                _ => {}
            }
        }
        data
    }
}

impl FromIterator<(String, ColumnMapping)> for ColumnMap {
    fn from_iter<T: IntoIterator<Item = (String, ColumnMapping)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn render_sub_value(value: &Value) -> Value {
    match value {
        Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
        other => Value::String(format!("{other:?}")),
    }
}
