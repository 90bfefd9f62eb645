//! Conversion between stored rows and logical rows.
//!
//! The store has no boolean or array types: booleans are kept as 0/1
//! integers and arrays as JSON text. [`RowCodec`] widens those on the way
//! out and narrows them on the way in. Decoding never fails.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::Row;

const DEFAULT_BOOLEAN_COLUMNS: &[&str] = &["is_admin", "featured", "is_featured", "is_published"];
const DEFAULT_ARRAY_COLUMNS: &[&str] = &["tags"];

/// Column-aware encoder/decoder for rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCodec {
    boolean_columns: BTreeSet<String>,
    array_columns: BTreeSet<String>,
}

impl Default for RowCodec {
    fn default() -> Self {
        Self {
            boolean_columns: DEFAULT_BOOLEAN_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            array_columns: DEFAULT_ARRAY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl RowCodec {
    /// A codec with no typed columns; only JSON-array text is widened.
    pub fn empty() -> Self {
        Self {
            boolean_columns: BTreeSet::new(),
            array_columns: BTreeSet::new(),
        }
    }

    pub fn with_boolean_column(mut self, column: impl Into<String>) -> Self {
        self.boolean_columns.insert(column.into());
        self
    }

    pub fn with_array_column(mut self, column: impl Into<String>) -> Self {
        self.array_columns.insert(column.into());
        self
    }

    pub fn is_boolean_column(&self, column: &str) -> bool {
        self.boolean_columns.contains(column)
    }

    pub fn is_array_column(&self, column: &str) -> bool {
        self.array_columns.contains(column)
    }

    /// Widen a stored row to its logical shape. Absence propagates.
    pub fn decode(&self, row: Option<Row>) -> Option<Row> {
        row.map(|row| self.decode_row(row))
    }

    pub fn decode_row(&self, row: Row) -> Row {
        row.into_iter()
            .map(|(key, value)| {
                let value = if self.is_boolean_column(&key) {
                    widen_bool(value)
                } else if self.is_array_column(&key) {
                    widen_array(value)
                } else {
                    widen_json_array_text(value)
                };
                (key, value)
            })
            .collect()
    }

    /// Narrow a logical row to storage scalars. Keys are never invented.
    pub fn encode(&self, row: Row) -> Row {
        row.into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::Bool(b) => Value::from(i64::from(b)),
                    Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
                    other => other,
                };
                (key, value)
            })
            .collect()
    }
}

fn widen_bool(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::Bool(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => {
            let truthy = match s.trim().parse::<f64>() {
                Ok(f) => f != 0.0,
                Err(_) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
            };
            Value::Bool(truthy)
        }
        // Null stays null, bools pass through
        other => other,
    }
}

fn widen_array(value: Value) -> Value {
    match value {
        Value::Array(_) => value,
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(parsed @ Value::Array(_)) => parsed,
            _ => Value::Array(Vec::new()),
        },
        _ => Value::Array(Vec::new()),
    }
}

fn widen_json_array_text(value: Value) -> Value {
    match value {
        Value::String(s) if looks_like_json_array(&s) => {
            match serde_json::from_str::<Value>(&s) {
                Ok(parsed @ Value::Array(_)) => parsed,
                _ => Value::String(s),
            }
        }
        other => other,
    }
}

fn looks_like_json_array(s: &str) -> bool {
    let s = s.trim();
    s.starts_with('[') && s.ends_with(']')
}
