//! Event representation and field lookup
//!
//! An [`Event`] wraps one parsed JSON log record. The engine only ever
//! reads it through dotted-path lookup; nested-object traversal beyond
//! that lives with the loader that produced the JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Value type returned from event field selection
///
/// A closed tagged union over the shapes a JSON loader can produce, so
/// modifier application never operates on untyped data.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// String value, Arc for cheap cloning
    String(Arc<str>),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// Array of values
    Array(Vec<Value>),
    /// Object mapping keys to values
    Object(HashMap<String, Value>),
    /// Null value
    #[default]
    Null,
}

impl Value {
    /// View as string if possible
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// View as float, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// View as bool if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn from_json_bounded(json: &serde_json::Value, depth: usize) -> Value {
        if depth > Event::MAX_JSON_DEPTH {
            return Value::Null;
        }
        match json {
            serde_json::Value::String(s) => Value::String(Arc::from(s.as_str())),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Null
                }
            }
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Array(arr) => Value::Array(
                arr.iter()
                    .map(|v| Self::from_json_bounded(v, depth + 1))
                    .collect(),
            ),
            serde_json::Value::Object(obj) => Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json_bounded(v, depth + 1)))
                    .collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        Self::from_json_bounded(json, 0)
    }
}

/// One structured log record under evaluation
///
/// Immutable once constructed; the engine never writes to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    data: serde_json::Value,
}

impl Event {
    const MAX_JSON_DEPTH: usize = 128;

    /// Wrap a parsed JSON record
    pub fn new(data: serde_json::Value) -> Self {
        Self { data }
    }

    /// Select a field by dotted path, e.g. `alert.signature`
    ///
    /// Returns `None` when the path does not resolve. Malformed keys
    /// (empty segments, leading or trailing dots) never resolve.
    pub fn select(&self, key: &str) -> Option<Value> {
        if key.is_empty() || key.starts_with('.') || key.ends_with('.') || key.contains("..") {
            return None;
        }

        let mut current = &self.data;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(Value::from(current))
    }

    /// Access the underlying JSON document
    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }
}

impl From<serde_json::Value> for Event {
    fn from(data: serde_json::Value) -> Self {
        Self::new(data)
    }
}
