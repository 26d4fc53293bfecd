//! The detection section of a rule document

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Detection represents the detection field in a rule document:
/// named selections plus the condition expression over them.
///
/// Keys are sorted, so selection ordering (and therefore `them`
/// expansion and reported match order) is deterministic regardless of
/// the source document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Detection(BTreeMap<String, Value>);

impl Detection {
    /// Create a new empty detection
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// The raw condition string, if present and a string
    pub fn condition(&self) -> Option<&str> {
        self.0.get("condition").and_then(|v| v.as_str())
    }

    /// Whether a `condition` key exists at all, regardless of type
    pub fn has_condition_key(&self) -> bool {
        self.0.contains_key("condition")
    }

    /// Iterate selection entries, excluding the condition
    pub fn selections(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter().filter(|(k, _)| k.as_str() != "condition")
    }

    /// Selection names in deterministic order
    pub fn selection_names(&self) -> Vec<String> {
        self.selections().map(|(k, _)| k.clone()).collect()
    }

    /// Number of selections, excluding the condition
    pub fn selection_count(&self) -> usize {
        self.selections().count()
    }

    /// Get one entry by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert an entry
    pub fn insert(&mut self, key: String, value: Value) {
        self.0.insert(key, value);
    }
}

impl From<BTreeMap<String, Value>> for Detection {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}
