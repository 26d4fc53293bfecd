//! Rule document parsing and representation
//!
//! A [`Rule`] is the in-memory form of one rule document as produced by
//! a YAML or JSON loader. Only the detection section is interpreted;
//! everything else is pass-through metadata. Rules are parsed once and
//! immutable afterwards; compilation of the detection section happens
//! in the engine.

use crate::error::Result;
use serde::{Deserialize, Serialize};

pub mod detection;

pub use detection::Detection;

/// Rule defines one raw detection rule document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Rule {
    /// Rule title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Unique rule identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Rule status (experimental, testing, stable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Severity level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Rule author
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Rule description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// External references
    #[serde(default)]
    pub references: Vec<String>,

    /// Rule tags for categorization
    #[serde(default)]
    pub tags: Vec<String>,

    /// Log source hints, uninterpreted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logsource: Option<serde_json::Value>,

    /// Creation date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Last modification date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,

    /// Detection selections and condition
    #[serde(default)]
    pub detection: Detection,
}

impl Rule {
    /// Identity used for caching and diagnostics: id, else title
    pub fn key(&self) -> &str {
        self.id
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("<unnamed rule>")
    }
}

/// Parse a single rule from YAML data
pub fn rule_from_yaml(data: &[u8]) -> Result<Rule> {
    Ok(serde_yaml::from_slice(data)?)
}

/// Parse every rule in a YAML stream (multi-document files supported)
pub fn rules_from_yaml(data: &[u8]) -> Result<Vec<Rule>> {
    use serde::de::Deserialize as _;
    let mut rules = Vec::new();
    for document in serde_yaml::Deserializer::from_slice(data) {
        rules.push(Rule::deserialize(document)?);
    }
    Ok(rules)
}

/// Parse a single rule from JSON data
pub fn rule_from_json(data: &[u8]) -> Result<Rule> {
    Ok(serde_json::from_slice(data)?)
}

/// Parse rules from JSON data: one object or an array of objects
pub fn rules_from_json(data: &[u8]) -> Result<Vec<Rule>> {
    let value: serde_json::Value = serde_json::from_slice(data)?;
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| Ok(serde_json::from_value(item)?))
            .collect(),
        single => Ok(vec![serde_json::from_value(single)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_from_yaml() {
        let yaml = br#"
title: Suspicious Process Creation
id: 12345678-1234-1234-1234-123456789abc
status: stable
level: medium
tags:
  - attack.execution
logsource:
  product: windows
  category: process_creation
detection:
  selection:
    EventID: 1
    CommandLine|contains: 'powershell'
  condition: selection
"#;
        let rule = rule_from_yaml(yaml).unwrap();
        assert_eq!(rule.title.as_deref(), Some("Suspicious Process Creation"));
        assert_eq!(rule.key(), "12345678-1234-1234-1234-123456789abc");
        assert_eq!(rule.detection.condition(), Some("selection"));
        assert_eq!(rule.detection.selection_count(), 1);
    }

    #[test]
    fn test_rule_key_falls_back_to_title() {
        let rule = rule_from_yaml(b"title: Only A Title\ndetection:\n  condition: x\n").unwrap();
        assert_eq!(rule.key(), "Only A Title");
        assert_eq!(Rule::default().key(), "<unnamed rule>");
    }

    #[test]
    fn test_unknown_metadata_ignored() {
        let yaml = br#"
title: T
falsepositives:
  - Unknown
custom_field: whatever
detection:
  selection:
    a: 1
  condition: selection
"#;
        assert!(rule_from_yaml(yaml).is_ok());
    }

    #[test]
    fn test_multi_document_stream() {
        let yaml = br#"
title: First
detection:
  selection:
    a: 1
  condition: selection
---
title: Second
detection:
  selection:
    b: 2
  condition: selection
"#;
        let rules = rules_from_yaml(yaml).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].title.as_deref(), Some("Second"));
    }

    #[test]
    fn test_rules_from_json_array_and_object() {
        let array = br#"[
            {"title": "A", "detection": {"selection": {"x": 1}, "condition": "selection"}},
            {"title": "B", "detection": {"selection": {"y": 2}, "condition": "selection"}}
        ]"#;
        assert_eq!(rules_from_json(array).unwrap().len(), 2);

        let object =
            br#"{"title": "A", "detection": {"selection": {"x": 1}, "condition": "selection"}}"#;
        assert_eq!(rules_from_json(object).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_detection_still_parses() {
        // Structural completeness is the validator's job, not serde's
        let rule = rule_from_yaml(b"title: Empty\n").unwrap();
        assert_eq!(rule.detection.selection_count(), 0);
        assert!(!rule.detection.has_condition_key());
    }
}
