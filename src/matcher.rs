//! Selection matching against events
//!
//! A [`Selection`] is compiled once from the raw detection document and
//! is immutable afterwards. Matching never fails: a missing field or a
//! type mismatch is a non-match, so a malformed event cannot abort a
//! batch. All hard errors surface at compile time in [`Selection::from_value`].

use crate::error::{Result, SigmaError};
use crate::event::{Event, Value};
use crate::pattern::{
    new_num_matcher, new_string_matcher, parse_field_key, MatchMode, ModifierSet, NumMatcher,
    StringMatcher,
};
use std::sync::Arc;

/// Predicate compiled from one listed rule value
#[derive(Debug)]
enum ValueMatcher {
    /// String comparison (exact, substring, regex, glob)
    String(Box<dyn StringMatcher>),
    /// Numeric comparison (equality or ordered)
    Num(Box<dyn NumMatcher>),
    /// Boolean equality
    Bool(bool),
    /// Null sentinel: matches an absent or null field
    Absent,
}

impl ValueMatcher {
    fn matches(&self, value: &Value) -> bool {
        match self {
            ValueMatcher::String(matcher) => match value {
                Value::String(s) => matcher.string_match(s),
                Value::Integer(i) => matcher.string_match(&i.to_string()),
                Value::Float(f) => matcher.string_match(&f.to_string()),
                Value::Boolean(b) => matcher.string_match(if *b { "true" } else { "false" }),
                _ => false,
            },
            ValueMatcher::Num(matcher) => match numeric_view(value) {
                Some(n) => matcher.num_match(n),
                None => false,
            },
            ValueMatcher::Bool(expected) => value.as_bool() == Some(*expected),
            ValueMatcher::Absent => matches!(value, Value::Null),
        }
    }
}

/// Read an event value on the numeric axis
///
/// Numeric strings are accepted so `EventID: 4688` matches a log source
/// that serializes IDs as strings.
fn numeric_view(value: &Value) -> Option<f64> {
    if let Some(n) = value.as_float() {
        return Some(n);
    }
    value.as_str().and_then(|s| s.trim().parse().ok())
}

/// One field spec: field name, modifiers, compiled value predicates
#[derive(Debug)]
pub struct FieldSpec {
    field: Arc<str>,
    modifiers: ModifierSet,
    matchers: Vec<ValueMatcher>,
}

impl FieldSpec {
    fn compile(key: &str, raw: &serde_json::Value) -> Result<Self> {
        let (field, modifiers) = parse_field_key(key)?;

        let values: Vec<&serde_json::Value> = match raw {
            serde_json::Value::Array(items) => items.iter().collect(),
            scalar => vec![scalar],
        };
        if values.is_empty() {
            return Err(SigmaError::Structural(format!(
                "field {} has an empty value list",
                key
            )));
        }

        let mut matchers = Vec::with_capacity(values.len());
        for value in values {
            matchers.push(Self::compile_value(key, modifiers, value)?);
        }
        Ok(Self {
            field: Arc::from(field),
            modifiers,
            matchers,
        })
    }

    fn compile_value(
        key: &str,
        modifiers: ModifierSet,
        value: &serde_json::Value,
    ) -> Result<ValueMatcher> {
        let numeric_mode = matches!(
            modifiers.mode,
            MatchMode::Gt | MatchMode::Gte | MatchMode::Lt | MatchMode::Lte
        );
        match value {
            serde_json::Value::Null => Ok(ValueMatcher::Absent),
            serde_json::Value::String(s) => {
                if numeric_mode {
                    let bound: f64 = s.trim().parse().map_err(|_| {
                        SigmaError::pattern(s, "numeric comparison requires a numeric value")
                    })?;
                    Ok(ValueMatcher::Num(new_num_matcher(modifiers.mode, bound)))
                } else {
                    Ok(ValueMatcher::String(new_string_matcher(
                        modifiers.mode,
                        modifiers.cased,
                        s,
                    )?))
                }
            }
            serde_json::Value::Number(n) => {
                let num = n.as_f64().ok_or_else(|| {
                    SigmaError::pattern(n.to_string(), "number out of range")
                })?;
                match modifiers.mode {
                    MatchMode::Exact | MatchMode::Gt | MatchMode::Gte | MatchMode::Lt
                    | MatchMode::Lte => Ok(ValueMatcher::Num(new_num_matcher(modifiers.mode, num))),
                    // Substring-family modifier on a number: match its decimal form
                    _ => Ok(ValueMatcher::String(new_string_matcher(
                        modifiers.mode,
                        modifiers.cased,
                        &n.to_string(),
                    )?)),
                }
            }
            serde_json::Value::Bool(b) => {
                if numeric_mode {
                    Err(SigmaError::modifier(
                        key,
                        "numeric comparison against a boolean value",
                    ))
                } else if modifiers.mode == MatchMode::Exact {
                    Ok(ValueMatcher::Bool(*b))
                } else {
                    Ok(ValueMatcher::String(new_string_matcher(
                        modifiers.mode,
                        modifiers.cased,
                        if *b { "true" } else { "false" },
                    )?))
                }
            }
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Err(SigmaError::Structural(format!(
                    "field {} has a nested value; only scalars and lists of scalars are allowed",
                    key
                )))
            }
        }
    }

    /// Field name this spec reads from the event
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Match this spec against an event
    ///
    /// The value list is a disjunction; with the `all` modifier every
    /// listed value must match at least one element of the field.
    pub fn matches(&self, event: &Event) -> bool {
        let value = match event.select(&self.field) {
            Some(v) => v,
            None => {
                // Absence matches only when the rule lists the null sentinel
                return self
                    .matchers
                    .iter()
                    .any(|m| matches!(m, ValueMatcher::Absent));
            }
        };

        // List-valued fields match per element; scalars are a one-element view
        let elements: &[Value] = match &value {
            Value::Array(items) => items,
            scalar => std::slice::from_ref(scalar),
        };

        if self.modifiers.match_all {
            self.matchers
                .iter()
                .all(|m| elements.iter().any(|e| m.matches(e)))
        } else {
            self.matchers
                .iter()
                .any(|m| elements.iter().any(|e| m.matches(e)))
        }
    }
}

/// One mapping of field specs, all of which must match
#[derive(Debug)]
pub struct FieldGroup {
    specs: Vec<FieldSpec>,
}

impl FieldGroup {
    fn compile(name: &str, map: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        if map.is_empty() {
            return Err(SigmaError::Structural(format!(
                "selection {} contains an empty mapping",
                name
            )));
        }
        let mut specs = Vec::with_capacity(map.len());
        for (key, value) in map {
            specs.push(FieldSpec::compile(key, value)?);
        }
        Ok(Self { specs })
    }

    /// True iff every field spec matches
    pub fn matches(&self, event: &Event) -> bool {
        self.specs.iter().all(|spec| spec.matches(event))
    }
}

/// A named selection: one field group, or an OR over several
///
/// The rule format's "list of maps" convention: a sequence of mappings
/// is a disjunction of conjunctions.
#[derive(Debug)]
pub struct Selection {
    groups: Vec<FieldGroup>,
}

impl Selection {
    /// Compile a selection from its raw document value
    pub fn from_value(name: &str, raw: &serde_json::Value) -> Result<Self> {
        match raw {
            serde_json::Value::Object(map) => Ok(Self {
                groups: vec![FieldGroup::compile(name, map)?],
            }),
            serde_json::Value::Array(items) => {
                if items.is_empty() {
                    return Err(SigmaError::Structural(format!(
                        "selection {} is an empty list",
                        name
                    )));
                }
                let mut groups = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::Object(map) => {
                            groups.push(FieldGroup::compile(name, map)?)
                        }
                        _ => {
                            return Err(SigmaError::Structural(format!(
                                "selection {}: list elements must be mappings",
                                name
                            )))
                        }
                    }
                }
                Ok(Self { groups })
            }
            _ => Err(SigmaError::Structural(format!(
                "selection {} must be a mapping or a list of mappings",
                name
            ))),
        }
    }

    /// Match this selection against an event
    pub fn matches(&self, event: &Event) -> bool {
        self.groups.iter().any(|group| group.matches(event))
    }

    /// Iterate the field specs of all groups
    pub fn field_specs(&self) -> impl Iterator<Item = &FieldSpec> {
        self.groups.iter().flat_map(|g| g.specs.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn selection(raw: serde_json::Value) -> Selection {
        Selection::from_value("selection", &raw).unwrap()
    }

    #[test]
    fn test_field_group_is_conjunction() {
        let sel = selection(json!({ "A": "x", "B": "y" }));
        assert!(sel.matches(&Event::new(json!({ "A": "x", "B": "y" }))));
        assert!(!sel.matches(&Event::new(json!({ "A": "x", "B": "z" }))));
        assert!(!sel.matches(&Event::new(json!({ "A": "q", "B": "y" }))));
    }

    #[test]
    fn test_group_list_is_disjunction() {
        let sel = selection(json!([{ "A": "x" }, { "B": "y" }]));
        assert!(sel.matches(&Event::new(json!({ "A": "x" }))));
        assert!(sel.matches(&Event::new(json!({ "B": "y" }))));
        assert!(!sel.matches(&Event::new(json!({ "C": "z" }))));
    }

    #[test]
    fn test_value_list_is_disjunction() {
        let sel = selection(json!({ "EventID": [1, 4688] }));
        assert!(sel.matches(&Event::new(json!({ "EventID": 4688 }))));
        assert!(!sel.matches(&Event::new(json!({ "EventID": 2 }))));
    }

    #[test]
    fn test_all_modifier_over_event_list() {
        let sel = selection(json!({ "Tags|contains|all": ["alpha", "beta"] }));
        assert!(sel.matches(&Event::new(json!({ "Tags": ["alpha", "beta", "gamma"] }))));
        assert!(!sel.matches(&Event::new(json!({ "Tags": ["alpha", "gamma"] }))));
    }

    #[test]
    fn test_list_field_matches_per_element() {
        let sel = selection(json!({ "Hashes": "abc" }));
        assert!(sel.matches(&Event::new(json!({ "Hashes": ["def", "abc"] }))));
        assert!(!sel.matches(&Event::new(json!({ "Hashes": ["def", "ghi"] }))));
    }

    #[test]
    fn test_missing_field_is_non_match() {
        let sel = selection(json!({ "User": "admin" }));
        assert!(!sel.matches(&Event::new(json!({ "Other": 1 }))));
    }

    #[test]
    fn test_null_sentinel_matches_absence() {
        let sel = selection(json!({ "ParentImage": null }));
        assert!(sel.matches(&Event::new(json!({ "Image": "a.exe" }))));
        assert!(sel.matches(&Event::new(json!({ "ParentImage": null }))));
        assert!(!sel.matches(&Event::new(json!({ "ParentImage": "b.exe" }))));
    }

    #[test]
    fn test_endswith_modifier() {
        let sel = selection(json!({ "path|endswith": ".exe" }));
        assert!(sel.matches(&Event::new(json!({ "path": "C:\\tools\\run.exe" }))));
        assert!(!sel.matches(&Event::new(json!({ "path": "run.exe.bak" }))));
    }

    #[test]
    fn test_cased_modifier() {
        let sel = selection(json!({ "proc|cased": "Run.exe" }));
        assert!(sel.matches(&Event::new(json!({ "proc": "Run.exe" }))));
        assert!(!sel.matches(&Event::new(json!({ "proc": "run.exe" }))));
    }

    #[test]
    fn test_numeric_comparison_and_type_mismatch() {
        let sel = selection(json!({ "Size|gte": 1024 }));
        assert!(sel.matches(&Event::new(json!({ "Size": 2048 }))));
        assert!(sel.matches(&Event::new(json!({ "Size": "4096" }))));
        assert!(!sel.matches(&Event::new(json!({ "Size": 512 }))));
        // Non-numeric value: degrade to non-match, never an error
        assert!(!sel.matches(&Event::new(json!({ "Size": "large" }))));
        assert!(!sel.matches(&Event::new(json!({ "Size": true }))));
    }

    #[test]
    fn test_exact_numeric_equality_across_types() {
        let sel = selection(json!({ "Score": 1 }));
        assert!(sel.matches(&Event::new(json!({ "Score": 1.0 }))));
        assert!(sel.matches(&Event::new(json!({ "Score": "1" }))));
        assert!(!sel.matches(&Event::new(json!({ "Score": 2 }))));
    }

    #[test]
    fn test_boolean_equality() {
        let sel = selection(json!({ "Elevated": true }));
        assert!(sel.matches(&Event::new(json!({ "Elevated": true }))));
        assert!(!sel.matches(&Event::new(json!({ "Elevated": false }))));
        assert!(!sel.matches(&Event::new(json!({ "Elevated": "true" }))));
    }

    #[test]
    fn test_dotted_path_lookup() {
        let sel = selection(json!({ "alert.signature|contains": "scan" }));
        assert!(sel.matches(&Event::new(json!({
            "alert": { "signature": "portscan detected" }
        }))));
    }

    #[test]
    fn test_regex_modifier_full_match() {
        let sel = selection(json!({ "id|re": "[a-f0-9]{8}" }));
        assert!(sel.matches(&Event::new(json!({ "id": "deadbeef" }))));
        assert!(!sel.matches(&Event::new(json!({ "id": "xdeadbeefx" }))));
    }

    #[test]
    fn test_structural_errors() {
        assert!(Selection::from_value("s", &json!("bare string")).is_err());
        assert!(Selection::from_value("s", &json!({})).is_err());
        assert!(Selection::from_value("s", &json!([])).is_err());
        assert!(Selection::from_value("s", &json!(["not a map"])).is_err());
        assert!(Selection::from_value("s", &json!({ "a": [] })).is_err());
        assert!(Selection::from_value("s", &json!({ "a": { "nested": 1 } })).is_err());
    }

    #[test]
    fn test_bad_regex_is_compile_time() {
        let err = Selection::from_value("s", &json!({ "f|re": "(unbalanced" })).unwrap_err();
        assert!(matches!(err, SigmaError::Pattern { .. }));
    }

    #[test]
    fn test_unknown_modifier_is_compile_time() {
        let err = Selection::from_value("s", &json!({ "f|b0gus": 1 })).unwrap_err();
        assert!(matches!(err, SigmaError::Modifier { .. }));
    }
}
