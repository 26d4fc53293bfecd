//! Engine facade: compile rule sets and run them over event batches
//!
//! The engine owns a cache of compiled rules keyed by rule identity and
//! content fingerprint, so repeated checks with an unchanged rule set
//! skip recompilation while edited rules recompile transparently. The
//! match path itself holds no shared mutable state and the rule × event
//! cross-product runs in parallel.

use crate::ast::{CompiledCondition, SelectionMemo};
use crate::error::{Result, SigmaError};
use crate::event::Event;
use crate::matcher::Selection;
use crate::parser;
use crate::rule::Rule;
use crate::validate::{self, ValidationIssue};
use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, trace};

/// One rule, fully compiled and ready to match events
#[derive(Debug)]
pub struct CompiledRule {
    key: String,
    title: Option<String>,
    selection_names: Vec<String>,
    selections: Vec<Selection>,
    condition: CompiledCondition,
    fingerprint: u64,
}

impl CompiledRule {
    /// Compile a parsed rule document
    pub fn compile(rule: &Rule) -> Result<Self> {
        let detection = &rule.detection;
        let condition_str = detection.condition().ok_or_else(|| {
            SigmaError::Structural(if detection.has_condition_key() {
                "condition must be a string".to_string()
            } else {
                "detection has no condition".to_string()
            })
        })?;

        let selection_names = detection.selection_names();
        let mut selections = Vec::with_capacity(selection_names.len());
        for (name, raw) in detection.selections() {
            selections.push(Selection::from_value(name, raw)?);
        }

        let condition = parser::compile(condition_str, &selection_names)?;
        Ok(Self {
            key: rule.key().to_string(),
            title: rule.title.clone(),
            selection_names,
            selections,
            condition,
            fingerprint: fingerprint(rule)?,
        })
    }

    /// Rule identity (id, or title as fallback)
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Rule title, if the document had one
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Match one event
    pub fn matches(&self, event: &Event) -> bool {
        let mut memo = SelectionMemo::new(&self.selections, event);
        self.condition.evaluate(&mut memo)
    }

    /// Match one event, reporting the selections that matched
    ///
    /// Only selections the evaluation actually touched can appear;
    /// short-circuited branches stay unevaluated.
    pub fn matches_detailed(&self, event: &Event) -> (bool, Vec<String>) {
        let mut memo = SelectionMemo::new(&self.selections, event);
        let matched = self.condition.evaluate(&mut memo);
        let names = memo
            .matched_indices()
            .map(|idx| self.selection_names[idx].clone())
            .collect();
        (matched, names)
    }
}

/// Content fingerprint of a rule's detection section
fn fingerprint(rule: &Rule) -> Result<u64> {
    let serialized = serde_json::to_string(&rule.detection)?;
    let mut hasher = DefaultHasher::new();
    serialized.hash(&mut hasher);
    Ok(hasher.finish())
}

/// Outcome of matching one rule against one event
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Rule key
    pub rule: String,
    /// Index of the event within the checked batch
    pub event_index: usize,
    /// Whether the full condition held
    pub matched: bool,
    /// Names of selections that individually matched
    pub matched_selections: Vec<String>,
}

/// A rule that failed to compile during a batch check
#[derive(Debug, Clone, Serialize)]
pub struct RuleFailure {
    /// Rule key
    pub rule: String,
    /// Compile error description
    pub error: String,
}

/// Full outcome of a batch check
#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    /// One entry per (rule, event) pair, for every rule that compiled
    pub results: Vec<MatchResult>,
    /// Rules that did not compile and were skipped
    pub failures: Vec<RuleFailure>,
}

impl CheckReport {
    /// Iterate only the positive matches
    pub fn matches(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter().filter(|r| r.matched)
    }

    /// True if any rule failed to compile
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Rule compilation cache plus batch entry points
#[derive(Debug, Default)]
pub struct Engine {
    cache: DashMap<String, Arc<CompiledRule>>,
}

impl Engine {
    /// Create an engine with an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a rule, reusing the cached artifact when the detection
    /// section is unchanged
    pub fn compile(&self, rule: &Rule) -> Result<Arc<CompiledRule>> {
        let print = fingerprint(rule)?;
        if let Some(cached) = self.cache.get(rule.key()) {
            if cached.fingerprint == print {
                trace!(rule = rule.key(), "compiled rule cache hit");
                return Ok(Arc::clone(&cached));
            }
            debug!(rule = rule.key(), "rule content changed, recompiling");
        }
        let compiled = Arc::new(CompiledRule::compile(rule)?);
        self.cache
            .insert(rule.key().to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Number of cached compiled rules
    pub fn cached_rules(&self) -> usize {
        self.cache.len()
    }

    /// Validate a batch of rules without compiling into the cache
    pub fn validate(&self, rules: &[Rule]) -> Vec<ValidationIssue> {
        validate::validate_all(rules)
    }

    /// Match every rule against every event
    ///
    /// Rules that fail to compile are reported in the result and do not
    /// abort the batch. Result order is rule-major, then event order.
    pub fn check(&self, rules: &[Rule], events: &[Event]) -> CheckReport {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut failures = Vec::new();
        for rule in rules {
            match self.compile(rule) {
                Ok(c) => compiled.push(c),
                Err(e) => {
                    debug!(rule = rule.key(), error = %e, "rule failed to compile");
                    failures.push(RuleFailure {
                        rule: rule.key().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let results = compiled
            .par_iter()
            .flat_map_iter(|rule| {
                events.iter().enumerate().map(move |(event_index, event)| {
                    let (matched, matched_selections) = rule.matches_detailed(event);
                    MatchResult {
                        rule: rule.key().to_string(),
                        event_index,
                        matched,
                        matched_selections,
                    }
                })
            })
            .collect();

        CheckReport { results, failures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::rule_from_yaml;
    use serde_json::json;

    fn rule(yaml: &str) -> Rule {
        rule_from_yaml(yaml.as_bytes()).unwrap()
    }

    fn sample_rule() -> Rule {
        rule(
            r#"
title: Sample
id: rule-1
detection:
  selection:
    EventID: 1
    Image|endswith: '\cmd.exe'
  filter:
    User: SYSTEM
  condition: selection and not filter
"#,
        )
    }

    #[test]
    fn test_compiled_rule_matches() {
        let compiled = CompiledRule::compile(&sample_rule()).unwrap();
        assert!(compiled.matches(&Event::new(json!({
            "EventID": 1, "Image": "C:\\Windows\\cmd.exe", "User": "alice"
        }))));
        assert!(!compiled.matches(&Event::new(json!({
            "EventID": 1, "Image": "C:\\Windows\\cmd.exe", "User": "SYSTEM"
        }))));
        assert!(!compiled.matches(&Event::new(json!({ "EventID": 2 }))));
    }

    #[test]
    fn test_matches_detailed_reports_selection_names() {
        let compiled = CompiledRule::compile(&sample_rule()).unwrap();
        let (matched, names) = compiled.matches_detailed(&Event::new(json!({
            "EventID": 1, "Image": "C:\\Windows\\cmd.exe", "User": "alice"
        })));
        assert!(matched);
        assert_eq!(names, vec!["selection".to_string()]);
    }

    #[test]
    fn test_compile_requires_condition() {
        let bad = rule("title: T\ndetection:\n  selection:\n    a: 1\n");
        let err = CompiledRule::compile(&bad).unwrap_err();
        assert!(matches!(err, SigmaError::Structural(_)));
    }

    #[test]
    fn test_engine_cache_and_recompile() {
        let engine = Engine::new();
        let rule_v1 = sample_rule();
        let first = engine.compile(&rule_v1).unwrap();
        let second = engine.compile(&rule_v1).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cached_rules(), 1);

        // Same key, different detection content: must recompile
        let mut rule_v2 = rule_v1.clone();
        rule_v2
            .detection
            .insert("condition".into(), json!("selection"));
        let third = engine.compile(&rule_v2).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(engine.cached_rules(), 1);
    }

    #[test]
    fn test_check_reports_cross_product() {
        let engine = Engine::new();
        let rules = vec![sample_rule()];
        let events = vec![
            Event::new(json!({ "EventID": 1, "Image": "C:\\x\\cmd.exe", "User": "bob" })),
            Event::new(json!({ "EventID": 99 })),
        ];
        let report = engine.check(&rules, &events);
        assert_eq!(report.results.len(), 2);
        assert!(report.results[0].matched);
        assert!(!report.results[1].matched);
        assert_eq!(report.matches().count(), 1);
        assert!(!report.has_failures());
    }

    #[test]
    fn test_check_skips_broken_rules() {
        let engine = Engine::new();
        let rules = vec![
            sample_rule(),
            rule("title: Broken\ndetection:\n  selection:\n    a: 1\n  condition: a and\n"),
        ];
        let events = vec![Event::new(json!({ "EventID": 99 }))];
        let report = engine.check(&rules, &events);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].rule, "Broken");
    }
}
