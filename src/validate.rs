//! Static rule validation
//!
//! Validation runs the same compilation path as the engine but collects
//! every problem instead of stopping at the first, so a lint run over a
//! rule repository reports all findings in one pass. Errors mean the
//! rule cannot be compiled; warnings flag suspicious but loadable rules
//! such as selections the condition never references.

use crate::matcher::Selection;
use crate::parser;
use crate::rule::Rule;
use std::fmt;

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Rule cannot be compiled
    Error,
    /// Rule compiles but is suspicious
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One finding against one rule
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ValidationIssue {
    /// Finding severity
    pub severity: Severity,
    /// Rule key (id, or title as fallback)
    pub rule: String,
    /// Where in the rule the finding applies: a selection name,
    /// `condition`, or `detection`
    pub location: String,
    /// Human-readable description
    pub message: String,
}

impl ValidationIssue {
    fn error(rule: &Rule, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            rule: rule.key().to_string(),
            location: location.into(),
            message: message.into(),
        }
    }

    fn warning(rule: &Rule, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            rule: rule.key().to_string(),
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}]: {}",
            self.severity, self.rule, self.location, self.message
        )
    }
}

/// True if any issue is an error
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

/// Validate one rule, collecting every finding
pub fn validate(rule: &Rule) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let detection = &rule.detection;

    let condition = match (detection.has_condition_key(), detection.condition()) {
        (false, _) => {
            issues.push(ValidationIssue::error(
                rule,
                "detection",
                "missing condition",
            ));
            None
        }
        (true, None) => {
            issues.push(ValidationIssue::error(
                rule,
                "condition",
                "condition must be a string",
            ));
            None
        }
        (true, Some(c)) => Some(c),
    };

    if detection.selection_count() == 0 {
        issues.push(ValidationIssue::error(
            rule,
            "detection",
            "no selections defined",
        ));
    }

    // Compile every selection even after a failure, so one bad selection
    // does not mask findings in the others
    for (name, raw) in detection.selections() {
        if let Err(e) = Selection::from_value(name, raw) {
            issues.push(ValidationIssue::error(rule, name, e.to_string()));
        }
    }

    if let Some(condition) = condition {
        let names = detection.selection_names();
        match parser::compile(condition, &names) {
            Ok(compiled) => {
                for (idx, name) in names.iter().enumerate() {
                    if !compiled.references(idx) {
                        issues.push(ValidationIssue::warning(
                            rule,
                            name,
                            "selection is never referenced by the condition",
                        ));
                    }
                }
            }
            Err(e) => issues.push(ValidationIssue::error(rule, "condition", e.to_string())),
        }
    }

    issues
}

/// Validate a batch of rules
pub fn validate_all(rules: &[Rule]) -> Vec<ValidationIssue> {
    rules.iter().flat_map(validate).collect()
}
