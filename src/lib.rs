//! Detection rule compilation and event matching
//!
//! This crate loads detection rules (YAML or JSON documents with named
//! selections and a boolean condition over them), compiles them into
//! immutable matchers, and evaluates structured JSON events against
//! them. Compilation fails loudly with positioned errors; the match
//! path is total and never errors on malformed event data.
//!
//! # Example
//!
//! ```
//! use sigmacheck::{rule_from_yaml, CompiledRule, Event};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), sigmacheck::SigmaError> {
//! let rule = rule_from_yaml(br#"
//! title: Suspicious Shell
//! detection:
//!   selection:
//!     Image|endswith: '\cmd.exe'
//!   condition: selection
//! "#)?;
//!
//! let compiled = CompiledRule::compile(&rule)?;
//! let event = Event::new(json!({ "Image": "C:\\Windows\\System32\\cmd.exe" }));
//! assert!(compiled.matches(&event));
//! # Ok(())
//! # }
//! ```
//!
//! For batches, [`Engine`] caches compiled rules and runs the rule ×
//! event cross-product in parallel; [`validate`] lints rules without
//! matching anything.

#![warn(missing_docs)]

pub mod ast;
pub mod engine;
pub mod error;
pub mod event;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod pattern;
pub mod rule;
pub mod validate;

pub use engine::{CheckReport, CompiledRule, Engine, MatchResult, RuleFailure};
pub use error::{Result, SigmaError};
pub use event::{Event, Value};
pub use matcher::Selection;
pub use rule::{
    rule_from_json, rule_from_yaml, rules_from_json, rules_from_yaml, Detection, Rule,
};
pub use validate::{validate, validate_all, Severity, ValidationIssue};
