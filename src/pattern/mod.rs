//! Pattern matchers and field modifier parsing

/// Factory functions for building matchers from rule values
pub mod factory;
/// Numeric matcher implementations
pub mod num_matcher;
/// String matcher implementations
pub mod string_matcher;
/// Matcher traits
pub mod traits;

pub use factory::{new_num_matcher, new_string_matcher};
pub use num_matcher::{CmpOp, CmpPattern, NumPattern};
pub use string_matcher::{
    ContainsPattern, ContentPattern, GlobPatternMatcher, PrefixPattern, RegexPattern,
    SuffixPattern,
};
pub use traits::{NumMatcher, StringMatcher};

use crate::error::{Result, SigmaError};

/// Comparison mode selected by a field modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Exact equality (the default; wildcards normalized at parse time)
    #[default]
    Exact,
    /// Substring test
    Contains,
    /// Prefix test
    StartsWith,
    /// Suffix test
    EndsWith,
    /// Anchored regular expression
    Regex,
    /// Numeric strictly-greater comparison
    Gt,
    /// Numeric greater-or-equal comparison
    Gte,
    /// Numeric strictly-less comparison
    Lt,
    /// Numeric less-or-equal comparison
    Lte,
}

impl MatchMode {
    fn is_numeric(self) -> bool {
        matches!(self, Self::Gt | Self::Gte | Self::Lt | Self::Lte)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::Regex => "re",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }
}

/// Parsed modifier chain of one field spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierSet {
    /// Comparison mode
    pub mode: MatchMode,
    /// `all`: every listed value must match, not just one
    pub match_all: bool,
    /// `cased`: case-sensitive string comparison
    pub cased: bool,
}

/// Split a detection field key into field name and modifier set
///
/// Keys use the `Field|modifier|modifier` convention, e.g.
/// `CommandLine|contains|all`. Unknown modifiers and incompatible
/// combinations are hard errors, never silently ignored.
pub fn parse_field_key(key: &str) -> Result<(&str, ModifierSet)> {
    let mut parts = key.split('|');
    let field = parts.next().unwrap_or_default();
    if field.is_empty() {
        return Err(SigmaError::modifier(key, "empty field name"));
    }

    let mut set = ModifierSet::default();
    let mut mode: Option<MatchMode> = None;
    for token in parts {
        let parsed = match token.to_ascii_lowercase().as_str() {
            "contains" => Some(MatchMode::Contains),
            "startswith" | "prefix" => Some(MatchMode::StartsWith),
            "endswith" | "suffix" => Some(MatchMode::EndsWith),
            "re" | "regex" => Some(MatchMode::Regex),
            "gt" => Some(MatchMode::Gt),
            "gte" => Some(MatchMode::Gte),
            "lt" => Some(MatchMode::Lt),
            "lte" => Some(MatchMode::Lte),
            "all" => {
                set.match_all = true;
                None
            }
            "cased" => {
                set.cased = true;
                None
            }
            other => {
                return Err(SigmaError::modifier(
                    key,
                    format!("unknown modifier: {}", other),
                ))
            }
        };
        if let Some(parsed) = parsed {
            if let Some(existing) = mode {
                return Err(SigmaError::modifier(
                    key,
                    format!(
                        "incompatible modifiers: {} and {}",
                        existing.name(),
                        parsed.name()
                    ),
                ));
            }
            mode = Some(parsed);
        }
    }

    set.mode = mode.unwrap_or_default();
    if set.cased && set.mode == MatchMode::Regex {
        return Err(SigmaError::modifier(key, "cased cannot combine with re"));
    }
    if set.mode.is_numeric() && (set.cased || set.match_all) {
        return Err(SigmaError::modifier(
            key,
            format!("{} cannot combine with all/cased", set.mode.name()),
        ));
    }
    Ok((field, set))
}
