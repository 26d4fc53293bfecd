//! String pattern matching implementations
//!
//! Matching is case-insensitive by default; the `cased` modifier opts a
//! field spec into exact-case comparison. Case folding is ASCII, which
//! is the convention for the log sources this rule format targets.

use crate::pattern::traits::StringMatcher;
use glob::{MatchOptions, Pattern as GlobPattern};
use regex::Regex;
use std::sync::Arc;

fn fold(token: &str, cased: bool) -> Arc<str> {
    if cased {
        Arc::from(token)
    } else {
        Arc::from(token.to_ascii_lowercase().as_str())
    }
}

/// Pattern for exact content matching
#[derive(Debug, Clone)]
pub struct ContentPattern {
    token: Arc<str>,
    cased: bool,
}

impl ContentPattern {
    /// Create an exact-match pattern
    pub fn new(token: &str, cased: bool) -> Self {
        Self {
            token: fold(token, cased),
            cased,
        }
    }
}

impl StringMatcher for ContentPattern {
    fn string_match(&self, value: &str) -> bool {
        if self.cased {
            value == &*self.token
        } else {
            value.eq_ignore_ascii_case(&self.token)
        }
    }
}

/// Pattern for prefix matching
#[derive(Debug, Clone)]
pub struct PrefixPattern {
    token: Arc<str>,
    cased: bool,
}

impl PrefixPattern {
    /// Create a prefix pattern
    pub fn new(token: &str, cased: bool) -> Self {
        Self {
            token: fold(token, cased),
            cased,
        }
    }
}

impl StringMatcher for PrefixPattern {
    fn string_match(&self, value: &str) -> bool {
        if self.cased {
            value.starts_with(&*self.token)
        } else {
            value.is_char_boundary(self.token.len())
                && value[..self.token.len()].eq_ignore_ascii_case(&self.token)
        }
    }
}

/// Pattern for suffix matching
#[derive(Debug, Clone)]
pub struct SuffixPattern {
    token: Arc<str>,
    cased: bool,
}

impl SuffixPattern {
    /// Create a suffix pattern
    pub fn new(token: &str, cased: bool) -> Self {
        Self {
            token: fold(token, cased),
            cased,
        }
    }
}

impl StringMatcher for SuffixPattern {
    fn string_match(&self, value: &str) -> bool {
        if self.cased {
            value.ends_with(&*self.token)
        } else if value.len() >= self.token.len() {
            let start = value.len() - self.token.len();
            value.is_char_boundary(start) && value[start..].eq_ignore_ascii_case(&self.token)
        } else {
            false
        }
    }
}

/// Pattern for substring matching
#[derive(Debug, Clone)]
pub struct ContainsPattern {
    token: Arc<str>,
    cased: bool,
}

impl ContainsPattern {
    /// Create a substring pattern
    pub fn new(token: &str, cased: bool) -> Self {
        Self {
            token: fold(token, cased),
            cased,
        }
    }
}

impl StringMatcher for ContainsPattern {
    fn string_match(&self, value: &str) -> bool {
        if self.cased {
            value.contains(&*self.token)
        } else {
            value.to_ascii_lowercase().contains(&*self.token)
        }
    }
}

/// Pattern for regular expression matching
///
/// The pattern is anchored at both ends at construction; the `regex`
/// crate's linear-time engine keeps match cost bounded on any input.
#[derive(Debug)]
pub struct RegexPattern {
    regex: Regex,
}

impl RegexPattern {
    /// Compile an anchored full-match regex
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let anchored = format!("^(?:{})$", pattern);
        Ok(Self {
            regex: Regex::new(&anchored)?,
        })
    }
}

impl StringMatcher for RegexPattern {
    fn string_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Pattern for glob matching of values with interior wildcards
#[derive(Debug)]
pub struct GlobPatternMatcher {
    glob: GlobPattern,
    options: MatchOptions,
}

impl GlobPatternMatcher {
    /// Compile a glob pattern
    pub fn new(pattern: &str, cased: bool) -> Result<Self, glob::PatternError> {
        Ok(Self {
            glob: GlobPattern::new(pattern)?,
            options: MatchOptions {
                case_sensitive: cased,
                require_literal_separator: false,
                require_literal_leading_dot: false,
            },
        })
    }
}

impl StringMatcher for GlobPatternMatcher {
    fn string_match(&self, value: &str) -> bool {
        self.glob.matches_with(value, self.options)
    }
}
