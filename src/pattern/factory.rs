//! Factory functions for creating pattern matchers
//!
//! All pattern compilation happens here, at rule-parse time. Wildcard
//! normalization of exact values into the prefix/suffix/contains/glob
//! family is a compile-time rewrite; match time never inspects `*`/`?`.

use crate::error::SigmaError;
use crate::pattern::num_matcher::{CmpOp, CmpPattern, NumPattern};
use crate::pattern::string_matcher::{
    ContainsPattern, ContentPattern, GlobPatternMatcher, PrefixPattern, RegexPattern,
    SuffixPattern,
};
use crate::pattern::traits::{NumMatcher, StringMatcher};
use crate::pattern::MatchMode;

/// Compile-time classification of an exact value with wildcards
#[derive(Debug, Clone, PartialEq, Eq)]
enum WildcardPlan {
    /// No unescaped wildcards
    Literal(String),
    /// Leading `*` only: suffix match on the core
    Suffix(String),
    /// Trailing `*` only: prefix match on the core
    Prefix(String),
    /// Leading and trailing `*`: substring match on the core
    Contains(String),
    /// Interior wildcards or `?`: full glob
    Glob(String),
}

/// Classify a rule value for wildcard handling
///
/// Backslash escapes `*`, `?` and itself; any other backslash is a
/// literal character, which keeps Windows paths intact.
fn plan_wildcards(pattern: &str) -> WildcardPlan {
    #[derive(Clone, Copy, PartialEq)]
    enum Seg {
        Star,
        Question,
        Lit(char),
    }

    let mut segs = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek() {
                Some(&next @ ('*' | '?' | '\\')) => {
                    chars.next();
                    segs.push(Seg::Lit(next));
                }
                _ => segs.push(Seg::Lit('\\')),
            },
            '*' => segs.push(Seg::Star),
            '?' => segs.push(Seg::Question),
            other => segs.push(Seg::Lit(other)),
        }
    }

    let has_question = segs.contains(&Seg::Question);
    let leading = segs.iter().take_while(|s| **s == Seg::Star).count();
    let trailing = segs
        .iter()
        .rev()
        .take_while(|s| **s == Seg::Star)
        .count()
        .min(segs.len() - leading);
    let core = &segs[leading..segs.len() - trailing];
    let interior_wild = core.iter().any(|s| matches!(s, Seg::Star | Seg::Question));

    if !has_question && !interior_wild {
        let literal: String = core
            .iter()
            .map(|s| match s {
                Seg::Lit(c) => *c,
                _ => unreachable!(),
            })
            .collect();
        return match (leading > 0, trailing > 0) {
            (false, false) => WildcardPlan::Literal(literal),
            (true, false) => WildcardPlan::Suffix(literal),
            (false, true) => WildcardPlan::Prefix(literal),
            (true, true) => WildcardPlan::Contains(literal),
        };
    }

    // General case: rebuild as a glob source with literals escaped
    let mut glob = String::with_capacity(pattern.len() + 8);
    for seg in &segs {
        match seg {
            Seg::Star => glob.push('*'),
            Seg::Question => glob.push('?'),
            Seg::Lit(c @ ('*' | '?' | '[' | ']')) => {
                glob.push('[');
                glob.push(*c);
                glob.push(']');
            }
            Seg::Lit(c) => glob.push(*c),
        }
    }
    WildcardPlan::Glob(glob)
}

/// Create a string matcher for one rule value
pub fn new_string_matcher(
    mode: MatchMode,
    cased: bool,
    pattern: &str,
) -> Result<Box<dyn StringMatcher>, SigmaError> {
    let matcher: Box<dyn StringMatcher> = match mode {
        MatchMode::Regex => Box::new(
            RegexPattern::new(pattern)
                .map_err(|e| SigmaError::pattern(pattern, e.to_string()))?,
        ),
        MatchMode::Contains => Box::new(ContainsPattern::new(pattern, cased)),
        MatchMode::StartsWith => Box::new(PrefixPattern::new(pattern, cased)),
        MatchMode::EndsWith => Box::new(SuffixPattern::new(pattern, cased)),
        MatchMode::Exact => match plan_wildcards(pattern) {
            WildcardPlan::Literal(lit) => Box::new(ContentPattern::new(&lit, cased)),
            WildcardPlan::Prefix(core) => Box::new(PrefixPattern::new(&core, cased)),
            WildcardPlan::Suffix(core) => Box::new(SuffixPattern::new(&core, cased)),
            WildcardPlan::Contains(core) => Box::new(ContainsPattern::new(&core, cased)),
            WildcardPlan::Glob(source) => Box::new(
                GlobPatternMatcher::new(&source, cased)
                    .map_err(|e| SigmaError::pattern(pattern, e.to_string()))?,
            ),
        },
        MatchMode::Gt | MatchMode::Gte | MatchMode::Lt | MatchMode::Lte => {
            return Err(SigmaError::pattern(
                pattern,
                "numeric comparison requires a numeric value",
            ))
        }
    };
    Ok(matcher)
}

/// Create a numeric matcher for one rule value
pub fn new_num_matcher(mode: MatchMode, value: f64) -> Box<dyn NumMatcher> {
    match mode {
        MatchMode::Gt => Box::new(CmpPattern::new(CmpOp::Gt, value)),
        MatchMode::Gte => Box::new(CmpPattern::new(CmpOp::Gte, value)),
        MatchMode::Lt => Box::new(CmpPattern::new(CmpOp::Lt, value)),
        MatchMode::Lte => Box::new(CmpPattern::new(CmpOp::Lte, value)),
        _ => Box::new(NumPattern::new(value)),
    }
}
