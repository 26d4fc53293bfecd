//! Core traits for pattern matching

use std::fmt::Debug;

/// Trait for string pattern matchers
pub trait StringMatcher: Debug + Send + Sync {
    /// Match a string value against this pattern
    fn string_match(&self, value: &str) -> bool;
}

/// Trait for numeric pattern matchers
pub trait NumMatcher: Debug + Send + Sync {
    /// Match a numeric value against this pattern
    fn num_match(&self, value: f64) -> bool;
}
