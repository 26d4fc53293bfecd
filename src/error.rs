//! Error types for rule compilation and evaluation
//!
//! Every failure surfaces at load or compile time. Matching an event
//! against a compiled rule is total and has no error path.

use thiserror::Error;

/// Errors produced while loading, validating, or compiling rules
#[derive(Error, Debug)]
pub enum SigmaError {
    /// Condition string does not parse
    #[error("condition syntax error at offset {position}: {message}")]
    ConditionSyntax {
        /// Byte offset into the condition string
        position: usize,
        /// What went wrong
        message: String,
    },

    /// Condition names a selection the detection does not define
    #[error("condition references unknown selection: {name}")]
    ConditionReference {
        /// The unresolved name or wildcard group
        name: String,
    },

    /// Unknown or incompatible field modifier chain
    #[error("invalid modifier on field {field}: {message}")]
    Modifier {
        /// The offending field key as written in the rule
        field: String,
        /// What went wrong
        message: String,
    },

    /// A rule value does not compile into a matcher
    #[error("invalid pattern {pattern}: {message}")]
    Pattern {
        /// The offending value
        pattern: String,
        /// What went wrong
        message: String,
    },

    /// Detection document shape violation
    #[error("invalid rule structure: {0}")]
    Structural(String),

    /// YAML deserialization failure
    #[error("yaml parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON deserialization failure
    #[error("json parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O failure while reading rule or event files
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SigmaError {
    /// Condition syntax error at a byte offset
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::ConditionSyntax {
            position,
            message: message.into(),
        }
    }

    /// Unresolved selection reference
    pub fn reference(name: impl Into<String>) -> Self {
        Self::ConditionReference { name: name.into() }
    }

    /// Modifier error on a field key
    pub fn modifier(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Modifier {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Pattern compilation error
    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SigmaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        let err = SigmaError::syntax(7, "expected \")\"");
        assert_eq!(
            err.to_string(),
            "condition syntax error at offset 7: expected \")\""
        );

        let err = SigmaError::reference("sel_x");
        assert!(err.to_string().contains("sel_x"));

        let err = SigmaError::modifier("Image|b0gus", "unknown modifier: b0gus");
        assert!(err.to_string().contains("Image|b0gus"));
    }

    #[test]
    fn test_from_serde_errors() {
        let yaml_err = serde_yaml::from_str::<i32>("[not an int").unwrap_err();
        assert!(matches!(SigmaError::from(yaml_err), SigmaError::YamlParse(_)));

        let json_err = serde_json::from_str::<i32>("{").unwrap_err();
        assert!(matches!(SigmaError::from(json_err), SigmaError::JsonParse(_)));
    }
}
