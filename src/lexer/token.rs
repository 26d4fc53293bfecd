//! Token definitions for the condition grammar

/// Token types in rule condition expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Selection name, matched case-sensitively
    Identifier,
    /// Selection group pattern containing `*` or `?`
    IdentifierWithWildcard,
    /// The `them` keyword: every selection in the rule
    IdentifierAll,
    /// Integer literal, the N in `N of`
    Number,
    /// `and`
    KeywordAnd,
    /// `or`
    KeywordOr,
    /// `not`
    KeywordNot,
    /// `all`, as in `all of`
    KeywordAll,
    /// `of`
    KeywordOf,
    /// `(`
    SepLpar,
    /// `)`
    SepRpar,
    /// End of input
    LitEof,
}

impl Token {
    /// Human-readable token description for diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            Token::Identifier => "selection name",
            Token::IdentifierWithWildcard => "selection group pattern",
            Token::IdentifierAll => "\"them\"",
            Token::Number => "number",
            Token::KeywordAnd => "\"and\"",
            Token::KeywordOr => "\"or\"",
            Token::KeywordNot => "\"not\"",
            Token::KeywordAll => "\"all\"",
            Token::KeywordOf => "\"of\"",
            Token::SepLpar => "\"(\"",
            Token::SepRpar => "\")\"",
            Token::LitEof => "end of condition",
        }
    }
}

/// Classify one whitespace-delimited word
///
/// Keywords are case-insensitive; anything else is an identifier, with
/// wildcard identifiers split out for group expansion.
pub fn check_keyword(word: &str) -> Token {
    match word.to_ascii_lowercase().as_str() {
        "and" => Token::KeywordAnd,
        "or" => Token::KeywordOr,
        "not" => Token::KeywordNot,
        "all" => Token::KeywordAll,
        "of" => Token::KeywordOf,
        "them" => Token::IdentifierAll,
        _ => {
            if word.bytes().all(|b| b.is_ascii_digit()) {
                Token::Number
            } else if word.contains('*') || word.contains('?') {
                Token::IdentifierWithWildcard
            } else {
                Token::Identifier
            }
        }
    }
}

/// Lexical token with its source text and byte offset
#[derive(Debug, Clone)]
pub struct Item {
    /// Token type
    pub token: Token,
    /// Source text of the token
    pub value: String,
    /// Byte offset into the condition string
    pub pos: usize,
}

impl Item {
    /// Create a new item
    pub fn new(token: Token, value: impl Into<String>, pos: usize) -> Self {
        Self {
            token,
            value: value.into(),
            pos,
        }
    }
}
