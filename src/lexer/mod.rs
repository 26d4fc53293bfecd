//! Lexical analysis of rule condition strings

/// Token definitions and utilities
pub mod token;

pub use token::{check_keyword, Item, Token};

use crate::error::{Result, SigmaError};

/// Lexer for rule conditions
///
/// Converts a condition string into a token sequence. Whitespace is
/// insignificant; every emitted token carries its byte offset so parse
/// errors can point at the condition source.
pub struct Lexer<'a> {
    input: &'a str,
    start: usize,
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer over a condition string
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            start: 0,
            position: 0,
        }
    }

    /// Scan the whole input, ending with a `LitEof` item
    pub fn scan(mut self) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        while let Some(ch) = self.peek_char() {
            match ch {
                c if c.is_whitespace() => {
                    self.advance(c);
                    self.ignore();
                }
                '(' => {
                    self.advance(ch);
                    items.push(self.emit(Token::SepLpar));
                }
                ')' => {
                    self.advance(ch);
                    items.push(self.emit(Token::SepRpar));
                }
                '|' => {
                    // Pipe introduces an aggregation expression, which this
                    // engine does not evaluate
                    return Err(SigmaError::syntax(
                        self.position,
                        "aggregation expressions are not supported",
                    ));
                }
                _ => {
                    self.scan_word();
                    let word = self.collected();
                    items.push(self.emit(check_keyword(word)));
                }
            }
        }
        items.push(Item::new(Token::LitEof, "", self.input.len()));
        Ok(items)
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn advance(&mut self, ch: char) {
        self.position += ch.len_utf8();
    }

    fn scan_word(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() || matches!(ch, '(' | ')' | '|') {
                break;
            }
            self.advance(ch);
        }
    }

    fn collected(&self) -> &str {
        &self.input[self.start..self.position]
    }

    fn ignore(&mut self) {
        self.start = self.position;
    }

    fn emit(&mut self, token: Token) -> Item {
        let item = Item::new(token, self.collected(), self.start);
        self.ignore();
        item
    }
}
