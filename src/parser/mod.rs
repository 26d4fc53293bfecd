//! Condition compilation
//!
//! Parses a rule's condition string into a [`CompiledCondition`] against
//! the rule's known selection names. Wildcard group references and
//! quantifier targets are expanded here, at compile time; evaluation
//! never touches glob patterns.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr       := and_expr ( "or" and_expr )*
//! and_expr   := not_expr ( "and" not_expr )*
//! not_expr   := "not" not_expr | atom
//! atom       := "(" expr ")" | quantifier | IDENT | WILDCARD
//! quantifier := ( NUMBER | "all" ) "of" ( "them" | IDENT | WILDCARD )
//! ```
//!
//! Keywords are case-insensitive; selection names are case-sensitive.

use crate::ast::{CompiledCondition, ConditionNode};
use crate::error::{Result, SigmaError};
use crate::lexer::{Item, Lexer, Token};
use glob::Pattern as GlobPattern;

/// Compile a condition string against a rule's selection names
pub fn compile(condition: &str, selection_names: &[String]) -> Result<CompiledCondition> {
    if condition.trim().is_empty() {
        return Err(SigmaError::syntax(0, "empty condition"));
    }

    let items = Lexer::new(condition).scan()?;
    let mut parser = ConditionParser {
        items: &items,
        pos: 0,
        names: selection_names,
    };
    let root = parser.parse_expr()?;
    parser.expect(Token::LitEof)?;
    Ok(CompiledCondition::new(root, selection_names.len()))
}

struct ConditionParser<'a> {
    items: &'a [Item],
    pos: usize,
    names: &'a [String],
}

impl<'a> ConditionParser<'a> {
    fn peek(&self) -> &Item {
        // The token stream always ends with LitEof
        &self.items[self.pos.min(self.items.len() - 1)]
    }

    fn advance(&mut self) -> &Item {
        let item = &self.items[self.pos.min(self.items.len() - 1)];
        if self.pos < self.items.len() - 1 {
            self.pos += 1;
        }
        item
    }

    fn expect(&mut self, token: Token) -> Result<&Item> {
        let item = self.advance();
        if item.token == token {
            Ok(item)
        } else {
            Err(SigmaError::syntax(
                item.pos,
                format!("expected {}, found {}", token.describe(), item.token.describe()),
            ))
        }
    }

    fn parse_expr(&mut self) -> Result<ConditionNode> {
        let mut nodes = vec![self.parse_and()?];
        while self.peek().token == Token::KeywordOr {
            self.advance();
            nodes.push(self.parse_and()?);
        }
        Ok(reduce(nodes, ConditionNode::Or))
    }

    fn parse_and(&mut self) -> Result<ConditionNode> {
        let mut nodes = vec![self.parse_not()?];
        while self.peek().token == Token::KeywordAnd {
            self.advance();
            nodes.push(self.parse_not()?);
        }
        Ok(reduce(nodes, ConditionNode::And))
    }

    fn parse_not(&mut self) -> Result<ConditionNode> {
        if self.peek().token == Token::KeywordNot {
            self.advance();
            // `not` binds to the following atom or group only
            let inner = self.parse_not()?;
            return Ok(ConditionNode::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<ConditionNode> {
        let item = self.advance().clone();
        match item.token {
            Token::SepLpar => {
                let inner = self.parse_expr()?;
                self.expect(Token::SepRpar)?;
                Ok(inner)
            }
            Token::Identifier => Ok(ConditionNode::Selection(self.resolve(&item)?)),
            Token::IdentifierWithWildcard => {
                // A bare group reference is an OR over its expansion;
                // matching nothing is a reference error
                let targets = self.expand_group(&item)?;
                if targets.is_empty() {
                    return Err(SigmaError::reference(item.value));
                }
                Ok(reduce(
                    targets.into_iter().map(ConditionNode::Selection).collect(),
                    ConditionNode::Or,
                ))
            }
            Token::Number => {
                let required: usize = item.value.parse().map_err(|_| {
                    SigmaError::syntax(item.pos, format!("invalid count: {}", item.value))
                })?;
                self.expect(Token::KeywordOf)?;
                let targets = self.parse_targets()?;
                Ok(ConditionNode::Quantifier {
                    required: Some(required),
                    targets,
                })
            }
            Token::KeywordAll => {
                self.expect(Token::KeywordOf)?;
                let targets = self.parse_targets()?;
                Ok(ConditionNode::Quantifier {
                    required: None,
                    targets,
                })
            }
            other => Err(SigmaError::syntax(
                item.pos,
                format!(
                    "expected selection name, quantifier, or \"(\", found {}",
                    other.describe()
                ),
            )),
        }
    }

    /// Parse the targets of a quantifier: `them`, one name, or a pattern
    ///
    /// A pattern expanding to nothing is permitted here; the quantifier
    /// then follows the vacuous rules (`all of` true, `N of` false).
    fn parse_targets(&mut self) -> Result<Vec<usize>> {
        let item = self.advance().clone();
        match item.token {
            Token::IdentifierAll => Ok((0..self.names.len()).collect()),
            Token::Identifier => Ok(vec![self.resolve(&item)?]),
            Token::IdentifierWithWildcard => self.expand_group(&item),
            other => Err(SigmaError::syntax(
                item.pos,
                format!(
                    "expected \"them\", a selection name, or a group pattern, found {}",
                    other.describe()
                ),
            )),
        }
    }

    fn resolve(&self, item: &Item) -> Result<usize> {
        self.names
            .iter()
            .position(|name| name == &item.value)
            .ok_or_else(|| SigmaError::reference(&item.value))
    }

    fn expand_group(&self, item: &Item) -> Result<Vec<usize>> {
        let pattern = GlobPattern::new(&item.value)
            .map_err(|e| SigmaError::syntax(item.pos, e.to_string()))?;
        Ok(self
            .names
            .iter()
            .enumerate()
            .filter(|(_, name)| pattern.matches(name))
            .map(|(idx, _)| idx)
            .collect())
    }
}

fn reduce(mut nodes: Vec<ConditionNode>, combine: fn(Vec<ConditionNode>) -> ConditionNode) -> ConditionNode {
    if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        combine(nodes)
    }
}
