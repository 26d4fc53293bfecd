//! Compiled condition trees and their evaluation
//!
//! A [`CompiledCondition`] is built once per rule by the parser and is
//! immutable afterwards: selection references are resolved to indices,
//! wildcard groups are already expanded, and no event state is held, so
//! one tree can be evaluated against any number of events concurrently.

use crate::event::Event;
use crate::matcher::Selection;

/// One node of a compiled condition expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionNode {
    /// Reference to a selection by index into the rule's selection list
    Selection(usize),
    /// Logical negation
    Not(Box<ConditionNode>),
    /// Conjunction, short-circuiting
    And(Vec<ConditionNode>),
    /// Disjunction, short-circuiting
    Or(Vec<ConditionNode>),
    /// `N of <targets>` / `all of <targets>`
    ///
    /// `required: None` means all targets. Targets are resolved
    /// selection indices; `them` resolves to every selection.
    Quantifier {
        /// Minimum number of matching targets, or `None` for all
        required: Option<usize>,
        /// Resolved target selection indices
        targets: Vec<usize>,
    },
}

impl ConditionNode {
    /// Evaluate this node, memoizing per-selection results
    pub fn eval(&self, memo: &mut SelectionMemo<'_>) -> bool {
        match self {
            ConditionNode::Selection(idx) => memo.result(*idx),
            ConditionNode::Not(inner) => !inner.eval(memo),
            ConditionNode::And(nodes) => nodes.iter().all(|n| n.eval(memo)),
            ConditionNode::Or(nodes) => nodes.iter().any(|n| n.eval(memo)),
            ConditionNode::Quantifier { required, targets } => match required {
                // all of: vacuously true over zero targets
                None => targets.iter().all(|idx| memo.result(*idx)),
                Some(n) => {
                    let mut count = 0;
                    for idx in targets {
                        if memo.result(*idx) {
                            count += 1;
                            if count >= *n {
                                return true;
                            }
                        }
                    }
                    count >= *n
                }
            },
        }
    }

    fn collect_references(&self, out: &mut Vec<bool>) {
        match self {
            ConditionNode::Selection(idx) => out[*idx] = true,
            ConditionNode::Not(inner) => inner.collect_references(out),
            ConditionNode::And(nodes) | ConditionNode::Or(nodes) => {
                for node in nodes {
                    node.collect_references(out);
                }
            }
            ConditionNode::Quantifier { targets, .. } => {
                for idx in targets {
                    out[*idx] = true;
                }
            }
        }
    }
}

/// An immutable compiled condition for one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCondition {
    root: ConditionNode,
    referenced: Vec<bool>,
}

impl CompiledCondition {
    /// Wrap a parsed expression tree over `selection_count` selections
    pub fn new(root: ConditionNode, selection_count: usize) -> Self {
        let mut referenced = vec![false; selection_count];
        root.collect_references(&mut referenced);
        Self { root, referenced }
    }

    /// Evaluate against memoized selection results for one event
    pub fn evaluate(&self, memo: &mut SelectionMemo<'_>) -> bool {
        self.root.eval(memo)
    }

    /// Whether the condition references the selection at `idx`
    ///
    /// Used for dead-selection analysis during validation.
    pub fn references(&self, idx: usize) -> bool {
        self.referenced.get(idx).copied().unwrap_or(false)
    }

    /// The expression tree root
    pub fn root(&self) -> &ConditionNode {
        &self.root
    }
}

/// Per-event memo of selection match results
///
/// Each selection is evaluated against the event at most once, no
/// matter how many branches of the condition reference it.
pub struct SelectionMemo<'a> {
    selections: &'a [Selection],
    event: &'a Event,
    results: Vec<Option<bool>>,
}

impl<'a> SelectionMemo<'a> {
    /// Create a memo for one (rule, event) evaluation
    pub fn new(selections: &'a [Selection], event: &'a Event) -> Self {
        Self {
            selections,
            event,
            results: vec![None; selections.len()],
        }
    }

    /// Result for the selection at `idx`, computing it on first use
    pub fn result(&mut self, idx: usize) -> bool {
        match self.results.get(idx) {
            Some(Some(cached)) => *cached,
            Some(None) => {
                let matched = self.selections[idx].matches(self.event);
                self.results[idx] = Some(matched);
                matched
            }
            // Out-of-range indices cannot be produced by the compiler
            None => false,
        }
    }

    /// Indices of selections that were evaluated and matched
    pub fn matched_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, r)| **r == Some(true))
            .map(|(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixtures() -> (Vec<Selection>, Event) {
        let selections = vec![
            Selection::from_value("s0", &json!({ "A": "x" })).unwrap(),
            Selection::from_value("s1", &json!({ "B": "y" })).unwrap(),
            Selection::from_value("s2", &json!({ "C": "z" })).unwrap(),
        ];
        // Matches s0 and s1, not s2
        let event = Event::new(json!({ "A": "x", "B": "y", "C": "other" }));
        (selections, event)
    }

    #[test]
    fn test_boolean_operators() {
        let (selections, event) = fixtures();
        let mut memo = SelectionMemo::new(&selections, &event);

        let node = ConditionNode::And(vec![
            ConditionNode::Selection(0),
            ConditionNode::Not(Box::new(ConditionNode::Selection(2))),
        ]);
        assert!(node.eval(&mut memo));

        let node = ConditionNode::Or(vec![
            ConditionNode::Selection(2),
            ConditionNode::Selection(1),
        ]);
        assert!(node.eval(&mut memo));

        let node = ConditionNode::And(vec![
            ConditionNode::Selection(0),
            ConditionNode::Selection(2),
        ]);
        assert!(!node.eval(&mut memo));
    }

    #[test]
    fn test_quantifier_at_least_n() {
        let (selections, event) = fixtures();
        let mut memo = SelectionMemo::new(&selections, &event);

        let two_of = ConditionNode::Quantifier {
            required: Some(2),
            targets: vec![0, 1, 2],
        };
        assert!(two_of.eval(&mut memo));

        let three_of = ConditionNode::Quantifier {
            required: Some(3),
            targets: vec![0, 1, 2],
        };
        assert!(!three_of.eval(&mut memo));
    }

    #[test]
    fn test_quantifier_all() {
        let (selections, event) = fixtures();
        let mut memo = SelectionMemo::new(&selections, &event);

        let all_matching = ConditionNode::Quantifier {
            required: None,
            targets: vec![0, 1],
        };
        assert!(all_matching.eval(&mut memo));

        let all_including_miss = ConditionNode::Quantifier {
            required: None,
            targets: vec![0, 1, 2],
        };
        assert!(!all_including_miss.eval(&mut memo));
    }

    #[test]
    fn test_vacuous_quantifiers() {
        let selections: Vec<Selection> = Vec::new();
        let event = Event::new(json!({}));
        let mut memo = SelectionMemo::new(&selections, &event);

        let all_of_none = ConditionNode::Quantifier {
            required: None,
            targets: vec![],
        };
        assert!(all_of_none.eval(&mut memo));

        let one_of_none = ConditionNode::Quantifier {
            required: Some(1),
            targets: vec![],
        };
        assert!(!one_of_none.eval(&mut memo));
    }

    #[test]
    fn test_memoization_evaluates_once() {
        let (selections, event) = fixtures();
        let mut memo = SelectionMemo::new(&selections, &event);

        let node = ConditionNode::Or(vec![
            ConditionNode::And(vec![
                ConditionNode::Selection(0),
                ConditionNode::Selection(2),
            ]),
            ConditionNode::Selection(0),
        ]);
        assert!(node.eval(&mut memo));
        let matched: Vec<usize> = memo.matched_indices().collect();
        assert_eq!(matched, vec![0]);
    }

    #[test]
    fn test_reference_tracking() {
        let node = ConditionNode::And(vec![
            ConditionNode::Selection(0),
            ConditionNode::Quantifier {
                required: Some(1),
                targets: vec![2],
            },
        ]);
        let compiled = CompiledCondition::new(node, 3);
        assert!(compiled.references(0));
        assert!(!compiled.references(1));
        assert!(compiled.references(2));
    }
}
