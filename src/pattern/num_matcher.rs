//! Numeric pattern matching implementations

use crate::pattern::traits::NumMatcher;

/// Pattern for exact numeric matching
///
/// Integers and floats compare on a common f64 axis so `1` and `1.0`
/// are equal, matching the loose typing of the rule format.
#[derive(Debug, Clone)]
pub struct NumPattern {
    value: f64,
}

impl NumPattern {
    /// Create an equality pattern
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl NumMatcher for NumPattern {
    fn num_match(&self, value: f64) -> bool {
        self.value == value
    }
}

/// Comparison operator for ordered numeric matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// Strictly greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Strictly less than
    Lt,
    /// Less than or equal
    Lte,
}

/// Pattern for ordered numeric comparison against a bound
#[derive(Debug, Clone)]
pub struct CmpPattern {
    op: CmpOp,
    bound: f64,
}

impl CmpPattern {
    /// Create a comparison pattern
    pub fn new(op: CmpOp, bound: f64) -> Self {
        Self { op, bound }
    }
}

impl NumMatcher for CmpPattern {
    fn num_match(&self, value: f64) -> bool {
        match self.op {
            CmpOp::Gt => value > self.bound,
            CmpOp::Gte => value >= self.bound,
            CmpOp::Lt => value < self.bound,
            CmpOp::Lte => value <= self.bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_pattern() {
        let pattern = NumPattern::new(42.0);
        assert!(pattern.num_match(42.0));
        assert!(!pattern.num_match(41.0));
    }

    #[test]
    fn test_cmp_pattern() {
        let gt = CmpPattern::new(CmpOp::Gt, 10.0);
        assert!(gt.num_match(11.0));
        assert!(!gt.num_match(10.0));

        let gte = CmpPattern::new(CmpOp::Gte, 10.0);
        assert!(gte.num_match(10.0));
        assert!(!gte.num_match(9.9));

        let lt = CmpPattern::new(CmpOp::Lt, 0.0);
        assert!(lt.num_match(-1.0));
        assert!(!lt.num_match(0.0));

        let lte = CmpPattern::new(CmpOp::Lte, 0.0);
        assert!(lte.num_match(0.0));
        assert!(!lte.num_match(0.1));
    }
}
