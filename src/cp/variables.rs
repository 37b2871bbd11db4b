//! CP variable handles and linear expressions.
//!
//! Variables are lightweight, copyable indices into a [`super::CpModel`].
//! Booleans are integer variables with domain `[0, 1]`; a [`Lit`] is a
//! boolean variable with a polarity and is how constraints are reified.

use serde::{Deserialize, Serialize};

/// An integer decision variable with a bounded domain.
///
/// Handles are only meaningful for the model that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntVar(pub(crate) usize);

impl IntVar {
    /// Index of this variable within its model.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A boolean decision variable (an integer variable with domain `[0, 1]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoolVar(pub(crate) usize);

impl BoolVar {
    /// Index of the underlying integer variable.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    /// The positive literal: true when the variable solves to 1.
    #[inline]
    pub fn lit(self) -> Lit {
        Lit {
            var: self.0,
            positive: true,
        }
    }

    /// The negated literal: true when the variable solves to 0.
    #[inline]
    pub fn negated(self) -> Lit {
        Lit {
            var: self.0,
            positive: false,
        }
    }

    /// View as an integer variable (0 or 1), e.g. for counting sums.
    #[inline]
    pub fn as_int(self) -> IntVar {
        IntVar(self.0)
    }
}

/// A literal: a boolean variable with a polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lit {
    pub(crate) var: usize,
    pub(crate) positive: bool,
}

impl Lit {
    /// The opposite literal.
    #[inline]
    pub fn negated(self) -> Lit {
        Lit {
            var: self.var,
            positive: !self.positive,
        }
    }
}

/// An integer linear expression: `sum(coeff_i * var_i) + constant`.
///
/// Built incrementally with the chaining methods; most model-building code
/// creates these inline at the `add_*` call site.
///
/// # Example
/// ```
/// use periodize::cp::{CpModel, LinearExpr};
///
/// let mut model = CpModel::new("demo");
/// let x = model.new_int_var(0, 10, "x");
/// let y = model.new_int_var(0, 10, "y");
/// // 2x + 3y - 1
/// let expr = LinearExpr::new().term(x, 2).term(y, 3).offset(-1);
/// model.add_le(expr, 12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LinearExpr {
    pub(crate) terms: Vec<(i64, usize)>,
    pub(crate) constant: i64,
}

impl LinearExpr {
    /// An empty expression (constant 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `coeff * var`.
    pub fn term(mut self, var: IntVar, coeff: i64) -> Self {
        self.terms.push((coeff, var.0));
        self
    }

    /// Adds a constant offset.
    pub fn offset(mut self, constant: i64) -> Self {
        self.constant += constant;
        self
    }

    /// Sum of the given variables with coefficient 1.
    pub fn sum(vars: &[IntVar]) -> Self {
        Self {
            terms: vars.iter().map(|v| (1, v.0)).collect(),
            constant: 0,
        }
    }

    /// Sum of boolean variables, useful for counting.
    pub fn bool_sum(vars: &[BoolVar]) -> Self {
        Self {
            terms: vars.iter().map(|v| (1, v.0)).collect(),
            constant: 0,
        }
    }

    /// `self - other`, the form every comparison constraint reduces to.
    pub fn minus(mut self, other: LinearExpr) -> Self {
        for (c, v) in other.terms {
            self.terms.push((-c, v));
        }
        self.constant -= other.constant;
        self
    }
}

impl From<IntVar> for LinearExpr {
    fn from(v: IntVar) -> Self {
        LinearExpr::new().term(v, 1)
    }
}

impl From<BoolVar> for LinearExpr {
    fn from(v: BoolVar) -> Self {
        LinearExpr::new().term(v.as_int(), 1)
    }
}

impl From<i64> for LinearExpr {
    fn from(c: i64) -> Self {
        LinearExpr::new().offset(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_negation() {
        let b = BoolVar(3);
        let l = b.lit();
        assert!(l.positive);
        assert_eq!(l.negated().var, 3);
        assert!(!l.negated().positive);
        assert_eq!(l.negated().negated(), l);
    }

    #[test]
    fn test_expr_building() {
        let x = IntVar(0);
        let y = IntVar(1);
        let e = LinearExpr::new().term(x, 2).term(y, -1).offset(5);
        assert_eq!(e.terms, vec![(2, 0), (-1, 1)]);
        assert_eq!(e.constant, 5);
    }

    #[test]
    fn test_expr_minus() {
        let x = IntVar(0);
        let y = IntVar(1);
        let e = LinearExpr::from(x).minus(LinearExpr::new().term(y, 3).offset(2));
        assert_eq!(e.terms, vec![(1, 0), (-3, 1)]);
        assert_eq!(e.constant, -2);
    }

    #[test]
    fn test_bool_sum() {
        let bools = [BoolVar(0), BoolVar(1), BoolVar(2)];
        let e = LinearExpr::bool_sum(&bools);
        assert_eq!(e.terms.len(), 3);
        assert!(e.terms.iter().all(|&(c, _)| c == 1));
    }
}
