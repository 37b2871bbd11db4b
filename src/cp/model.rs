//! Declarative CP model.
//!
//! A [`CpModel`] accumulates integer variables and constraints; it is never
//! solved incrementally and constraints cannot be removed once added; a
//! caller that needs a different constraint set rebuilds from scratch.
//!
//! The constraint vocabulary mirrors the usual CP-SAT primitives: linear
//! relations (optionally half-reified with [`ConstraintRef::only_enforce_if`]),
//! multiplication and division equalities, table membership
//! (`add_allowed_assignments`), and boolean disjunctions.

use thiserror::Error;

use super::variables::{BoolVar, IntVar, LinearExpr, Lit};

/// Errors raised while building a model.
///
/// These are structural programming/input errors; solve-time infeasibility
/// is a status, not an error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A division was posted whose divisor domain admits zero or negatives.
    #[error("division divisor domain [{lo}, {hi}] must be strictly positive")]
    NonPositiveDivisor {
        /// Divisor domain lower bound.
        lo: i64,
        /// Divisor domain upper bound.
        hi: i64,
    },
    /// A table constraint tuple has the wrong arity.
    #[error("table tuple arity {got} does not match {expected} variables")]
    TupleArity {
        /// Expected arity (number of variables).
        expected: usize,
        /// Actual tuple length.
        got: usize,
    },
    /// A table constraint was posted with no tuples.
    #[error("table constraint over {vars} variables has no allowed tuples")]
    EmptyTable {
        /// Number of variables in the scope.
        vars: usize,
    },
    /// A stage precondition does not hold for the given parameters.
    #[error("model precondition violated: {0}")]
    Precondition(String),
}

/// Optimization sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// Minimize the objective expression.
    Minimize,
    /// Maximize the objective expression.
    Maximize,
}

#[derive(Debug, Clone)]
pub(crate) struct VarData {
    pub(crate) lo: i64,
    pub(crate) hi: i64,
    #[allow(dead_code)]
    pub(crate) name: String,
}

#[derive(Debug, Clone)]
pub(crate) enum ConstraintKind {
    /// `lo <= expr <= hi`.
    Linear { expr: LinearExpr, lo: i64, hi: i64 },
    /// `expr != 0`.
    NotEqual { expr: LinearExpr },
    /// `target == a * b`.
    Mul {
        target: IntVar,
        a: IntVar,
        b: IntVar,
    },
    /// `target == num / den`, truncating division, `den >= 1` by construction.
    Div {
        target: IntVar,
        num: IntVar,
        den: IntVar,
    },
    /// The variable tuple must equal one of the allowed rows.
    Table {
        vars: Vec<IntVar>,
        tuples: Vec<Vec<i64>>,
    },
    /// At least one literal is true.
    BoolOr { lits: Vec<Lit> },
}

#[derive(Debug, Clone)]
pub(crate) struct Constraint {
    pub(crate) kind: ConstraintKind,
    /// Enforcement literals: the constraint applies only when all are true.
    pub(crate) enforce: Vec<Lit>,
}

/// Borrow of a freshly added constraint, used to attach enforcement literals.
pub struct ConstraintRef<'a> {
    model: &'a mut CpModel,
    index: usize,
}

impl ConstraintRef<'_> {
    /// Half-reifies the constraint: it is enforced only when every given
    /// literal is true. Full reification is expressed by posting the
    /// negated relation under the negated literal.
    pub fn only_enforce_if(self, lits: &[Lit]) -> Self {
        self.model.constraints[self.index]
            .enforce
            .extend_from_slice(lits);
        self
    }
}

/// A constraint-programming model under construction.
///
/// # Example
/// ```
/// use periodize::cp::{CpModel, CpSolver, LinearExpr, SolverConfig};
///
/// let mut model = CpModel::new("demo");
/// let x = model.new_int_var(0, 5, "x");
/// let y = model.new_int_var(0, 5, "y");
/// model.add_eq(LinearExpr::sum(&[x, y]), 7);
/// model.maximize(LinearExpr::from(x));
///
/// let solution = CpSolver::new().solve(&model, &SolverConfig::default());
/// assert!(solution.has_solution());
/// assert_eq!(solution.value(x), 5);
/// assert_eq!(solution.value(y), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CpModel {
    name: String,
    pub(crate) vars: Vec<VarData>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) objective: Option<(Sense, LinearExpr)>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            constraints: Vec::new(),
            objective: None,
        }
    }

    /// Model name (used in logs).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates an integer variable with domain `[lo, hi]`.
    ///
    /// An empty domain (`lo > hi`) is permitted and makes the model
    /// trivially infeasible; builders rely on validation having rejected
    /// malformed catalogs before this point.
    pub fn new_int_var(&mut self, lo: i64, hi: i64, name: impl Into<String>) -> IntVar {
        self.vars.push(VarData {
            lo,
            hi,
            name: name.into(),
        });
        IntVar(self.vars.len() - 1)
    }

    /// Creates a boolean variable (integer domain `[0, 1]`).
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        let v = self.new_int_var(0, 1, name);
        BoolVar(v.0)
    }

    /// Creates a variable fixed to `value`.
    pub fn new_constant(&mut self, value: i64) -> IntVar {
        self.new_int_var(value, value, format!("const_{value}"))
    }

    /// Current lower bound of a variable.
    pub fn lb(&self, v: IntVar) -> i64 {
        self.vars[v.0].lo
    }

    /// Current upper bound of a variable.
    pub fn ub(&self, v: IntVar) -> i64 {
        self.vars[v.0].hi
    }

    /// Number of variables.
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    fn push(&mut self, kind: ConstraintKind) -> ConstraintRef<'_> {
        self.constraints.push(Constraint {
            kind,
            enforce: Vec::new(),
        });
        let index = self.constraints.len() - 1;
        ConstraintRef { model: self, index }
    }

    /// Posts `lo <= expr <= hi`.
    pub fn add_linear(
        &mut self,
        expr: impl Into<LinearExpr>,
        lo: i64,
        hi: i64,
    ) -> ConstraintRef<'_> {
        self.push(ConstraintKind::Linear {
            expr: expr.into(),
            lo,
            hi,
        })
    }

    /// Posts `left == right`.
    pub fn add_eq(
        &mut self,
        left: impl Into<LinearExpr>,
        right: impl Into<LinearExpr>,
    ) -> ConstraintRef<'_> {
        let expr = left.into().minus(right.into());
        self.push(ConstraintKind::Linear {
            expr,
            lo: 0,
            hi: 0,
        })
    }

    /// Posts `left <= right`.
    pub fn add_le(
        &mut self,
        left: impl Into<LinearExpr>,
        right: impl Into<LinearExpr>,
    ) -> ConstraintRef<'_> {
        let expr = left.into().minus(right.into());
        self.push(ConstraintKind::Linear {
            expr,
            lo: i64::MIN,
            hi: 0,
        })
    }

    /// Posts `left >= right`.
    pub fn add_ge(
        &mut self,
        left: impl Into<LinearExpr>,
        right: impl Into<LinearExpr>,
    ) -> ConstraintRef<'_> {
        let expr = left.into().minus(right.into());
        self.push(ConstraintKind::Linear {
            expr,
            lo: 0,
            hi: i64::MAX,
        })
    }

    /// Posts `left != right`.
    pub fn add_ne(
        &mut self,
        left: impl Into<LinearExpr>,
        right: impl Into<LinearExpr>,
    ) -> ConstraintRef<'_> {
        let expr = left.into().minus(right.into());
        self.push(ConstraintKind::NotEqual { expr })
    }

    /// Posts `at least one of lits`.
    pub fn add_bool_or(&mut self, lits: Vec<Lit>) -> ConstraintRef<'_> {
        self.push(ConstraintKind::BoolOr { lits })
    }

    /// Posts `a -> b` (`b` is true whenever `a` is).
    pub fn add_implication(&mut self, a: Lit, b: Lit) -> ConstraintRef<'_> {
        self.add_bool_or(vec![a.negated(), b])
    }

    /// Posts `target == a * b`.
    pub fn add_multiplication_equality(
        &mut self,
        target: IntVar,
        a: IntVar,
        b: IntVar,
    ) -> ConstraintRef<'_> {
        self.push(ConstraintKind::Mul { target, a, b })
    }

    /// Posts `target == num / den` (truncating integer division).
    ///
    /// The divisor's domain must be strictly positive; derived-quantity
    /// code guards every potentially-zero divisor before reaching this
    /// primitive (see [`crate::algebra::scaled_ratio`]).
    pub fn add_division_equality(
        &mut self,
        target: IntVar,
        num: IntVar,
        den: IntVar,
    ) -> Result<ConstraintRef<'_>, ModelError> {
        let (lo, hi) = (self.lb(den), self.ub(den));
        if lo < 1 {
            return Err(ModelError::NonPositiveDivisor { lo, hi });
        }
        Ok(self.push(ConstraintKind::Div { target, num, den }))
    }

    /// Posts a table constraint: the variable tuple must equal one of the
    /// allowed rows.
    pub fn add_allowed_assignments(
        &mut self,
        vars: Vec<IntVar>,
        tuples: Vec<Vec<i64>>,
    ) -> Result<ConstraintRef<'_>, ModelError> {
        if tuples.is_empty() {
            return Err(ModelError::EmptyTable { vars: vars.len() });
        }
        for t in &tuples {
            if t.len() != vars.len() {
                return Err(ModelError::TupleArity {
                    expected: vars.len(),
                    got: t.len(),
                });
            }
        }
        Ok(self.push(ConstraintKind::Table { vars, tuples }))
    }

    /// Sets a minimization objective, replacing any previous one.
    pub fn minimize(&mut self, expr: impl Into<LinearExpr>) {
        self.objective = Some((Sense::Minimize, expr.into()));
    }

    /// Sets a maximization objective, replacing any previous one.
    pub fn maximize(&mut self, expr: impl Into<LinearExpr>) {
        self.objective = Some((Sense::Maximize, expr.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_creation() {
        let mut m = CpModel::new("t");
        let x = m.new_int_var(2, 9, "x");
        let b = m.new_bool_var("b");
        let c = m.new_constant(7);
        assert_eq!((m.lb(x), m.ub(x)), (2, 9));
        assert_eq!((m.lb(b.as_int()), m.ub(b.as_int())), (0, 1));
        assert_eq!((m.lb(c), m.ub(c)), (7, 7));
        assert_eq!(m.var_count(), 3);
    }

    #[test]
    fn test_only_enforce_if_records_literals() {
        let mut m = CpModel::new("t");
        let x = m.new_int_var(0, 5, "x");
        let b = m.new_bool_var("b");
        m.add_eq(x, 3).only_enforce_if(&[b.lit()]);
        assert_eq!(m.constraints[0].enforce, vec![b.lit()]);
    }

    #[test]
    fn test_division_requires_positive_divisor() {
        let mut m = CpModel::new("t");
        let t = m.new_int_var(0, 10, "t");
        let n = m.new_int_var(0, 10, "n");
        let d = m.new_int_var(0, 10, "d");
        let err = m.add_division_equality(t, n, d).err().unwrap();
        assert_eq!(err, ModelError::NonPositiveDivisor { lo: 0, hi: 10 });

        let safe = m.new_int_var(1, 10, "safe");
        assert!(m.add_division_equality(t, n, safe).is_ok());
    }

    #[test]
    fn test_table_arity_checked() {
        let mut m = CpModel::new("t");
        let x = m.new_int_var(0, 5, "x");
        let y = m.new_int_var(0, 5, "y");
        let err = m
            .add_allowed_assignments(vec![x, y], vec![vec![1]])
            .err()
            .unwrap();
        assert_eq!(
            err,
            ModelError::TupleArity {
                expected: 2,
                got: 1
            }
        );
        assert!(m
            .add_allowed_assignments(vec![x, y], vec![vec![1, 2], vec![3, 4]])
            .is_ok());
    }

    #[test]
    fn test_empty_table_rejected() {
        let mut m = CpModel::new("t");
        let x = m.new_int_var(0, 5, "x");
        let err = m.add_allowed_assignments(vec![x], vec![]).err().unwrap();
        assert_eq!(err, ModelError::EmptyTable { vars: 1 });
    }
}
