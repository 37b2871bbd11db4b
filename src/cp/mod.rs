//! Integer constraint-programming engine.
//!
//! The scheduling stages build [`CpModel`]s out of bounded integer and
//! boolean variables, solve them with [`CpSolver`], and read values back
//! from [`CpSolution`]. The engine is integer-only: ratios are pre-scaled
//! (×100) before division and decoded to fractional display values only
//! after solving.
//!
//! Models are declarative and write-once; a constraint, once added, is
//! never removed. The relaxation loop therefore rebuilds a fresh model for
//! every attempt instead of mutating a solved one.
//!
//! # Reference
//! - Rossi, van Beek, Walsh (2006), "Handbook of Constraint Programming"

mod model;
mod solution;
mod solver;
mod variables;

pub use model::{ConstraintRef, CpModel, ModelError, Sense};
pub use solution::{CpSolution, SolveStatus};
pub use solver::{CpSolver, SolverConfig};
pub use variables::{BoolVar, IntVar, LinearExpr, Lit};
