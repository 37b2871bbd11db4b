//! Solve results.

use serde::{Deserialize, Serialize};

use super::variables::{BoolVar, IntVar};

/// Terminal status of a solve call.
///
/// `Unknown` means the time budget expired before either a solution or an
/// infeasibility proof was found; the relaxation loop treats it the same as
/// `Infeasible` (the distinction stays observable here for callers that
/// need it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Best solution found and proven optimal (or search space exhausted).
    Optimal,
    /// A solution was found but optimality was not proven in budget.
    Feasible,
    /// Proven infeasible.
    Infeasible,
    /// Time budget expired with no solution and no proof.
    Unknown,
}

impl SolveStatus {
    /// Whether a solution is available to read values from.
    #[inline]
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

/// Result of solving a [`super::CpModel`].
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Terminal status.
    pub status: SolveStatus,
    /// Objective value of the best solution, if the model had an objective
    /// and a solution was found.
    pub objective: Option<i64>,
    /// Wall-clock time spent solving, in milliseconds.
    pub wall_ms: u64,
    /// Number of branch decisions taken.
    pub branches: u64,
    /// Number of conflicts (failed subtrees).
    pub conflicts: u64,
    /// Number of restarts performed.
    pub restarts: u64,
    pub(crate) values: Vec<i64>,
}

impl CpSolution {
    pub(crate) fn empty(status: SolveStatus) -> Self {
        Self {
            status,
            objective: None,
            wall_ms: 0,
            branches: 0,
            conflicts: 0,
            restarts: 0,
            values: Vec::new(),
        }
    }

    /// Whether a solution was found.
    #[inline]
    pub fn has_solution(&self) -> bool {
        self.status.has_solution()
    }

    /// Solved value of an integer variable.
    ///
    /// # Panics
    /// Panics if no solution was found; guard with [`Self::has_solution`].
    pub fn value(&self, v: IntVar) -> i64 {
        self.values[v.index()]
    }

    /// Solved value of a boolean variable.
    ///
    /// # Panics
    /// Panics if no solution was found; guard with [`Self::has_solution`].
    pub fn bool_value(&self, v: BoolVar) -> bool {
        self.values[v.index()] != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_has_solution() {
        assert!(SolveStatus::Optimal.has_solution());
        assert!(SolveStatus::Feasible.has_solution());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert!(!SolveStatus::Unknown.has_solution());
    }

    #[test]
    fn test_value_readback() {
        let mut s = CpSolution::empty(SolveStatus::Feasible);
        s.values = vec![4, 1];
        assert_eq!(s.value(IntVar(0)), 4);
        assert!(s.bool_value(BoolVar(1)));
    }
}
