//! Constraint-programming scheduler for personalized training programs.
//!
//! Builds periodized fitness programs by solving a nested series of
//! integer constraint models: which training phase fills each mesocycle,
//! which phase-components land on which workout day, and which concrete
//! exercises with what sets, reps, rest, and load staff each slot. On
//! infeasibility, a relaxation advisor selectively disables constraint
//! groups and the affected stage re-solves from scratch.
//!
//! # Modules
//!
//! - **`cp`**: the integer-constraint model and solver (variables,
//!   reified constraints, DFS search with restarts)
//! - **`algebra`**: derived training quantities (duration, effort,
//!   strain, volume, density, performance) as constraint relations
//! - **`constraints`**: reusable constraint builders, the togglable
//!   activation map, and the applied/skipped narrative log
//! - **`models`**: catalogs, parameters, solved-schedule shapes,
//!   relaxation bookkeeping
//! - **`stages`**: the phase, phase-component, and two-pass exercise
//!   schedulers
//! - **`relax`**: the solve-and-relax loop and the advisor interface
//! - **`pipeline`**: the end-to-end run entry point
//! - **`validation`**: catalog integrity checks
//!
//! # Example
//!
//! ```no_run
//! use periodize::{pipeline, Parameters, RoundRobinAdvisor, SolverConfig};
//! use std::collections::BTreeMap;
//!
//! let params = Parameters::new();
//! let mut advisor = RoundRobinAdvisor::new();
//! let outcome = pipeline::run(
//!     &params,
//!     &BTreeMap::new(),
//!     &mut advisor,
//!     &SolverConfig::default(),
//! )?;
//! println!("{}", outcome.formatted);
//! # Ok::<(), periodize::ScheduleError>(())
//! ```

pub mod algebra;
pub mod constraints;
pub mod cp;
pub mod models;
pub mod pipeline;
pub mod relax;
pub mod stages;
pub mod validation;

use thiserror::Error;

pub use constraints::{ConstraintSet, ConstraintSpec, NarrativeLog};
pub use cp::{CpModel, CpSolution, CpSolver, ModelError, SolveStatus, SolverConfig};
pub use models::{Parameters, Solution};
pub use pipeline::Outcome;
pub use relax::{AdvisorContext, Relaxation, RelaxationAdvisor, RoundRobinAdvisor};
pub use stages::StageModel;
pub use validation::{ValidationError, ValidationErrorKind};

/// Errors a scheduling run can surface before or during model building.
///
/// Infeasibility is not an error: it flows through the relaxation loop
/// and, at worst, ends the run with an empty solution.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The parameter catalogs failed structural validation.
    #[error("malformed parameters: {0:?}")]
    Validation(Vec<ValidationError>),
    /// A stage refused to build its model.
    #[error("model build failed: {0}")]
    Model(#[from] ModelError),
}
