//! Scheduling stage models.
//!
//! Each stage (phase, phase-component, exercise shape, exercise
//! assignment) is a [`StageModel`]: a builder that turns catalogs plus a
//! constraint activation map into one or more solver-ready model forms,
//! and knows how to read a solution back out. The relaxation loop in
//! [`crate::relax`] drives any stage through the shared
//! setup → build → solve → analyze state machine.
//!
//! Stages may emit multiple [`BuiltForm`]s per build: the primary form
//! first, then fallback forms with easier-to-search objective
//! formulations. The loop solves them in order and takes the first with a
//! solution.

mod exercise;
mod phase;
mod phase_component;

pub use exercise::{ExerciseAssignmentStage, ExerciseShapeStage, ShapeSlot};
pub use phase::PhaseStage;
pub use phase_component::PhaseComponentStage;

use std::collections::BTreeMap;

use crate::constraints::{ConstraintSet, ConstraintSpec, NarrativeLog};
use crate::cp::{CpModel, CpSolution, ModelError};

/// Which objective formulation a built model carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelForm {
    /// The stage's preferred objective.
    Primary,
    /// Fallback: the same constraints with the aggregate-ratio objective
    /// split into per-slot divisions, cheaper to search.
    DividedStrain,
}

/// One solver-ready model plus the stage data needed to decode it.
#[derive(Debug)]
pub struct BuiltForm<B> {
    pub form: ModelForm,
    pub built: B,
}

/// A scheduling stage: build models from an activation map, decode
/// solutions, report metrics.
///
/// `build` must be deterministic: the same activation map and catalogs
/// always produce a model with the same feasibility outcome. Models are
/// never mutated across relaxation retries; each retry rebuilds from
/// scratch.
pub trait StageModel {
    /// Solver-ready model plus decode bookkeeping.
    type Built;
    /// Decoded stage output.
    type Solution;

    /// Stage name for logs and reports.
    fn name(&self) -> &'static str;

    /// The stage's togglable constraint groups with their defaults.
    fn constraint_catalog(&self) -> Vec<ConstraintSpec>;

    /// Builds the stage's model forms for the given activation map,
    /// primary form first.
    fn build(
        &self,
        constraints: &ConstraintSet,
        narrative: &mut NarrativeLog,
    ) -> Result<Vec<BuiltForm<Self::Built>>, ModelError>;

    /// The solver model inside a built form.
    fn model<'a>(&self, built: &'a Self::Built) -> &'a CpModel;

    /// Reads solver values back into the stage's output shape. Only
    /// called when the solution has a feasible assignment.
    fn extract(&self, built: &Self::Built, solution: &CpSolution) -> Self::Solution;

    /// Aggregate metrics of a decoded solution, for attempt records and
    /// reports.
    fn metrics(&self, solution: &Self::Solution) -> BTreeMap<String, i64>;
}
