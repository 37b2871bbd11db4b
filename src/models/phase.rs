//! Training phase model.
//!
//! A phase is a macro-level training stage (stabilization endurance,
//! strength endurance, hypertrophy, ...) assigned to mesocycle slots over
//! a macrocycle. Durations are in whole weeks.

use serde::{Deserialize, Serialize};

/// A training phase available for mesocycle assignment.
///
/// Index 0 of the phase catalog is the inactive sentinel (see
/// [`Phase::sentinel`]); every real phase has `id >= 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    /// Catalog id; 0 is reserved for the inactive sentinel.
    pub id: i64,
    /// Human-readable name.
    pub name: String,
    /// Shortest admissible stay in this phase, in weeks.
    pub duration_min: i64,
    /// Longest admissible stay in this phase, in weeks.
    pub duration_max: i64,
    /// Whether the active goal requires this phase to appear at least once.
    pub required_phase: bool,
    /// Whether time in this phase counts toward the goal objective.
    pub goal_phase: bool,
    /// Whether this is the designated recovery phase for windowed revisits.
    pub recovery_phase: bool,
}

impl Phase {
    /// Creates a phase with zero-width duration and no flags set.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            duration_min: 0,
            duration_max: 0,
            required_phase: false,
            goal_phase: false,
            recovery_phase: false,
        }
    }

    /// The inactive sentinel occupying catalog index 0.
    pub fn sentinel() -> Self {
        Self::new(0, "inactive")
    }

    /// Sets the admissible duration range in weeks.
    pub fn with_duration(mut self, min: i64, max: i64) -> Self {
        self.duration_min = min;
        self.duration_max = max;
        self
    }

    /// Marks the phase as required for the active goal.
    pub fn required(mut self) -> Self {
        self.required_phase = true;
        self
    }

    /// Marks time in this phase as goal time for the objective.
    pub fn goal(mut self) -> Self {
        self.goal_phase = true;
        self
    }

    /// Marks this as the recovery phase anchoring windowed revisits.
    pub fn recovery(mut self) -> Self {
        self.recovery_phase = true;
        self
    }
}
