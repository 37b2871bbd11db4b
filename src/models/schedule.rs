//! Solved schedule shapes.
//!
//! Result extraction reads solver values back into these records once per
//! successful solve; they are immutable afterwards and consumed by output
//! formatting and persistence. `OutputRow` field names are part of the
//! downstream persistence contract and must not be renamed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cp::SolveStatus;

/// One mesocycle slot in a solved phase schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseSlot {
    /// 0-based mesocycle slot index.
    pub slot: usize,
    /// Selected phase id; 0 for an inactive slot.
    pub phase_id: i64,
    /// Selected phase name.
    pub name: String,
    /// Solved stay length in weeks; 0 for an inactive slot.
    pub duration_weeks: i64,
}

/// A solved macrocycle: one phase per active mesocycle slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseSchedule {
    pub slots: Vec<PhaseSlot>,
    /// Sum of active slot durations, in weeks.
    pub total_weeks: i64,
    /// Weeks spent in goal-flagged phases.
    pub goal_weeks: i64,
}

/// One phase-component slot on one workout day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSlot {
    /// 0-based day index within the microcycle.
    pub day: usize,
    /// 0-based slot index within the day.
    pub slot: usize,
    /// Selected phase-component id; 0 for an inactive slot.
    pub phase_component_id: i64,
    /// Bodypart of the selected component.
    pub bodypart_id: i64,
    /// Solved slot duration in seconds.
    pub duration: i64,
}

/// One workout day in a solved microcycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPlan {
    /// 0-based day index.
    pub day: usize,
    /// Whether any training lands on this day.
    pub active_workday: bool,
    /// The day's component slots in order.
    pub slots: Vec<ComponentSlot>,
}

/// A solved microcycle: phase-components placed on day/slot pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSchedule {
    pub days: Vec<DayPlan>,
    /// Total scheduled duration across the microcycle, in seconds.
    pub total_duration: i64,
    /// Max minus min active-day duration, in seconds.
    pub duration_spread: i64,
}

/// One persistence-ready row of a solved exercise schedule.
///
/// Field names are the downstream contract; serde serializes them as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRow {
    /// 0-based slot index.
    pub slot: usize,
    pub phase_component_id: i64,
    pub bodypart_id: i64,
    /// Selected exercise id; 0 when only the shape pass has run.
    pub exercise_id: i64,
    pub reps_var: i64,
    pub sets_var: i64,
    pub intensity_var: i64,
    pub rest_var: i64,
    /// Solved load in centi-units; 0 for unweighted selections.
    pub training_weight: i64,
    /// Solved seconds of work per rep.
    pub seconds_per_exercise: i64,
    /// Solved slot duration in seconds.
    pub duration: i64,
}

/// A solved exercise schedule: shape (and, after pass 2, identity) per
/// phase-component slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSchedule {
    pub rows: Vec<OutputRow>,
    /// Total scheduled duration in seconds.
    pub total_duration: i64,
    /// Working-effort over base-effort, centi-scaled.
    pub strain_ratio: i64,
}

/// The full solution record a scheduling run returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Final solver status of the last attempt.
    pub status: SolveStatus,
    /// Present when the phase stage solved.
    pub phase_schedule: Option<PhaseSchedule>,
    /// Present when the phase-component stage solved.
    pub component_schedule: Option<ComponentSchedule>,
    /// Present when the exercise stage solved.
    pub exercise_schedule: Option<ExerciseSchedule>,
    /// Aggregate metrics of the last feasible attempt.
    pub metrics: BTreeMap<String, i64>,
}

impl Solution {
    /// An empty solution with the given status and nothing solved.
    pub fn empty(status: SolveStatus) -> Self {
        Self {
            status,
            phase_schedule: None,
            component_schedule: None,
            exercise_schedule: None,
            metrics: BTreeMap::new(),
        }
    }

    /// Flattened persistence projection: one row per active exercise slot.
    pub fn output(&self) -> Vec<OutputRow> {
        self.exercise_schedule
            .as_ref()
            .map(|s| {
                s.rows
                    .iter()
                    .filter(|r| r.phase_component_id != 0)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
