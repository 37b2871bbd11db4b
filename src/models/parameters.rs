//! Scheduling parameters: the catalogs and scalar bounds one run consumes.
//!
//! Parameters are read-only inputs to a solve. The pipeline owns one
//! [`Parameters`] value per request and threads it through the stages; it
//! never mutates during solving.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Exercise, Phase, PhaseComponent};

/// Catalogs and scalar bounds for one scheduling request.
///
/// Every catalog must carry its inactive sentinel at index 0; see
/// [`crate::validation::validate`] for the structural checks run before
/// any model is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameters {
    /// Phase catalog, sentinel first.
    pub phases: Vec<Phase>,
    /// Phase-component catalog, sentinel first.
    pub phase_components: Vec<PhaseComponent>,
    /// Exercise catalog, sentinel first.
    pub exercises: Vec<Exercise>,
    /// Macrocycle length ceiling, in weeks.
    pub macrocycle_allowed_weeks: i64,
    /// Upper bound on mesocycle slots the phase scheduler may fill.
    pub max_mesocycles: usize,
    /// "No more than N phases without the recovery phase" window size.
    pub recovery_window: usize,
    /// Per-day training availability across the microcycle, in seconds.
    /// The vector length is the microcycle length in days.
    pub availability: Vec<i64>,
    /// Phase-component slots per workout day.
    pub slots_per_day: usize,
    /// Target workout length, in seconds.
    pub workout_length: i64,
    /// Projected per-slot base duration for strain ratios, in seconds.
    pub projected_duration: i64,
    /// Discrete loads physically available to the user, centi-scaled.
    pub available_weights: Vec<i64>,
    /// Last recorded performance per exercise category, for the
    /// progressive-overload constraint.
    pub last_recorded: BTreeMap<i64, i64>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            phases: vec![Phase::sentinel()],
            phase_components: vec![PhaseComponent::sentinel()],
            exercises: vec![Exercise::sentinel()],
            macrocycle_allowed_weeks: 0,
            max_mesocycles: 0,
            recovery_window: 0,
            availability: Vec::new(),
            slots_per_day: 0,
            workout_length: 0,
            projected_duration: 0,
            available_weights: Vec::new(),
            last_recorded: BTreeMap::new(),
        }
    }
}

impl Parameters {
    /// Empty parameters carrying only the catalog sentinels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a phase to the catalog.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    /// Appends a phase-component to the catalog.
    pub fn with_phase_component(mut self, component: PhaseComponent) -> Self {
        self.phase_components.push(component);
        self
    }

    /// Appends an exercise to the catalog.
    pub fn with_exercise(mut self, exercise: Exercise) -> Self {
        self.exercises.push(exercise);
        self
    }

    /// Sets the macrocycle length ceiling in weeks.
    pub fn with_macrocycle_allowed_weeks(mut self, weeks: i64) -> Self {
        self.macrocycle_allowed_weeks = weeks;
        self
    }

    /// Sets the mesocycle slot count.
    pub fn with_max_mesocycles(mut self, slots: usize) -> Self {
        self.max_mesocycles = slots;
        self
    }

    /// Sets the recovery revisit window.
    pub fn with_recovery_window(mut self, window: usize) -> Self {
        self.recovery_window = window;
        self
    }

    /// Sets per-day availability in seconds; the length fixes the
    /// microcycle's day count.
    pub fn with_availability(mut self, availability: Vec<i64>) -> Self {
        self.availability = availability;
        self
    }

    /// Sets phase-component slots per day.
    pub fn with_slots_per_day(mut self, slots: usize) -> Self {
        self.slots_per_day = slots;
        self
    }

    /// Sets the target workout length in seconds.
    pub fn with_workout_length(mut self, seconds: i64) -> Self {
        self.workout_length = seconds;
        self
    }

    /// Sets the projected per-slot base duration in seconds.
    pub fn with_projected_duration(mut self, seconds: i64) -> Self {
        self.projected_duration = seconds;
        self
    }

    /// Sets the discrete available loads, centi-scaled.
    pub fn with_available_weights(mut self, weights: Vec<i64>) -> Self {
        self.available_weights = weights;
        self
    }

    /// Records the last performance for one exercise category.
    pub fn with_last_recorded(mut self, category_id: i64, performance: i64) -> Self {
        self.last_recorded.insert(category_id, performance);
        self
    }

    /// Number of days in the microcycle.
    pub fn microcycle_days(&self) -> usize {
        self.availability.len()
    }
}
