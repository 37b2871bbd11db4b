//! Phase-component model.
//!
//! A phase-component is a (training-category x bodypart) pairing ("core
//! stabilization", "chest resistance") assigned to day/slot pairs within
//! a microcycle, and later given concrete exercise shape (seconds, reps,
//! sets, rest, intensity) by the exercise scheduler. All ranges are
//! integer and inclusive; intensity is in percent of one-rep max.

use serde::{Deserialize, Serialize};

/// A phase-component available for workout-slot assignment.
///
/// Index 0 of the catalog is the inactive sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseComponent {
    /// Catalog id; 0 is reserved for the inactive sentinel.
    pub id: i64,
    /// Human-readable name.
    pub name: String,
    /// Bodypart this component trains (0 for bodypart-neutral components).
    pub bodypart_id: i64,
    /// Admissible per-slot duration, in seconds.
    pub duration_min: i64,
    pub duration_max: i64,
    /// Admissible seconds of work per rep.
    pub seconds_per_exercise_min: i64,
    pub seconds_per_exercise_max: i64,
    /// Admissible rep range.
    pub reps_min: i64,
    pub reps_max: i64,
    /// Admissible set range.
    pub sets_min: i64,
    pub sets_max: i64,
    /// Admissible rest range, in rest units (5-second increments).
    pub rest_min: i64,
    pub rest_max: i64,
    /// Admissible intensity range, percent of one-rep max.
    pub intensity_min: i64,
    pub intensity_max: i64,
    /// How many exercises of this component one bodypart workout may hold.
    pub exercises_per_bodypart_workout_min: i64,
    pub exercises_per_bodypart_workout_max: i64,
    /// Occurrences per microcycle, when declared. Absent bounds impose no
    /// constraint.
    pub frequency_per_microcycle_min: Option<i64>,
    pub frequency_per_microcycle_max: Option<i64>,
    /// Must appear on every active workout day.
    pub required_every_workout: bool,
    /// Must appear at least once somewhere in the microcycle.
    pub required_within_microcycle: bool,
    /// Sibling resistance components sharing a group id train in equal
    /// counts.
    pub sibling_group: Option<i64>,
}

impl PhaseComponent {
    /// Creates a component with empty ranges and no flags set.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            bodypart_id: 0,
            duration_min: 0,
            duration_max: 0,
            seconds_per_exercise_min: 0,
            seconds_per_exercise_max: 0,
            reps_min: 0,
            reps_max: 0,
            sets_min: 0,
            sets_max: 0,
            rest_min: 0,
            rest_max: 0,
            intensity_min: 0,
            intensity_max: 0,
            exercises_per_bodypart_workout_min: 0,
            exercises_per_bodypart_workout_max: 0,
            frequency_per_microcycle_min: None,
            frequency_per_microcycle_max: None,
            required_every_workout: false,
            required_within_microcycle: false,
            sibling_group: None,
        }
    }

    /// The inactive sentinel occupying catalog index 0.
    pub fn sentinel() -> Self {
        Self::new(0, "inactive")
    }

    /// Sets the trained bodypart.
    pub fn with_bodypart(mut self, bodypart_id: i64) -> Self {
        self.bodypart_id = bodypart_id;
        self
    }

    /// Sets the admissible per-slot duration range in seconds.
    pub fn with_duration(mut self, min: i64, max: i64) -> Self {
        self.duration_min = min;
        self.duration_max = max;
        self
    }

    /// Sets the admissible seconds-per-rep range.
    pub fn with_seconds_per_exercise(mut self, min: i64, max: i64) -> Self {
        self.seconds_per_exercise_min = min;
        self.seconds_per_exercise_max = max;
        self
    }

    /// Sets the admissible rep range.
    pub fn with_reps(mut self, min: i64, max: i64) -> Self {
        self.reps_min = min;
        self.reps_max = max;
        self
    }

    /// Sets the admissible set range.
    pub fn with_sets(mut self, min: i64, max: i64) -> Self {
        self.sets_min = min;
        self.sets_max = max;
        self
    }

    /// Sets the admissible rest range in 5-second units.
    pub fn with_rest(mut self, min: i64, max: i64) -> Self {
        self.rest_min = min;
        self.rest_max = max;
        self
    }

    /// Sets the admissible intensity range in percent of one-rep max.
    pub fn with_intensity(mut self, min: i64, max: i64) -> Self {
        self.intensity_min = min;
        self.intensity_max = max;
        self
    }

    /// Sets how many exercises of this component a bodypart workout holds.
    pub fn with_exercises_per_bodypart_workout(mut self, min: i64, max: i64) -> Self {
        self.exercises_per_bodypart_workout_min = min;
        self.exercises_per_bodypart_workout_max = max;
        self
    }

    /// Declares a per-microcycle frequency window.
    pub fn with_frequency_per_microcycle(mut self, min: i64, max: i64) -> Self {
        self.frequency_per_microcycle_min = Some(min);
        self.frequency_per_microcycle_max = Some(max);
        self
    }

    /// Requires this component on every active workout day.
    pub fn required_every_workout(mut self) -> Self {
        self.required_every_workout = true;
        self
    }

    /// Requires this component at least once per microcycle.
    pub fn required_within_microcycle(mut self) -> Self {
        self.required_within_microcycle = true;
        self
    }

    /// Assigns this component to a sibling resistance group.
    pub fn with_sibling_group(mut self, group: i64) -> Self {
        self.sibling_group = Some(group);
        self
    }
}
