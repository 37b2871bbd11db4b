//! Exercise model.
//!
//! A concrete exercise ("goblet squat", "plank") bound to one or more
//! phase-components. Loads are centi-scaled: `one_rep_max` of 8000 means
//! 80.00 nominal units, so training weights stay integral after the
//! intensity multiplication.

use serde::{Deserialize, Serialize};

/// A concrete exercise available for slot assignment.
///
/// Index 0 of the catalog is the inactive sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    /// Catalog id; 0 is reserved for the inactive sentinel.
    pub id: i64,
    /// Human-readable name.
    pub name: String,
    /// Phase-components this exercise may serve.
    pub phase_component_ids: Vec<i64>,
    /// Bodypart this exercise trains.
    pub bodypart_id: i64,
    /// Progressive-overload category, keyed against last-recorded metrics.
    pub category_id: i64,
    /// Whether the exercise takes external load.
    pub weighted: bool,
    /// User's one-rep max in centi-units; 0 for unweighted exercises.
    pub one_rep_max: i64,
    /// Intrinsic strain contribution on the centered effort scale.
    pub base_strain: i64,
}

impl Exercise {
    /// Creates an unweighted exercise with no component bindings.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            phase_component_ids: Vec::new(),
            bodypart_id: 0,
            category_id: 0,
            weighted: false,
            one_rep_max: 0,
            base_strain: 0,
        }
    }

    /// The inactive sentinel occupying catalog index 0.
    pub fn sentinel() -> Self {
        Self::new(0, "inactive")
    }

    /// Binds the exercise to the given phase-components.
    pub fn with_phase_components(mut self, ids: Vec<i64>) -> Self {
        self.phase_component_ids = ids;
        self
    }

    /// Sets the trained bodypart.
    pub fn with_bodypart(mut self, bodypart_id: i64) -> Self {
        self.bodypart_id = bodypart_id;
        self
    }

    /// Sets the progressive-overload category.
    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = category_id;
        self
    }

    /// Marks the exercise weighted with the given centi-scaled one-rep max.
    pub fn weighted(mut self, one_rep_max: i64) -> Self {
        self.weighted = true;
        self.one_rep_max = one_rep_max;
        self
    }

    /// Sets the intrinsic strain contribution.
    pub fn with_base_strain(mut self, base_strain: i64) -> Self {
        self.base_strain = base_strain;
        self
    }

    /// Whether the exercise may serve the given phase-component.
    pub fn serves(&self, phase_component_id: i64) -> bool {
        self.phase_component_ids.contains(&phase_component_id)
    }
}
