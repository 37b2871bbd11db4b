//! Input validation for scheduling parameters.
//!
//! Checks structural integrity of the catalogs before any model is built.
//! Detects:
//! - Missing or malformed inactive sentinels (index 0)
//! - Duplicate catalog IDs
//! - Inverted min/max ranges
//! - Exercises referencing unknown phase-components
//! - Weighted exercises with no admissible load
//!
//! A malformed catalog fails fast here rather than letting the solver
//! silently misbehave on nonsense bounds.

use std::collections::HashSet;

use crate::models::Parameters;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A catalog's index 0 is not the inactive sentinel.
    MissingSentinel,
    /// Two catalog entries share the same ID.
    DuplicateId,
    /// A declared range has min > max.
    InvertedRange,
    /// An exercise references a phase-component that doesn't exist.
    InvalidComponentReference,
    /// A weighted exercise has no admissible load to draw from.
    NoAdmissibleLoad,
    /// A scalar bound is out of its sensible domain.
    InvalidBound,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the parameters for a scheduling run.
///
/// Checks:
/// 1. Every catalog carries the id-0 sentinel at index 0
/// 2. No duplicate IDs within a catalog
/// 3. Every declared min/max pair satisfies min <= max
/// 4. Exercise phase-component references resolve
/// 5. Weighted exercises have a positive one-rep max and at least one
///    available weight to draw training weight from
/// 6. Scalar bounds are non-negative
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate(params: &Parameters) -> ValidationResult {
    let mut errors = Vec::new();

    check_sentinel(
        params.phases.first().map(|p| p.id),
        "phases",
        &mut errors,
    );
    check_sentinel(
        params.phase_components.first().map(|c| c.id),
        "phase_components",
        &mut errors,
    );
    check_sentinel(
        params.exercises.first().map(|e| e.id),
        "exercises",
        &mut errors,
    );

    check_duplicates(params.phases.iter().map(|p| p.id), "phase", &mut errors);
    check_duplicates(
        params.phase_components.iter().map(|c| c.id),
        "phase_component",
        &mut errors,
    );
    check_duplicates(
        params.exercises.iter().map(|e| e.id),
        "exercise",
        &mut errors,
    );

    for p in &params.phases {
        check_range(
            p.duration_min,
            p.duration_max,
            format!("phase {} duration", p.id),
            &mut errors,
        );
    }

    for c in &params.phase_components {
        let id = c.id;
        let ranges = [
            (c.duration_min, c.duration_max, "duration"),
            (
                c.seconds_per_exercise_min,
                c.seconds_per_exercise_max,
                "seconds_per_exercise",
            ),
            (c.reps_min, c.reps_max, "reps"),
            (c.sets_min, c.sets_max, "sets"),
            (c.rest_min, c.rest_max, "rest"),
            (c.intensity_min, c.intensity_max, "intensity"),
            (
                c.exercises_per_bodypart_workout_min,
                c.exercises_per_bodypart_workout_max,
                "exercises_per_bodypart_workout",
            ),
        ];
        for (min, max, what) in ranges {
            check_range(min, max, format!("phase_component {id} {what}"), &mut errors);
        }
        if let (Some(min), Some(max)) =
            (c.frequency_per_microcycle_min, c.frequency_per_microcycle_max)
        {
            check_range(
                min,
                max,
                format!("phase_component {id} frequency_per_microcycle"),
                &mut errors,
            );
        }
    }

    let component_ids: HashSet<i64> = params.phase_components.iter().map(|c| c.id).collect();
    for e in &params.exercises {
        for &cid in &e.phase_component_ids {
            if !component_ids.contains(&cid) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidComponentReference,
                    format!("exercise {} references unknown phase_component {cid}", e.id),
                ));
            }
        }
        if e.weighted {
            if e.one_rep_max <= 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NoAdmissibleLoad,
                    format!("weighted exercise {} has one_rep_max <= 0", e.id),
                ));
            }
            if params.available_weights.is_empty() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NoAdmissibleLoad,
                    format!(
                        "weighted exercise {} present but available_weights is empty",
                        e.id
                    ),
                ));
            }
        }
    }

    let scalars = [
        (params.macrocycle_allowed_weeks, "macrocycle_allowed_weeks"),
        (params.workout_length, "workout_length"),
        (params.projected_duration, "projected_duration"),
    ];
    for (value, what) in scalars {
        if value < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidBound,
                format!("{what} is negative: {value}"),
            ));
        }
    }
    for (day, &avail) in params.availability.iter().enumerate() {
        if avail < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidBound,
                format!("availability for day {day} is negative: {avail}"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_sentinel(first_id: Option<i64>, catalog: &str, errors: &mut Vec<ValidationError>) {
    if first_id != Some(0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::MissingSentinel,
            format!("catalog '{catalog}' must carry the id-0 sentinel at index 0"),
        ));
    }
}

fn check_duplicates(
    ids: impl Iterator<Item = i64>,
    what: &str,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {what} ID: {id}"),
            ));
        }
    }
}

fn check_range(min: i64, max: i64, what: String, errors: &mut Vec<ValidationError>) {
    if min > max {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvertedRange,
            format!("{what} range inverted: min {min} > max {max}"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, Phase, PhaseComponent, Parameters};

    fn sample_params() -> Parameters {
        Parameters::new()
            .with_phase(Phase::new(1, "stabilization endurance").with_duration(4, 6))
            .with_phase_component(
                PhaseComponent::new(1, "core stabilization")
                    .with_reps(12, 20)
                    .with_sets(1, 3),
            )
            .with_exercise(Exercise::new(1, "plank").with_phase_components(vec![1]))
            .with_macrocycle_allowed_weeks(43)
    }

    #[test]
    fn test_valid_params() {
        assert!(validate(&sample_params()).is_ok());
    }

    #[test]
    fn test_missing_sentinel() {
        let mut params = sample_params();
        params.phases.remove(0);
        let errors = validate(&params).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::MissingSentinel));
    }

    #[test]
    fn test_duplicate_id() {
        let params = sample_params().with_phase(Phase::new(1, "again"));
        let errors = validate(&params).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_inverted_range() {
        let params =
            sample_params().with_phase_component(PhaseComponent::new(2, "bad").with_reps(10, 5));
        let errors = validate(&params).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvertedRange));
    }

    #[test]
    fn test_unknown_component_reference() {
        let params =
            sample_params().with_exercise(Exercise::new(2, "ghost").with_phase_components(vec![99]));
        let errors = validate(&params).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidComponentReference));
    }

    #[test]
    fn test_weighted_exercise_needs_loads() {
        let params = sample_params()
            .with_exercise(Exercise::new(2, "goblet squat").weighted(8000));
        let errors = validate(&params).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::NoAdmissibleLoad));
        // With one_rep_max but also weights available it passes.
        let params = params.with_available_weights(vec![400, 800, 1200]);
        assert!(validate(&params).is_ok());
    }

    #[test]
    fn test_negative_availability() {
        let params = sample_params().with_availability(vec![3600, -1]);
        let errors = validate(&params).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidBound));
    }
}
