//! End-to-end pipeline tests over the public API.

use std::collections::BTreeMap;

use periodize::models::{Exercise, Phase, PhaseComponent};
use periodize::{pipeline, Parameters, RoundRobinAdvisor, SolverConfig};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sample_params() -> Parameters {
    Parameters::new()
        .with_phase(
            Phase::new(1, "stabilization endurance")
                .with_duration(4, 6)
                .required(),
        )
        .with_phase(
            Phase::new(2, "strength endurance")
                .with_duration(3, 5)
                .required()
                .goal(),
        )
        .with_phase(
            Phase::new(3, "recovery")
                .with_duration(1, 2)
                .required()
                .recovery(),
        )
        .with_phase_component(
            PhaseComponent::new(1, "core stabilization")
                .with_bodypart(1)
                .with_duration(100, 600)
                .with_seconds_per_exercise(2, 4)
                .with_reps(12, 15)
                .with_sets(1, 3)
                .with_rest(0, 4)
                .with_intensity(0, 0)
                .required_every_workout(),
        )
        .with_phase_component(
            PhaseComponent::new(2, "chest resistance")
                .with_bodypart(2)
                .with_duration(100, 800)
                .with_seconds_per_exercise(2, 4)
                .with_reps(8, 12)
                .with_sets(2, 4)
                .with_rest(6, 12)
                .with_intensity(50, 100),
        )
        .with_exercise(
            Exercise::new(1, "plank")
                .with_phase_components(vec![1])
                .with_bodypart(1)
                .with_category(1)
                .with_base_strain(1),
        )
        .with_exercise(
            Exercise::new(2, "bench press")
                .with_phase_components(vec![2])
                .with_bodypart(2)
                .with_category(2)
                .weighted(8000)
                .with_base_strain(3),
        )
        .with_available_weights(vec![4000, 6000, 8000])
        .with_macrocycle_allowed_weeks(20)
        .with_max_mesocycles(4)
        .with_recovery_window(3)
        .with_availability(vec![1500, 0])
        .with_slots_per_day(2)
        .with_workout_length(1500)
        .with_projected_duration(400)
}

#[test]
fn full_run_yields_consistent_solution() {
    init_logging();
    let params = sample_params();
    let mut advisor = RoundRobinAdvisor::new();
    let outcome = pipeline::run(
        &params,
        &BTreeMap::new(),
        &mut advisor,
        &SolverConfig::default(),
    )
    .expect("valid parameters");

    assert!(outcome.solution.status.has_solution());

    let phases = outcome.solution.phase_schedule.as_ref().unwrap();
    assert!(phases.total_weeks <= 20);
    assert_eq!(phases.slots[0].phase_id, 1);

    let days = outcome.solution.component_schedule.as_ref().unwrap();
    assert!(!days.days[1].active_workday, "zero-availability day rests");

    for row in &outcome.output {
        assert_ne!(row.exercise_id, 0);
        let exercise = params
            .exercises
            .iter()
            .find(|e| e.id == row.exercise_id)
            .unwrap();
        if exercise.weighted {
            assert!(params.available_weights.contains(&row.training_weight));
        } else {
            assert_eq!(row.intensity_var, 0);
            assert_eq!(row.training_weight, 0);
        }
    }
}

#[test]
fn output_rows_keep_the_persistence_field_names() {
    init_logging();
    let params = sample_params();
    let mut advisor = RoundRobinAdvisor::new();
    let outcome = pipeline::run(
        &params,
        &BTreeMap::new(),
        &mut advisor,
        &SolverConfig::default(),
    )
    .unwrap();

    let row = outcome.output.first().expect("at least one active slot");
    let json = serde_json::to_value(row).unwrap();
    for field in [
        "phase_component_id",
        "bodypart_id",
        "exercise_id",
        "reps_var",
        "sets_var",
        "intensity_var",
        "rest_var",
        "training_weight",
    ] {
        assert!(json.get(field).is_some(), "missing output field '{field}'");
    }
}

#[test]
fn relaxing_more_constraints_preserves_feasibility() {
    init_logging();
    let params = sample_params();

    let feasible_with = |overrides: &BTreeMap<String, bool>| {
        let mut advisor = RoundRobinAdvisor::new();
        pipeline::run(&params, overrides, &mut advisor, &SolverConfig::default())
            .unwrap()
            .solution
            .status
            .has_solution()
    };

    assert!(feasible_with(&BTreeMap::new()));
    // Turning additional groups off can only widen the solution space.
    let mut overrides = BTreeMap::new();
    overrides.insert("phase_2_is_str_end".to_string(), false);
    overrides.insert("duration_spread".to_string(), false);
    overrides.insert("progressive_overload".to_string(), false);
    assert!(feasible_with(&overrides));
}
