//! The scheduling pipeline: phase → phase-component → exercise.
//!
//! Stages run strictly in sequence because each stage's inputs depend on
//! the previous stage's committed output: the phase schedule fixes the
//! macrocycle, the component schedule fixes day/slot assignments, and the
//! exercise passes shape and staff the active slots of each workout day.
//! Every stage runs through the solve-and-relax loop with the same
//! advisor; a stage that stays infeasible after exhaustion ends the run
//! early, keeping whatever earlier stages committed, rather than raising
//! an error.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use log::info;

use crate::cp::{SolveStatus, SolverConfig};
use crate::models::{OutputRow, Parameters, RelaxationAttempt, Solution};
use crate::relax::{solve_with_relaxation, RelaxationAdvisor, StageOutcome};
use crate::stages::{
    ExerciseAssignmentStage, ExerciseShapeStage, PhaseComponentStage, PhaseStage, ShapeSlot,
};
use crate::validation;
use crate::ScheduleError;

/// Everything one scheduling run returns.
#[derive(Debug)]
pub struct Outcome {
    /// Human-readable trace of the run.
    pub formatted: String,
    /// Persistence-ready projection, one row per active exercise slot.
    pub output: Vec<OutputRow>,
    /// The structured solution record.
    pub solution: Solution,
    /// Applied/skipped constraint narrative across all stages.
    pub logs: String,
    /// Relaxation history across all stages, in run order.
    pub attempts: Vec<RelaxationAttempt>,
}

/// Runs the full pipeline.
///
/// `overrides` maps constraint-group names to activation flags; omitted
/// names keep each stage's defaults. Validation failures and model-build
/// preconditions surface as errors; infeasibility does not.
pub fn run(
    params: &Parameters,
    overrides: &BTreeMap<String, bool>,
    advisor: &mut dyn RelaxationAdvisor,
    config: &SolverConfig,
) -> Result<Outcome, ScheduleError> {
    validation::validate(params).map_err(ScheduleError::Validation)?;

    let mut solution = Solution::empty(SolveStatus::Unknown);
    let mut logs = String::new();
    let mut attempts = Vec::new();

    info!("pipeline start: phase stage");
    let phase_stage = PhaseStage::new(params);
    let phase = solve_with_relaxation(&phase_stage, overrides, advisor, config)?;
    absorb(&mut logs, &mut attempts, &mut solution, "phase", &phase);
    let Some(phase_schedule) = phase.solution else {
        return Ok(finish(solution, logs, attempts));
    };
    solution.phase_schedule = Some(phase_schedule);

    info!("pipeline: phase-component stage");
    let component_stage = PhaseComponentStage::new(params);
    let component = solve_with_relaxation(&component_stage, overrides, advisor, config)?;
    absorb(&mut logs, &mut attempts, &mut solution, "phase_component", &component);
    let Some(component_schedule) = component.solution else {
        return Ok(finish(solution, logs, attempts));
    };
    solution.component_schedule = Some(component_schedule.clone());

    let mut all_rows: Vec<OutputRow> = Vec::new();
    let mut exercises_complete = true;
    for day in component_schedule.days.iter().filter(|d| d.active_workday) {
        let slots: Vec<ShapeSlot> = day
            .slots
            .iter()
            .filter(|s| s.phase_component_id != 0)
            .map(|s| ShapeSlot {
                phase_component_id: s.phase_component_id,
                bodypart_id: s.bodypart_id,
            })
            .collect();
        if slots.is_empty() {
            continue;
        }

        info!("pipeline: exercise shape for day {}", day.day);
        let shape_stage = ExerciseShapeStage::new(params, slots);
        let shape = solve_with_relaxation(&shape_stage, overrides, advisor, config)?;
        absorb(&mut logs, &mut attempts, &mut solution, "exercise_shape", &shape);
        let Some(shape_schedule) = shape.solution else {
            exercises_complete = false;
            break;
        };

        info!("pipeline: exercise assignment for day {}", day.day);
        let assign_stage = ExerciseAssignmentStage::new(params, shape_schedule.rows);
        let assigned = solve_with_relaxation(&assign_stage, overrides, advisor, config)?;
        absorb(
            &mut logs,
            &mut attempts,
            &mut solution,
            "exercise_assignment",
            &assigned,
        );
        let Some(assigned_schedule) = assigned.solution else {
            exercises_complete = false;
            break;
        };

        let base = all_rows.len();
        all_rows.extend(assigned_schedule.rows.into_iter().map(|mut r| {
            r.slot += base;
            r
        }));
        let strain = assigned_schedule.strain_ratio;
        solution
            .metrics
            .insert(format!("day_{}_strain_ratio", day.day), strain);
    }

    // Days assigned before an exhausted day keep their rows; the schedule
    // stays `None` only when no day was assigned at all.
    if exercises_complete || !all_rows.is_empty() {
        let total_duration = all_rows.iter().map(|r| r.duration).sum();
        let strain_ratio = solution
            .metrics
            .iter()
            .filter(|(k, _)| k.starts_with("day_") && k.ends_with("_strain_ratio"))
            .map(|(_, &v)| v)
            .max()
            .unwrap_or(0);
        solution.exercise_schedule = Some(crate::models::ExerciseSchedule {
            rows: all_rows,
            total_duration,
            strain_ratio,
        });
    }

    Ok(finish(solution, logs, attempts))
}

fn absorb<T>(
    logs: &mut String,
    attempts: &mut Vec<RelaxationAttempt>,
    solution: &mut Solution,
    stage: &str,
    outcome: &StageOutcome<T>,
) {
    logs.push_str(outcome.narrative.as_str());
    attempts.extend(outcome.attempts.iter().cloned());
    solution.status = outcome.status;
    if let Some(last) = outcome.attempts.iter().rev().find(|a| a.result_feasible) {
        for (k, &v) in &last.metrics {
            solution.metrics.insert(format!("{stage}_{k}"), v);
        }
    }
}

fn finish(solution: Solution, logs: String, attempts: Vec<RelaxationAttempt>) -> Outcome {
    let formatted = render(&solution, &attempts);
    let output = solution.output();
    Outcome {
        formatted,
        output,
        solution,
        logs,
        attempts,
    }
}

fn render(solution: &Solution, attempts: &[RelaxationAttempt]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "status: {:?}", solution.status);

    if let Some(phases) = &solution.phase_schedule {
        let _ = writeln!(
            out,
            "macrocycle: {} weeks scheduled, {} in goal phases",
            phases.total_weeks, phases.goal_weeks
        );
        for slot in phases.slots.iter().filter(|s| s.phase_id != 0) {
            let _ = writeln!(
                out,
                "  mesocycle {}: {} ({} weeks)",
                slot.slot, slot.name, slot.duration_weeks
            );
        }
    }

    if let Some(days) = &solution.component_schedule {
        let _ = writeln!(
            out,
            "microcycle: {} s scheduled, day spread {} s",
            days.total_duration, days.duration_spread
        );
        for day in &days.days {
            if !day.active_workday {
                let _ = writeln!(out, "  day {}: rest", day.day);
                continue;
            }
            let _ = writeln!(out, "  day {}:", day.day);
            for slot in day.slots.iter().filter(|s| s.phase_component_id != 0) {
                let _ = writeln!(
                    out,
                    "    slot {}: component {} (bodypart {}, {} s)",
                    slot.slot, slot.phase_component_id, slot.bodypart_id, slot.duration
                );
            }
        }
    }

    if let Some(exercises) = &solution.exercise_schedule {
        let _ = writeln!(out, "workouts: {} s total", exercises.total_duration);
        for row in &exercises.rows {
            let _ = writeln!(
                out,
                "  slot {}: exercise {} for component {}, {}x{} reps, rest {}, \
                 intensity {}%, weight {}",
                row.slot,
                row.exercise_id,
                row.phase_component_id,
                row.sets_var,
                row.reps_var,
                row.rest_var,
                row.intensity_var,
                row.training_weight
            );
        }
    }

    for attempt in attempts {
        let _ = writeln!(
            out,
            "attempt {} ({}): relaxed {:?} -> {}",
            attempt.attempt,
            attempt.rationale,
            attempt.relaxed,
            if attempt.result_feasible {
                "feasible"
            } else {
                "infeasible"
            }
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, Phase, PhaseComponent};
    use crate::relax::RoundRobinAdvisor;

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
            .with_phase(Phase::new(3, "recovery").with_duration(1, 2).required().recovery())
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
    fn test_full_pipeline_produces_output_rows() {
        let params = sample_params();
        let mut advisor = RoundRobinAdvisor::new();
        let outcome = run(
            &params,
            &BTreeMap::new(),
            &mut advisor,
            &SolverConfig::default(),
        )
        .unwrap();

        assert!(outcome.solution.status.has_solution());
        let phases = outcome.solution.phase_schedule.as_ref().unwrap();
        assert!(phases.total_weeks <= 20);

        assert!(!outcome.output.is_empty());
        for row in &outcome.output {
            assert_ne!(row.phase_component_id, 0);
            assert_ne!(row.exercise_id, 0);
        }
        assert!(outcome.formatted.contains("macrocycle"));
        assert!(outcome.logs.contains("applied constraint"));
        assert!(!outcome.attempts.is_empty());
    }

    #[test]
    fn test_exercise_failure_keeps_component_schedule() {
        // An exercise catalog holding only the sentinel makes every
        // assignment infeasible regardless of relaxation; the phase and
        // component schedules that already solved must survive.
        let mut params = sample_params();
        params.exercises.truncate(1);
        let mut advisor = RoundRobinAdvisor::new();
        let outcome = run(
            &params,
            &BTreeMap::new(),
            &mut advisor,
            &SolverConfig::default(),
        )
        .unwrap();

        assert!(outcome.solution.phase_schedule.is_some());
        assert!(outcome.solution.component_schedule.is_some());
        assert!(outcome.solution.exercise_schedule.is_none());
        assert!(outcome.output.is_empty());
        assert!(!outcome.solution.status.has_solution());
        assert!(outcome.formatted.contains("microcycle"));
    }

    #[test]
    fn test_validation_failure_is_an_error() {
        let mut params = sample_params();
        params.phases.remove(0);
        let mut advisor = RoundRobinAdvisor::new();
        let err = run(
            &params,
            &BTreeMap::new(),
            &mut advisor,
            &SolverConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::Validation(_)));
    }
}
