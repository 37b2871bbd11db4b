//! Exercise scheduler: shape and identity for phase-component slots.
//!
//! Two passes over the slots of one workout:
//!
//! - **Shape pass** ([`ExerciseShapeStage`]): distributes the workout's
//!   assigned phase-components over the ordered slots and solves each
//!   slot's shape (seconds per rep, reps, sets, rest and the derived
//!   duration) against catalog bounds, minimizing working-time strain
//!   relative to the projected base duration.
//! - **Assignment pass** ([`ExerciseAssignmentStage`]): with shape fixed,
//!   binds a concrete exercise to every slot, gates intensity and
//!   training weight on the exercise being weighted, draws training
//!   weight from the discrete available-load table, and penalizes
//!   per-category performance that fails to beat the user's last recorded
//!   value. Minimizes the working-effort over base-effort ratio plus the
//!   overload penalties.
//!
//! Both passes emit a divided-strain fallback form whose objective sums
//! per-slot ratios instead of dividing aggregate totals once.

use std::collections::BTreeMap;

use crate::algebra::{self, EffortTerms, NEUTRAL_LOAD};
use crate::constraints::{
    self, ConstraintSet, ConstraintSpec, EntryVars, NarrativeLog,
};
use crate::cp::{BoolVar, CpModel, CpSolution, IntVar, LinearExpr, ModelError};
use crate::models::{ExerciseSchedule, OutputRow, Parameters, PhaseComponent};

use super::{BuiltForm, ModelForm, StageModel};

/// Dominance weight for overload penalties over the strain term.
const OVERLOAD_WEIGHT: i64 = 1000;

/// One workout slot awaiting exercise shape: the phase-component the
/// earlier stage committed to it.
#[derive(Debug, Clone, Copy)]
pub struct ShapeSlot {
    pub phase_component_id: i64,
    pub bodypart_id: i64,
}

/// The shape pass: slot order and shape for the workout's components.
pub struct ExerciseShapeStage<'a> {
    params: &'a Parameters,
    slots: Vec<ShapeSlot>,
}

struct ShapeVars {
    entry: EntryVars,
    seconds: IntVar,
    reps: IntVar,
    sets: IntVar,
    rest: IntVar,
    duration: IntVar,
    working: IntVar,
}

/// Solver model plus per-slot shape variables.
pub struct ShapeBuilt {
    model: CpModel,
    vars: Vec<ShapeVars>,
    total_duration: IntVar,
    strain: IntVar,
}

fn attr_cap(components: &[PhaseComponent], f: impl Fn(&PhaseComponent) -> i64) -> i64 {
    components.iter().map(f).max().unwrap_or(0)
}

impl<'a> ExerciseShapeStage<'a> {
    pub fn new(params: &'a Parameters, slots: Vec<ShapeSlot>) -> Self {
        Self { params, slots }
    }

    fn component_index(&self, id: i64) -> usize {
        self.params
            .phase_components
            .iter()
            .position(|c| c.id == id)
            .unwrap_or(0)
    }

    fn build_form(
        &self,
        form: ModelForm,
        constraints: &ConstraintSet,
        narrative: &mut NarrativeLog,
    ) -> Result<ShapeBuilt, ModelError> {
        let components = &self.params.phase_components;
        let n = self.slots.len();
        let mut model = CpModel::new(match form {
            ModelForm::Primary => "exercise_shape",
            ModelForm::DividedStrain => "exercise_shape_divided",
        });

        let secs_cap = attr_cap(components, |c| c.seconds_per_exercise_max);
        let reps_cap = attr_cap(components, |c| c.reps_max);
        let sets_cap = attr_cap(components, |c| c.sets_max);
        let rest_cap = attr_cap(components, |c| c.rest_max);

        let shape_range_on = constraints.gate("shape_range", narrative);
        let duration_range_on = constraints.gate("component_duration_range", narrative);

        let mut vars = Vec::with_capacity(n);
        for i in 0..n {
            let prefix = format!("slot_{i}");
            let entry = constraints::link_entry(&mut model, components.len(), &prefix);
            let seconds = model.new_int_var(0, secs_cap, format!("{prefix}_seconds"));
            let reps = model.new_int_var(0, reps_cap, format!("{prefix}_reps"));
            let sets = model.new_int_var(0, sets_cap, format!("{prefix}_sets"));
            let rest = model.new_int_var(0, rest_cap, format!("{prefix}_rest"));

            // Inactive slots zero out; active slots do real work.
            for &attr in &[seconds, reps, sets, rest] {
                model
                    .add_eq(attr, 0)
                    .only_enforce_if(&[entry.active.negated()]);
            }
            for &attr in &[seconds, reps, sets] {
                model
                    .add_ge(attr, 1)
                    .only_enforce_if(&[entry.active.lit()]);
            }

            for (j, c) in components.iter().enumerate().skip(1) {
                if !shape_range_on {
                    continue;
                }
                let ranges = [
                    (seconds, c.seconds_per_exercise_min, c.seconds_per_exercise_max),
                    (reps, c.reps_min, c.reps_max),
                    (sets, c.sets_min, c.sets_max),
                    (rest, c.rest_min, c.rest_max),
                ];
                for (attr, min, max) in ranges {
                    model
                        .add_ge(attr, min)
                        .only_enforce_if(&[entry.used[j].lit()]);
                    model
                        .add_le(attr, max)
                        .only_enforce_if(&[entry.used[j].lit()]);
                }
            }

            let duration = algebra::duration(&mut model, seconds, reps, rest, sets, &prefix);
            let working = algebra::working_duration(&mut model, seconds, reps, sets, &prefix);
            if duration_range_on {
                for (j, c) in components.iter().enumerate().skip(1) {
                    model
                        .add_ge(duration, c.duration_min)
                        .only_enforce_if(&[entry.used[j].lit()]);
                    model
                        .add_le(duration, c.duration_max)
                        .only_enforce_if(&[entry.used[j].lit()]);
                }
            }

            vars.push(ShapeVars {
                entry,
                seconds,
                reps,
                sets,
                rest,
                duration,
                working,
            });
        }

        let selectors: Vec<IntVar> = vars.iter().map(|v| v.entry.selector).collect();
        let actives: Vec<BoolVar> = vars.iter().map(|v| v.entry.active).collect();
        let entries: Vec<EntryVars> = vars.iter().map(|v| v.entry.clone()).collect();

        if constraints.gate("inactive_slots_trail", narrative) {
            constraints::active_entry_monotonicity(&mut model, &actives);
        }
        if constraints.gate("no_duplicate_component", narrative) {
            constraints::no_duplicates(&mut model, &selectors, Some(&actives));
        }
        if constraints.gate("assigned_component_coverage", narrative) {
            let assigned: Vec<usize> = self
                .slots
                .iter()
                .map(|s| self.component_index(s.phase_component_id))
                .collect();
            constraints::required_coverage_hard(&mut model, &entries, &assigned);
        }
        if constraints.gate("exercises_per_bodypart_workout", narrative) {
            for (j, c) in components.iter().enumerate().skip(1) {
                if c.exercises_per_bodypart_workout_max == 0 {
                    continue;
                }
                let count =
                    constraints::item_count(&mut model, &entries, j, "per_workout");
                constraints::frequency_window(
                    &mut model,
                    count,
                    Some(c.exercises_per_bodypart_workout_min),
                    Some(c.exercises_per_bodypart_workout_max),
                    &format!("per_workout_{j}"),
                );
            }
        }

        let durations: Vec<IntVar> = vars.iter().map(|v| v.duration).collect();
        let workings: Vec<IntVar> = vars.iter().map(|v| v.working).collect();
        let total_cap: i64 = durations.iter().map(|&d| model.ub(d)).sum();
        let total_duration = model.new_int_var(0, total_cap, "total_duration");
        model.add_eq(total_duration, LinearExpr::sum(&durations));
        if constraints.gate("workout_length", narrative) {
            model.add_le(total_duration, self.params.workout_length);
        }

        let strain = match form {
            ModelForm::Primary => {
                let total_working = model.new_int_var(0, total_cap, "total_working");
                model.add_eq(total_working, LinearExpr::sum(&workings));
                let base = model.new_constant(self.params.projected_duration * n as i64);
                algebra::strain(&mut model, total_working, base, "workout")?
            }
            ModelForm::DividedStrain => {
                let mut ratios = Vec::with_capacity(n);
                for (i, &working) in workings.iter().enumerate() {
                    let base = model.new_constant(self.params.projected_duration);
                    ratios.push(algebra::strain(
                        &mut model,
                        working,
                        base,
                        &format!("slot_{i}"),
                    )?);
                }
                let cap = 100 * total_cap;
                let sum = model.new_int_var(0, cap.max(1), "strain_sum");
                model.add_eq(sum, LinearExpr::sum(&ratios));
                sum
            }
        };
        model.minimize(strain);

        Ok(ShapeBuilt {
            model,
            vars,
            total_duration,
            strain,
        })
    }
}

impl StageModel for ExerciseShapeStage<'_> {
    type Built = ShapeBuilt;
    type Solution = ExerciseSchedule;

    fn name(&self) -> &'static str {
        "exercise_shape"
    }

    fn constraint_catalog(&self) -> Vec<ConstraintSpec> {
        vec![
            ConstraintSpec::new("shape_range", "attributes within catalog bounds"),
            ConstraintSpec::new(
                "component_duration_range",
                "slot duration within catalog range",
            ),
            ConstraintSpec::new("workout_length", "total duration within the workout"),
            ConstraintSpec::new(
                "assigned_component_coverage",
                "every assigned component gets a slot",
            ),
            ConstraintSpec::new(
                "exercises_per_bodypart_workout",
                "per-component exercise count within the workout window",
            ),
            ConstraintSpec::new("no_duplicate_component", "one slot per component"),
            ConstraintSpec::new("inactive_slots_trail", "inactive slots trail active ones"),
        ]
    }

    fn build(
        &self,
        constraints: &ConstraintSet,
        narrative: &mut NarrativeLog,
    ) -> Result<Vec<BuiltForm<ShapeBuilt>>, ModelError> {
        narrative.section("exercise shape build");
        let primary = self.build_form(ModelForm::Primary, constraints, narrative)?;
        let divided = self.build_form(ModelForm::DividedStrain, constraints, narrative)?;
        Ok(vec![
            BuiltForm {
                form: ModelForm::Primary,
                built: primary,
            },
            BuiltForm {
                form: ModelForm::DividedStrain,
                built: divided,
            },
        ])
    }

    fn model<'b>(&self, built: &'b ShapeBuilt) -> &'b CpModel {
        &built.model
    }

    fn extract(&self, built: &ShapeBuilt, solution: &CpSolution) -> ExerciseSchedule {
        let rows = built
            .vars
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let idx = solution.value(v.entry.selector) as usize;
                let component = &self.params.phase_components[idx];
                OutputRow {
                    slot: i,
                    phase_component_id: component.id,
                    bodypart_id: component.bodypart_id,
                    exercise_id: 0,
                    reps_var: solution.value(v.reps),
                    sets_var: solution.value(v.sets),
                    intensity_var: 0,
                    rest_var: solution.value(v.rest),
                    training_weight: 0,
                    seconds_per_exercise: solution.value(v.seconds),
                    duration: solution.value(v.duration),
                }
            })
            .collect();
        ExerciseSchedule {
            rows,
            total_duration: solution.value(built.total_duration),
            strain_ratio: solution.value(built.strain),
        }
    }

    fn metrics(&self, solution: &ExerciseSchedule) -> BTreeMap<String, i64> {
        BTreeMap::from([
            ("total_duration".to_string(), solution.total_duration),
            ("strain_ratio".to_string(), solution.strain_ratio),
        ])
    }
}

/// The assignment pass: exercise identity and load for shaped slots.
pub struct ExerciseAssignmentStage<'a> {
    params: &'a Parameters,
    rows: Vec<OutputRow>,
}

struct AssignVars {
    entry: EntryVars,
    intensity: IntVar,
    training_weight: IntVar,
    performance: IntVar,
    duration: i64,
}

/// Solver model plus per-slot assignment variables.
pub struct AssignBuilt {
    model: CpModel,
    vars: Vec<AssignVars>,
    strain: IntVar,
    penalties: Vec<BoolVar>,
}

impl<'a> ExerciseAssignmentStage<'a> {
    /// Takes the shape pass's solved rows as the fixed slot layout.
    pub fn new(params: &'a Parameters, rows: Vec<OutputRow>) -> Self {
        let rows = rows
            .into_iter()
            .filter(|r| r.phase_component_id != 0)
            .collect();
        Self { params, rows }
    }

    fn component(&self, id: i64) -> &PhaseComponent {
        self.params
            .phase_components
            .iter()
            .find(|c| c.id == id)
            .unwrap_or(&self.params.phase_components[0])
    }

    fn build_form(
        &self,
        form: ModelForm,
        constraints: &ConstraintSet,
        narrative: &mut NarrativeLog,
    ) -> Result<AssignBuilt, ModelError> {
        let params = self.params;
        let exercises = &params.exercises;
        let mut model = CpModel::new(match form {
            ModelForm::Primary => "exercise_assignment",
            ModelForm::DividedStrain => "exercise_assignment_divided",
        });

        let weighted_tuples: Vec<Vec<i64>> = exercises
            .iter()
            .enumerate()
            .map(|(j, e)| vec![j as i64, i64::from(e.weighted)])
            .collect();
        let orm_tuples: Vec<Vec<i64>> = exercises
            .iter()
            .enumerate()
            .map(|(j, e)| vec![j as i64, e.one_rep_max])
            .collect();
        let strain_tuples: Vec<Vec<i64>> = exercises
            .iter()
            .enumerate()
            .map(|(j, e)| vec![j as i64, e.base_strain])
            .collect();
        let orm_cap = exercises.iter().map(|e| e.one_rep_max).max().unwrap_or(0);
        let base_strain_cap = exercises.iter().map(|e| e.base_strain).max().unwrap_or(0);

        let allowed_on = constraints.gate("allowed_exercise_for_component", narrative);
        let intensity_range_on = constraints.gate("intensity_range", narrative);
        let weights_table_on = constraints.gate("available_weights_membership", narrative);

        let mut vars: Vec<AssignVars> = Vec::with_capacity(self.rows.len());
        let mut efforts = Vec::with_capacity(self.rows.len());
        let mut working_efforts = Vec::with_capacity(self.rows.len());
        let mut slot_strains = Vec::with_capacity(self.rows.len());

        for (i, row) in self.rows.iter().enumerate() {
            let prefix = format!("slot_{i}");
            let component = self.component(row.phase_component_id);
            let entry = constraints::link_entry(&mut model, exercises.len(), &prefix);
            // Every shaped slot carries a real exercise.
            model.add_eq(entry.active.as_int(), 1);

            if allowed_on {
                for (j, e) in exercises.iter().enumerate().skip(1) {
                    if !e.serves(row.phase_component_id) {
                        model.add_eq(entry.used[j].as_int(), 0);
                    }
                }
            }

            let weighted = model.new_bool_var(format!("{prefix}_weighted"));
            model.add_allowed_assignments(
                vec![entry.selector, weighted.as_int()],
                weighted_tuples.clone(),
            )?;
            let one_rep_max =
                model.new_int_var(0, orm_cap.max(0), format!("{prefix}_one_rep_max"));
            model.add_allowed_assignments(
                vec![entry.selector, one_rep_max],
                orm_tuples.clone(),
            )?;
            let base_strain =
                model.new_int_var(0, base_strain_cap.max(0), format!("{prefix}_base_strain"));
            model.add_allowed_assignments(
                vec![entry.selector, base_strain],
                strain_tuples.clone(),
            )?;

            let intensity =
                model.new_int_var(0, component.intensity_max, format!("{prefix}_intensity"));
            model
                .add_eq(intensity, 0)
                .only_enforce_if(&[weighted.negated()]);
            if intensity_range_on {
                model
                    .add_ge(intensity, component.intensity_min)
                    .only_enforce_if(&[weighted.lit()]);
                model
                    .add_le(intensity, component.intensity_max)
                    .only_enforce_if(&[weighted.lit()]);
            }

            let training_weight =
                algebra::training_weight(&mut model, one_rep_max, intensity, &prefix)?;
            if weights_table_on && !params.available_weights.is_empty() {
                let weight_rows: Vec<Vec<i64>> =
                    params.available_weights.iter().map(|&w| vec![w]).collect();
                model
                    .add_allowed_assignments(vec![training_weight], weight_rows)?
                    .only_enforce_if(&[weighted.lit()]);
            }

            // Fixed shape from the first pass enters as constants.
            let seconds = model.new_constant(row.seconds_per_exercise);
            let reps = model.new_constant(row.reps_var);
            let sets = model.new_constant(row.sets_var);
            let rest = model.new_constant(row.rest_var);

            let load = model.new_int_var(
                0,
                NEUTRAL_LOAD.max(orm_cap),
                format!("{prefix}_load"),
            );
            model
                .add_eq(load, training_weight)
                .only_enforce_if(&[weighted.lit()]);
            model
                .add_eq(load, NEUTRAL_LOAD)
                .only_enforce_if(&[weighted.negated()]);

            let volume = algebra::volume(&mut model, reps, sets, load, &prefix);
            let duration = model.new_constant(row.duration);
            let working = model.new_constant(
                row.seconds_per_exercise * row.reps_var * row.sets_var,
            );
            let density = algebra::density(&mut model, working, duration, &prefix)?;
            let performance = algebra::performance(&mut model, volume, density, &prefix);

            let terms = EffortTerms {
                intensity: Some(intensity),
                base_strain: Some(base_strain),
            };
            let effort = algebra::effort(&mut model, seconds, reps, rest, sets, terms, &prefix);
            let working_effort =
                algebra::working_effort(&mut model, seconds, reps, sets, terms, &prefix);
            if form == ModelForm::DividedStrain {
                slot_strains.push(algebra::strain(
                    &mut model,
                    working_effort,
                    effort,
                    &format!("{prefix}_ratio"),
                )?);
            }
            efforts.push(effort);
            working_efforts.push(working_effort);

            vars.push(AssignVars {
                entry,
                intensity,
                training_weight,
                performance,
                duration: row.duration,
            });
        }

        let selectors: Vec<IntVar> = vars.iter().map(|v| v.entry.selector).collect();
        if constraints.gate("no_duplicate_exercise", narrative) {
            constraints::no_duplicates(&mut model, &selectors, None);
        }

        let mut penalties = Vec::new();
        if constraints.gate("progressive_overload", narrative) {
            for (i, v) in vars.iter().enumerate() {
                for (j, e) in exercises.iter().enumerate().skip(1) {
                    let Some(&last) = params.last_recorded.get(&e.category_id) else {
                        continue;
                    };
                    let penalty =
                        model.new_bool_var(format!("slot_{i}_ex_{j}_no_overload"));
                    model
                        .add_ge(v.performance, last + 1)
                        .only_enforce_if(&[v.entry.used[j].lit(), penalty.negated()]);
                    penalties.push(penalty);
                }
            }
        }

        let effort_cap: i64 = efforts
            .iter()
            .map(|&e| model.ub(e))
            .sum::<i64>()
            .max(1);
        let strain = match form {
            ModelForm::Primary => {
                let total_working =
                    model.new_int_var(0, effort_cap, "total_working_effort");
                model.add_eq(total_working, LinearExpr::sum(&working_efforts));
                let total_effort = model.new_int_var(0, effort_cap, "total_effort");
                model.add_eq(total_effort, LinearExpr::sum(&efforts));
                algebra::strain(&mut model, total_working, total_effort, "workout")?
            }
            ModelForm::DividedStrain => {
                let sum = model.new_int_var(
                    0,
                    100 * (slot_strains.len() as i64 + 1),
                    "strain_sum",
                );
                model.add_eq(sum, LinearExpr::sum(&slot_strains));
                sum
            }
        };

        let mut objective = LinearExpr::new().term(strain, 1);
        for p in &penalties {
            objective = objective.term(p.as_int(), OVERLOAD_WEIGHT);
        }
        model.minimize(objective);

        Ok(AssignBuilt {
            model,
            vars,
            strain,
            penalties,
        })
    }
}

impl StageModel for ExerciseAssignmentStage<'_> {
    type Built = AssignBuilt;
    type Solution = ExerciseSchedule;

    fn name(&self) -> &'static str {
        "exercise_assignment"
    }

    fn constraint_catalog(&self) -> Vec<ConstraintSpec> {
        vec![
            ConstraintSpec::new(
                "allowed_exercise_for_component",
                "exercise must serve the slot's component",
            ),
            ConstraintSpec::new("no_duplicate_exercise", "each exercise at most once"),
            ConstraintSpec::new("intensity_range", "intensity within catalog bounds"),
            ConstraintSpec::new(
                "available_weights_membership",
                "training weight drawn from available loads",
            ),
            ConstraintSpec::new(
                "progressive_overload",
                "performance should beat the last recorded value",
            ),
        ]
    }

    fn build(
        &self,
        constraints: &ConstraintSet,
        narrative: &mut NarrativeLog,
    ) -> Result<Vec<BuiltForm<AssignBuilt>>, ModelError> {
        narrative.section("exercise assignment build");
        let primary = self.build_form(ModelForm::Primary, constraints, narrative)?;
        let divided = self.build_form(ModelForm::DividedStrain, constraints, narrative)?;
        Ok(vec![
            BuiltForm {
                form: ModelForm::Primary,
                built: primary,
            },
            BuiltForm {
                form: ModelForm::DividedStrain,
                built: divided,
            },
        ])
    }

    fn model<'b>(&self, built: &'b AssignBuilt) -> &'b CpModel {
        &built.model
    }

    fn extract(&self, built: &AssignBuilt, solution: &CpSolution) -> ExerciseSchedule {
        let rows = self
            .rows
            .iter()
            .zip(&built.vars)
            .map(|(row, v)| {
                let idx = solution.value(v.entry.selector) as usize;
                let mut out = row.clone();
                out.exercise_id = self.params.exercises[idx].id;
                out.intensity_var = solution.value(v.intensity);
                out.training_weight = solution.value(v.training_weight);
                out
            })
            .collect();
        let total_duration = built.vars.iter().map(|v| v.duration).sum();
        ExerciseSchedule {
            rows,
            total_duration,
            strain_ratio: solution.value(built.strain),
        }
    }

    fn metrics(&self, solution: &ExerciseSchedule) -> BTreeMap<String, i64> {
        BTreeMap::from([
            ("total_duration".to_string(), solution.total_duration),
            ("strain_ratio".to_string(), solution.strain_ratio),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{CpSolver, SolverConfig};
    use crate::models::{Exercise, PhaseComponent};

    fn sample_params() -> Parameters {
        Parameters::new()
            .with_phase_component(
                PhaseComponent::new(1, "core stabilization")
                    .with_bodypart(1)
                    .with_duration(100, 1000)
                    .with_seconds_per_exercise(2, 4)
                    .with_reps(12, 15)
                    .with_sets(1, 3)
                    .with_rest(0, 4)
                    .with_intensity(0, 0),
            )
            .with_phase_component(
                PhaseComponent::new(2, "chest resistance")
                    .with_bodypart(2)
                    .with_duration(100, 1500)
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
            .with_workout_length(3000)
            .with_projected_duration(500)
    }

    fn solve_shape(params: &Parameters) -> ExerciseSchedule {
        let stage = ExerciseShapeStage::new(
            params,
            vec![
                ShapeSlot {
                    phase_component_id: 1,
                    bodypart_id: 1,
                },
                ShapeSlot {
                    phase_component_id: 2,
                    bodypart_id: 2,
                },
            ],
        );
        let set = ConstraintSet::from_specs(&stage.constraint_catalog());
        let mut narrative = NarrativeLog::new();
        let mut forms = stage.build(&set, &mut narrative).unwrap();
        let built = forms.remove(0).built;
        let solution = CpSolver::new().solve(&built.model, &SolverConfig::default());
        assert!(solution.has_solution());
        stage.extract(&built, &solution)
    }

    #[test]
    fn test_shape_pass_covers_assigned_components() {
        let params = sample_params();
        let shape = solve_shape(&params);
        let ids: Vec<i64> = shape.rows.iter().map(|r| r.phase_component_id).collect();
        assert!(ids.contains(&1));
        assert!(ids.contains(&2));
    }

    #[test]
    fn test_shape_within_catalog_bounds() {
        let params = sample_params();
        let shape = solve_shape(&params);
        for row in &shape.rows {
            let c = params
                .phase_components
                .iter()
                .find(|c| c.id == row.phase_component_id)
                .unwrap();
            assert!(row.reps_var >= c.reps_min && row.reps_var <= c.reps_max);
            assert!(row.sets_var >= c.sets_min && row.sets_var <= c.sets_max);
            assert!(row.rest_var >= c.rest_min && row.rest_var <= c.rest_max);
            assert_eq!(
                row.duration,
                (row.seconds_per_exercise * row.reps_var + 5 * row.rest_var) * row.sets_var
            );
        }
        assert!(shape.total_duration <= params.workout_length);
    }

    #[test]
    fn test_exercises_per_bodypart_workout_binds_count() {
        // A two-exercise chest section needs no_duplicate_component off,
        // since the window counts slots of the same component.
        let mut params = sample_params();
        params.phase_components[2] = params.phase_components[2]
            .clone()
            .with_exercises_per_bodypart_workout(2, 2);
        let stage = ExerciseShapeStage::new(
            &params,
            vec![
                ShapeSlot {
                    phase_component_id: 1,
                    bodypart_id: 1,
                },
                ShapeSlot {
                    phase_component_id: 2,
                    bodypart_id: 2,
                },
                ShapeSlot {
                    phase_component_id: 2,
                    bodypart_id: 2,
                },
            ],
        );
        let mut overrides = std::collections::BTreeMap::new();
        overrides.insert("no_duplicate_component".to_string(), false);
        let set =
            ConstraintSet::from_specs(&stage.constraint_catalog()).with_overrides(&overrides);
        let mut narrative = NarrativeLog::new();
        let mut forms = stage.build(&set, &mut narrative).unwrap();
        let built = forms.remove(0).built;
        let solution = CpSolver::new().solve(&built.model, &SolverConfig::default());
        assert!(solution.has_solution());
        let shape = stage.extract(&built, &solution);
        let chest_slots = shape
            .rows
            .iter()
            .filter(|r| r.phase_component_id == 2)
            .count();
        assert_eq!(chest_slots, 2, "chest section must hold exactly 2 exercises");
    }

    fn solve_assignment(params: &Parameters, rows: Vec<OutputRow>) -> (AssignBuilt, ExerciseSchedule) {
        let stage = ExerciseAssignmentStage::new(params, rows);
        let set = ConstraintSet::from_specs(&stage.constraint_catalog());
        let mut narrative = NarrativeLog::new();
        let mut forms = stage.build(&set, &mut narrative).unwrap();
        let built = forms.remove(0).built;
        let solution = CpSolver::new().solve(&built.model, &SolverConfig::default());
        assert!(solution.has_solution(), "assignment infeasible");
        let schedule = stage.extract(&built, &solution);
        (built, schedule)
    }

    #[test]
    fn test_assignment_respects_component_binding() {
        let params = sample_params();
        let shape = solve_shape(&params);
        let (_, schedule) = solve_assignment(&params, shape.rows);
        for row in &schedule.rows {
            let exercise = params
                .exercises
                .iter()
                .find(|e| e.id == row.exercise_id)
                .unwrap();
            assert!(exercise.serves(row.phase_component_id));
        }
    }

    #[test]
    fn test_unweighted_slot_zeroes_intensity_and_weight() {
        let params = sample_params();
        let shape = solve_shape(&params);
        let (_, schedule) = solve_assignment(&params, shape.rows);
        for row in &schedule.rows {
            let exercise = params
                .exercises
                .iter()
                .find(|e| e.id == row.exercise_id)
                .unwrap();
            if !exercise.weighted {
                assert_eq!(row.intensity_var, 0);
                assert_eq!(row.training_weight, 0);
            }
        }
    }

    #[test]
    fn test_weighted_slot_draws_from_available_loads() {
        let params = sample_params();
        let shape = solve_shape(&params);
        let (_, schedule) = solve_assignment(&params, shape.rows);
        for row in &schedule.rows {
            let exercise = params
                .exercises
                .iter()
                .find(|e| e.id == row.exercise_id)
                .unwrap();
            if exercise.weighted {
                assert!(params.available_weights.contains(&row.training_weight));
                assert!(row.intensity_var >= 50);
            }
        }
    }

    #[test]
    fn test_progressive_overload_penalty_counted() {
        // An unreachably high last-recorded value forces the penalty.
        let params = sample_params().with_last_recorded(1, i64::MAX / 8);
        let shape = solve_shape(&params);
        let stage = ExerciseAssignmentStage::new(&params, shape.rows);
        let set = ConstraintSet::from_specs(&stage.constraint_catalog());
        let mut narrative = NarrativeLog::new();
        let mut forms = stage.build(&set, &mut narrative).unwrap();
        let built = forms.remove(0).built;
        let solution = CpSolver::new().solve(&built.model, &SolverConfig::default());
        assert!(solution.has_solution());
        let paid = built
            .penalties
            .iter()
            .filter(|&&p| solution.bool_value(p))
            .count();
        assert!(paid >= 1, "unbeatable record must cost a penalty");
    }
}
