//! Phase-component scheduler: (category x bodypart) pairs over day/slot
//! pairs within a microcycle.
//!
//! Each day carries a fixed number of ordered component slots; per-day
//! scheduled duration must fit that day's availability, mandatory
//! components land on every active day or at least once in the cycle,
//! per-component frequency windows bound occurrence counts, sibling
//! resistance components train in equal counts, and a day's slots for one
//! bodypart stay contiguous.
//!
//! # Objective
//! Maximize total scheduled duration, penalized by the spread between the
//! busiest and lightest active day. The divided-strain fallback form swaps
//! the spread penalty for per-day availability-utilization ratios, which
//! search faster when the combined objective stalls.

use std::collections::{BTreeMap, BTreeSet};

use crate::algebra;
use crate::constraints::{
    self, ConstraintSet, ConstraintSpec, EntryVars, NarrativeLog,
};
use crate::cp::{BoolVar, CpModel, CpSolution, IntVar, LinearExpr, Lit, ModelError};
use crate::models::{ComponentSchedule, ComponentSlot, DayPlan, Parameters};

use super::{BuiltForm, ModelForm, StageModel};

/// Dominance weight for total duration over the spread penalty.
const DURATION_WEIGHT: i64 = 100;

/// The phase-component scheduling stage.
pub struct PhaseComponentStage<'a> {
    params: &'a Parameters,
}

/// Solver model plus the day/slot variables needed to decode it.
pub struct ComponentBuilt {
    model: CpModel,
    entries: Vec<EntryVars>,
    durations: Vec<IntVar>,
    active_workdays: Vec<BoolVar>,
    total_duration: IntVar,
}

impl<'a> PhaseComponentStage<'a> {
    pub fn new(params: &'a Parameters) -> Self {
        Self { params }
    }

    fn slot_count(&self) -> usize {
        self.params.microcycle_days() * self.params.slots_per_day
    }

    fn day_slots(&self, day: usize) -> std::ops::Range<usize> {
        let spd = self.params.slots_per_day;
        day * spd..(day + 1) * spd
    }

    fn build_form(
        &self,
        form: ModelForm,
        constraints: &ConstraintSet,
        narrative: &mut NarrativeLog,
    ) -> Result<ComponentBuilt, ModelError> {
        let params = self.params;
        let components = &params.phase_components;
        let days = params.microcycle_days();
        let spd = params.slots_per_day;
        let duration_cap = components.iter().map(|c| c.duration_max).max().unwrap_or(0);

        let mut model = CpModel::new(match form {
            ModelForm::Primary => "phase_component",
            ModelForm::DividedStrain => "phase_component_divided",
        });

        let mut entries = Vec::with_capacity(days * spd);
        let mut durations = Vec::with_capacity(days * spd);
        let mut bodypart_vars = Vec::with_capacity(days * spd);

        let bodypart_tuples: Vec<Vec<i64>> = components
            .iter()
            .enumerate()
            .map(|(j, c)| vec![j as i64, c.bodypart_id])
            .collect();
        let bodypart_cap = components.iter().map(|c| c.bodypart_id).max().unwrap_or(0);

        let duration_range_on = constraints.gate("component_duration_range", narrative);
        for day in 0..days {
            for slot in 0..spd {
                let prefix = format!("d{day}_s{slot}");
                let entry = constraints::link_entry(&mut model, components.len(), &prefix);
                let duration =
                    model.new_int_var(0, duration_cap, format!("{prefix}_duration"));
                model
                    .add_eq(duration, 0)
                    .only_enforce_if(&[entry.active.negated()]);
                model
                    .add_ge(duration, 1)
                    .only_enforce_if(&[entry.active.lit()]);

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

                // Selector-to-bodypart lookup for the grouping constraint.
                let bodypart =
                    model.new_int_var(0, bodypart_cap, format!("{prefix}_bodypart"));
                model.add_allowed_assignments(
                    vec![entry.selector, bodypart],
                    bodypart_tuples.clone(),
                )?;

                entries.push(entry);
                durations.push(duration);
                bodypart_vars.push(bodypart);
            }
        }

        let mut day_durations = Vec::with_capacity(days);
        let mut active_workdays = Vec::with_capacity(days);
        let availability_on = constraints.gate("daily_availability", narrative);
        for day in 0..days {
            let range = self.day_slots(day);
            let slot_durs = &durations[range.clone()];
            let day_cap = duration_cap * spd as i64;
            let day_duration =
                model.new_int_var(0, day_cap, format!("day_{day}_duration"));
            model.add_eq(day_duration, LinearExpr::sum(slot_durs));

            let workday = model.new_bool_var(format!("day_{day}_active"));
            let slot_actives: Vec<Lit> = entries[range.clone()]
                .iter()
                .map(|e| e.active.lit())
                .collect();
            model
                .add_bool_or(slot_actives.clone())
                .only_enforce_if(&[workday.lit()]);
            for lit in slot_actives {
                model.add_implication(lit, workday.lit());
            }

            if availability_on {
                model.add_le(day_duration, params.availability[day]);
                constraints::cap_each(&mut model, slot_durs, params.availability[day]);
            }

            day_durations.push(day_duration);
            active_workdays.push(workday);
        }

        if constraints.gate("inactive_slots_trail", narrative) {
            for day in 0..days {
                let actives: Vec<BoolVar> = entries[self.day_slots(day)]
                    .iter()
                    .map(|e| e.active)
                    .collect();
                constraints::active_entry_monotonicity(&mut model, &actives);
            }
        }

        if constraints.gate("required_every_workout", narrative) {
            for (j, _) in components
                .iter()
                .enumerate()
                .filter(|(_, c)| c.required_every_workout)
            {
                for day in 0..days {
                    let mut lits: Vec<Lit> = entries[self.day_slots(day)]
                        .iter()
                        .map(|e| e.used[j].lit())
                        .collect();
                    lits.push(active_workdays[day].negated());
                    model.add_bool_or(lits);
                }
            }
        }

        if constraints.gate("required_within_microcycle", narrative) {
            let required: Vec<usize> = components
                .iter()
                .enumerate()
                .filter(|(_, c)| c.required_within_microcycle)
                .map(|(j, _)| j)
                .collect();
            constraints::required_coverage_hard(&mut model, &entries, &required);
        }

        if constraints.gate("frequency_per_microcycle", narrative) {
            for (j, c) in components.iter().enumerate().skip(1) {
                if c.frequency_per_microcycle_min.is_none()
                    && c.frequency_per_microcycle_max.is_none()
                {
                    continue;
                }
                let count = constraints::item_count(&mut model, &entries, j, "freq");
                constraints::frequency_window(
                    &mut model,
                    count,
                    c.frequency_per_microcycle_min,
                    c.frequency_per_microcycle_max,
                    &format!("freq_{j}"),
                );
            }
        }

        if constraints.gate("sibling_equal_counts", narrative) {
            let groups: BTreeSet<i64> = components
                .iter()
                .filter_map(|c| c.sibling_group)
                .collect();
            for group in groups {
                let members: Vec<usize> = components
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.sibling_group == Some(group))
                    .map(|(j, _)| j)
                    .collect();
                let counts: Vec<IntVar> = members
                    .iter()
                    .map(|&j| constraints::item_count(&mut model, &entries, j, "sibling"))
                    .collect();
                constraints::equal_counts(&mut model, &counts);
            }
        }

        if constraints.gate("bodypart_grouping", narrative) {
            self.add_bodypart_grouping(&mut model, &bodypart_vars, bodypart_cap);
        }

        let total_cap = duration_cap * (days * spd) as i64;
        let total_duration = model.new_int_var(0, total_cap, "total_duration");
        model.add_eq(total_duration, LinearExpr::sum(&durations));

        match form {
            ModelForm::Primary => {
                let mut objective =
                    LinearExpr::new().term(total_duration, DURATION_WEIGHT);
                // The spread envelopes are only one-sidedly bounded, so
                // they are posted only where the objective pins them.
                if constraints.gate("duration_spread", narrative) {
                    let envelope = constraints::spread(
                        &mut model,
                        &day_durations,
                        &active_workdays,
                        "day_duration",
                    );
                    objective = objective.term(envelope.spread, -1);
                }
                model.maximize(objective);
            }
            ModelForm::DividedStrain => {
                // Per-day utilization ratios search faster than the
                // combined total-with-spread objective.
                let mut ratios = Vec::with_capacity(days);
                for (day, &day_duration) in day_durations.iter().enumerate() {
                    let avail = model.new_constant(params.availability[day]);
                    let ratio = algebra::scaled_ratio(
                        &mut model,
                        day_duration,
                        avail,
                        &format!("day_{day}_utilization"),
                    )?;
                    ratios.push(ratio);
                }
                model.maximize(LinearExpr::sum(&ratios));
            }
        }

        Ok(ComponentBuilt {
            model,
            entries,
            durations,
            active_workdays,
            total_duration,
        })
    }

    /// Within each day, the slots training one bodypart must be
    /// contiguous: forbid the hit/gap/hit pattern over every slot triple.
    fn add_bodypart_grouping(
        &self,
        model: &mut CpModel,
        bodypart_vars: &[IntVar],
        bodypart_cap: i64,
    ) {
        let spd = self.params.slots_per_day;
        if spd < 3 {
            return;
        }
        for day in 0..self.params.microcycle_days() {
            let day_vars = &bodypart_vars[self.day_slots(day)];
            for b in 1..=bodypart_cap {
                let hits: Vec<BoolVar> = day_vars
                    .iter()
                    .enumerate()
                    .map(|(s, &v)| {
                        let hit =
                            model.new_bool_var(format!("d{day}_s{s}_trains_{b}"));
                        model.add_eq(v, b).only_enforce_if(&[hit.lit()]);
                        model.add_ne(v, b).only_enforce_if(&[hit.negated()]);
                        hit
                    })
                    .collect();
                for i in 0..spd {
                    for j in i + 1..spd {
                        for k in j + 1..spd {
                            model.add_bool_or(vec![
                                hits[i].negated(),
                                hits[j].lit(),
                                hits[k].negated(),
                            ]);
                        }
                    }
                }
            }
        }
    }
}

impl StageModel for PhaseComponentStage<'_> {
    type Built = ComponentBuilt;
    type Solution = ComponentSchedule;

    fn name(&self) -> &'static str {
        "phase_component"
    }

    fn constraint_catalog(&self) -> Vec<ConstraintSpec> {
        vec![
            ConstraintSpec::new("daily_availability", "per-day duration within availability"),
            ConstraintSpec::new(
                "component_duration_range",
                "slot duration within catalog range",
            ),
            ConstraintSpec::new(
                "required_every_workout",
                "mandatory components on every active day",
            ),
            ConstraintSpec::new(
                "required_within_microcycle",
                "mandatory components at least once per cycle",
            ),
            ConstraintSpec::new(
                "frequency_per_microcycle",
                "occurrence counts within catalog windows",
            ),
            ConstraintSpec::new(
                "sibling_equal_counts",
                "sibling resistance components in equal counts",
            ),
            ConstraintSpec::new("bodypart_grouping", "same-bodypart slots contiguous per day"),
            ConstraintSpec::new("duration_spread", "penalize uneven day loading"),
            ConstraintSpec::new("inactive_slots_trail", "inactive slots trail active ones"),
        ]
    }

    fn build(
        &self,
        constraints: &ConstraintSet,
        narrative: &mut NarrativeLog,
    ) -> Result<Vec<BuiltForm<ComponentBuilt>>, ModelError> {
        narrative.section("phase-component stage build");
        let primary = self.build_form(ModelForm::Primary, constraints, narrative)?;
        narrative.line(format_args!("built divided-strain fallback form"));
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

    fn model<'b>(&self, built: &'b ComponentBuilt) -> &'b CpModel {
        &built.model
    }

    fn extract(&self, built: &ComponentBuilt, solution: &CpSolution) -> ComponentSchedule {
        let spd = self.params.slots_per_day;
        let days: Vec<DayPlan> = (0..self.params.microcycle_days())
            .map(|day| {
                let slots = self
                    .day_slots(day)
                    .map(|i| {
                        let idx = solution.value(built.entries[i].selector) as usize;
                        let component = &self.params.phase_components[idx];
                        ComponentSlot {
                            day,
                            slot: i - day * spd,
                            phase_component_id: component.id,
                            bodypart_id: component.bodypart_id,
                            duration: solution.value(built.durations[i]),
                        }
                    })
                    .collect();
                DayPlan {
                    day,
                    active_workday: solution.bool_value(built.active_workdays[day]),
                    slots,
                }
            })
            .collect();
        // Recomputed from the solved day durations: the model only carries
        // spread variables when the objective uses them.
        let active_totals: Vec<i64> = days
            .iter()
            .filter(|d| d.active_workday)
            .map(|d| d.slots.iter().map(|s| s.duration).sum())
            .collect();
        let duration_spread = match (active_totals.iter().min(), active_totals.iter().max()) {
            (Some(lo), Some(hi)) => hi - lo,
            _ => 0,
        };
        ComponentSchedule {
            days,
            total_duration: solution.value(built.total_duration),
            duration_spread,
        }
    }

    fn metrics(&self, solution: &ComponentSchedule) -> BTreeMap<String, i64> {
        BTreeMap::from([
            ("total_duration".to_string(), solution.total_duration),
            ("duration_spread".to_string(), solution.duration_spread),
            (
                "active_workdays".to_string(),
                solution.days.iter().filter(|d| d.active_workday).count() as i64,
            ),
        ])
    }
}
