//! The solve-and-relax loop.
//!
//! Drives a [`StageModel`] through repeated build/solve cycles: build all
//! model forms against a fresh activation map, solve them in order, and on
//! infeasibility ask a [`RelaxationAdvisor`] which constraint groups to
//! turn off before rebuilding. Relaxations are not cumulative; every
//! attempt starts from the defaults plus caller overrides and applies only
//! the newly advised subset.
//!
//! The loop terminates on the first feasible solve, when the advisor has
//! nothing left to suggest, when every group is already off and the model
//! is still infeasible, or after `2 x catalog` attempts (the advisor is
//! not required to deduplicate its suggestions, so the loop carries its
//! own liveness bound).
//!
//! Timeouts count as infeasible for loop control: a solve that ran out of
//! budget without a solution routes to the advisor exactly like a proven
//! UNSAT, though the recorded status keeps the distinction.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::constraints::{ConstraintSet, ConstraintSpec, NarrativeLog};
use crate::cp::{CpSolver, ModelError, SolveStatus, SolverConfig};
use crate::models::RelaxationAttempt;
use crate::stages::StageModel;

/// One advisor suggestion: which groups to relax and why.
#[derive(Debug, Clone)]
pub struct Relaxation {
    pub names: Vec<String>,
    pub rationale: String,
}

/// Everything an advisor may consult when choosing a relaxation.
pub struct AdvisorContext<'a> {
    /// Stage being relaxed.
    pub stage: &'a str,
    /// The stage's full constraint catalog with descriptions.
    pub catalog: &'a [ConstraintSpec],
    /// All attempts so far, newest last.
    pub history: &'a [RelaxationAttempt],
    /// Applied/skipped narrative accumulated across builds.
    pub narrative: &'a str,
}

/// Strategy interface for the relaxation decision point.
///
/// Production deployments back this with an external advisor; tests and
/// offline runs use [`RoundRobinAdvisor`]. Returning `None` ends the loop.
pub trait RelaxationAdvisor {
    fn advise(&mut self, ctx: &AdvisorContext<'_>) -> Option<Relaxation>;
}

/// Deterministic fallback advisor: relaxes each catalog group alone in
/// order, then everything at once, then gives up.
#[derive(Debug, Default)]
pub struct RoundRobinAdvisor {
    cursor: usize,
}

impl RoundRobinAdvisor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelaxationAdvisor for RoundRobinAdvisor {
    fn advise(&mut self, ctx: &AdvisorContext<'_>) -> Option<Relaxation> {
        let n = ctx.catalog.len();
        let suggestion = if self.cursor < n {
            let spec = &ctx.catalog[self.cursor];
            Relaxation {
                names: vec![spec.name.to_string()],
                rationale: format!("round-robin: relax '{}' alone", spec.name),
            }
        } else if self.cursor == n {
            Relaxation {
                names: ctx.catalog.iter().map(|s| s.name.to_string()).collect(),
                rationale: "round-robin exhausted: relax everything".to_string(),
            }
        } else {
            return None;
        };
        self.cursor += 1;
        Some(suggestion)
    }
}

/// Result of driving one stage through the loop.
pub struct StageOutcome<T> {
    /// The first feasible solution, if any attempt produced one.
    pub solution: Option<T>,
    /// Status of the last solve.
    pub status: SolveStatus,
    /// Attempt history, newest last.
    pub attempts: Vec<RelaxationAttempt>,
    /// Applied/skipped narrative across all builds.
    pub narrative: NarrativeLog,
}

/// Runs a stage through setup → build → solve → analyze until feasible or
/// exhausted.
pub fn solve_with_relaxation<S: StageModel>(
    stage: &S,
    overrides: &BTreeMap<String, bool>,
    advisor: &mut dyn RelaxationAdvisor,
    config: &SolverConfig,
) -> Result<StageOutcome<S::Solution>, ModelError> {
    let catalog = stage.constraint_catalog();
    let max_attempts = (2 * catalog.len()).max(1);
    let solver = CpSolver::new();

    let mut narrative = NarrativeLog::new();
    let mut attempts: Vec<RelaxationAttempt> = Vec::new();
    let mut relaxation: Option<Relaxation> = None;
    let mut last_status = SolveStatus::Unknown;

    for attempt in 0..max_attempts {
        let mut set = ConstraintSet::from_specs(&catalog).with_overrides(overrides);
        let (relaxed, rationale) = match &relaxation {
            None => (
                Vec::new(),
                "initial attempt, constraints at defaults".to_string(),
            ),
            Some(r) => {
                set.deactivate(&r.names);
                (r.names.clone(), r.rationale.clone())
            }
        };
        narrative.line(format_args!(
            "stage '{}' attempt {attempt}, relaxed: {relaxed:?}",
            stage.name()
        ));

        let forms = stage.build(&set, &mut narrative)?;
        let mut record = RelaxationAttempt::new(attempt, relaxed, rationale);
        let mut solved: Option<S::Solution> = None;
        for form in &forms {
            let solution = solver.solve(stage.model(&form.built), config);
            last_status = solution.status;
            debug!(
                "stage '{}' attempt {attempt} form {:?}: {:?}",
                stage.name(),
                form.form,
                solution.status
            );
            if solution.status.has_solution() {
                solved = Some(stage.extract(&form.built, &solution));
                break;
            }
        }

        match solved {
            Some(solution) => {
                record = record.succeeded(stage.metrics(&solution));
                attempts.push(record);
                info!(
                    "stage '{}' solved on attempt {attempt} ({:?})",
                    stage.name(),
                    last_status
                );
                return Ok(StageOutcome {
                    solution: Some(solution),
                    status: last_status,
                    attempts,
                    narrative,
                });
            }
            None => {
                attempts.push(record);
                narrative.line(format_args!(
                    "attempt {attempt} found no solution ({last_status:?})"
                ));
                // Every group already off and still infeasible: final
                // failure, nothing left to relax.
                if set.active_names().is_empty() {
                    break;
                }
                let ctx = AdvisorContext {
                    stage: stage.name(),
                    catalog: &catalog,
                    history: &attempts,
                    narrative: narrative.as_str(),
                };
                match advisor.advise(&ctx) {
                    Some(next) => relaxation = Some(next),
                    None => break,
                }
            }
        }
    }

    info!(
        "stage '{}' exhausted after {} attempts",
        stage.name(),
        attempts.len()
    );
    Ok(StageOutcome {
        solution: None,
        status: last_status,
        attempts,
        narrative,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{self, EntryVars};
    use crate::cp::{CpModel, CpSolution};
    use crate::stages::{BuiltForm, ModelForm};

    /// Minimal stage for loop tests: `slots` entry slots over `items`
    /// catalog items, with a togglable full-coverage group. Five required
    /// items into three slots is infeasible until coverage is relaxed.
    struct CoverageStage {
        slots: usize,
        items: usize,
    }

    struct CoverageBuilt {
        model: CpModel,
        entries: Vec<EntryVars>,
    }

    impl StageModel for CoverageStage {
        type Built = CoverageBuilt;
        type Solution = Vec<i64>;

        fn name(&self) -> &'static str {
            "coverage"
        }

        fn constraint_catalog(&self) -> Vec<ConstraintSpec> {
            vec![
                ConstraintSpec::new("full_coverage", "every item appears"),
                ConstraintSpec::new("no_duplicates", "distinct selections"),
            ]
        }

        fn build(
            &self,
            constraints_set: &ConstraintSet,
            narrative: &mut NarrativeLog,
        ) -> Result<Vec<BuiltForm<CoverageBuilt>>, ModelError> {
            let mut model = CpModel::new("coverage");
            let entries: Vec<EntryVars> = (0..self.slots)
                .map(|i| constraints::link_entry(&mut model, self.items, &format!("s{i}")))
                .collect();
            if constraints_set.gate("full_coverage", narrative) {
                let required: Vec<usize> = (1..self.items).collect();
                constraints::required_coverage_hard(&mut model, &entries, &required);
            }
            if constraints_set.gate("no_duplicates", narrative) {
                let selectors: Vec<_> = entries.iter().map(|e| e.selector).collect();
                let actives: Vec<_> = entries.iter().map(|e| e.active).collect();
                constraints::no_duplicates(&mut model, &selectors, Some(&actives));
            }
            Ok(vec![BuiltForm {
                form: ModelForm::Primary,
                built: CoverageBuilt { model, entries },
            }])
        }

        fn model<'a>(&self, built: &'a CoverageBuilt) -> &'a CpModel {
            &built.model
        }

        fn extract(&self, built: &CoverageBuilt, solution: &CpSolution) -> Vec<i64> {
            built
                .entries
                .iter()
                .map(|e| solution.value(e.selector))
                .collect()
        }

        fn metrics(&self, solution: &Vec<i64>) -> BTreeMap<String, i64> {
            BTreeMap::from([(
                "active_slots".to_string(),
                solution.iter().filter(|&&v| v != 0).count() as i64,
            )])
        }
    }

    #[test]
    fn test_feasible_first_attempt_records_success() {
        let stage = CoverageStage { slots: 4, items: 4 };
        let mut advisor = RoundRobinAdvisor::new();
        let outcome = solve_with_relaxation(
            &stage,
            &BTreeMap::new(),
            &mut advisor,
            &SolverConfig::default(),
        )
        .unwrap();
        assert!(outcome.solution.is_some());
        assert_eq!(outcome.attempts.len(), 1);
        assert!(outcome.attempts[0].result_feasible);
        assert!(outcome.attempts[0].relaxed.is_empty());
    }

    #[test]
    fn test_over_constrained_instance_relaxes_then_solves() {
        // 5 required items into 3 slots: infeasible until coverage is off.
        let stage = CoverageStage { slots: 3, items: 6 };
        let mut advisor = RoundRobinAdvisor::new();
        let outcome = solve_with_relaxation(
            &stage,
            &BTreeMap::new(),
            &mut advisor,
            &SolverConfig::default(),
        )
        .unwrap();
        let solution = outcome.solution.expect("relaxation recovers feasibility");
        assert_eq!(solution.len(), 3);

        assert!(outcome.attempts.len() >= 2, "advisor must be consulted");
        assert!(!outcome.attempts[0].result_feasible);
        assert!(outcome.attempts.last().unwrap().result_feasible);
        let feasible_after_failure = outcome
            .attempts
            .iter()
            .position(|a| a.result_feasible)
            .unwrap();
        assert!(feasible_after_failure > 0);
        assert!(outcome
            .attempts
            .last()
            .unwrap()
            .relaxed
            .contains(&"full_coverage".to_string()));
    }

    #[test]
    fn test_relaxations_are_not_cumulative() {
        struct ScriptedAdvisor {
            step: usize,
        }
        impl RelaxationAdvisor for ScriptedAdvisor {
            fn advise(&mut self, _ctx: &AdvisorContext<'_>) -> Option<Relaxation> {
                self.step += 1;
                match self.step {
                    1 => Some(Relaxation {
                        names: vec!["no_duplicates".to_string()],
                        rationale: "try duplicates first".to_string(),
                    }),
                    2 => Some(Relaxation {
                        names: vec!["full_coverage".to_string()],
                        rationale: "coverage next".to_string(),
                    }),
                    _ => None,
                }
            }
        }

        let stage = CoverageStage { slots: 3, items: 6 };
        let mut advisor = ScriptedAdvisor { step: 0 };
        let outcome = solve_with_relaxation(
            &stage,
            &BTreeMap::new(),
            &mut advisor,
            &SolverConfig::default(),
        )
        .unwrap();
        // Relaxing duplicates alone still leaves coverage infeasible;
        // the second suggestion starts fresh and turns only coverage off.
        assert!(outcome.solution.is_some());
        assert_eq!(outcome.attempts.len(), 3);
        assert_eq!(outcome.attempts[1].relaxed, vec!["no_duplicates"]);
        assert_eq!(outcome.attempts[2].relaxed, vec!["full_coverage"]);
        assert!(outcome.attempts[2].result_feasible);
    }

    #[test]
    fn test_attempt_bound_stops_unhelpful_advisor() {
        struct StubbornAdvisor;
        impl RelaxationAdvisor for StubbornAdvisor {
            fn advise(&mut self, _ctx: &AdvisorContext<'_>) -> Option<Relaxation> {
                Some(Relaxation {
                    names: vec!["no_duplicates".to_string()],
                    rationale: "same thing again".to_string(),
                })
            }
        }

        // Coverage keeps it infeasible; the advisor never relaxes it.
        let stage = CoverageStage { slots: 3, items: 6 };
        let mut advisor = StubbornAdvisor;
        let outcome = solve_with_relaxation(
            &stage,
            &BTreeMap::new(),
            &mut advisor,
            &SolverConfig::default(),
        )
        .unwrap();
        assert!(outcome.solution.is_none());
        assert_eq!(outcome.attempts.len(), 4, "2 x catalog size bound");
    }

    #[test]
    fn test_caller_overrides_survive_every_attempt() {
        let stage = CoverageStage { slots: 3, items: 6 };
        let mut overrides = BTreeMap::new();
        overrides.insert("full_coverage".to_string(), false);
        let mut advisor = RoundRobinAdvisor::new();
        let outcome = solve_with_relaxation(
            &stage,
            &overrides,
            &mut advisor,
            &SolverConfig::default(),
        )
        .unwrap();
        assert!(outcome.solution.is_some());
        assert_eq!(outcome.attempts.len(), 1);
    }
}
