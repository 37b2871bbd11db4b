//! DFS solver with bounds propagation and objective probing.
//!
//! # Algorithm
//!
//! The solver runs depth-first search over variable domains, interleaved
//! with a fixpoint bounds-propagation pass:
//!
//! - linear constraints tighten each variable from the residual interval;
//! - multiplication/division equalities tighten targets from corner
//!   products/quotients and fix them exactly once inputs are fixed;
//! - table constraints narrow each position to the compatible rows;
//! - half-reified constraints are enforced once every enforcement literal
//!   is fixed true, and an entailed-violated constraint with a single
//!   unfixed enforcement literal forces that literal false;
//! - a boolean disjunction with one live literal left fixes it true.
//!
//! Branching bisects the first unfixed variable, low half first; a failure
//! limit triggers a restart with a seed-shuffled variable order (limit
//! doubles each restart). Optimization runs as a sequence of probes that
//! bisect the objective interval, so convergence is logarithmic in the
//! objective range rather than linear.
//!
//! Search is deterministic for a fixed model and [`SolverConfig`].
//!
//! # Reference
//! - Rossi, van Beek, Walsh (2006), "Handbook of Constraint Programming"

use std::time::Instant;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::model::{Constraint, ConstraintKind, CpModel, Sense};
use super::solution::{CpSolution, SolveStatus};
use super::variables::{LinearExpr, Lit};

/// Solver search configuration.
///
/// One `solve` call is a blocking, atomic operation bounded by
/// `time_limit_ms` wall-clock time. `num_workers` is a resource hint kept
/// for interface parity; the search itself is single-threaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Worker-thread hint. Not a concurrency contract.
    pub num_workers: usize,
    /// Hard wall-clock ceiling in milliseconds.
    pub time_limit_ms: u64,
    /// Seed for restart shuffling; fixed seed gives deterministic search.
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            num_workers: 4,
            time_limit_ms: 10_000,
            seed: 0,
        }
    }
}

/// The integer-constraint solver.
#[derive(Debug, Clone, Default)]
pub struct CpSolver;

impl CpSolver {
    /// Creates a solver.
    pub fn new() -> Self {
        Self
    }

    /// Solves the model within the configured budget.
    pub fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let start = Instant::now();
        debug!(
            "solve '{}': {} vars, {} constraints, {} worker hint",
            model.name(),
            model.var_count(),
            model.constraint_count(),
            config.num_workers
        );

        let mut search = Search::new(model, config, start);
        let status = match &model.objective {
            None => search.solve_satisfaction(),
            Some((sense, expr)) => search.solve_optimization(*sense, &expr.clone()),
        };

        let mut solution = CpSolution::empty(status);
        solution.wall_ms = start.elapsed().as_millis() as u64;
        solution.branches = search.branches;
        solution.conflicts = search.conflicts;
        solution.restarts = search.restarts;
        if status.has_solution() {
            solution.values = search.best_values.expect("solution status without values");
            solution.objective = search.best_objective;
        }
        debug!(
            "solve '{}': {:?} in {} ms ({} branches, {} conflicts, {} restarts)",
            model.name(),
            status,
            solution.wall_ms,
            solution.branches,
            solution.conflicts,
            solution.restarts
        );
        solution
    }
}

type Bounds = Vec<(i64, i64)>;

/// Why a DFS pass stopped early.
enum Abort {
    Timeout,
    FailLimit,
    Solution,
}

enum Probe {
    Sat,
    Unsat,
    Timeout,
}

struct Search<'a> {
    model: &'a CpModel,
    deadline: Instant,
    seed: u64,
    order: Vec<usize>,
    fail_limit: u64,
    fails_since_restart: u64,
    branches: u64,
    conflicts: u64,
    restarts: u64,
    /// Objective-bound cut applied during probes: `lo <= objective <= hi`.
    cut: Option<(LinearExpr, i64, i64)>,
    /// Values of the most recent accepted solution.
    best_values: Option<Vec<i64>>,
    best_objective: Option<i64>,
    /// Candidate from the current probe, promoted on acceptance.
    probe_values: Option<Vec<i64>>,
}

impl<'a> Search<'a> {
    fn new(model: &'a CpModel, config: &SolverConfig, start: Instant) -> Self {
        Self {
            model,
            deadline: start + std::time::Duration::from_millis(config.time_limit_ms),
            seed: config.seed,
            order: (0..model.var_count()).collect(),
            fail_limit: 512,
            fails_since_restart: 0,
            branches: 0,
            conflicts: 0,
            restarts: 0,
            cut: None,
            best_values: None,
            best_objective: None,
            probe_values: None,
        }
    }

    fn initial_bounds(&self) -> Bounds {
        self.model.vars.iter().map(|v| (v.lo, v.hi)).collect()
    }

    fn solve_satisfaction(&mut self) -> SolveStatus {
        match self.probe() {
            Probe::Sat => {
                self.best_values = self.probe_values.take();
                SolveStatus::Feasible
            }
            Probe::Unsat => SolveStatus::Infeasible,
            Probe::Timeout => SolveStatus::Unknown,
        }
    }

    fn solve_optimization(&mut self, sense: Sense, objective: &LinearExpr) -> SolveStatus {
        // First probe without a cut establishes feasibility and a baseline.
        match self.probe() {
            Probe::Unsat => return SolveStatus::Infeasible,
            Probe::Timeout => return SolveStatus::Unknown,
            Probe::Sat => {}
        }
        let values = self.probe_values.take().expect("sat probe without values");
        let mut best = eval_fixed(objective, &values);
        self.best_values = Some(values);
        self.best_objective = Some(best);

        let bounds = self.initial_bounds();
        let (obj_lo, obj_hi) = expr_range_clamped(objective, &bounds);

        // Bisect the remaining objective interval; each probe either
        // improves the incumbent or shrinks the interval by half.
        let (mut lo, mut hi) = match sense {
            Sense::Maximize => (best.saturating_add(1), obj_hi),
            Sense::Minimize => (obj_lo, best.saturating_sub(1)),
        };
        while lo <= hi {
            let target = lo + (hi - lo) / 2;
            let cut = match sense {
                Sense::Maximize => (objective.clone(), target, i64::MAX),
                Sense::Minimize => (objective.clone(), i64::MIN, target),
            };
            trace!(
                "objective probe '{}': target {} in [{}, {}]",
                self.model.name(),
                target,
                lo,
                hi
            );
            self.cut = Some(cut);
            match self.probe() {
                Probe::Sat => {
                    let values = self.probe_values.take().expect("sat probe without values");
                    best = eval_fixed(objective, &values);
                    self.best_values = Some(values);
                    self.best_objective = Some(best);
                    match sense {
                        Sense::Maximize => lo = best.saturating_add(1),
                        Sense::Minimize => hi = best.saturating_sub(1),
                    }
                }
                Probe::Unsat => match sense {
                    Sense::Maximize => hi = target - 1,
                    Sense::Minimize => lo = target + 1,
                },
                Probe::Timeout => {
                    self.cut = None;
                    return SolveStatus::Feasible;
                }
            }
        }
        self.cut = None;
        SolveStatus::Optimal
    }

    /// One satisfiability probe under the current cut, restarting on the
    /// fail limit until it returns a definite answer or times out.
    fn probe(&mut self) -> Probe {
        // An inverted initial domain would otherwise read as "fixed".
        if self.model.vars.iter().any(|v| v.lo > v.hi) {
            return Probe::Unsat;
        }
        loop {
            self.fails_since_restart = 0;
            let bounds = self.initial_bounds();
            match self.dfs(bounds) {
                Ok(()) => return Probe::Unsat,
                Err(Abort::Solution) => return Probe::Sat,
                Err(Abort::Timeout) => return Probe::Timeout,
                Err(Abort::FailLimit) => {
                    self.restarts += 1;
                    self.fail_limit = self.fail_limit.saturating_mul(2);
                    let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.restarts));
                    self.order.shuffle(&mut rng);
                    trace!(
                        "restart {} of '{}' (fail limit now {})",
                        self.restarts,
                        self.model.name(),
                        self.fail_limit
                    );
                }
            }
        }
    }

    fn dfs(&mut self, mut bounds: Bounds) -> Result<(), Abort> {
        if Instant::now() >= self.deadline {
            return Err(Abort::Timeout);
        }
        if !self.propagate(&mut bounds) {
            self.conflicts += 1;
            self.fails_since_restart += 1;
            if self.fails_since_restart >= self.fail_limit {
                return Err(Abort::FailLimit);
            }
            return Ok(());
        }

        let branch_var = self
            .order
            .iter()
            .copied()
            .find(|&v| bounds[v].0 < bounds[v].1);
        let Some(v) = branch_var else {
            // All fixed and propagation-consistent: a solution.
            self.probe_values = Some(bounds.iter().map(|&(lo, _)| lo).collect());
            return Err(Abort::Solution);
        };

        self.branches += 1;
        let (lo, hi) = bounds[v];
        let mid = lo + (hi - lo) / 2;

        let mut left = bounds.clone();
        left[v] = (lo, mid);
        self.dfs(left)?;

        bounds[v] = (mid + 1, hi);
        self.dfs(bounds)
    }

    /// Fixpoint propagation. Returns false on conflict.
    fn propagate(&mut self, bounds: &mut Bounds) -> bool {
        loop {
            let mut changed = false;
            if let Some((expr, lo, hi)) = self.cut.clone() {
                match propagate_linear(&expr, lo, hi, bounds) {
                    PropResult::Conflict => return false,
                    PropResult::Changed => changed = true,
                    PropResult::Stable => {}
                }
            }
            for c in &self.model.constraints {
                match apply_constraint(c, bounds) {
                    PropResult::Conflict => return false,
                    PropResult::Changed => changed = true,
                    PropResult::Stable => {}
                }
            }
            if !changed {
                return true;
            }
        }
    }
}

#[derive(PartialEq, Eq)]
enum PropResult {
    Stable,
    Changed,
    Conflict,
}

fn lit_truth(bounds: &Bounds, lit: Lit) -> Option<bool> {
    let (lo, hi) = bounds[lit.var];
    if lo == hi {
        Some((lo != 0) == lit.positive)
    } else {
        None
    }
}

fn assert_lit(bounds: &mut Bounds, lit: Lit, value: bool) -> PropResult {
    let target = i64::from(lit.positive == value);
    let (lo, hi) = bounds[lit.var];
    if lo > target || hi < target {
        return PropResult::Conflict;
    }
    if lo == hi {
        return PropResult::Stable;
    }
    bounds[lit.var] = (target, target);
    PropResult::Changed
}

fn apply_constraint(c: &Constraint, bounds: &mut Bounds) -> PropResult {
    let mut unfixed: Option<Lit> = None;
    let mut unfixed_count = 0usize;
    for &lit in &c.enforce {
        match lit_truth(bounds, lit) {
            Some(true) => {}
            Some(false) => return PropResult::Stable, // dropped
            None => {
                unfixed = Some(lit);
                unfixed_count += 1;
            }
        }
    }
    if unfixed_count == 0 {
        return enforce_kind(&c.kind, bounds);
    }
    // Pending gate: an entailed-violated body with a single undecided
    // enforcement literal forces that literal false.
    if unfixed_count == 1 && entailed_violated(&c.kind, bounds) {
        return assert_lit(bounds, unfixed.expect("counted literal"), false);
    }
    PropResult::Stable
}

fn enforce_kind(kind: &ConstraintKind, bounds: &mut Bounds) -> PropResult {
    match kind {
        ConstraintKind::Linear { expr, lo, hi } => propagate_linear(expr, *lo, *hi, bounds),
        ConstraintKind::NotEqual { expr } => propagate_not_equal(expr, bounds),
        ConstraintKind::Mul { target, a, b } => {
            propagate_mul(target.index(), a.index(), b.index(), bounds)
        }
        ConstraintKind::Div { target, num, den } => {
            propagate_div(target.index(), num.index(), den.index(), bounds)
        }
        ConstraintKind::Table { vars, tuples } => propagate_table(vars, tuples, bounds),
        ConstraintKind::BoolOr { lits } => propagate_bool_or(lits, bounds),
    }
}

fn entailed_violated(kind: &ConstraintKind, bounds: &Bounds) -> bool {
    match kind {
        ConstraintKind::Linear { expr, lo, hi } => {
            let (elo, ehi) = expr_range(expr, bounds);
            elo > widen(*hi) || ehi < widen(*lo)
        }
        ConstraintKind::NotEqual { expr } => {
            let (elo, ehi) = expr_range(expr, bounds);
            elo == 0 && ehi == 0
        }
        ConstraintKind::Mul { target, a, b } => {
            let (plo, phi) = product_range(bounds[a.index()], bounds[b.index()]);
            let (tlo, thi) = bounds[target.index()];
            phi < tlo as i128 || plo > thi as i128
        }
        ConstraintKind::Div { target, num, den } => {
            let (qlo, qhi) = quotient_range(bounds[num.index()], bounds[den.index()]);
            let (tlo, thi) = bounds[target.index()];
            qhi < tlo || qlo > thi
        }
        ConstraintKind::Table { vars, tuples } => !tuples
            .iter()
            .any(|t| tuple_compatible(t, vars, bounds)),
        ConstraintKind::BoolOr { lits } => lits
            .iter()
            .all(|&l| lit_truth(bounds, l) == Some(false)),
    }
}

/// Maps the i64 sentinel bounds used by `add_le`/`add_ge` into a wider
/// range so interval arithmetic cannot overflow.
fn widen(v: i64) -> i128 {
    if v == i64::MIN {
        i128::MIN / 4
    } else if v == i64::MAX {
        i128::MAX / 4
    } else {
        v as i128
    }
}

fn expr_range(expr: &LinearExpr, bounds: &Bounds) -> (i128, i128) {
    let mut lo = expr.constant as i128;
    let mut hi = lo;
    for &(c, v) in &expr.terms {
        let (vlo, vhi) = bounds[v];
        let a = c as i128 * vlo as i128;
        let b = c as i128 * vhi as i128;
        lo += a.min(b);
        hi += a.max(b);
    }
    (lo, hi)
}

fn expr_range_clamped(expr: &LinearExpr, bounds: &Bounds) -> (i64, i64) {
    let (lo, hi) = expr_range(expr, bounds);
    (
        lo.clamp(i64::MIN as i128 / 4, i64::MAX as i128 / 4) as i64,
        hi.clamp(i64::MIN as i128 / 4, i64::MAX as i128 / 4) as i64,
    )
}

fn eval_fixed(expr: &LinearExpr, values: &[i64]) -> i64 {
    let mut total = expr.constant;
    for &(c, v) in &expr.terms {
        total += c * values[v];
    }
    total
}

fn div_floor(a: i128, b: i128) -> i128 {
    let q = a / b;
    if a % b != 0 && (a < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

fn div_ceil(a: i128, b: i128) -> i128 {
    let q = a / b;
    if a % b != 0 && (a < 0) == (b < 0) {
        q + 1
    } else {
        q
    }
}

fn clamp_i64(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

fn tighten(bounds: &mut Bounds, var: usize, lo: i64, hi: i64) -> PropResult {
    let (old_lo, old_hi) = bounds[var];
    let new_lo = old_lo.max(lo);
    let new_hi = old_hi.min(hi);
    if new_lo > new_hi {
        return PropResult::Conflict;
    }
    if new_lo == old_lo && new_hi == old_hi {
        return PropResult::Stable;
    }
    bounds[var] = (new_lo, new_hi);
    PropResult::Changed
}

fn merge(acc: &mut PropResult, step: PropResult) -> bool {
    match step {
        PropResult::Conflict => true,
        PropResult::Changed => {
            *acc = PropResult::Changed;
            false
        }
        PropResult::Stable => false,
    }
}

fn propagate_linear(expr: &LinearExpr, lo: i64, hi: i64, bounds: &mut Bounds) -> PropResult {
    let clo = widen(lo);
    let chi = widen(hi);
    let (total_lo, total_hi) = expr_range(expr, bounds);
    if total_lo > chi || total_hi < clo {
        return PropResult::Conflict;
    }
    let mut result = PropResult::Stable;
    for &(c, v) in &expr.terms {
        if c == 0 {
            continue;
        }
        let (vlo, vhi) = bounds[v];
        let a = c as i128 * vlo as i128;
        let b = c as i128 * vhi as i128;
        let (term_lo, term_hi) = (a.min(b), a.max(b));
        let rest_lo = total_lo - term_lo;
        let rest_hi = total_hi - term_hi;
        // c*v must lie in [clo - rest_hi, chi - rest_lo].
        let t_lo = clo - rest_hi;
        let t_hi = chi - rest_lo;
        let (x_lo, x_hi) = if c > 0 {
            (div_ceil(t_lo, c as i128), div_floor(t_hi, c as i128))
        } else {
            (div_ceil(t_hi, c as i128), div_floor(t_lo, c as i128))
        };
        if merge(
            &mut result,
            tighten(bounds, v, clamp_i64(x_lo), clamp_i64(x_hi)),
        ) {
            return PropResult::Conflict;
        }
    }
    result
}

fn propagate_not_equal(expr: &LinearExpr, bounds: &mut Bounds) -> PropResult {
    let (lo, hi) = expr_range(expr, bounds);
    if lo == 0 && hi == 0 {
        return PropResult::Conflict;
    }
    // Bound-shaving only for a single unit-coefficient term; wider cases
    // are checked once fixed.
    if expr.terms.len() == 1 {
        let (c, v) = expr.terms[0];
        if (c == 1 || c == -1) && expr.constant % c == 0 {
            let forbidden = -expr.constant / c;
            let (vlo, vhi) = bounds[v];
            if vlo == vhi {
                return PropResult::Stable; // fixed and != forbidden, checked above
            }
            if vlo == forbidden {
                return tighten(bounds, v, vlo + 1, vhi);
            }
            if vhi == forbidden {
                return tighten(bounds, v, vlo, vhi - 1);
            }
        }
    }
    PropResult::Stable
}

fn product_range((alo, ahi): (i64, i64), (blo, bhi): (i64, i64)) -> (i128, i128) {
    let corners = [
        alo as i128 * blo as i128,
        alo as i128 * bhi as i128,
        ahi as i128 * blo as i128,
        ahi as i128 * bhi as i128,
    ];
    (
        *corners.iter().min().expect("nonempty"),
        *corners.iter().max().expect("nonempty"),
    )
}

fn propagate_mul(target: usize, a: usize, b: usize, bounds: &mut Bounds) -> PropResult {
    let (plo, phi) = product_range(bounds[a], bounds[b]);
    let mut result = tighten(bounds, target, clamp_i64(plo), clamp_i64(phi));
    if result == PropResult::Conflict {
        return PropResult::Conflict;
    }
    let (alo, ahi) = bounds[a];
    let (blo, bhi) = bounds[b];
    let (tlo, thi) = bounds[target];
    // Inverse propagation once the target and one factor are fixed.
    if tlo == thi {
        if alo == ahi && alo != 0 {
            if tlo % alo != 0 {
                return PropResult::Conflict;
            }
            let q = tlo / alo;
            if merge(&mut result, tighten(bounds, b, q, q)) {
                return PropResult::Conflict;
            }
        }
        if blo == bhi && blo != 0 {
            if tlo % blo != 0 {
                return PropResult::Conflict;
            }
            let q = tlo / blo;
            if merge(&mut result, tighten(bounds, a, q, q)) {
                return PropResult::Conflict;
            }
        }
        if alo == ahi && alo == 0 && tlo != 0 {
            return PropResult::Conflict;
        }
        if blo == bhi && blo == 0 && tlo != 0 {
            return PropResult::Conflict;
        }
    }
    result
}

/// Quotient interval for truncating division with a strictly positive
/// divisor; truncation is monotone in the numerator, so corner evaluation
/// is exact on the hull.
fn quotient_range((nlo, nhi): (i64, i64), (dlo, dhi): (i64, i64)) -> (i64, i64) {
    debug_assert!(dlo >= 1);
    let corners = [nlo / dlo, nlo / dhi, nhi / dlo, nhi / dhi];
    (
        *corners.iter().min().expect("nonempty"),
        *corners.iter().max().expect("nonempty"),
    )
}

fn propagate_div(target: usize, num: usize, den: usize, bounds: &mut Bounds) -> PropResult {
    let (qlo, qhi) = quotient_range(bounds[num], bounds[den]);
    tighten(bounds, target, qlo, qhi)
}

fn tuple_compatible(tuple: &[i64], vars: &[super::variables::IntVar], bounds: &Bounds) -> bool {
    tuple.iter().zip(vars).all(|(&val, var)| {
        let (lo, hi) = bounds[var.index()];
        lo <= val && val <= hi
    })
}

fn propagate_table(
    vars: &[super::variables::IntVar],
    tuples: &[Vec<i64>],
    bounds: &mut Bounds,
) -> PropResult {
    let mut mins = vec![i64::MAX; vars.len()];
    let mut maxs = vec![i64::MIN; vars.len()];
    let mut any = false;
    for t in tuples {
        if tuple_compatible(t, vars, bounds) {
            any = true;
            for (i, &val) in t.iter().enumerate() {
                mins[i] = mins[i].min(val);
                maxs[i] = maxs[i].max(val);
            }
        }
    }
    if !any {
        return PropResult::Conflict;
    }
    let mut result = PropResult::Stable;
    for (i, var) in vars.iter().enumerate() {
        if merge(&mut result, tighten(bounds, var.index(), mins[i], maxs[i])) {
            return PropResult::Conflict;
        }
    }
    result
}

fn propagate_bool_or(lits: &[Lit], bounds: &mut Bounds) -> PropResult {
    let mut last_unfixed: Option<Lit> = None;
    let mut unfixed = 0usize;
    for &lit in lits {
        match lit_truth(bounds, lit) {
            Some(true) => return PropResult::Stable,
            Some(false) => {}
            None => {
                last_unfixed = Some(lit);
                unfixed += 1;
            }
        }
    }
    match unfixed {
        0 => PropResult::Conflict,
        1 => assert_lit(bounds, last_unfixed.expect("counted literal"), true),
        _ => PropResult::Stable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::CpModel;

    fn solve(model: &CpModel) -> CpSolution {
        CpSolver::new().solve(model, &SolverConfig::default())
    }

    #[test]
    fn test_satisfaction_basic() {
        let mut m = CpModel::new("sat");
        let x = m.new_int_var(1, 10, "x");
        m.add_le(x, 5);
        let s = solve(&m);
        assert_eq!(s.status, SolveStatus::Feasible);
        assert!(s.value(x) >= 1 && s.value(x) <= 5);
    }

    #[test]
    fn test_infeasible() {
        let mut m = CpModel::new("unsat");
        let x = m.new_int_var(1, 3, "x");
        m.add_ge(x, 10);
        let s = solve(&m);
        assert_eq!(s.status, SolveStatus::Infeasible);
        assert!(!s.has_solution());
    }

    #[test]
    fn test_maximize() {
        let mut m = CpModel::new("max");
        let x = m.new_int_var(0, 5, "x");
        let y = m.new_int_var(0, 5, "y");
        m.add_le(LinearExpr::sum(&[x, y]), 7);
        m.maximize(LinearExpr::new().term(x, 2).term(y, 1));
        let s = solve(&m);
        assert_eq!(s.status, SolveStatus::Optimal);
        // x is worth double: x=5, y=2.
        assert_eq!(s.value(x), 5);
        assert_eq!(s.value(y), 2);
        assert_eq!(s.objective, Some(12));
    }

    #[test]
    fn test_minimize_with_lower_bound() {
        let mut m = CpModel::new("min");
        let x = m.new_int_var(0, 100, "x");
        m.add_ge(x, 37);
        m.minimize(x);
        let s = solve(&m);
        assert_eq!(s.status, SolveStatus::Optimal);
        assert_eq!(s.value(x), 37);
        assert_eq!(s.objective, Some(37));
    }

    #[test]
    fn test_multiplication_equality() {
        let mut m = CpModel::new("mul");
        let a = m.new_int_var(2, 9, "a");
        let b = m.new_int_var(2, 9, "b");
        let t = m.new_int_var(0, 100, "t");
        m.add_multiplication_equality(t, a, b);
        m.add_eq(a, 6);
        m.add_eq(b, 7);
        let s = solve(&m);
        assert!(s.has_solution());
        assert_eq!(s.value(t), 42);
    }

    #[test]
    fn test_division_truncates() {
        let mut m = CpModel::new("div");
        let n = m.new_int_var(7, 7, "n");
        let d = m.new_int_var(2, 2, "d");
        let q = m.new_int_var(0, 100, "q");
        m.add_division_equality(q, n, d).unwrap();
        let s = solve(&m);
        assert!(s.has_solution());
        assert_eq!(s.value(q), 3);
    }

    #[test]
    fn test_reified_equality_pair() {
        // b <=> (x == 3), expressed as the paired half-reifications.
        let mut m = CpModel::new("reif");
        let x = m.new_int_var(0, 5, "x");
        let b = m.new_bool_var("b");
        m.add_eq(x, 3).only_enforce_if(&[b.lit()]);
        m.add_ne(x, 3).only_enforce_if(&[b.negated()]);

        m.add_eq(x, 3);
        let s = solve(&m);
        assert!(s.has_solution());
        assert!(s.bool_value(b));

        let mut m2 = CpModel::new("reif2");
        let x2 = m2.new_int_var(0, 5, "x");
        let b2 = m2.new_bool_var("b");
        m2.add_eq(x2, 3).only_enforce_if(&[b2.lit()]);
        m2.add_ne(x2, 3).only_enforce_if(&[b2.negated()]);
        m2.add_eq(x2, 4);
        let s2 = solve(&m2);
        assert!(s2.has_solution());
        assert!(!s2.bool_value(b2));
    }

    #[test]
    fn test_allowed_assignments() {
        let mut m = CpModel::new("table");
        let x = m.new_int_var(0, 10, "x");
        let y = m.new_int_var(0, 10, "y");
        m.add_allowed_assignments(vec![x, y], vec![vec![2, 8], vec![4, 6], vec![9, 1]])
            .unwrap();
        m.add_ge(x, 5);
        let s = solve(&m);
        assert!(s.has_solution());
        assert_eq!((s.value(x), s.value(y)), (9, 1));
    }

    #[test]
    fn test_bool_or_unit_propagation() {
        let mut m = CpModel::new("or");
        let a = m.new_bool_var("a");
        let b = m.new_bool_var("b");
        m.add_bool_or(vec![a.lit(), b.lit()]);
        m.add_eq(a.as_int(), 0);
        let s = solve(&m);
        assert!(s.has_solution());
        assert!(s.bool_value(b));
    }

    #[test]
    fn test_not_equal() {
        let mut m = CpModel::new("ne");
        let x = m.new_int_var(0, 1, "x");
        let y = m.new_int_var(0, 1, "y");
        m.add_ne(x, y);
        m.add_eq(x, 1);
        let s = solve(&m);
        assert!(s.has_solution());
        assert_eq!(s.value(y), 0);
    }

    #[test]
    fn test_deterministic_replay() {
        let build = || {
            let mut m = CpModel::new("det");
            let xs: Vec<_> = (0..6).map(|i| m.new_int_var(0, 6, format!("x{i}"))).collect();
            for w in xs.windows(2) {
                m.add_ne(w[0], w[1]);
            }
            m.maximize(LinearExpr::sum(&xs));
            (m, xs)
        };
        let (m1, xs1) = build();
        let (m2, xs2) = build();
        let s1 = solve(&m1);
        let s2 = solve(&m2);
        assert_eq!(s1.status, s2.status);
        for (a, b) in xs1.iter().zip(&xs2) {
            assert_eq!(s1.value(*a), s2.value(*b));
        }
    }

    #[test]
    fn test_empty_domain_is_infeasible() {
        let mut m = CpModel::new("empty");
        let _x = m.new_int_var(5, 2, "x");
        let s = solve(&m);
        assert_eq!(s.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_implication() {
        let mut m = CpModel::new("imp");
        let a = m.new_bool_var("a");
        let b = m.new_bool_var("b");
        m.add_implication(a.lit(), b.lit());
        m.add_eq(a.as_int(), 1);
        let s = solve(&m);
        assert!(s.has_solution());
        assert!(s.bool_value(b));
    }
}
