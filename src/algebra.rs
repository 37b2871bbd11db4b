//! Derived-quantity algebra.
//!
//! Expresses the non-linear training quantities (duration, effort, strain,
//! volume, density, performance, training weight) as chains of auxiliary
//! integer variables plus equality constraints, because the solver only
//! accepts linear, multiplicative, and divisional primitive relations.
//!
//! All quantities are pure integer arithmetic. Ratios are pre-scaled by 100
//! before division and decoded at formatting time; division truncates
//! toward zero. Intensity and base-strain enter effort as additive offsets
//! around the neutral multiplier 10 (a 1.0 factor is represented as 10, so
//! any formula that includes either term rescales its rest contribution by
//! the same factor to stay on one scale).
//!
//! None of these builders can fail at model-build time except through the
//! division-guard contract, which they uphold internally: every potentially
//! zero divisor is substituted by 1 under an is-zero indicator and the
//! quotient forced to 0 in that case.

use crate::cp::{CpModel, IntVar, LinearExpr, ModelError};

/// Neutral load sentinel for unweighted work: a nominal 1.0 load on the
/// centi-unit weight scale (`100 * 100`), keeping unweighted volume
/// comparable to weighted volume.
pub const NEUTRAL_LOAD: i64 = 100 * 100;

/// Scale factor applied to all ratio quantities before division.
pub const RATIO_SCALE: i64 = 100;

/// Neutral effort multiplier: a 1.0 factor on the tens scale.
pub const EFFORT_CENTER: i64 = 10;

fn range(model: &CpModel, v: IntVar) -> (i64, i64) {
    (model.lb(v), model.ub(v))
}

fn product_bounds(a: (i64, i64), b: (i64, i64)) -> (i64, i64) {
    let corners = [a.0 * b.0, a.0 * b.1, a.1 * b.0, a.1 * b.1];
    (
        *corners.iter().min().expect("nonempty"),
        *corners.iter().max().expect("nonempty"),
    )
}

fn mul(model: &mut CpModel, a: IntVar, b: IntVar, name: String) -> IntVar {
    let bounds = product_bounds(range(model, a), range(model, b));
    let target = model.new_int_var(bounds.0, bounds.1, name);
    model.add_multiplication_equality(target, a, b);
    target
}

/// `duration = (seconds_per_exercise * reps + 5 * rest) * sets`.
///
/// Built via two chained auxiliaries: the per-set working time
/// `seconds_per_exercise * reps`, the per-set total including rest, and the
/// final multiplication by `sets`.
pub fn duration(
    model: &mut CpModel,
    seconds_per_exercise: IntVar,
    reps: IntVar,
    rest: IntVar,
    sets: IntVar,
    prefix: &str,
) -> IntVar {
    let work = mul(model, seconds_per_exercise, reps, format!("{prefix}_set_work"));
    let (wlo, whi) = range(model, work);
    let (rlo, rhi) = range(model, rest);
    let per_set = model.new_int_var(wlo + 5 * rlo, whi + 5 * rhi, format!("{prefix}_set_total"));
    model.add_eq(
        per_set,
        LinearExpr::new().term(work, 1).term(rest, 5),
    );
    mul(model, per_set, sets, format!("{prefix}_duration"))
}

/// `working_duration = seconds_per_exercise * reps * sets`: the duration
/// formula with the rest term omitted (time under tension).
pub fn working_duration(
    model: &mut CpModel,
    seconds_per_exercise: IntVar,
    reps: IntVar,
    sets: IntVar,
    prefix: &str,
) -> IntVar {
    let work = mul(
        model,
        seconds_per_exercise,
        reps,
        format!("{prefix}_working_set"),
    );
    mul(model, work, sets, format!("{prefix}_working_duration"))
}

/// Effort formula inputs that apply only to some exercises.
#[derive(Debug, Clone, Copy, Default)]
pub struct EffortTerms {
    /// Intensity attribute variable, when the item is intensity-bearing.
    pub intensity: Option<IntVar>,
    /// Base-strain attribute variable, when the catalog declares one.
    pub base_strain: Option<IntVar>,
}

impl EffortTerms {
    fn any(&self) -> bool {
        self.intensity.is_some() || self.base_strain.is_some()
    }
}

/// `effort = (seconds_per_exercise * (10 + base_strain + intensity) * reps
/// + 5 * 10 * rest) * sets`, with each additive term present only when its
/// variable is supplied. When neither applies the formula degenerates to
/// plain [`duration`] (no ×10 rescale, the scale center stays at 1).
pub fn effort(
    model: &mut CpModel,
    seconds_per_exercise: IntVar,
    reps: IntVar,
    rest: IntVar,
    sets: IntVar,
    terms: EffortTerms,
    prefix: &str,
) -> IntVar {
    if !terms.any() {
        return duration(model, seconds_per_exercise, reps, rest, sets, prefix);
    }
    let factor = effort_factor(model, terms, prefix);
    let scaled_secs = mul(
        model,
        seconds_per_exercise,
        factor,
        format!("{prefix}_effort_secs"),
    );
    let work = mul(model, scaled_secs, reps, format!("{prefix}_effort_work"));
    let (wlo, whi) = range(model, work);
    let (rlo, rhi) = range(model, rest);
    let rest_scale = 5 * EFFORT_CENTER;
    let per_set = model.new_int_var(
        wlo + rest_scale * rlo,
        whi + rest_scale * rhi,
        format!("{prefix}_effort_set"),
    );
    model.add_eq(
        per_set,
        LinearExpr::new().term(work, 1).term(rest, rest_scale),
    );
    mul(model, per_set, sets, format!("{prefix}_effort"))
}

/// `working_effort`: the effort formula with the rest term omitted.
pub fn working_effort(
    model: &mut CpModel,
    seconds_per_exercise: IntVar,
    reps: IntVar,
    sets: IntVar,
    terms: EffortTerms,
    prefix: &str,
) -> IntVar {
    if !terms.any() {
        return working_duration(model, seconds_per_exercise, reps, sets, prefix);
    }
    let factor = effort_factor(model, terms, prefix);
    let scaled_secs = mul(
        model,
        seconds_per_exercise,
        factor,
        format!("{prefix}_weffort_secs"),
    );
    let work = mul(model, scaled_secs, reps, format!("{prefix}_weffort_work"));
    mul(model, work, sets, format!("{prefix}_working_effort"))
}

/// The common `10 + base_strain + intensity` multiplier variable.
fn effort_factor(model: &mut CpModel, terms: EffortTerms, prefix: &str) -> IntVar {
    let mut expr = LinearExpr::new().offset(EFFORT_CENTER);
    let mut lo = EFFORT_CENTER;
    let mut hi = EFFORT_CENTER;
    if let Some(i) = terms.intensity {
        expr = expr.term(i, 1);
        lo += model.lb(i);
        hi += model.ub(i);
    }
    if let Some(b) = terms.base_strain {
        expr = expr.term(b, 1);
        lo += model.lb(b);
        hi += model.ub(b);
    }
    let factor = model.new_int_var(lo, hi, format!("{prefix}_effort_factor"));
    model.add_eq(factor, expr);
    factor
}

/// Guarded scaled ratio: `100 * num / max(den, 1)`, with the quotient
/// forced to exactly 0 whenever the true divisor solves to 0.
///
/// The division primitive requires a strictly positive divisor, so the
/// divisor is substituted by 1 under an is-zero indicator; the indicator
/// then routes the target to the real quotient or to 0. This is the single
/// pattern through which every ratio (strain, density) reaches the solver.
pub fn scaled_ratio(
    model: &mut CpModel,
    num: IntVar,
    den: IntVar,
    prefix: &str,
) -> Result<IntVar, ModelError> {
    let (nlo, nhi) = range(model, num);
    let (dlo, dhi) = range(model, den);

    let den_zero = model.new_bool_var(format!("{prefix}_den_zero"));
    model.add_eq(den, 0).only_enforce_if(&[den_zero.lit()]);
    model.add_ne(den, 0).only_enforce_if(&[den_zero.negated()]);

    let safe_den = model.new_int_var(1, dhi.max(1), format!("{prefix}_safe_den"));
    model
        .add_eq(safe_den, den)
        .only_enforce_if(&[den_zero.negated()]);
    model.add_eq(safe_den, 1).only_enforce_if(&[den_zero.lit()]);
    debug_assert!(dlo >= 0, "ratio divisors are nonnegative quantities");

    let scaled = model.new_int_var(
        RATIO_SCALE * nlo.min(0),
        RATIO_SCALE * nhi.max(0),
        format!("{prefix}_scaled_num"),
    );
    model.add_eq(scaled, LinearExpr::new().term(num, RATIO_SCALE));

    let quotient = model.new_int_var(
        RATIO_SCALE * nlo.min(0),
        RATIO_SCALE * nhi.max(0),
        format!("{prefix}_quotient"),
    );
    model.add_division_equality(quotient, scaled, safe_den)?;

    let target = model.new_int_var(
        RATIO_SCALE * nlo.min(0),
        RATIO_SCALE * nhi.max(0),
        format!("{prefix}_ratio"),
    );
    model
        .add_eq(target, quotient)
        .only_enforce_if(&[den_zero.negated()]);
    model.add_eq(target, 0).only_enforce_if(&[den_zero.lit()]);
    Ok(target)
}

/// `volume = reps * sets * load`, where `load` is the training weight for
/// weighted work or the [`NEUTRAL_LOAD`] sentinel otherwise (the caller
/// supplies the already-gated load variable).
pub fn volume(model: &mut CpModel, reps: IntVar, sets: IntVar, load: IntVar, prefix: &str) -> IntVar {
    let reps_sets = mul(model, reps, sets, format!("{prefix}_reps_sets"));
    mul(model, reps_sets, load, format!("{prefix}_volume"))
}

/// `density = 100 * working_duration / max(duration, 1)` (guarded).
pub fn density(
    model: &mut CpModel,
    working_duration: IntVar,
    duration: IntVar,
    prefix: &str,
) -> Result<IntVar, ModelError> {
    scaled_ratio(model, working_duration, duration, &format!("{prefix}_density"))
}

/// `strain = 100 * working / max(base, 1)` (guarded).
pub fn strain(
    model: &mut CpModel,
    working: IntVar,
    base: IntVar,
    prefix: &str,
) -> Result<IntVar, ModelError> {
    scaled_ratio(model, working, base, &format!("{prefix}_strain"))
}

/// `performance = volume * density`.
pub fn performance(
    model: &mut CpModel,
    volume: IntVar,
    density: IntVar,
    prefix: &str,
) -> IntVar {
    mul(model, volume, density, format!("{prefix}_performance"))
}

/// `training_weight = one_rep_max * intensity / 100`, in centi-units.
///
/// `one_rep_max` is an attribute variable bound per selected exercise;
/// intensity is a percentage, so the product is scaled back down by 100 to
/// stay on the centi-unit weight scale. Membership in the discrete
/// available-weight table is the caller's constraint to add (it only
/// applies to weighted selections).
pub fn training_weight(
    model: &mut CpModel,
    one_rep_max: IntVar,
    intensity: IntVar,
    prefix: &str,
) -> Result<IntVar, ModelError> {
    let raw = mul(model, one_rep_max, intensity, format!("{prefix}_weight_raw"));
    let hundred = model.new_constant(100);
    let (rlo, rhi) = range(model, raw);
    let target = model.new_int_var(rlo / 100, rhi / 100, format!("{prefix}_training_weight"));
    model.add_division_equality(target, raw, hundred)?;
    Ok(target)
}
