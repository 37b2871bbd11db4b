//! Reusable constraint builders.
//!
//! Each function posts one family of constraints over arrays of decision
//! variables and returns any auxiliary variables later passes need (spread
//! variables for secondary objectives, penalty variables for soft
//! coverage). Builders never fail: they are pure constraint declarations,
//! and infeasibility surfaces only at solve time.

use crate::cp::{BoolVar, CpModel, IntVar, LinearExpr, Lit};

/// Decision variables for one slot ("entry") in an ordered sequence.
///
/// The selector ranges over catalog indices with 0 reserved for the
/// inactive sentinel; `used[j]` is the one-hot indicator for item `j`, and
/// `active` gates whether the slot carries a real assignment.
#[derive(Debug, Clone)]
pub struct EntryVars {
    /// Catalog-index selector; 0 means inactive.
    pub selector: IntVar,
    /// Whether the slot is in use.
    pub active: BoolVar,
    /// One-hot indicators, one per catalog item (index 0 = sentinel).
    pub used: Vec<BoolVar>,
}

/// Creates one entry's selector/active/used variables and posts the
/// structural one-hot linkage:
///
/// - exactly one `used[j]` is true and it matches the selector value
///   (paired half-reifications per item);
/// - `used[0]` is the negation of `active`, so an inactive slot selects
///   the sentinel and nothing else.
///
/// The linkage is structural, not a togglable group: relaxing it would
/// make range lookups meaningless.
pub fn link_entry(model: &mut CpModel, item_count: usize, prefix: &str) -> EntryVars {
    let selector = model.new_int_var(0, item_count as i64 - 1, format!("{prefix}_selector"));
    let active = model.new_bool_var(format!("{prefix}_active"));
    let used: Vec<BoolVar> = (0..item_count)
        .map(|j| model.new_bool_var(format!("{prefix}_used_{j}")))
        .collect();

    for (j, &u) in used.iter().enumerate() {
        let j = j as i64;
        model.add_eq(selector, j).only_enforce_if(&[u.lit()]);
        model.add_ne(selector, j).only_enforce_if(&[u.negated()]);
    }
    model.add_eq(LinearExpr::bool_sum(&used), 1);
    model.add_eq(
        LinearExpr::new().term(used[0].as_int(), 1).term(active.as_int(), 1),
        1,
    );

    EntryVars {
        selector,
        active,
        used,
    }
}

/// Inactive slots must trail active ones: `active[i] >= active[i+1]`.
///
/// Symmetry breaking: placements differing only in the position of empty
/// slots collapse to one canonical form.
pub fn active_entry_monotonicity(model: &mut CpModel, actives: &[BoolVar]) {
    for w in actives.windows(2) {
        model.add_ge(w[0].as_int(), w[1].as_int());
    }
}

/// Pairwise all-different over the selectors. When `actives` is given the
/// inequality only binds between two active slots (an inactive slot
/// imposes no constraint).
pub fn no_duplicates(model: &mut CpModel, selectors: &[IntVar], actives: Option<&[BoolVar]>) {
    for i in 0..selectors.len() {
        for k in i + 1..selectors.len() {
            let c = model.add_ne(selectors[i], selectors[k]);
            if let Some(acts) = actives {
                c.only_enforce_if(&[acts[i].lit(), acts[k].lit()]);
            }
        }
    }
}

/// Adjacent slots must not select the same item, gated on both being
/// active when `actives` is given.
pub fn no_consecutive_identical(
    model: &mut CpModel,
    selectors: &[IntVar],
    actives: Option<&[BoolVar]>,
) {
    for i in 0..selectors.len().saturating_sub(1) {
        let c = model.add_ne(selectors[i], selectors[i + 1]);
        if let Some(acts) = actives {
            c.only_enforce_if(&[acts[i].lit(), acts[i + 1].lit()]);
        }
    }
}

/// "No `window` slots without the anchor item": every sliding window of
/// the given size must contain a slot selecting `anchor`, or end the
/// active sequence (the window-final slot being inactive satisfies it).
pub fn windowed_coverage(
    model: &mut CpModel,
    selectors: &[IntVar],
    actives: &[BoolVar],
    window: usize,
    anchor: i64,
    prefix: &str,
) {
    if window == 0 || selectors.len() < window {
        return;
    }
    // One reified anchor indicator per slot, shared across windows.
    let hits: Vec<BoolVar> = selectors
        .iter()
        .enumerate()
        .map(|(i, &sel)| {
            let hit = model.new_bool_var(format!("{prefix}_anchor_hit_{i}"));
            model.add_eq(sel, anchor).only_enforce_if(&[hit.lit()]);
            model.add_ne(sel, anchor).only_enforce_if(&[hit.negated()]);
            hit
        })
        .collect();

    for start in 0..=selectors.len() - window {
        let last = start + window - 1;
        let mut lits: Vec<Lit> = (start..=last).map(|i| hits[i].lit()).collect();
        lits.push(actives[last].negated());
        model.add_bool_or(lits);
    }
}

/// Hard coverage: each required item index must be selected in at least
/// one slot.
pub fn required_coverage_hard(model: &mut CpModel, entries: &[EntryVars], required: &[usize]) {
    for &item in required {
        let lits: Vec<Lit> = entries.iter().map(|e| e.used[item].lit()).collect();
        model.add_bool_or(lits);
    }
}

/// Soft coverage: returns one penalty boolean per required item, true when
/// the item is absent, for the objective to weigh against other goals.
pub fn required_coverage_soft(
    model: &mut CpModel,
    entries: &[EntryVars],
    required: &[usize],
    prefix: &str,
) -> Vec<BoolVar> {
    required
        .iter()
        .map(|&item| {
            let exists = model.new_bool_var(format!("{prefix}_exists_{item}"));
            let lits: Vec<Lit> = entries.iter().map(|e| e.used[item].lit()).collect();
            model
                .add_bool_or(lits)
                .only_enforce_if(&[exists.lit()]);
            for e in entries {
                model.add_implication(e.used[item].lit(), exists.lit());
            }
            let penalty = model.new_bool_var(format!("{prefix}_missing_{item}"));
            model.add_eq(
                LinearExpr::new()
                    .term(exists.as_int(), 1)
                    .term(penalty.as_int(), 1),
                1,
            );
            penalty
        })
        .collect()
}

/// Occurrence count of one item across the entries.
pub fn item_count(model: &mut CpModel, entries: &[EntryVars], item: usize, prefix: &str) -> IntVar {
    let count = model.new_int_var(0, entries.len() as i64, format!("{prefix}_count_{item}"));
    let indicators: Vec<BoolVar> = entries.iter().map(|e| e.used[item]).collect();
    model.add_eq(count, LinearExpr::bool_sum(&indicators));
    count
}

/// Frequency-window bounds on an occurrence count. The minimum only binds
/// when the item is used at all (a lower bound is meaningless for an item
/// the solver left out entirely); the maximum always binds. Absent bounds
/// impose no constraint.
pub fn frequency_window(
    model: &mut CpModel,
    count: IntVar,
    min: Option<i64>,
    max: Option<i64>,
    prefix: &str,
) {
    if let Some(min) = min {
        let used_at_all = model.new_bool_var(format!("{prefix}_used_at_all"));
        model.add_ge(count, 1).only_enforce_if(&[used_at_all.lit()]);
        model
            .add_le(count, 0)
            .only_enforce_if(&[used_at_all.negated()]);
        model
            .add_ge(count, min)
            .only_enforce_if(&[used_at_all.lit()]);
    }
    if let Some(max) = max {
        model.add_le(count, max);
    }
}

/// Min/max-over-active-slots auxiliaries plus their difference, for
/// spread-minimization objectives.
#[derive(Debug, Clone, Copy)]
pub struct SpreadVars {
    /// Lower envelope of the attribute over active slots.
    pub min: IntVar,
    /// Upper envelope of the attribute over active slots.
    pub max: IntVar,
    /// `max - min`, the quantity objectives minimize.
    pub spread: IntVar,
}

/// Builds spread variables for an attribute across slots. Only active
/// slots pin the envelopes; with no active slot the objective collapses
/// the spread to 0 on its own.
pub fn spread(
    model: &mut CpModel,
    values: &[IntVar],
    actives: &[BoolVar],
    prefix: &str,
) -> SpreadVars {
    let lo = values.iter().map(|&v| model.lb(v)).min().unwrap_or(0);
    let hi = values.iter().map(|&v| model.ub(v)).max().unwrap_or(0);
    let min = model.new_int_var(lo, hi, format!("{prefix}_min"));
    let max = model.new_int_var(lo, hi, format!("{prefix}_max"));
    let spread = model.new_int_var(0, hi - lo, format!("{prefix}_spread"));
    for (&v, &a) in values.iter().zip(actives) {
        model.add_le(min, v).only_enforce_if(&[a.lit()]);
        model.add_ge(max, v).only_enforce_if(&[a.lit()]);
    }
    model.add_eq(
        spread,
        LinearExpr::new().term(max, 1).term(min, -1),
    );
    SpreadVars { min, max, spread }
}

/// Forces all the given counts equal (sibling resistance components train
/// in balance).
pub fn equal_counts(model: &mut CpModel, counts: &[IntVar]) {
    for w in counts.windows(2) {
        model.add_eq(w[0], w[1]);
    }
}

/// Redundant per-element caps derived from a shared total bound: when the
/// non-negative values sum to at most `cap`, each value is at most `cap`
/// on its own. Never changes feasibility, only tightens propagation.
pub fn cap_each(model: &mut CpModel, values: &[IntVar], cap: i64) {
    for &v in values {
        if model.ub(v) > cap {
            model.add_le(v, cap);
        }
    }
}
