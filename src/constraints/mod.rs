//! Named constraint groups and the activation map.
//!
//! Every scheduling stage declares a catalog of [`ConstraintSpec`]s: named,
//! independently togglable constraint groups with per-stage defaults. A
//! [`ConstraintSet`] is the activation map threaded through the relaxation
//! loop; each retry builds a fresh set rather than mutating the previous
//! one, so a single build/solve never sees the map change under it.
//!
//! Stages apply their groups data-driven: iterate the catalog, gate each
//! builder on [`ConstraintSet::gate`], and let the gate record the
//! applied/skipped decision in the narrative log the relaxation advisor
//! reads.

mod library;

pub use library::{
    active_entry_monotonicity, cap_each, equal_counts, frequency_window, item_count, link_entry,
    no_consecutive_identical, no_duplicates, required_coverage_hard, required_coverage_soft,
    spread, windowed_coverage, EntryVars, SpreadVars,
};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Description of one togglable constraint group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintSpec {
    /// Stable name, the key callers and the relaxation advisor use.
    pub name: &'static str,
    /// One-line description shown to the relaxation advisor.
    pub description: &'static str,
    /// Whether the group starts active.
    pub default_active: bool,
}

impl ConstraintSpec {
    /// A group that defaults to active (nearly every group does).
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            default_active: true,
        }
    }
}

/// Activation map: constraint-group name to on/off flag.
///
/// Mutated only between solve attempts, never during a build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstraintSet {
    active: BTreeMap<String, bool>,
}

impl ConstraintSet {
    /// Builds the default activation map for a stage catalog.
    pub fn from_specs(specs: &[ConstraintSpec]) -> Self {
        Self {
            active: specs
                .iter()
                .map(|s| (s.name.to_string(), s.default_active))
                .collect(),
        }
    }

    /// Applies caller overrides; names not present in the catalog are
    /// logged and ignored (omitted names keep their defaults).
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, bool>) -> Self {
        for (name, &active) in overrides {
            match self.active.get_mut(name) {
                Some(slot) => *slot = active,
                None => log::warn!("ignoring override for unknown constraint '{name}'"),
            }
        }
        self
    }

    /// Whether a group is active. Unknown names are active by default.
    pub fn is_active(&self, name: &str) -> bool {
        self.active.get(name).copied().unwrap_or(true)
    }

    /// Turns the named groups off.
    pub fn deactivate<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            if let Some(slot) = self.active.get_mut(name.as_ref()) {
                *slot = false;
            }
        }
    }

    /// Names of the groups still on, in stable order.
    pub fn active_names(&self) -> Vec<String> {
        self.active
            .iter()
            .filter(|(_, &on)| on)
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Names of the groups turned off, in stable order.
    pub fn inactive_names(&self) -> Vec<String> {
        self.active
            .iter()
            .filter(|(_, &on)| !on)
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Gate for a constraint builder: records the decision in the
    /// narrative log and tells the caller whether to apply the group.
    pub fn gate(&self, name: &str, log: &mut NarrativeLog) -> bool {
        let on = self.is_active(name);
        if on {
            log.line(format_args!("applied constraint '{name}'"));
        } else {
            log.line(format_args!("skipped constraint '{name}' (relaxed)"));
        }
        on
    }
}

/// Append-only narrative of which constraints were applied or skipped.
///
/// The narrative feeds the relaxation advisor as part of its context, so it
/// is kept separate from the `log` facade used for operational logging.
#[derive(Debug, Clone, Default)]
pub struct NarrativeLog {
    text: String,
}

impl NarrativeLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one line.
    pub fn line(&mut self, args: fmt::Arguments<'_>) {
        use fmt::Write;
        let _ = writeln!(self.text, "{args}");
    }

    /// Appends a section heading.
    pub fn section(&mut self, title: &str) {
        self.line(format_args!("== {title} =="));
    }

    /// The accumulated narrative.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for NarrativeLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> Vec<ConstraintSpec> {
        vec![
            ConstraintSpec::new("a", "first"),
            ConstraintSpec::new("b", "second"),
        ]
    }

    #[test]
    fn test_defaults_all_active() {
        let set = ConstraintSet::from_specs(&specs());
        assert!(set.is_active("a"));
        assert!(set.is_active("b"));
        assert_eq!(set.active_names(), vec!["a", "b"]);
        assert!(set.inactive_names().is_empty());
    }

    #[test]
    fn test_overrides_and_unknown_names() {
        let mut overrides = BTreeMap::new();
        overrides.insert("b".to_string(), false);
        overrides.insert("nope".to_string(), false);
        let set = ConstraintSet::from_specs(&specs()).with_overrides(&overrides);
        assert!(set.is_active("a"));
        assert!(!set.is_active("b"));
        // Unknown names are ignored, not stored.
        assert_eq!(set.active_names(), vec!["a"]);
    }

    #[test]
    fn test_deactivate() {
        let mut set = ConstraintSet::from_specs(&specs());
        set.deactivate(&["a"]);
        assert!(!set.is_active("a"));
        assert_eq!(set.inactive_names(), vec!["a"]);
    }

    #[test]
    fn test_gate_records_narrative() {
        let mut set = ConstraintSet::from_specs(&specs());
        set.deactivate(&["b"]);
        let mut log = NarrativeLog::new();
        assert!(set.gate("a", &mut log));
        assert!(!set.gate("b", &mut log));
        assert!(log.as_str().contains("applied constraint 'a'"));
        assert!(log.as_str().contains("skipped constraint 'b'"));
    }
}
