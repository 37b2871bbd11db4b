//! Relaxation attempt bookkeeping.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Immutable record of one build/solve attempt in the relaxation loop.
///
/// Appended to an ordered history once per solve call; never mutated or
/// deleted afterwards. The relaxation advisor reads the history to pick
/// the next subset to relax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaxationAttempt {
    /// 0-based attempt index.
    pub attempt: usize,
    /// Constraint-group names turned off for this attempt.
    pub relaxed: Vec<String>,
    /// Whether the solve produced a solution.
    pub result_feasible: bool,
    /// Solved aggregate metrics, empty when infeasible.
    pub metrics: BTreeMap<String, i64>,
    /// Advisor rationale for this relaxation choice.
    pub rationale: String,
    /// Wall-clock creation time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

impl RelaxationAttempt {
    /// Creates a record stamped with the current wall clock.
    pub fn new(attempt: usize, relaxed: Vec<String>, rationale: impl Into<String>) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            attempt,
            relaxed,
            result_feasible: false,
            metrics: BTreeMap::new(),
            rationale: rationale.into(),
            timestamp_ms,
        }
    }

    /// Marks the attempt feasible with its solved metrics.
    pub fn succeeded(mut self, metrics: BTreeMap<String, i64>) -> Self {
        self.result_feasible = true;
        self.metrics = metrics;
        self
    }
}
