//! Bounded retry accounting for plan revisions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Replan counters: per step (Executor-requested) and in total (every Planner revision).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplanAttempts {
  pub per_step: BTreeMap<u32, u32>,
  pub total: u32,
}

impl ReplanAttempts {
  pub fn for_step(&self, step: u32) -> u32 {
    self.per_step.get(&step).copied().unwrap_or(0)
  }

  /// Returns a copy with the counter for `step` incremented.
  pub fn with_step_attempt(&self, step: u32) -> Self {
    let mut next = self.clone();
    *next.per_step.entry(step).or_insert(0) += 1;
    next
  }

  /// Returns a copy with the total incremented.
  pub fn with_revision(&self) -> Self {
    let mut next = self.clone();
    next.total += 1;
    next
  }

  /// Highest per-step counter.
  pub fn max_step_attempts(&self) -> u32 {
    self.per_step.values().copied().max().unwrap_or(0)
  }
}
