//! Orchestrator states a node can route to.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::StageName;

/// Next state of the Orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", content = "stage", rename_all = "snake_case")]
pub enum Route {
  Planner,
  Supervisor,
  Executor,
  Worker(StageName),
  Terminal,
}

impl Route {
  pub fn worker(name: impl Into<StageName>) -> Self {
    Route::Worker(name.into())
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, Route::Terminal)
  }

  pub fn stage(&self) -> Option<&StageName> {
    match self {
      Route::Worker(name) => Some(name),
      _ => None,
    }
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Route::Planner => write!(f, "planner"),
      Route::Supervisor => write!(f, "supervisor"),
      Route::Executor => write!(f, "executor"),
      Route::Worker(name) => write!(f, "{}", name),
      Route::Terminal => write!(f, "terminal"),
    }
  }
}
