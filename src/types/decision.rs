//! Typed decisions returned by the decision provider (executor route, supervisor verdict).
//!
//! Plans have their own parser in [super::Plan::parse].

use serde::{Deserialize, Serialize};

/// Route name the Executor may use to ask for a revision instead of setting `replan`.
pub const PLANNER_ROUTE: &str = "planner";

/// Executor decision: `{replan, goto, reason, query}`; every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorDecision {
  pub replan: bool,
  pub goto: String,
  pub reason: String,
  pub query: String,
}

impl ExecutorDecision {
  /// Parses a raw reply. Missing or mistyped fields are rejected.
  pub fn parse(raw: &str) -> Result<Self, String> {
    let mut d: ExecutorDecision = serde_json::from_str(raw.trim()).map_err(|e| e.to_string())?;
    d.goto = d.goto.trim().to_string();
    Ok(d)
  }

  /// True when the decision asks for a new plan, either explicitly or by routing to the planner.
  pub fn wants_replan(&self) -> bool {
    self.replan || self.goto.eq_ignore_ascii_case(PLANNER_ROUTE)
  }
}

/// Supervisor verdict: `{needs_replan, reason, issues[], suggestions[]}`.
///
/// Only `needs_replan` is required; the other fields default to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorVerdict {
  pub needs_replan: bool,
  #[serde(default)]
  pub reason: String,
  #[serde(default)]
  pub issues: Vec<String>,
  #[serde(default)]
  pub suggestions: Vec<String>,
}

impl SupervisorVerdict {
  pub fn parse(raw: &str) -> Result<Self, String> {
    serde_json::from_str(raw.trim()).map_err(|e| e.to_string())
  }

  /// Verdict used when the reply cannot be parsed.
  pub fn implicit_approval() -> Self {
    Self {
      needs_replan: false,
      reason: "Could not parse supervisor response".to_string(),
      issues: vec![],
      suggestions: vec![],
    }
  }
}
