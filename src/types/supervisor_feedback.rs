//! Most recent Supervisor feedback, consumed by the Planner on the next revision.

use serde::{Deserialize, Serialize};

/// Supervisor feedback. The empty value means "cleared".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorFeedback {
  pub reason: String,
  pub issues: Vec<String>,
  pub suggestions: Vec<String>,
}

impl SupervisorFeedback {
  pub fn is_empty(&self) -> bool {
    self.reason.is_empty() && self.issues.is_empty() && self.suggestions.is_empty()
  }

  /// Human-readable revision reason: the reason, then the issues, then the suggestions.
  pub fn revision_reason(&self) -> String {
    let mut out = self.reason.clone();
    if !self.issues.is_empty() {
      out.push_str(&format!("\n\nIssues identified: {}", self.issues.join(", ")));
    }
    if !self.suggestions.is_empty() {
      out.push_str(&format!("\n\nSuggestions: {}", self.suggestions.join(", ")));
    }
    out
  }
}
