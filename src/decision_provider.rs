//! The decision provider seam: every model call of the control loop goes through here.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::CallError;

/// Which of the three decision schemas a request expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
  /// A Plan mapping (`{"1": {"agent", "action"}, ...}`).
  Plan,
  /// An executor route (`{replan, goto, reason, query}`).
  Executor,
  /// A supervisor verdict (`{needs_replan, reason, issues, suggestions}`).
  Supervisor,
}

impl fmt::Display for DecisionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DecisionKind::Plan => write!(f, "plan"),
      DecisionKind::Executor => write!(f, "executor"),
      DecisionKind::Supervisor => write!(f, "supervisor"),
    }
  }
}

/// Request handed to a [DecisionProvider]. `context` carries the structured facts the caller
/// needs judged; turning them into a prompt is the provider's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
  pub run_id: Uuid,
  pub kind: DecisionKind,
  pub context: Value,
}

/// Produces decisions for the Planner, Supervisor and Executor.
///
/// Returns the raw reply text; the calling node validates it against the schema for
/// `request.kind`, so a malformed reply can be reported verbatim.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
  async fn decide(&self, request: &DecisionRequest) -> Result<String, CallError>;
}
