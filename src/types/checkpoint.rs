//! Checkpoint for resumable runs.

use serde::{Deserialize, Serialize};

use super::{Route, RunState};

/// Run state plus the route the Orchestrator dispatches to next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
  pub state: RunState,
  pub next: Route,
  pub node_invocations: u32,
}
