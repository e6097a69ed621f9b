//! Result of a completed run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Plan, ReplanAttempts, RunMessage, RunState};

/// What a successful run hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
  pub run_id: Uuid,
  pub final_answer: String,
  pub messages: Vec<RunMessage>,
  pub plan: Plan,
  /// Final value of the step pointer.
  pub total_steps: u32,
  pub replan_attempts: ReplanAttempts,
  pub node_invocations: u32,
}

impl RunResult {
  /// Builds the result from a terminal state; `None` when no final answer was produced.
  pub fn from_state(state: RunState, node_invocations: u32) -> Option<Self> {
    let final_answer = state.final_answer?;
    Some(Self {
      run_id: state.run_id,
      final_answer,
      messages: state.messages,
      plan: state.plan,
      total_steps: state.current_step,
      replan_attempts: state.replan_attempts,
      node_invocations,
    })
  }

  /// Number of messages produced by `producer`.
  pub fn messages_from(&self, producer: &str) -> usize {
    self.messages.iter().filter(|m| m.producer == producer).count()
  }
}
