//! What a node returns: a state delta plus the next route.

use super::{Plan, ReplanAttempts, Route, RunMessage, StageName, SupervisorFeedback};

/// Delta applied to [super::RunState] after a node returns.
///
/// `Some` scalars overwrite, `messages` are appended, `agent_output` is inserted into the
/// per-stage output map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
  pub plan: Option<Plan>,
  pub current_step: Option<u32>,
  pub agent_query: Option<String>,
  pub last_reason: Option<String>,
  pub replan_flag: Option<bool>,
  pub replan_attempts: Option<ReplanAttempts>,
  pub supervisor_approved: Option<bool>,
  pub supervisor_feedback: Option<SupervisorFeedback>,
  pub agent_output: Option<(StageName, String)>,
  pub final_answer: Option<String>,
  pub messages: Vec<RunMessage>,
}

impl StateUpdate {
  /// Names of the fields this update sets, for logging.
  pub fn keys(&self) -> Vec<&'static str> {
    let mut keys = Vec::new();
    if self.plan.is_some() {
      keys.push("plan");
    }
    if self.current_step.is_some() {
      keys.push("current_step");
    }
    if self.agent_query.is_some() {
      keys.push("agent_query");
    }
    if self.last_reason.is_some() {
      keys.push("last_reason");
    }
    if self.replan_flag.is_some() {
      keys.push("replan_flag");
    }
    if self.replan_attempts.is_some() {
      keys.push("replan_attempts");
    }
    if self.supervisor_approved.is_some() {
      keys.push("supervisor_approved");
    }
    if self.supervisor_feedback.is_some() {
      keys.push("supervisor_feedback");
    }
    if self.agent_output.is_some() {
      keys.push("agent_outputs");
    }
    if self.final_answer.is_some() {
      keys.push("final_answer");
    }
    if !self.messages.is_empty() {
      keys.push("messages");
    }
    keys
  }
}

/// Node result: the update to merge and where to go next.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCommand {
  pub update: StateUpdate,
  pub goto: Route,
}

impl NodeCommand {
  pub fn new(update: StateUpdate, goto: Route) -> Self {
    Self { update, goto }
  }
}
