//! RunState: the record threaded through every node invocation of one run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use super::{
  Plan, PlanStep, ReplanAttempts, RunMessage, StageName, StageSet, StateUpdate,
  SupervisorFeedback,
};

/// State of one run. Owned by the Orchestrator; nodes only read it and return a
/// [StateUpdate].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
  pub run_id: Uuid,
  pub query: String,
  pub enabled_stages: StageSet,
  pub plan: Plan,
  pub current_step: u32,
  pub agent_query: String,
  pub last_reason: Option<String>,
  pub replan_flag: bool,
  pub replan_attempts: ReplanAttempts,
  pub supervisor_approved: bool,
  pub supervisor_feedback: SupervisorFeedback,
  pub agent_outputs: BTreeMap<StageName, String>,
  pub final_answer: Option<String>,
  pub messages: Vec<RunMessage>,
}

impl RunState {
  /// Fresh state for `query`; the query is the first message of the trail.
  pub fn new(query: impl Into<String>, enabled_stages: StageSet) -> Self {
    let query = query.into();
    Self {
      run_id: Uuid::new_v4(),
      messages: vec![RunMessage::new("user", query.clone())],
      query,
      enabled_stages,
      plan: Plan::default(),
      current_step: 1,
      agent_query: String::new(),
      last_reason: None,
      replan_flag: false,
      replan_attempts: ReplanAttempts::default(),
      supervisor_approved: false,
      supervisor_feedback: SupervisorFeedback::default(),
      agent_outputs: BTreeMap::new(),
      final_answer: None,
    }
  }

  /// The plan entry under the step pointer, if any.
  pub fn current_plan_step(&self) -> Option<&PlanStep> {
    self.plan.get(self.current_step)
  }

  /// Last `n` messages, oldest first.
  pub fn recent_messages(&self, n: usize) -> &[RunMessage] {
    let start = self.messages.len().saturating_sub(n);
    &self.messages[start..]
  }

  /// Merges `update` into the state: scalars overwrite, messages append.
  #[instrument(level = "trace", skip(self, update))]
  pub fn apply(&mut self, update: StateUpdate) {
    if let Some(plan) = update.plan {
      self.plan = plan;
    }
    if let Some(step) = update.current_step {
      self.current_step = step;
    }
    if let Some(q) = update.agent_query {
      self.agent_query = q;
    }
    if let Some(r) = update.last_reason {
      self.last_reason = Some(r);
    }
    if let Some(f) = update.replan_flag {
      self.replan_flag = f;
    }
    if let Some(a) = update.replan_attempts {
      self.replan_attempts = a;
    }
    if let Some(a) = update.supervisor_approved {
      self.supervisor_approved = a;
    }
    if let Some(fb) = update.supervisor_feedback {
      self.supervisor_feedback = fb;
    }
    if let Some((stage, content)) = update.agent_output {
      self.agent_outputs.insert(stage, content);
    }
    if let Some(answer) = update.final_answer {
      self.final_answer = Some(answer);
    }
    self.messages.extend(update.messages);
  }

  /// Checks the run invariants after an update. `previous_step` is the pointer before it.
  pub fn check_invariants(&self, previous_step: u32, max_replans: u32) -> Result<(), String> {
    if self.current_step < previous_step {
      return Err(format!(
        "current_step moved backwards from {} to {}",
        previous_step, self.current_step
      ));
    }
    if self.current_step == 0 {
      return Err("current_step must be at least 1".to_string());
    }
    if !self.plan.is_empty() && self.current_step > self.plan.completion_step() {
      return Err(format!(
        "current_step {} is past the end of a {}-step plan",
        self.current_step,
        self.plan.len()
      ));
    }
    if let Some((step, n)) = self
      .replan_attempts
      .per_step
      .iter()
      .find(|(_, n)| **n > max_replans)
    {
      return Err(format!(
        "step {} has {} replans, above the limit of {}",
        step, n, max_replans
      ));
    }
    Ok(())
  }
}
