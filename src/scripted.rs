//! In-memory collaborators driven by queued replies or closures.
//!
//! Used for dry runs and tests: no model and no stage backend is contacted.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::decision_provider::{DecisionKind, DecisionProvider, DecisionRequest};
use crate::error::CallError;
use crate::types::{StageName, StageRole};
use crate::worker_stage::{StageInput, StageOutput, WorkerStage};

/// Replies queued per decision kind, consumed in order.
#[derive(Default)]
pub struct ScriptedDecisionProvider {
  replies: Mutex<HashMap<DecisionKind, VecDeque<String>>>,
  calls: Mutex<Vec<DecisionRequest>>,
}

impl ScriptedDecisionProvider {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queues one reply for `kind`.
  pub fn with_reply(self, kind: DecisionKind, reply: impl Into<String>) -> Self {
    self
      .replies
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .entry(kind)
      .or_default()
      .push_back(reply.into());
    self
  }

  /// Queues several replies for `kind`.
  pub fn with_replies<I, S>(self, kind: DecisionKind, replies: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    replies
      .into_iter()
      .fold(self, |provider, reply| provider.with_reply(kind, reply))
  }

  /// Every request received so far, in order.
  pub fn calls(&self) -> Vec<DecisionRequest> {
    self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }

  pub fn call_count(&self, kind: DecisionKind) -> usize {
    self
      .calls
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .iter()
      .filter(|r| r.kind == kind)
      .count()
  }
}

#[async_trait]
impl DecisionProvider for ScriptedDecisionProvider {
  async fn decide(&self, request: &DecisionRequest) -> Result<String, CallError> {
    self
      .calls
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .push(request.clone());
    self
      .replies
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .get_mut(&request.kind)
      .and_then(VecDeque::pop_front)
      .ok_or_else(|| CallError::ScriptExhausted(request.kind.to_string()))
  }
}

/// Provider backed by a closure, for replies that depend on the request context.
pub struct FnDecisionProvider<F> {
  decide: F,
  calls: AtomicU32,
}

impl<F> FnDecisionProvider<F>
where
  F: Fn(&DecisionRequest) -> Result<String, CallError> + Send + Sync,
{
  pub fn new(decide: F) -> Self {
    Self {
      decide,
      calls: AtomicU32::new(0),
    }
  }

  pub fn call_count(&self) -> u32 {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl<F> DecisionProvider for FnDecisionProvider<F>
where
  F: Fn(&DecisionRequest) -> Result<String, CallError> + Send + Sync,
{
  async fn decide(&self, request: &DecisionRequest) -> Result<String, CallError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    (self.decide)(request)
  }
}

/// Stage that answers every call with fixed content (or echoes its query when none is set).
pub struct StaticStage {
  name: StageName,
  role: StageRole,
  content: Option<String>,
  invocations: AtomicU32,
}

impl StaticStage {
  /// Stage replying with `content`; role derived from the name.
  pub fn new(name: impl Into<StageName>, content: impl Into<String>) -> Self {
    let mut stage = Self::echo(name);
    stage.content = Some(content.into());
    stage
  }

  /// Stage replying `"<name>: <agent_query>"`.
  pub fn echo(name: impl Into<StageName>) -> Self {
    let name = name.into();
    Self {
      role: StageRole::for_name(name.as_str()),
      name,
      content: None,
      invocations: AtomicU32::new(0),
    }
  }

  pub fn with_role(mut self, role: StageRole) -> Self {
    self.role = role;
    self
  }

  pub fn invocations(&self) -> u32 {
    self.invocations.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl WorkerStage for StaticStage {
  fn name(&self) -> &StageName {
    &self.name
  }

  fn role(&self) -> StageRole {
    self.role
  }

  async fn run(&self, input: StageInput) -> Result<StageOutput, CallError> {
    self.invocations.fetch_add(1, Ordering::SeqCst);
    let content = match &self.content {
      Some(c) => c.clone(),
      None => format!("{}: {}", self.name, input.agent_query),
    };
    Ok(StageOutput::new(self.name.as_str(), content))
  }
}
