//! The worker stage seam: research, chart, summary and synthesis implementations plug in here.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CallError;
use crate::types::{RunMessage, StageName, StageRole};

/// State slice a stage receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageInput {
  /// Instruction from the Executor.
  pub agent_query: String,
  /// The user's original request.
  pub user_query: String,
  /// Latest output of every stage that has run.
  pub agent_outputs: BTreeMap<StageName, String>,
  /// Recent audit messages, oldest first.
  pub recent_messages: Vec<RunMessage>,
}

/// What a stage produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutput {
  pub content: String,
  pub producer: String,
}

impl StageOutput {
  pub fn new(producer: impl Into<String>, content: impl Into<String>) -> Self {
    Self {
      content: content.into(),
      producer: producer.into(),
    }
  }
}

/// A unit of work the Executor can dispatch to.
#[async_trait]
pub trait WorkerStage: Send + Sync {
  fn name(&self) -> &StageName;

  fn role(&self) -> StageRole {
    StageRole::for_name(self.name().as_str())
  }

  async fn run(&self, input: StageInput) -> Result<StageOutput, CallError>;
}

/// Registered stage implementations, keyed by name.
#[derive(Clone, Default)]
pub struct StageRegistry {
  stages: BTreeMap<StageName, Arc<dyn WorkerStage>>,
}

impl StageRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `stage`, replacing any stage with the same name.
  pub fn register(&mut self, stage: Arc<dyn WorkerStage>) -> &mut Self {
    self.stages.insert(stage.name().clone(), stage);
    self
  }

  pub fn with(mut self, stage: Arc<dyn WorkerStage>) -> Self {
    self.register(stage);
    self
  }

  pub fn get(&self, name: &str) -> Option<&Arc<dyn WorkerStage>> {
    self.stages.get(&StageName::from(name))
  }

  pub fn names(&self) -> Vec<&StageName> {
    self.stages.keys().collect()
  }
}
