//! Control-loop configuration: bounds, windows, and deadlines.
//!
//! Layers: defaults, then an optional JSON file, then `STAGEPLAN_*` environment variables.
//! The CLI applies its flags last.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::error::RunError;
use crate::types::{CHART_GENERATOR, SYNTHESIZER, WEB_RESEARCHER};

/// Stages enabled when the caller names none.
pub const DEFAULT_ENABLED_STAGES: [&str; 3] = [WEB_RESEARCHER, CHART_GENERATOR, SYNTHESIZER];

/// Bounds and knobs of the control loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
  /// Executor-requested replans allowed per plan step.
  pub max_replans: u32,
  /// Replan total at which the Supervisor stops rejecting plans.
  pub global_replan_ceiling: u32,
  /// Research steps a plan may hold before the Supervisor flags it.
  pub max_research_steps: u32,
  /// Hard ceiling on node invocations per run.
  pub max_node_invocations: u32,
  /// Messages shown to the Executor and to stages.
  pub recent_message_window: usize,
  /// Deadline for each decision-provider and stage call; `None` waits forever.
  pub call_timeout_secs: Option<u64>,
  /// Reject plans that break local structural rules even when the provider approves them.
  pub enforce_plan_rules: bool,
}

impl Default for LoopConfig {
  fn default() -> Self {
    Self {
      max_replans: 2,
      global_replan_ceiling: 2,
      max_research_steps: 3,
      max_node_invocations: 64,
      recent_message_window: 4,
      call_timeout_secs: None,
      enforce_plan_rules: false,
    }
  }
}

impl LoopConfig {
  /// Loads a config from a JSON file; absent keys keep their defaults.
  #[instrument(level = "trace", skip(path))]
  pub fn from_json_file(path: &Path) -> Result<Self, RunError> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes)
      .map_err(|e| RunError::InvalidConfig(format!("{}: {}", path.display(), e)))
  }

  /// Applies `STAGEPLAN_*` overrides from the process environment.
  pub fn with_env(self) -> Self {
    self.with_env_from(|key| std::env::var(key).ok())
  }

  /// Applies `STAGEPLAN_*` overrides read through `lookup`. Unparsable values are ignored
  /// with a warning.
  pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
    fn parse<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
      let raw = raw?;
      match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
          warn!(key, value = %raw, "ignoring unparsable config override");
          None
        }
      }
    }

    if let Some(v) = parse("STAGEPLAN_MAX_REPLANS", lookup("STAGEPLAN_MAX_REPLANS")) {
      self.max_replans = v;
    }
    if let Some(v) = parse(
      "STAGEPLAN_GLOBAL_REPLAN_CEILING",
      lookup("STAGEPLAN_GLOBAL_REPLAN_CEILING"),
    ) {
      self.global_replan_ceiling = v;
    }
    if let Some(v) = parse(
      "STAGEPLAN_MAX_RESEARCH_STEPS",
      lookup("STAGEPLAN_MAX_RESEARCH_STEPS"),
    ) {
      self.max_research_steps = v;
    }
    if let Some(v) = parse(
      "STAGEPLAN_MAX_NODE_INVOCATIONS",
      lookup("STAGEPLAN_MAX_NODE_INVOCATIONS"),
    ) {
      self.max_node_invocations = v;
    }
    if let Some(v) = parse(
      "STAGEPLAN_RECENT_MESSAGE_WINDOW",
      lookup("STAGEPLAN_RECENT_MESSAGE_WINDOW"),
    ) {
      self.recent_message_window = v;
    }
    if let Some(v) = parse(
      "STAGEPLAN_CALL_TIMEOUT_SECS",
      lookup("STAGEPLAN_CALL_TIMEOUT_SECS"),
    ) {
      self.call_timeout_secs = Some(v);
    }
    if let Some(v) = parse(
      "STAGEPLAN_ENFORCE_PLAN_RULES",
      lookup("STAGEPLAN_ENFORCE_PLAN_RULES"),
    ) {
      self.enforce_plan_rules = v;
    }
    self
  }

  pub fn call_timeout(&self) -> Option<Duration> {
    self.call_timeout_secs.map(Duration::from_secs)
  }

  /// Rejects settings that would stall or disable the loop.
  pub fn validate(&self) -> Result<(), RunError> {
    if self.max_node_invocations == 0 {
      return Err(RunError::InvalidConfig(
        "max_node_invocations must be at least 1".to_string(),
      ));
    }
    if self.recent_message_window == 0 {
      return Err(RunError::InvalidConfig(
        "recent_message_window must be at least 1".to_string(),
      ));
    }
    if self.call_timeout_secs == Some(0) {
      return Err(RunError::InvalidConfig(
        "call_timeout_secs must be positive".to_string(),
      ));
    }
    Ok(())
  }
}
