//! DTOs for execution.log.json: one entry per node invocation, for debugging a run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RunMessage;

/// One recorded node invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStepEntry {
  /// 1-based invocation index.
  pub invocation: u32,
  /// Node that ran (e.g. "planner", "web_researcher").
  pub node: String,
  /// Route the node selected.
  pub next: String,
  /// Plan pointer before the update.
  pub current_step_before: u32,
  /// Plan pointer after the update.
  pub current_step_after: u32,
  /// Replan total after the update.
  pub replan_total: u32,
  /// State fields the node set.
  pub update_keys: Vec<String>,
  /// Messages the node appended.
  pub messages: Vec<RunMessage>,
}

/// Root structure for execution.log.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
  /// Log format version.
  pub version: u32,
  pub run_id: Uuid,
  pub query: String,
  /// RFC 3339 timestamp when the run started.
  pub started_at: String,
  /// RFC 3339 timestamp when the run finished (None while running).
  pub finished_at: Option<String>,
  /// "success", "running", or the error that ended the run.
  pub final_status: String,
  /// Recorded invocations in order.
  pub steps: Vec<ExecutionStepEntry>,
}

impl ExecutionLog {
  pub const VERSION: u32 = 1;

  pub fn new(run_id: Uuid, query: impl Into<String>, started_at: impl Into<String>) -> Self {
    Self {
      version: Self::VERSION,
      run_id,
      query: query.into(),
      started_at: started_at.into(),
      finished_at: None,
      final_status: "running".to_string(),
      steps: vec![],
    }
  }
}

#[cfg(test)]
mod tests {
  use super::{ExecutionLog, ExecutionStepEntry};
  use crate::types::RunMessage;
  use uuid::Uuid;

  fn entry() -> ExecutionStepEntry {
    ExecutionStepEntry {
      invocation: 3,
      node: "executor".to_string(),
      next: "web_researcher".to_string(),
      current_step_before: 1,
      current_step_after: 2,
      replan_total: 0,
      update_keys: vec!["current_step".to_string(), "messages".to_string()],
      messages: vec![RunMessage::new("executor", "{}")],
    }
  }

  #[test]
  fn execution_step_entry_serializes_to_json() {
    let json = serde_json::to_string(&entry()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["invocation"], 3);
    assert_eq!(parsed["node"], "executor");
    assert_eq!(parsed["next"], "web_researcher");
    assert_eq!(parsed["current_step_after"], 2);
    assert_eq!(parsed["messages"][0]["producer"], "executor");
  }

  #[test]
  fn new_log_is_running() {
    let id = Uuid::new_v4();
    let mut log = ExecutionLog::new(id, "q", "2026-02-14T10:00:00Z");
    log.steps.push(entry());
    let json = serde_json::to_string(&log).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["version"], 1);
    assert_eq!(parsed["final_status"], "running");
    assert!(parsed["finished_at"].is_null());
    assert_eq!(parsed["run_id"], id.to_string());
    assert_eq!(parsed["steps"].as_array().unwrap().len(), 1);
  }
}
