//! Tests for command-backed collaborators.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::agent_run::{CommandDecisionProvider, CommandStage, run_command};
use crate::decision_provider::{DecisionKind, DecisionProvider, DecisionRequest};
use crate::error::CallError;
use crate::types::StageRole;
use crate::worker_stage::{StageInput, WorkerStage};

fn input() -> StageInput {
  StageInput {
    agent_query: "find caps".to_string(),
    user_query: "bank caps".to_string(),
    agent_outputs: BTreeMap::new(),
    recent_messages: vec![],
  }
}

#[tokio::test]
async fn run_command_pipes_stdin_to_stdout() {
  let out = run_command("cat", b"hello").await.unwrap();
  assert_eq!(out, "hello\n");
}

#[tokio::test]
async fn run_command_errors() {
  assert!(matches!(
    run_command("   ", b"").await,
    Err(CallError::EmptyCommand)
  ));
  assert!(matches!(
    run_command("definitely-not-a-real-binary-xyz", b"").await,
    Err(CallError::Spawn { .. })
  ));
  assert!(matches!(
    run_command("false", b"").await,
    Err(CallError::Exit { .. })
  ));
}

#[tokio::test]
async fn decision_provider_sends_compact_request() {
  let provider = CommandDecisionProvider::new("cat");
  let request = DecisionRequest {
    run_id: Uuid::new_v4(),
    kind: DecisionKind::Executor,
    context: serde_json::json!({"current_step": 1}),
  };
  let reply = provider.decide(&request).await.unwrap();
  assert!(reply.contains(r#""kind":"executor""#));
  let echoed: DecisionRequest = serde_json::from_str(&reply).unwrap();
  assert_eq!(echoed.run_id, request.run_id);
}

#[tokio::test]
async fn stage_plain_stdout_is_content() {
  let stage = CommandStage::new("web_researcher", "cat");
  assert_eq!(stage.role(), StageRole::Research);
  let out = stage.run(input()).await.unwrap();
  assert_eq!(out.producer, "web_researcher");
  let echoed: StageInput = serde_json::from_str(&out.content).unwrap();
  assert_eq!(echoed.agent_query, "find caps");
}

#[tokio::test]
async fn stage_json_stdout_sets_producer() {
  let dir = tempfile::tempdir().unwrap();
  let script = dir.path().join("stage.sh");
  std::fs::write(
    &script,
    "cat > /dev/null\nprintf '{\"content\":\"caps found\",\"producer\":\"search_tool\"}'\n",
  )
  .unwrap();
  let stage = CommandStage::new("web_researcher", format!("sh {}", script.display()));
  let out = stage.run(input()).await.unwrap();
  assert_eq!(out.content, "caps found");
  assert_eq!(out.producer, "search_tool");
}

#[test]
fn parse_stage_arg() {
  let stage = CommandStage::parse_arg("synthesizer=sh answer.sh").unwrap();
  assert_eq!(stage.name(), "synthesizer");
  assert_eq!(stage.role(), StageRole::Synthesis);
  let custom = CommandStage::parse_arg("notes=cat")
    .unwrap()
    .with_role(StageRole::Research);
  assert_eq!(custom.role(), StageRole::Research);
  assert!(CommandStage::parse_arg("synthesizer").is_err());
  assert!(CommandStage::parse_arg("=cat").is_err());
}
