//! Tests for checkpoint save/load.

use crate::checkpoint_io::{CHECKPOINT_FILENAME, load_checkpoint, save_checkpoint};
use crate::types::{Checkpoint, Plan, PlanStep, Route, RunState, StageSet};

fn checkpoint() -> Checkpoint {
  let mut state = RunState::new(
    "bank caps",
    StageSet::from_names(["web_researcher", "synthesizer"]),
  );
  state.plan = Plan::from_steps([
    PlanStep::new("web_researcher", "find caps"),
    PlanStep::new("synthesizer", "answer"),
  ]);
  state.current_step = 2;
  Checkpoint {
    state,
    next: Route::Executor,
    node_invocations: 4,
  }
}

#[test]
fn roundtrip_save_load() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("run").join(CHECKPOINT_FILENAME);
  let cp = checkpoint();
  save_checkpoint(&path, &cp).unwrap();
  assert!(path.exists());
  let loaded = load_checkpoint(&path).unwrap();
  assert_eq!(loaded, cp);
  assert_eq!(loaded.state.plan.agent_at(2).unwrap(), "synthesizer");
}

#[test]
fn load_missing_file_returns_error() {
  let dir = tempfile::tempdir().unwrap();
  let r = load_checkpoint(&dir.path().join("nonexistent.json"));
  assert_eq!(r.unwrap_err().kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn load_invalid_json_is_invalid_data() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join(CHECKPOINT_FILENAME);
  std::fs::write(&path, r#"{"state": 1}"#).unwrap();
  let r = load_checkpoint(&path);
  assert_eq!(r.unwrap_err().kind(), std::io::ErrorKind::InvalidData);
}
