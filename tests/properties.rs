//! Property tests: replan bounds and step-pointer monotonicity hold for arbitrary decision
//! sequences, and every run ends within the node-invocation ceiling.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use serde_json::{Value, json};
use stageplan::execution_log_io::{EXECUTION_LOG_FILENAME, load_execution_log};
use stageplan::scripted::{FnDecisionProvider, StaticStage};
use stageplan::{
  CallError, DecisionKind, DecisionRequest, LoopConfig, RunError, RunOptions, RunRequest,
  StageRegistry, run_query,
};

#[derive(Debug, Clone, Copy)]
enum Move {
  FollowPlan,
  Replan,
  Excursion,
}

fn move_strategy() -> impl Strategy<Value = Move> {
  prop_oneof![
    3 => Just(Move::FollowPlan),
    2 => Just(Move::Replan),
    1 => Just(Move::Excursion),
  ]
}

fn plan_with(research_steps: usize) -> String {
  let mut plan = serde_json::Map::new();
  for i in 1..=research_steps {
    plan.insert(
      i.to_string(),
      json!({"agent": "web_researcher", "action": format!("search {}", i)}),
    );
  }
  plan.insert(
    (research_steps + 1).to_string(),
    json!({"agent": "synthesizer", "action": "answer"}),
  );
  Value::Object(plan).to_string()
}

struct Script {
  moves: VecDeque<Move>,
  verdicts: VecDeque<bool>,
  research_steps: usize,
}

fn decide(script: &Mutex<Script>, request: &DecisionRequest) -> Result<String, CallError> {
  let mut script = script.lock().map_err(|e| CallError::Other(e.to_string()))?;
  Ok(match request.kind {
    DecisionKind::Plan => plan_with(script.research_steps),
    DecisionKind::Supervisor => {
      let reject = script.verdicts.pop_front().unwrap_or(false);
      json!({"needs_replan": reject, "reason": "checked"}).to_string()
    }
    DecisionKind::Executor => {
      let planned = request.context["plan_step"]["agent"]
        .as_str()
        .unwrap_or("synthesizer")
        .to_string();
      let (replan, goto) = match script.moves.pop_front().unwrap_or(Move::FollowPlan) {
        Move::FollowPlan => (false, planned),
        Move::Replan => (true, planned),
        Move::Excursion => (false, "chart_generator".to_string()),
      };
      json!({"replan": replan, "goto": goto, "reason": "r", "query": "q"}).to_string()
    }
  })
}

fn registry() -> StageRegistry {
  StageRegistry::new()
    .with(Arc::new(StaticStage::echo("web_researcher")))
    .with(Arc::new(StaticStage::echo("chart_generator")))
    .with(Arc::new(StaticStage::new("synthesizer", "answer")))
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(64))]

  #[test]
  fn bounds_hold_for_any_decision_sequence(
    moves in prop::collection::vec(move_strategy(), 0..24),
    verdicts in prop::collection::vec(any::<bool>(), 0..6),
    research_steps in 1usize..4,
    max_replans in 0u32..4,
  ) {
    let script = Arc::new(Mutex::new(Script {
      moves: moves.into_iter().collect(),
      verdicts: verdicts.into_iter().collect(),
      research_steps,
    }));
    let provider = {
      let script = script.clone();
      Arc::new(FnDecisionProvider::new(move |r: &DecisionRequest| decide(&script, r)))
    };
    let config = LoopConfig {
      max_replans,
      max_node_invocations: 48,
      ..Default::default()
    };
    let dir = tempfile::tempdir().unwrap();

    let outcome = tokio_test::block_on(run_query(
      provider,
      registry(),
      config,
      RunRequest::new("chart the bank caps", ["web_researcher", "chart_generator", "synthesizer"]),
      RunOptions { run_dir: Some(dir.path()), resume_checkpoint: None },
    ));

    match &outcome {
      Ok(result) => {
        prop_assert!(result.replan_attempts.max_step_attempts() <= max_replans);
        prop_assert!(result.node_invocations <= 48);
        prop_assert_eq!(result.final_answer.as_str(), "answer");
      }
      Err(RunError::StepLimitExceeded { limit }) => prop_assert_eq!(*limit, 48),
      Err(other) => prop_assert!(false, "unexpected error: {}", other),
    }

    let log = load_execution_log(&dir.path().join(EXECUTION_LOG_FILENAME)).unwrap();
    prop_assert!(log.steps.len() <= 48);
    for step in &log.steps {
      prop_assert!(step.current_step_after >= step.current_step_before);
    }
    for pair in log.steps.windows(2) {
      prop_assert_eq!(pair[0].current_step_after, pair[1].current_step_before);
    }
  }
}
