//! Tests for `Plan`.

use super::{Plan, PlanStep, StageRole, StageSet};

#[test]
fn parse_valid_plan() {
  let plan = Plan::parse(
    r#"{
      "1": {"agent": "web_researcher", "action": "bank market caps"},
      "2": {"agent": "synthesizer", "action": "answer"}
    }"#,
  )
  .unwrap();
  assert_eq!(plan.len(), 2);
  assert_eq!(plan.agent_at(1).unwrap(), "web_researcher");
  assert_eq!(plan.get(2).unwrap().action, "answer");
  assert_eq!(plan.last().unwrap().agent, "synthesizer");
  assert_eq!(plan.completion_step(), 3);
}

#[test]
fn parse_orders_by_index_not_key_order() {
  let plan = Plan::parse(
    r#"{"2": {"agent": "synthesizer", "action": "b"}, "1": {"agent": "web_researcher", "action": "a"}}"#,
  )
  .unwrap();
  let agents: Vec<&str> = plan.iter().map(|(_, s)| s.agent.as_str()).collect();
  assert_eq!(agents, vec!["web_researcher", "synthesizer"]);
}

#[test]
fn parse_rejects_non_json() {
  let err = Plan::parse("here is your plan: 1. research").unwrap_err();
  assert!(err.contains("not JSON"));
}

#[test]
fn parse_rejects_non_object() {
  assert!(Plan::parse(r#"[{"agent": "synthesizer", "action": "x"}]"#).is_err());
}

#[test]
fn parse_rejects_empty_plan() {
  let err = Plan::parse("{}").unwrap_err();
  assert!(err.contains("no steps"));
}

#[test]
fn parse_rejects_gaps() {
  let err = Plan::parse(
    r#"{"1": {"agent": "web_researcher", "action": "a"}, "3": {"agent": "synthesizer", "action": "b"}}"#,
  )
  .unwrap_err();
  assert!(err.contains("contiguous"));
}

#[test]
fn parse_rejects_zero_index() {
  assert!(Plan::parse(r#"{"0": {"agent": "synthesizer", "action": "b"}}"#).is_err());
}

#[test]
fn parse_rejects_non_integer_key() {
  let err = Plan::parse(r#"{"first": {"agent": "synthesizer", "action": "b"}}"#).unwrap_err();
  assert!(err.contains("not an integer"));
}

#[test]
fn parse_rejects_missing_fields() {
  let err = Plan::parse(r#"{"1": {"action": "b"}}"#).unwrap_err();
  assert!(err.contains("agent"));
  let err = Plan::parse(r#"{"1": {"agent": "synthesizer"}}"#).unwrap_err();
  assert!(err.contains("action"));
  assert!(Plan::parse(r#"{"1": {"agent": "  ", "action": "b"}}"#).is_err());
}

#[test]
fn serializes_with_string_keys() {
  let plan = Plan::from_steps([
    PlanStep::new("web_researcher", "a"),
    PlanStep::new("synthesizer", "b"),
  ]);
  let v = serde_json::to_value(&plan).unwrap();
  assert_eq!(v["1"]["agent"], "web_researcher");
  assert_eq!(v["2"]["action"], "b");
  let back: Plan = serde_json::from_value(v).unwrap();
  assert_eq!(back, plan);
}

#[test]
fn count_role_uses_stage_roles() {
  let stages = StageSet::from_names(["web_researcher", "chart_generator", "synthesizer"]);
  let plan = Plan::from_steps([
    PlanStep::new("web_researcher", "a"),
    PlanStep::new("web_researcher", "b"),
    PlanStep::new("chart_generator", "c"),
    PlanStep::new("synthesizer", "d"),
  ]);
  assert_eq!(plan.count_role(&stages, StageRole::Research), 2);
  assert_eq!(plan.count_role(&stages, StageRole::Chart), 1);
  assert_eq!(plan.count_role(&stages, StageRole::ChartSummary), 0);
}
