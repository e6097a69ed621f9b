//! Planner: turns the query (and revision feedback) into a fresh [Plan].

use serde_json::{Value, json};
use tracing::{info, instrument};

use super::{NodeContext, ask, chart_requested, malformed};
use crate::config::LoopConfig;
use crate::decision_provider::DecisionKind;
use crate::error::RunError;
use crate::types::{
  NodeCommand, Plan, Route, RunMessage, RunState, StageRole, StateUpdate, SupervisorFeedback,
};

/// Reason handed to the provider when revising: Supervisor feedback when present, otherwise
/// the Executor's last justification.
pub(crate) fn revision_reason(state: &RunState) -> String {
  if !state.supervisor_feedback.is_empty() {
    state.supervisor_feedback.revision_reason()
  } else {
    state.last_reason.clone().unwrap_or_default()
  }
}

/// Structural rules every plan must follow.
pub(crate) fn planning_rules(state: &RunState, config: &LoopConfig) -> Vec<String> {
  let synthesis = state
    .enabled_stages
    .synthesis_stage()
    .map(|s| s.to_string())
    .unwrap_or_else(|| "synthesis".to_string());
  let mut rules = vec![
    format!("The plan must end with the `{}` stage.", synthesis),
    format!(
      "Use at most {} research steps; combine related searches into one step.",
      config.max_research_steps
    ),
  ];
  let charts: Vec<String> = state
    .enabled_stages
    .iter()
    .filter(|s| s.role == StageRole::Chart)
    .map(|s| format!("`{}`", s.name))
    .collect();
  if !charts.is_empty() {
    rules.push(format!(
      "Include {} only if the user explicitly asks for a chart, and only as the penultimate or final step before `{}`.",
      charts.join(" or "),
      synthesis
    ));
  }
  rules
}

fn planning_context(state: &RunState, config: &LoopConfig, revising: bool) -> Value {
  let revision = if revising {
    json!({
      "reason": revision_reason(state),
      "prior_plan": state.plan,
      "current_step": state.current_step,
    })
  } else {
    Value::Null
  };
  json!({
    "query": state.query,
    "enabled_stages": state.enabled_stages.describe(),
    "rules": planning_rules(state, config),
    "chart_requested": chart_requested(&state.query),
    "revision": revision,
    "output_format": {
      "1": {"agent": "<stage name>", "action": "<instruction for the stage>"}
    },
  })
}

/// Asks the provider for a plan and replaces the current one.
///
/// A revision keeps the step pointer and counts towards the replan total; a fresh plan
/// starts at step 1. Always routes to the Supervisor.
#[instrument(level = "trace", skip(state, ctx), fields(run_id = %state.run_id))]
pub(crate) async fn plan(state: &RunState, ctx: &NodeContext<'_>) -> Result<NodeCommand, RunError> {
  let revising = state.replan_flag;
  let context = planning_context(state, ctx.config, revising);
  let raw = ask(ctx, state, DecisionKind::Plan, context).await?;
  let plan = Plan::parse(&raw).map_err(|reason| malformed(DecisionKind::Plan, reason, &raw))?;

  if revising && plan.completion_step() < state.current_step {
    return Err(malformed(
      DecisionKind::Plan,
      format!(
        "revised plan has {} steps but step {} is already in progress",
        plan.len(),
        state.current_step
      ),
      &raw,
    ));
  }

  info!(
    run_id = %state.run_id,
    steps = plan.len(),
    revising,
    "plan issued"
  );

  let mut update = StateUpdate {
    plan: Some(plan),
    replan_flag: Some(false),
    supervisor_approved: Some(false),
    supervisor_feedback: Some(SupervisorFeedback::default()),
    messages: vec![RunMessage::new(
      if revising { "replan" } else { "initial_plan" },
      raw,
    )],
    ..Default::default()
  };
  if revising {
    let attempts = state.replan_attempts.with_revision();
    info!(run_id = %state.run_id, total = attempts.total, "replan attempt");
    update.replan_attempts = Some(attempts);
  } else {
    update.current_step = Some(1);
  }
  Ok(NodeCommand::new(update, Route::Supervisor))
}
