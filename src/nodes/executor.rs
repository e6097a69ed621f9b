//! Executor: the dispatcher. Decides, for the current step, whether to replan or which
//! stage runs next, and moves the step pointer.

use serde_json::json;
use tracing::{info, instrument, warn};

use super::{NodeContext, ask, malformed};
use crate::decision_provider::DecisionKind;
use crate::error::RunError;
use crate::types::{
  ExecutorDecision, NodeCommand, Route, RunMessage, RunState, StageName, StateUpdate,
};

/// Resolves `name` against the enabled set, or fails with `UnknownRoute`.
fn ensure_enabled(state: &RunState, name: &str) -> Result<StageName, RunError> {
  state
    .enabled_stages
    .get(name)
    .cloned()
    .ok_or_else(|| RunError::UnknownRoute {
      from: "executor".to_string(),
      to: name.to_string(),
    })
}

/// Agent planned for `step`, or the synthesis stage once the plan is exhausted.
fn planned_or_synthesis(state: &RunState, step: u32) -> Result<StageName, RunError> {
  match state.plan.agent_at(step) {
    Some(agent) => ensure_enabled(state, agent.as_str()),
    None => state
      .enabled_stages
      .synthesis_stage()
      .cloned()
      .ok_or_else(|| RunError::UnknownRoute {
        from: "executor".to_string(),
        to: "synthesis".to_string(),
      }),
  }
}

fn advance(state: &RunState) -> u32 {
  (state.current_step + 1).min(state.plan.completion_step())
}

fn dispatch(
  step: Option<u32>,
  agent_query: String,
  reason: String,
  message: String,
  goto: Route,
) -> NodeCommand {
  let update = StateUpdate {
    current_step: step,
    agent_query: Some(agent_query),
    last_reason: Some(reason),
    messages: vec![RunMessage::new("executor", message)],
    ..Default::default()
  };
  NodeCommand::new(update, goto)
}

/// Runs the planned stage right after a revision, without consulting the provider.
fn forced_dispatch(state: &RunState) -> Result<NodeCommand, RunError> {
  let stage = planned_or_synthesis(state, state.current_step)?;
  let action = state
    .current_plan_step()
    .map(|s| s.action.clone())
    .unwrap_or_else(|| state.query.clone());
  let next_step = advance(state);
  info!(
    run_id = %state.run_id,
    step = state.current_step,
    goto = %stage,
    "forced dispatch after replan"
  );
  let reason = format!("Executing revised plan step {}", state.current_step);
  let mut command = dispatch(
    Some(next_step),
    action.clone(),
    reason,
    json!({"forced": true, "goto": stage, "query": action}).to_string(),
    Route::Worker(stage),
  );
  command.update.replan_flag = Some(false);
  Ok(command)
}

/// Dispatches the current step.
///
/// With `replan_flag` set the planned agent runs unconditionally; otherwise the provider
/// decides between replanning, following the plan, and an out-of-plan excursion.
#[instrument(
  level = "trace",
  skip(state, ctx),
  fields(run_id = %state.run_id, step = state.current_step)
)]
pub(crate) async fn execute(
  state: &RunState,
  ctx: &NodeContext<'_>,
) -> Result<NodeCommand, RunError> {
  if state.replan_flag {
    return forced_dispatch(state);
  }

  let step = state.current_step;
  let context = json!({
    "query": state.query,
    "current_step": step,
    "plan_step": state.current_plan_step(),
    "replan_attempts": state.replan_attempts.for_step(step),
    "max_replans": ctx.config.max_replans,
    "enabled_stages": state.enabled_stages.describe(),
    "recent_messages": state.recent_messages(ctx.config.recent_message_window),
  });
  let raw = ask(ctx, state, DecisionKind::Executor, context).await?;
  let decision = ExecutorDecision::parse(&raw)
    .map_err(|reason| malformed(DecisionKind::Executor, reason, &raw))?;

  if decision.wants_replan() {
    let attempts = state.replan_attempts.for_step(step);
    if attempts < ctx.config.max_replans {
      info!(
        run_id = %state.run_id,
        step,
        attempt = attempts + 1,
        reason = %decision.reason,
        "executor requested replan"
      );
      let mut command = dispatch(None, decision.query, decision.reason, raw, Route::Planner);
      command.update.replan_flag = Some(true);
      command.update.replan_attempts = Some(state.replan_attempts.with_step_attempt(step));
      return Ok(command);
    }

    // The pointer lands on step + 1 while that step's stage runs now. If the next
    // deliberation stays on plan it dispatches plan[step + 1] again, so that stage runs twice.
    let stage = planned_or_synthesis(state, step + 1)?;
    let next_step = advance(state);
    warn!(
      run_id = %state.run_id,
      step,
      attempts,
      goto = %stage,
      "replan bound exhausted, moving forward"
    );
    let agent_query = state
      .plan
      .get(step + 1)
      .map(|s| s.action.clone())
      .unwrap_or(decision.query);
    return Ok(dispatch(
      Some(next_step),
      agent_query,
      decision.reason,
      raw,
      Route::Worker(stage),
    ));
  }

  let stage = ensure_enabled(state, &decision.goto)?;
  let on_plan = state.plan.agent_at(step) == Some(&stage);
  let next_step = if on_plan {
    info!(run_id = %state.run_id, step, goto = %stage, "dispatching planned stage");
    Some(advance(state))
  } else {
    warn!(
      run_id = %state.run_id,
      step,
      goto = %stage,
      planned = ?state.plan.agent_at(step).map(StageName::as_str),
      "out-of-plan excursion"
    );
    None
  };
  Ok(dispatch(
    next_step,
    decision.query,
    decision.reason,
    raw,
    Route::Worker(stage),
  ))
}
