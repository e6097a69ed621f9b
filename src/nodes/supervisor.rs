//! Supervisor: checks a plan's structure, asks the provider for a verdict, and either
//! approves it or sends it back to the Planner.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::{NodeContext, ask};
use crate::config::LoopConfig;
use crate::decision_provider::DecisionKind;
use crate::error::RunError;
use crate::types::{
  NodeCommand, Plan, Route, RunMessage, RunState, StageRole, StageSet, StateUpdate,
  SupervisorFeedback, SupervisorVerdict,
};

static CHART_REQUEST: Lazy<Regex> = Lazy::new(|| {
  Regex::new(concat!(
    r"(?i)\b(chart(s|ed|ing)?|graph(s|ed|ing)?|plot(s|ted|ting)?",
    r"|diagram(s|med|ming)?|histograms?|visuali[sz]\w*)\b",
  ))
  .expect("chart keyword pattern is valid")
});

/// True when the query explicitly asks for a visualization.
pub fn chart_requested(query: &str) -> bool {
  CHART_REQUEST.is_match(query)
}

/// Structural statistics and rule violations of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanReport {
  pub total_steps: usize,
  pub research_steps: usize,
  pub chart_steps: usize,
  pub chart_requested: bool,
  pub ends_with_synthesis: bool,
  pub chart_before_synthesis: bool,
  pub issues: Vec<String>,
}

/// Computes a plan's statistics and flags rule violations. Pure.
pub fn inspect_plan(
  query: &str,
  plan: &Plan,
  stages: &StageSet,
  config: &LoopConfig,
) -> PlanReport {
  let mut issues = Vec::new();
  let research_steps = plan.count_role(stages, StageRole::Research);
  let chart_steps = plan.count_role(stages, StageRole::Chart);
  let requested = chart_requested(query);

  if research_steps > config.max_research_steps as usize {
    issues.push(format!(
      "{} research steps exceeds the limit of {}",
      research_steps, config.max_research_steps
    ));
  }

  let ends_with_synthesis = plan
    .last()
    .is_some_and(|s| stages.role_of(s.agent.as_str()) == StageRole::Synthesis);
  if !ends_with_synthesis {
    let name = stages
      .synthesis_stage()
      .map(|s| format!("`{}`", s))
      .unwrap_or_else(|| "a synthesis stage".to_string());
    issues.push(format!("plan does not end with {}", name));
  }

  // Only chart summaries and the synthesis step may follow a chart.
  let mut chart_before_synthesis = true;
  for (index, step) in plan.iter() {
    if stages.role_of(step.agent.as_str()) != StageRole::Chart {
      continue;
    }
    let tail_ok = plan.iter().filter(|(i, _)| *i > index).all(|(_, later)| {
      matches!(
        stages.role_of(later.agent.as_str()),
        StageRole::ChartSummary | StageRole::Synthesis
      )
    });
    if !tail_ok || !ends_with_synthesis {
      chart_before_synthesis = false;
      issues.push(format!(
        "chart step {} is not positioned right before synthesis",
        index
      ));
    }
  }
  if requested && chart_steps == 0 {
    issues.push("chart requested but no chart step is planned".to_string());
  }

  for (index, step) in plan.iter() {
    if !stages.contains(step.agent.as_str()) {
      issues.push(format!(
        "step {} uses stage `{}` which is not enabled",
        index, step.agent
      ));
    }
  }

  PlanReport {
    total_steps: plan.len(),
    research_steps,
    chart_steps,
    chart_requested: requested,
    ends_with_synthesis,
    chart_before_synthesis,
    issues,
  }
}

/// Validates the current plan and routes to the Executor (approved) or back to the Planner.
///
/// An unparsable verdict is an implicit approval. Once the replan total reaches the global
/// ceiling every plan is approved.
#[instrument(level = "trace", skip(state, ctx), fields(run_id = %state.run_id))]
pub(crate) async fn supervise(
  state: &RunState,
  ctx: &NodeContext<'_>,
) -> Result<NodeCommand, RunError> {
  let report = inspect_plan(&state.query, &state.plan, &state.enabled_stages, ctx.config);
  let total = state.replan_attempts.total;
  let context = json!({
    "query": state.query,
    "plan": state.plan,
    "stats": report,
    "enabled_stages": state.enabled_stages.describe(),
    "replan_total": total,
    "max_research_steps": ctx.config.max_research_steps,
  });
  let raw = ask(ctx, state, DecisionKind::Supervisor, context).await?;

  let mut verdict = match SupervisorVerdict::parse(&raw) {
    Ok(v) => v,
    Err(e) => {
      warn!(
        run_id = %state.run_id,
        error = %e,
        "unparsable supervisor verdict, proceeding with plan"
      );
      SupervisorVerdict::implicit_approval()
    }
  };

  if ctx.config.enforce_plan_rules && !report.issues.is_empty() && !verdict.needs_replan {
    verdict.needs_replan = true;
    verdict.reason = "plan breaks structural rules".to_string();
  }
  if verdict.needs_replan {
    for issue in &report.issues {
      if !verdict.issues.contains(issue) {
        verdict.issues.push(issue.clone());
      }
    }
  }

  if verdict.needs_replan && total >= ctx.config.global_replan_ceiling {
    warn!(
      run_id = %state.run_id,
      total,
      ceiling = ctx.config.global_replan_ceiling,
      "replan ceiling reached, force approving plan"
    );
    verdict.needs_replan = false;
    verdict.reason = format!("Force approved after {} replan attempts", total);
  }

  let message = RunMessage::new("supervisor", raw);
  if verdict.needs_replan {
    info!(run_id = %state.run_id, reason = %verdict.reason, "plan rejected");
    let update = StateUpdate {
      replan_flag: Some(true),
      supervisor_approved: Some(false),
      supervisor_feedback: Some(SupervisorFeedback {
        reason: verdict.reason,
        issues: verdict.issues,
        suggestions: verdict.suggestions,
      }),
      messages: vec![message],
      ..Default::default()
    };
    Ok(NodeCommand::new(update, Route::Planner))
  } else {
    info!(run_id = %state.run_id, reason = %verdict.reason, "plan approved");
    let update = StateUpdate {
      supervisor_approved: Some(true),
      supervisor_feedback: Some(SupervisorFeedback::default()),
      messages: vec![message],
      ..Default::default()
    };
    Ok(NodeCommand::new(update, Route::Executor))
  }
}
