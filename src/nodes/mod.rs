//! Control-loop nodes: Planner, Supervisor, Executor, and worker dispatch.
//!
//! Every node reads the [RunState] and returns a [crate::types::NodeCommand]; the
//! Orchestrator applies it.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::instrument;

use crate::config::LoopConfig;
use crate::decision_provider::{DecisionKind, DecisionProvider, DecisionRequest};
use crate::error::{CallError, RunError};
use crate::types::RunState;
use crate::worker_stage::StageRegistry;

mod executor;
mod planner;
mod supervisor;
mod worker;

pub(crate) use executor::execute;
pub(crate) use planner::plan;
pub use supervisor::{PlanReport, chart_requested, inspect_plan};
pub(crate) use supervisor::supervise;
pub(crate) use worker::run_stage;

/// Collaborators and bounds shared by every node of one run.
pub(crate) struct NodeContext<'a> {
  pub provider: &'a dyn DecisionProvider,
  pub stages: &'a StageRegistry,
  pub config: &'a LoopConfig,
}

/// Awaits an external call, bounded by `timeout` when one is set.
pub(crate) async fn with_deadline<T, F>(
  target: &str,
  timeout: Option<Duration>,
  call: F,
) -> Result<T, RunError>
where
  F: Future<Output = Result<T, CallError>>,
{
  let result = match timeout {
    Some(after) => tokio::time::timeout(after, call)
      .await
      .map_err(|_| RunError::Timeout {
        target: target.to_string(),
        after,
      })?,
    None => call.await,
  };
  result.map_err(|e| RunError::external(target, e))
}

/// Sends one decision request and returns the raw reply.
#[instrument(level = "trace", skip(ctx, state, context), fields(run_id = %state.run_id))]
pub(crate) async fn ask(
  ctx: &NodeContext<'_>,
  state: &RunState,
  kind: DecisionKind,
  context: Value,
) -> Result<String, RunError> {
  let request = DecisionRequest {
    run_id: state.run_id,
    kind,
    context,
  };
  let target = format!("decision provider ({})", kind);
  with_deadline(&target, ctx.config.call_timeout(), ctx.provider.decide(&request)).await
}

/// Wraps a schema failure with the raw reply.
pub(crate) fn malformed(kind: DecisionKind, reason: impl Into<String>, raw: &str) -> RunError {
  RunError::MalformedDecision {
    kind,
    reason: reason.into(),
    raw: raw.to_string(),
  }
}
