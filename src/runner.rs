//! Run entry point: validate the request, resolve the enabled stages, and drive the
//! Orchestrator from the Planner (or from a checkpoint).

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::LoopConfig;
use crate::decision_provider::DecisionProvider;
use crate::error::RunError;
use crate::orchestrator::Orchestrator;
use crate::types::{Checkpoint, Route, RunResult, RunState, StageName, StageSet};
use crate::worker_stage::StageRegistry;

/// What to run: the user's query and the stages it may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
  pub query: String,
  pub enabled_stages: Vec<StageName>,
}

impl RunRequest {
  pub fn new<I, S>(query: impl Into<String>, enabled_stages: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<StageName>,
  {
    Self {
      query: query.into(),
      enabled_stages: enabled_stages.into_iter().map(Into::into).collect(),
    }
  }
}

/// Options for [run_query].
#[derive(Default)]
pub struct RunOptions<'a> {
  /// If set, `checkpoint.json` and `execution.log.json` are rewritten here after every node.
  pub run_dir: Option<&'a Path>,
  /// If set, the run continues from this checkpoint; the request's query and stages are
  /// ignored in favour of the checkpointed state.
  pub resume_checkpoint: Option<&'a Checkpoint>,
}

/// Resolves enabled stage names against the registry. Every name needs an implementation
/// and one of them must have the synthesis role.
pub fn resolve_stages(registry: &StageRegistry, names: &[StageName]) -> Result<StageSet, RunError> {
  if names.is_empty() {
    return Err(RunError::InvalidConfig("no stages enabled".to_string()));
  }
  let mut resolved = Vec::with_capacity(names.len());
  for name in names {
    let stage = registry.get(name.as_str()).ok_or_else(|| {
      RunError::InvalidConfig(format!("stage `{}` is enabled but not registered", name))
    })?;
    resolved.push((name.clone(), stage.role()));
  }
  let set = StageSet::new(resolved);
  if set.synthesis_stage().is_none() {
    return Err(RunError::InvalidConfig(
      "no enabled stage has the synthesis role".to_string(),
    ));
  }
  Ok(set)
}

/// Runs `request` to completion and returns the final answer with its audit trail.
///
/// Fails with the first fatal error: malformed Planner/Executor decisions, unknown routes,
/// external call failures, timeouts, or the node-invocation ceiling.
#[instrument(level = "trace", skip(provider, stages, options))]
pub async fn run_query(
  provider: Arc<dyn DecisionProvider>,
  stages: StageRegistry,
  config: LoopConfig,
  request: RunRequest,
  options: RunOptions<'_>,
) -> Result<RunResult, RunError> {
  config.validate()?;

  let (state, next, invocations) = match options.resume_checkpoint {
    Some(cp) => {
      for stage in cp.state.enabled_stages.names() {
        if stages.get(stage.as_str()).is_none() {
          return Err(RunError::InvalidConfig(format!(
            "checkpoint enables stage `{}` which is not registered",
            stage
          )));
        }
      }
      info!(
        run_id = %cp.state.run_id,
        next = %cp.next,
        invocations = cp.node_invocations,
        "resuming from checkpoint"
      );
      (cp.state.clone(), cp.next.clone(), cp.node_invocations)
    }
    None => {
      let query = request.query.trim();
      if query.is_empty() {
        return Err(RunError::InvalidConfig("query is empty".to_string()));
      }
      let enabled = resolve_stages(&stages, &request.enabled_stages)?;
      (RunState::new(query, enabled), Route::Planner, 0)
    }
  };

  if next.is_terminal() {
    info!(run_id = %state.run_id, "checkpoint is already complete");
    return RunResult::from_state(state, invocations).ok_or(RunError::MissingFinalAnswer);
  }

  info!(
    run_id = %state.run_id,
    stages = ?state.enabled_stages.names(),
    "starting run"
  );
  let mut orchestrator = Orchestrator::new(provider, stages, config);
  if let Some(dir) = options.run_dir {
    orchestrator = orchestrator.with_run_dir(dir);
  }
  orchestrator.run(state, next, invocations).await
}
