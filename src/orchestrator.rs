//! Orchestrator: drives RunState through Planner, Supervisor, Executor and worker stages
//! until a stage routes to Terminal.
//!
//! Exactly one node runs at a time. After each node the update is merged, the run
//! invariants are checked, the step is recorded in the execution log and, with a run
//! directory, the checkpoint and partial log are rewritten.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::checkpoint_io::{self, CHECKPOINT_FILENAME};
use crate::config::LoopConfig;
use crate::decision_provider::DecisionProvider;
use crate::error::RunError;
use crate::execution_log_io::{self, EXECUTION_LOG_FILENAME};
use crate::nodes::{self, NodeContext};
use crate::types::{Checkpoint, ExecutionLog, ExecutionStepEntry, Route, RunResult, RunState};
use crate::worker_stage::StageRegistry;

/// Owns the collaborators of a run and the loop that ties them together.
pub struct Orchestrator {
  provider: Arc<dyn DecisionProvider>,
  stages: StageRegistry,
  config: LoopConfig,
  run_dir: Option<PathBuf>,
}

impl Orchestrator {
  pub fn new(
    provider: Arc<dyn DecisionProvider>,
    stages: StageRegistry,
    config: LoopConfig,
  ) -> Self {
    Self {
      provider,
      stages,
      config,
      run_dir: None,
    }
  }

  /// Writes `checkpoint.json` and `execution.log.json` under `dir` after every node.
  pub fn with_run_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.run_dir = Some(dir.into());
    self
  }

  /// Runs from `next` until Terminal. `invocations` is the number of nodes already run
  /// (non-zero when resuming) and counts towards `max_node_invocations`.
  #[instrument(level = "trace", skip(self, state), fields(run_id = %state.run_id))]
  pub async fn run(
    &self,
    mut state: RunState,
    mut next: Route,
    mut invocations: u32,
  ) -> Result<RunResult, RunError> {
    let mut log = ExecutionLog::new(
      state.run_id,
      state.query.clone(),
      chrono::Utc::now().to_rfc3339(),
    );
    let outcome = self
      .drive(&mut state, &mut next, &mut invocations, &mut log)
      .await;

    log.finished_at = Some(chrono::Utc::now().to_rfc3339());
    log.final_status = match &outcome {
      Ok(()) => "success".to_string(),
      Err(e) => e.to_string(),
    };
    if let Some(dir) = &self.run_dir {
      let path = dir.join(EXECUTION_LOG_FILENAME);
      if let Err(e) = execution_log_io::write_execution_log_final(&path, &log) {
        warn!(path = %path.display(), error = %e, "failed to write final execution log");
        if outcome.is_ok() {
          return Err(e.into());
        }
      }
    }

    outcome?;
    info!(run_id = %state.run_id, invocations, step = state.current_step, "run complete");
    RunResult::from_state(state, invocations).ok_or(RunError::MissingFinalAnswer)
  }

  async fn drive(
    &self,
    state: &mut RunState,
    next: &mut Route,
    invocations: &mut u32,
    log: &mut ExecutionLog,
  ) -> Result<(), RunError> {
    let ctx = NodeContext {
      provider: self.provider.as_ref(),
      stages: &self.stages,
      config: &self.config,
    };

    if let Route::Worker(stage) = &*next {
      if !state.enabled_stages.contains(stage.as_str()) {
        return Err(RunError::UnknownRoute {
          from: "checkpoint".to_string(),
          to: stage.to_string(),
        });
      }
    }

    while !next.is_terminal() {
      if *invocations >= self.config.max_node_invocations {
        warn!(
          run_id = %state.run_id,
          limit = self.config.max_node_invocations,
          "node invocation limit reached"
        );
        return Err(RunError::StepLimitExceeded {
          limit: self.config.max_node_invocations,
        });
      }
      *invocations += 1;

      let node = next.to_string();
      let before = state.current_step;
      info!(
        run_id = %state.run_id,
        invocation = *invocations,
        node = %node,
        step = before,
        "executing node"
      );

      let command = match &*next {
        Route::Planner => nodes::plan(state, &ctx).await?,
        Route::Supervisor => nodes::supervise(state, &ctx).await?,
        Route::Executor => nodes::execute(state, &ctx).await?,
        Route::Worker(name) => nodes::run_stage(state, name, &ctx).await?,
        Route::Terminal => break,
      };

      if let Route::Worker(stage) = &command.goto {
        if !state.enabled_stages.contains(stage.as_str()) {
          return Err(RunError::UnknownRoute {
            from: node,
            to: stage.to_string(),
          });
        }
      }

      let update_keys = command.update.keys().into_iter().map(String::from).collect();
      let messages = command.update.messages.clone();
      state.apply(command.update);
      state
        .check_invariants(before, self.config.max_replans)
        .map_err(|detail| RunError::InvariantViolation {
          node: node.clone(),
          detail,
        })?;

      info!(
        run_id = %state.run_id,
        node = %node,
        goto = %command.goto,
        step = state.current_step,
        "node routed"
      );
      log.steps.push(ExecutionStepEntry {
        invocation: *invocations,
        node,
        next: command.goto.to_string(),
        current_step_before: before,
        current_step_after: state.current_step,
        replan_total: state.replan_attempts.total,
        update_keys,
        messages,
      });
      *next = command.goto;

      if let Some(dir) = &self.run_dir {
        let checkpoint = Checkpoint {
          state: state.clone(),
          next: next.clone(),
          node_invocations: *invocations,
        };
        checkpoint_io::save_checkpoint(&dir.join(CHECKPOINT_FILENAME), &checkpoint)?;
        execution_log_io::write_execution_log_partial(&dir.join(EXECUTION_LOG_FILENAME), log)?;
      }
    }
    Ok(())
  }
}
