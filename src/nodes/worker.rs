//! Worker dispatch: runs one registered stage and merges its output.

use tracing::{info, instrument};

use super::{NodeContext, with_deadline};
use crate::error::RunError;
use crate::types::{NodeCommand, Route, RunMessage, RunState, StageName, StageRole, StateUpdate};
use crate::worker_stage::StageInput;

/// Invokes stage `name` with the current `agent_query`.
///
/// The synthesis-role stage ends the run; every other stage hands control back to the
/// Executor.
#[instrument(level = "trace", skip(state, ctx), fields(run_id = %state.run_id, stage = %name))]
pub(crate) async fn run_stage(
  state: &RunState,
  name: &StageName,
  ctx: &NodeContext<'_>,
) -> Result<NodeCommand, RunError> {
  let stage = ctx
    .stages
    .get(name.as_str())
    .ok_or_else(|| RunError::UnknownRoute {
      from: "orchestrator".to_string(),
      to: name.to_string(),
    })?;

  let input = StageInput {
    agent_query: state.agent_query.clone(),
    user_query: state.query.clone(),
    agent_outputs: state.agent_outputs.clone(),
    recent_messages: state
      .recent_messages(ctx.config.recent_message_window)
      .to_vec(),
  };
  let target = format!("stage {}", name);
  let output = with_deadline(&target, ctx.config.call_timeout(), stage.run(input)).await?;

  let producer = if output.producer.trim().is_empty() {
    name.to_string()
  } else {
    output.producer
  };
  info!(
    run_id = %state.run_id,
    stage = %name,
    producer = %producer,
    bytes = output.content.len(),
    "stage finished"
  );

  let terminal = state.enabled_stages.role_of(name.as_str()) == StageRole::Synthesis;
  let update = StateUpdate {
    agent_output: Some((name.clone(), output.content.clone())),
    final_answer: terminal.then(|| output.content.clone()),
    messages: vec![RunMessage::new(producer, output.content)],
    ..Default::default()
  };
  let goto = if terminal { Route::Terminal } else { Route::Executor };
  Ok(NodeCommand::new(update, goto))
}
