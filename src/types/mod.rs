//! Control-loop types: run state, plans, decisions, routes, and run artifacts.

mod checkpoint;
mod decision;
mod execution_log;
mod node_command;
mod plan;
#[cfg(test)]
mod plan_test;
mod replan_attempts;
#[cfg(test)]
mod replan_attempts_test;
mod route;
mod run_message;
mod run_result;
mod run_state;
mod stage_name;
mod stage_set;
mod supervisor_feedback;

pub use checkpoint::Checkpoint;
pub use decision::{ExecutorDecision, PLANNER_ROUTE, SupervisorVerdict};
pub use execution_log::{ExecutionLog, ExecutionStepEntry};
pub use node_command::{NodeCommand, StateUpdate};
pub use plan::{Plan, PlanStep};
pub use replan_attempts::ReplanAttempts;
pub use route::Route;
pub use run_message::RunMessage;
pub use run_result::RunResult;
pub use run_state::RunState;
pub use stage_name::{
  CHART_GENERATOR, CHART_SUMMARIZER, CORTEX_RESEARCHER, SYNTHESIZER, StageName, StageRole,
  WEB_RESEARCHER,
};
pub use stage_set::{EnabledStage, StageSet};
pub use supervisor_feedback::SupervisorFeedback;
