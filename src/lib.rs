//! # stageplan
//!
//! A bounded Plan → Supervise → Execute control loop for staged agent runs.
//!
//! ## Architecture
//!
//! A run is a single [types::RunState] driven by the [orchestrator::Orchestrator] through
//! four kinds of node (see `nodes`):
//!
//! - Planner: asks the [decision_provider::DecisionProvider] for a step plan.
//! - Supervisor: checks the plan's structure and approves it or sends it back.
//! - Executor: dispatches the current step to a [worker_stage::WorkerStage], or asks for a
//!   revision within the replan bounds.
//! - Worker stages: research, chart and synthesis implementations; the synthesis stage
//!   ends the run.
//!
//! Nodes never mutate state; they return a [types::NodeCommand] (delta plus next route) and
//! the Orchestrator applies it. Decision providers and stages are injected, either
//! command-backed ([agent_run]) or in-memory ([scripted]).

pub mod agent_run;
#[cfg(test)]
mod agent_run_test;
pub mod checkpoint_io;
#[cfg(test)]
mod checkpoint_io_test;
pub mod config;
pub mod decision_provider;
pub mod error;
pub mod execution_log_io;
pub mod nodes;
pub mod orchestrator;
pub mod runner;
pub mod scripted;
pub mod types;
pub mod worker_stage;

pub use agent_run::{CommandDecisionProvider, CommandStage};
pub use config::{DEFAULT_ENABLED_STAGES, LoopConfig};
pub use decision_provider::{DecisionKind, DecisionProvider, DecisionRequest};
pub use error::{CallError, RunError};
pub use orchestrator::Orchestrator;
pub use runner::{RunOptions, RunRequest, resolve_stages, run_query};
pub use types::{
  Checkpoint, Plan, PlanStep, Route, RunMessage, RunResult, RunState, StageName, StageRole,
};
pub use worker_stage::{StageInput, StageOutput, StageRegistry, WorkerStage};
