//! Error types for runs and their external collaborators.

use std::time::Duration;

use thiserror::Error;

use crate::decision_provider::DecisionKind;

/// Failure of an external call (decision provider or worker stage).
#[derive(Debug, Error)]
pub enum CallError {
  #[error("command is empty")]
  EmptyCommand,
  #[error("failed to spawn `{command}`: {source}")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },
  #[error("i/o with `{command}` failed: {source}")]
  Io {
    command: String,
    #[source]
    source: std::io::Error,
  },
  #[error("`{command}` exited with {status}: {stderr}")]
  Exit {
    command: String,
    status: String,
    stderr: String,
  },
  #[error("output of `{command}` is not UTF-8")]
  NonUtf8 { command: String },
  #[error("no scripted reply left for {0}")]
  ScriptExhausted(String),
  #[error("{0}")]
  Other(String),
}

/// Why a run ended without a final answer.
#[derive(Debug, Error)]
pub enum RunError {
  /// A decision reply failed schema validation. Carries the raw reply.
  #[error("malformed {kind} decision: {reason}\nraw reply:\n{raw}")]
  MalformedDecision {
    kind: DecisionKind,
    reason: String,
    raw: String,
  },
  /// A node routed to a state outside the graph or the enabled stage set.
  #[error("{from} routed to unknown stage `{to}`")]
  UnknownRoute { from: String, to: String },
  #[error("call to {target} failed: {source}")]
  ExternalCall {
    target: String,
    #[source]
    source: CallError,
  },
  #[error("call to {target} timed out after {after:?}")]
  Timeout { target: String, after: Duration },
  #[error("run exceeded {limit} node invocations")]
  StepLimitExceeded { limit: u32 },
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),
  #[error("invariant violated after {node}: {detail}")]
  InvariantViolation { node: String, detail: String },
  #[error("run ended without a final answer")]
  MissingFinalAnswer,
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl RunError {
  pub(crate) fn external(target: impl Into<String>, source: CallError) -> Self {
    RunError::ExternalCall {
      target: target.into(),
      source,
    }
  }
}
