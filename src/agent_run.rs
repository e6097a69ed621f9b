//! Command-backed collaborators: a decision provider and worker stages that spawn an
//! external command, write the request as JSON to its stdin, and read the reply from stdout.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::decision_provider::{DecisionProvider, DecisionRequest};
use crate::error::CallError;
use crate::types::{StageName, StageRole};
use crate::worker_stage::{StageInput, StageOutput, WorkerStage};

/// Runs `cmd` (split on whitespace) with `input` on stdin and returns its stdout.
///
/// The child is killed if the returned future is dropped. A child that exits without
/// reading its stdin is not an error; a non-zero exit is.
#[instrument(level = "trace", skip(input), fields(bytes = input.len()))]
pub(crate) async fn run_command(cmd: &str, input: &[u8]) -> Result<String, CallError> {
  let parts: Vec<&str> = cmd.split_whitespace().collect();
  let (bin, args) = parts.split_first().ok_or(CallError::EmptyCommand)?;

  let mut child = Command::new(bin)
    .args(args)
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true)
    .spawn()
    .map_err(|source| CallError::Spawn {
      command: cmd.to_string(),
      source,
    })?;

  if let Some(mut stdin) = child.stdin.take() {
    let written = async {
      stdin.write_all(input).await?;
      stdin.write_all(b"\n").await?;
      stdin.shutdown().await
    }
    .await;
    match written {
      Ok(()) => {}
      Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
        debug!(command = cmd, "command closed stdin early");
      }
      Err(source) => {
        return Err(CallError::Io {
          command: cmd.to_string(),
          source,
        });
      }
    }
  }

  let output = child
    .wait_with_output()
    .await
    .map_err(|source| CallError::Io {
      command: cmd.to_string(),
      source,
    })?;
  if !output.status.success() {
    return Err(CallError::Exit {
      command: cmd.to_string(),
      status: output.status.to_string(),
      stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    });
  }
  String::from_utf8(output.stdout).map_err(|_| CallError::NonUtf8 {
    command: cmd.to_string(),
  })
}

/// Decision provider that asks an external command. The request is written as one line of
/// compact JSON; the trimmed stdout is the reply.
#[derive(Debug, Clone)]
pub struct CommandDecisionProvider {
  cmd: String,
}

impl CommandDecisionProvider {
  pub fn new(cmd: impl Into<String>) -> Self {
    Self { cmd: cmd.into() }
  }
}

#[async_trait]
impl DecisionProvider for CommandDecisionProvider {
  async fn decide(&self, request: &DecisionRequest) -> Result<String, CallError> {
    let body = serde_json::to_vec(request).map_err(|e| CallError::Other(e.to_string()))?;
    let reply = run_command(&self.cmd, &body).await?;
    Ok(reply.trim().to_string())
  }
}

/// Worker stage backed by an external command.
///
/// The command receives the [StageInput] as JSON. Stdout that parses as
/// `{"content", "producer"}` is used as is; anything else is the content, produced by the
/// stage itself.
#[derive(Debug, Clone)]
pub struct CommandStage {
  name: StageName,
  role: StageRole,
  cmd: String,
}

impl CommandStage {
  pub fn new(name: impl Into<StageName>, cmd: impl Into<String>) -> Self {
    let name = name.into();
    Self {
      role: StageRole::for_name(name.as_str()),
      name,
      cmd: cmd.into(),
    }
  }

  pub fn with_role(mut self, role: StageRole) -> Self {
    self.role = role;
    self
  }

  /// Parses a `NAME=CMD` pair as given on the command line.
  pub fn parse_arg(arg: &str) -> Result<Self, String> {
    let (name, cmd) = arg
      .split_once('=')
      .ok_or_else(|| format!("expected NAME=CMD, got `{}`", arg))?;
    if name.trim().is_empty() || cmd.trim().is_empty() {
      return Err(format!("expected NAME=CMD, got `{}`", arg));
    }
    Ok(Self::new(name, cmd.trim()))
  }
}

#[async_trait]
impl WorkerStage for CommandStage {
  fn name(&self) -> &StageName {
    &self.name
  }

  fn role(&self) -> StageRole {
    self.role
  }

  async fn run(&self, input: StageInput) -> Result<StageOutput, CallError> {
    let body = serde_json::to_vec(&input).map_err(|e| CallError::Other(e.to_string()))?;
    let stdout = run_command(&self.cmd, &body).await?;
    let trimmed = stdout.trim();
    match serde_json::from_str::<StageOutput>(trimmed) {
      Ok(output) => Ok(output),
      Err(_) => Ok(StageOutput::new(self.name.as_str(), trimmed)),
    }
  }
}
