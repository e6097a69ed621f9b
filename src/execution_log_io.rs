//! Read and write execution.log.json under a run directory.

use std::path::Path;

use tracing::instrument;

use crate::types::ExecutionLog;

/// Execution log filename under a run directory.
pub const EXECUTION_LOG_FILENAME: &str = "execution.log.json";

fn write_json(path: &Path, log: &ExecutionLog) -> Result<(), std::io::Error> {
  let json = serde_json::to_string_pretty(log)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, json)
}

/// Loads an execution log. Missing files and invalid JSON are errors.
pub fn load_execution_log(path: &Path) -> Result<ExecutionLog, std::io::Error> {
  let bytes = std::fs::read(path)?;
  serde_json::from_slice(&bytes)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Rewrites the log of an in-progress run. `finished_at` is always written as null.
#[instrument(level = "trace", skip(path, log), fields(steps = log.steps.len()))]
pub fn write_execution_log_partial(path: &Path, log: &ExecutionLog) -> Result<(), std::io::Error> {
  let partial = ExecutionLog {
    finished_at: None,
    final_status: "running".to_string(),
    ..log.clone()
  };
  write_json(path, &partial)
}

/// Writes the log of a finished run as given (`finished_at` and `final_status` set by the caller).
#[instrument(level = "trace", skip(path, log), fields(status = %log.final_status))]
pub fn write_execution_log_final(path: &Path, log: &ExecutionLog) -> Result<(), std::io::Error> {
  write_json(path, log)
}
