//! Checkpoint save/load under a run directory (JSON).

use std::path::Path;

use tracing::instrument;

use crate::types::Checkpoint;

/// Checkpoint filename under a run directory.
pub const CHECKPOINT_FILENAME: &str = "checkpoint.json";

fn invalid_data(e: serde_json::Error) -> std::io::Error {
  std::io::Error::new(std::io::ErrorKind::InvalidData, e)
}

/// Saves `cp` to `path` as pretty JSON, creating the parent directory if needed.
#[instrument(level = "trace", skip(path, cp), fields(run_id = %cp.state.run_id, next = %cp.next))]
pub fn save_checkpoint(path: &Path, cp: &Checkpoint) -> Result<(), std::io::Error> {
  let json = serde_json::to_string_pretty(cp).map_err(invalid_data)?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, json)
}

/// Loads a checkpoint. Missing files and invalid JSON are errors.
#[instrument(level = "trace", skip(path))]
pub fn load_checkpoint(path: &Path) -> Result<Checkpoint, std::io::Error> {
  let bytes = std::fs::read(path)?;
  serde_json::from_slice(&bytes).map_err(invalid_data)
}
