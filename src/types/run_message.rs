//! One entry of the run's audit trail.

use serde::{Deserialize, Serialize};

/// Audit message: content plus the producer that appended it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMessage {
  pub content: String,
  pub producer: String,
}

impl RunMessage {
  pub fn new(producer: impl Into<String>, content: impl Into<String>) -> Self {
    Self {
      content: content.into(),
      producer: producer.into(),
    }
  }
}
