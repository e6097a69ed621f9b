//! Names and roles of worker stages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Built-in web research stage.
pub const WEB_RESEARCHER: &str = "web_researcher";
/// Built-in private-data research stage.
pub const CORTEX_RESEARCHER: &str = "cortex_researcher";
/// Built-in chart rendering stage.
pub const CHART_GENERATOR: &str = "chart_generator";
/// Built-in chart captioning stage.
pub const CHART_SUMMARIZER: &str = "chart_summarizer";
/// Built-in final-answer stage.
pub const SYNTHESIZER: &str = "synthesizer";

/// Name of a worker stage (e.g. `web_researcher`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageName(String);

impl StageName {
  pub fn new(name: impl Into<String>) -> Self {
    Self(name.into().trim().to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for StageName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for StageName {
  fn from(s: &str) -> Self {
    Self::new(s)
  }
}

impl From<String> for StageName {
  fn from(s: String) -> Self {
    Self::new(s)
  }
}

impl PartialEq<str> for StageName {
  fn eq(&self, other: &str) -> bool {
    self.0 == other
  }
}

impl PartialEq<&str> for StageName {
  fn eq(&self, other: &&str) -> bool {
    self.0 == *other
  }
}

/// What kind of work a stage does. The Supervisor's structural rules are phrased in roles,
/// so custom stages only need to declare one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageRole {
  Research,
  Chart,
  ChartSummary,
  Synthesis,
  Other,
}

impl StageRole {
  /// Role of a built-in stage name; unknown names are [StageRole::Other].
  pub fn for_name(name: &str) -> Self {
    match name {
      WEB_RESEARCHER | CORTEX_RESEARCHER => StageRole::Research,
      CHART_GENERATOR => StageRole::Chart,
      CHART_SUMMARIZER => StageRole::ChartSummary,
      SYNTHESIZER => StageRole::Synthesis,
      _ => StageRole::Other,
    }
  }

  /// One-line capability description handed to the decision provider.
  pub fn description(&self) -> &'static str {
    match self {
      StageRole::Research => "Fetch data needed to answer the query",
      StageRole::Chart => {
        "Build a visualization from structured data; only when the user explicitly asks for one"
      }
      StageRole::ChartSummary => "Summarize and explain a generated chart",
      StageRole::Synthesis => "Write the final answer from all gathered findings; always last",
      StageRole::Other => "Custom stage",
    }
  }
}

impl fmt::Display for StageRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StageRole::Research => write!(f, "research"),
      StageRole::Chart => write!(f, "chart"),
      StageRole::ChartSummary => write!(f, "chart_summary"),
      StageRole::Synthesis => write!(f, "synthesis"),
      StageRole::Other => write!(f, "other"),
    }
  }
}
