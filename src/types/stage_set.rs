//! The enabled stage set, resolved once per run.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{StageName, StageRole};

/// One enabled stage and its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledStage {
  pub name: StageName,
  pub role: StageRole,
}

/// Enabled stages in declaration order. Every worker route is checked against this set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSet {
  stages: Vec<EnabledStage>,
}

impl StageSet {
  /// Builds a set; later duplicates of a name are ignored.
  pub fn new(stages: impl IntoIterator<Item = (StageName, StageRole)>) -> Self {
    let mut out: Vec<EnabledStage> = Vec::new();
    for (name, role) in stages {
      if !out.iter().any(|s| s.name == name) {
        out.push(EnabledStage { name, role });
      }
    }
    Self { stages: out }
  }

  /// Builds a set from names, deriving each role from the name.
  pub fn from_names<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<StageName>,
  {
    Self::new(names.into_iter().map(|n| {
      let name = n.into();
      let role = StageRole::for_name(name.as_str());
      (name, role)
    }))
  }

  pub fn contains(&self, name: &str) -> bool {
    self.stages.iter().any(|s| s.name == name)
  }

  pub fn get(&self, name: &str) -> Option<&StageName> {
    self.stages.iter().find(|s| s.name == name).map(|s| &s.name)
  }

  /// Role of an enabled stage, or the name-derived role for stages outside the set.
  pub fn role_of(&self, name: &str) -> StageRole {
    self
      .stages
      .iter()
      .find(|s| s.name == name)
      .map(|s| s.role)
      .unwrap_or_else(|| StageRole::for_name(name))
  }

  /// The first enabled stage with the synthesis role. The run terminates through it.
  pub fn synthesis_stage(&self) -> Option<&StageName> {
    self
      .stages
      .iter()
      .find(|s| s.role == StageRole::Synthesis)
      .map(|s| &s.name)
  }

  pub fn names(&self) -> Vec<&StageName> {
    self.stages.iter().map(|s| &s.name).collect()
  }

  pub fn iter(&self) -> impl Iterator<Item = &EnabledStage> {
    self.stages.iter()
  }

  pub fn len(&self) -> usize {
    self.stages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.stages.is_empty()
  }

  /// Stage list with roles and descriptions, as sent to the decision provider.
  pub fn describe(&self) -> Value {
    Value::Array(
      self
        .stages
        .iter()
        .map(|s| {
          json!({
            "name": s.name,
            "role": s.role,
            "capability": s.role.description(),
          })
        })
        .collect(),
    )
  }
}
