//! Plan: step index → {agent, action}, as issued by the Planner.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{StageName, StageRole, StageSet};

/// One planned step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
  pub agent: StageName,
  pub action: String,
}

impl PlanStep {
  pub fn new(agent: impl Into<StageName>, action: impl Into<String>) -> Self {
    Self {
      agent: agent.into(),
      action: action.into(),
    }
  }
}

/// Ordered mapping from 1-based, contiguous step index to [PlanStep].
///
/// Serializes as a JSON object keyed by the step index (`{"1": {...}, "2": {...}}`), the same
/// shape the decision provider is asked to return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
  steps: BTreeMap<u32, PlanStep>,
}

impl Plan {
  /// Builds a plan from steps in order, numbering them from 1.
  pub fn from_steps(steps: impl IntoIterator<Item = PlanStep>) -> Self {
    Self {
      steps: steps
        .into_iter()
        .enumerate()
        .map(|(i, s)| (i as u32 + 1, s))
        .collect(),
    }
  }

  /// Parses a decision-provider reply into a plan. Fails closed: the reply must be a
  /// non-empty JSON object whose keys are the integers `1..=n` and whose values carry a
  /// non-empty string `agent` and a string `action`.
  pub fn parse(raw: &str) -> Result<Plan, String> {
    let value: Value =
      serde_json::from_str(raw.trim()).map_err(|e| format!("reply is not JSON: {}", e))?;
    let obj = value
      .as_object()
      .ok_or_else(|| "plan must be a JSON object".to_string())?;
    if obj.is_empty() {
      return Err("plan has no steps".to_string());
    }

    let mut steps = BTreeMap::new();
    for (key, entry) in obj {
      let index: u32 = key
        .trim()
        .parse()
        .map_err(|_| format!("step key `{}` is not an integer", key))?;
      let agent = entry
        .get("agent")
        .and_then(Value::as_str)
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| format!("step {} is missing `agent`", index))?;
      let action = entry
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| format!("step {} is missing `action`", index))?;
      if steps.insert(index, PlanStep::new(agent, action)).is_some() {
        return Err(format!("step {} appears twice", index));
      }
    }

    let n = steps.len() as u32;
    if steps.keys().copied().ne(1..=n) {
      return Err(format!(
        "step indices must be contiguous from 1, got {:?}",
        steps.keys().collect::<Vec<_>>()
      ));
    }
    Ok(Plan { steps })
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  pub fn get(&self, step: u32) -> Option<&PlanStep> {
    self.steps.get(&step)
  }

  pub fn agent_at(&self, step: u32) -> Option<&StageName> {
    self.steps.get(&step).map(|s| &s.agent)
  }

  pub fn last(&self) -> Option<&PlanStep> {
    self.steps.values().next_back()
  }

  /// Pointer value once every step has been dispatched.
  pub fn completion_step(&self) -> u32 {
    self.steps.len() as u32 + 1
  }

  pub fn iter(&self) -> impl Iterator<Item = (u32, &PlanStep)> {
    self.steps.iter().map(|(k, v)| (*k, v))
  }

  /// Number of steps whose agent has `role` in `stages`.
  pub fn count_role(&self, stages: &StageSet, role: StageRole) -> usize {
    self
      .steps
      .values()
      .filter(|s| stages.role_of(s.agent.as_str()) == role)
      .count()
  }
}
