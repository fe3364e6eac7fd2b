//! Workflow presets: an ordered list of steps naming other presets.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::{PresetBase, PresetKind};
use crate::Preset;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPreset {
    #[serde(flatten)]
    pub base: PresetBase,

    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowStep {
    #[serde(rename = "type")]
    pub step_type: WorkflowStepType,
    pub name: String,
}

impl WorkflowStep {
    pub fn new(step_type: WorkflowStepType, name: impl Into<String>) -> Self {
        Self {
            step_type,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStepType {
    #[display("configure")]
    Configure,
    #[display("build")]
    Build,
    #[display("test")]
    Test,
    #[display("package")]
    Package,
}

impl WorkflowStepType {
    /// The preset kind a step of this type refers to.
    pub fn kind(self) -> PresetKind {
        match self {
            WorkflowStepType::Configure => PresetKind::Configure,
            WorkflowStepType::Build => PresetKind::Build,
            WorkflowStepType::Test => PresetKind::Test,
            WorkflowStepType::Package => PresetKind::Package,
        }
    }
}

impl Preset for WorkflowPreset {
    const KIND: PresetKind = PresetKind::Workflow;

    fn base(&self) -> &PresetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PresetBase {
        &mut self.base
    }

    // Steps are never inherited; only the base fields merge.
    fn inherit_fields(&mut self, _parent: &Self) {}

    fn macro_fields_mut(&mut self) -> Vec<&mut String> {
        Vec::new()
    }
}

impl WorkflowPreset {
    pub fn new(name: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        Self {
            base: PresetBase::named(name),
            steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_steps() {
        let preset: WorkflowPreset = serde_json::from_value(json!({
            "name": "ci",
            "steps": [
                {"type": "configure", "name": "c"},
                {"type": "build", "name": "b"}
            ]
        }))
        .unwrap();
        assert_eq!(
            preset.steps,
            vec![
                WorkflowStep::new(WorkflowStepType::Configure, "c"),
                WorkflowStep::new(WorkflowStepType::Build, "b"),
            ]
        );
        assert_eq!(preset.steps[1].step_type.kind(), PresetKind::Build);
    }

    #[test]
    fn test_rejects_unknown_step_type() {
        let result: std::result::Result<WorkflowPreset, _> = serde_json::from_value(json!({
            "name": "ci",
            "steps": [{"type": "deploy", "name": "d"}]
        }));
        assert!(result.is_err());
    }
}
