//! Workflow step validation.
//!
//! Runs once every other kind is expanded. The first step fixes the
//! configure preset; every later step must build on that same one.

use presetgraph_core::{
    BuildPreset, ConfigurePreset, FileTable, PackagePreset, Preset, PresetPair, TestPreset,
    WorkflowPreset,
};
use presetgraph_core::preset::{WorkflowStep, WorkflowStepType};
use tracing::debug;

use crate::store::{PresetStore, StoredPreset};
use crate::{ConfigError, ConfigResult};

/// Validate every visible workflow preset.
pub(crate) fn validate_all(store: &PresetStore, files: &FileTable) -> ConfigResult<()> {
    for pair in store.workflow.iter() {
        let workflow = &pair.unexpanded;
        if workflow.base.hidden || pair.expanded.is_none() {
            continue;
        }
        validate(workflow, store, files)?;
        debug!(workflow = %workflow.name(), steps = workflow.steps.len(), "Workflow is valid");
    }
    Ok(())
}

/// Check the step sequence of one workflow.
pub fn validate(
    workflow: &WorkflowPreset,
    store: &PresetStore,
    files: &FileTable,
) -> ConfigResult<()> {
    let mut configure: Option<&str> = None;

    for (index, step) in workflow.steps.iter().enumerate() {
        let is_configure = step.step_type == WorkflowStepType::Configure;
        if index == 0 && !is_configure {
            return Err(ConfigError::FirstWorkflowStepNotConfigure {
                workflow: workflow.name().to_string(),
                step: step.name.clone(),
            });
        }
        if index > 0 && is_configure {
            return Err(ConfigError::ConfigureWorkflowStepNotFirst {
                workflow: workflow.name().to_string(),
                step: step.name.clone(),
            });
        }

        match step.step_type {
            WorkflowStepType::Configure => {
                let pair = find_step::<ConfigurePreset>(workflow, step, store, files)?;
                if !pair.unexpanded.base.hidden && is_active(pair) {
                    configure = Some(step.name.as_str());
                }
            }
            WorkflowStepType::Build => {
                check_step::<BuildPreset>(workflow, step, store, files, configure)?;
            }
            WorkflowStepType::Test => {
                check_step::<TestPreset>(workflow, step, store, files, configure)?;
            }
            WorkflowStepType::Package => {
                check_step::<PackagePreset>(workflow, step, store, files, configure)?;
            }
        }
    }

    if configure.is_none() {
        return Err(ConfigError::NoWorkflowSteps {
            workflow: workflow.name().to_string(),
        });
    }
    Ok(())
}

fn is_active<T: Preset>(pair: &PresetPair<T>) -> bool {
    pair.expanded
        .as_ref()
        .is_some_and(|expanded| expanded.base().condition_result)
}

/// Look up the preset a step names and check the workflow can reach it.
fn find_step<'s, T: StoredPreset>(
    workflow: &WorkflowPreset,
    step: &WorkflowStep,
    store: &'s PresetStore,
    files: &FileTable,
) -> ConfigResult<&'s PresetPair<T>> {
    let Some(pair) = store.map::<T>().get(&step.name) else {
        return Err(invalid_step(
            workflow,
            step,
            format!("no {} preset named \"{}\"", T::KIND, step.name),
        ));
    };
    if !files.is_reachable(workflow.base.origin_file, pair.unexpanded.base().origin_file) {
        return Err(ConfigError::WorkflowStepUnreachable {
            workflow: workflow.name().to_string(),
            step: step.name.clone(),
        });
    }
    Ok(pair)
}

fn check_step<T: StoredPreset>(
    workflow: &WorkflowPreset,
    step: &WorkflowStep,
    store: &PresetStore,
    files: &FileTable,
    configure: Option<&str>,
) -> ConfigResult<()> {
    let pair = find_step::<T>(workflow, step, store, files)?;
    if pair.unexpanded.base().hidden {
        return Err(invalid_step(workflow, step, "preset is hidden".to_string()));
    }
    let Some(expanded) = &pair.expanded else {
        return Err(invalid_step(
            workflow,
            step,
            "preset was ignored because of a vendor macro".to_string(),
        ));
    };
    if !expanded.base().condition_result {
        return Err(invalid_step(
            workflow,
            step,
            "preset is inactive because its condition is false".to_string(),
        ));
    }

    // The final check reports a workflow that never established a context.
    let Some(configure) = configure else {
        return Ok(());
    };
    let used = expanded.configure_preset().unwrap_or_default();
    if used != configure {
        return Err(invalid_step(
            workflow,
            step,
            format!("uses configure preset \"{used}\" instead of \"{configure}\""),
        ));
    }
    Ok(())
}

fn invalid_step(workflow: &WorkflowPreset, step: &WorkflowStep, reason: String) -> ConfigError {
    ConfigError::InvalidWorkflowStep {
        workflow: workflow.name().to_string(),
        step: step.name.clone(),
        reason,
    }
}
