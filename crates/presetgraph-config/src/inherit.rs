//! Inheritance resolution.
//!
//! Depth-first over the `inherits` relation with one status map per kind.
//! Each preset is merged at most once; meeting a preset that is still in
//! progress means the relation has a cycle.

use std::collections::HashMap;

use presetgraph_core::{FileTable, Preset};

use crate::store::PresetMap;
use crate::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleStatus {
    InProgress,
    Verified,
}

/// Merge every preset of one kind with its parents, in place.
pub fn resolve_all<T: Preset>(presets: &mut PresetMap<T>, files: &FileTable) -> ConfigResult<()> {
    let mut status = HashMap::new();
    let names = presets.names().to_vec();
    for name in &names {
        visit(name, presets, files, &mut status)?;
    }
    Ok(())
}

fn visit<T: Preset>(
    name: &str,
    presets: &mut PresetMap<T>,
    files: &FileTable,
    status: &mut HashMap<String, CycleStatus>,
) -> ConfigResult<()> {
    match status.get(name) {
        Some(CycleStatus::Verified) => return Ok(()),
        Some(CycleStatus::InProgress) => {
            return Err(ConfigError::CyclicInheritance {
                kind: T::KIND,
                name: name.to_string(),
            });
        }
        None => {}
    }

    let Some(pair) = presets.get(name) else {
        return Err(ConfigError::InvalidPresetReference {
            kind: T::KIND,
            name: name.to_string(),
            reference: name.to_string(),
        });
    };
    let mut preset = pair.unexpanded.clone();
    status.insert(name.to_string(), CycleStatus::InProgress);

    preset
        .base()
        .validate_before_inherit()
        .map_err(|e| invalid::<T>(name, e))?;

    let origin = preset.base().origin_file;
    for parent_name in preset.base().inherits.clone() {
        let Some(parent) = presets.get(&parent_name) else {
            return Err(ConfigError::InvalidPresetReference {
                kind: T::KIND,
                name: name.to_string(),
                reference: parent_name,
            });
        };
        if !files.is_reachable(origin, parent.unexpanded.base().origin_file) {
            return Err(ConfigError::InheritedPresetUnreachable {
                kind: T::KIND,
                name: name.to_string(),
                parent: parent_name,
            });
        }

        visit(&parent_name, presets, files, status)?;

        if let Some(parent) = presets.get(&parent_name) {
            preset.inherit_fields(&parent.unexpanded);
            preset.base_mut().inherit_from(parent.unexpanded.base());
        }
    }

    preset.base_mut().collapse_null_condition();
    preset
        .validate_after_inherit(files.version(origin))
        .map_err(|e| invalid::<T>(name, e))?;

    if let Some(pair) = presets.get_mut(name) {
        pair.unexpanded = preset;
    }
    status.insert(name.to_string(), CycleStatus::Verified);
    Ok(())
}

fn invalid<T: Preset>(name: &str, err: presetgraph_core::Error) -> ConfigError {
    ConfigError::InvalidPreset {
        kind: T::KIND,
        name: name.to_string(),
        message: err.to_string(),
    }
}
