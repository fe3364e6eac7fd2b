//! Schema version gates.
//!
//! Every preset file declares a `version`. Fields introduced in later
//! versions are rejected in files that declare an older one. The checks run
//! on the raw JSON so they see exactly what the file wrote.

use std::path::Path;

use presetgraph_core::PresetKind;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Location;
use crate::{ConfigError, ConfigResult};

pub const MIN_VERSION: u32 = 1;
pub const MAX_VERSION: u32 = 8;

/// A field that first became legal in `required`.
struct Gate {
    /// Preset kind the pointer applies to, or `None` for the root object.
    kind: Option<PresetKind>,
    pointer: &'static str,
    required: u32,
}

const fn root_gate(pointer: &'static str, required: u32) -> Gate {
    Gate {
        kind: None,
        pointer,
        required,
    }
}

const fn preset_gate(kind: PresetKind, pointer: &'static str, required: u32) -> Gate {
    Gate {
        kind: Some(kind),
        pointer,
        required,
    }
}

const GATES: &[Gate] = &[
    root_gate("/buildPresets", 2),
    root_gate("/testPresets", 2),
    root_gate("/include", 4),
    root_gate("/packagePresets", 6),
    root_gate("/workflowPresets", 6),
    root_gate("/$schema", 8),
    preset_gate(PresetKind::Configure, "/installDir", 3),
    preset_gate(PresetKind::Configure, "/toolchainFile", 3),
    preset_gate(PresetKind::Configure, "/condition", 3),
    preset_gate(PresetKind::Configure, "/graphviz", 6),
    preset_gate(PresetKind::Configure, "/trace", 7),
    preset_gate(PresetKind::Build, "/condition", 3),
    preset_gate(PresetKind::Test, "/condition", 3),
    preset_gate(PresetKind::Test, "/output/testOutputTruncation", 5),
    preset_gate(PresetKind::Test, "/output/outputJUnitFile", 6),
];

/// Read and range-check the root `version` field.
pub fn file_version(path: &Path, root: &Value) -> ConfigResult<u32> {
    let Some(object) = root.as_object() else {
        return Err(schema(path, "", "root must be an object"));
    };
    let version = match object.get("version") {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| schema(path, "/version", "\"version\" must be an integer"))?,
        Some(_) => return Err(schema(path, "/version", "\"version\" must be an integer")),
        None => return Err(schema(path, "", "missing \"version\"")),
    };

    match u32::try_from(version) {
        Ok(v) if (MIN_VERSION..=MAX_VERSION).contains(&v) => Ok(v),
        _ => Err(ConfigError::UnrecognizedVersion {
            path: path.to_path_buf(),
            version,
        }),
    }
}

/// Reject any field the declared version does not support yet.
pub fn check_gates(path: &Path, version: u32, root: &Value) -> ConfigResult<()> {
    for gate in GATES.iter().filter(|g| g.required > version) {
        let present = match gate.kind {
            None => root.pointer(gate.pointer).is_some(),
            Some(kind) => presets_of(root, kind).any(|p| p.pointer(gate.pointer).is_some()),
        };
        if present {
            return Err(ConfigError::VersionUnsupported {
                path: path.to_path_buf(),
                field: format!("\"{}\"", gate.pointer.trim_start_matches('/')),
                required: gate.required,
                found: version,
            });
        }
    }
    Ok(())
}

fn presets_of(root: &Value, kind: PresetKind) -> impl Iterator<Item = &Value> {
    root.get(kind.array_key())
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// A `major.minor.patch` tool version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolVersion {
    #[serde(default)]
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
    #[serde(default)]
    pub patch: u32,
}

impl ToolVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl std::fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Fail if the file demands a newer tool than `current`.
pub fn check_minimum_required(
    path: &Path,
    required: Option<ToolVersion>,
    current: ToolVersion,
) -> ConfigResult<()> {
    match required {
        Some(required) if required > current => Err(ConfigError::UnsupportedToolVersion {
            path: path.to_path_buf(),
            required: required.to_string(),
            current: current.to_string(),
        }),
        _ => Ok(()),
    }
}

fn schema(path: &Path, pointer: &str, message: &str) -> ConfigError {
    ConfigError::SchemaViolation {
        path: path.to_path_buf(),
        location: Location::pointer(pointer),
        message: message.to_string(),
    }
}
