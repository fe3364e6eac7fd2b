//! Preset loading and resolution errors.

use std::fmt;
use std::path::PathBuf;

use presetgraph_core::PresetKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no preset file found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}:{column}: JSON parse error: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{}:{location}: {message}", path.display())]
    SchemaViolation {
        path: PathBuf,
        location: Location,
        message: String,
    },

    #[error("{}: unrecognized \"version\" {version}", path.display())]
    UnrecognizedVersion { path: PathBuf, version: i64 },

    #[error(
        "{}: {field} requires file version {required} or higher (file declares {found})",
        path.display()
    )]
    VersionUnsupported {
        path: PathBuf,
        field: String,
        required: u32,
        found: u32,
    },

    #[error("{}: \"cmakeMinimumRequired\" {required} is newer than {current}", path.display())]
    UnsupportedToolVersion {
        path: PathBuf,
        required: String,
        current: String,
    },

    #[error("{}: invalid include \"{include}\"", path.display())]
    InvalidInclude { path: PathBuf, include: String },

    #[error("cyclic include among preset files: {}", path.display())]
    CyclicInclude { path: PathBuf },

    #[error("duplicate {kind} preset \"{name}\"")]
    DuplicatePreset { kind: PresetKind, name: String },

    #[error("{kind} preset \"{name}\": {message}")]
    InvalidPreset {
        kind: PresetKind,
        name: String,
        message: String,
    },

    #[error("{kind} preset \"{name}\" references missing preset \"{reference}\"")]
    InvalidPresetReference {
        kind: PresetKind,
        name: String,
        reference: String,
    },

    #[error("{kind} preset \"{name}\" inherits \"{parent}\" from a file it does not include")]
    InheritedPresetUnreachable {
        kind: PresetKind,
        name: String,
        parent: String,
    },

    #[error(
        "{kind} preset \"{name}\" uses configure preset \"{configure}\" from a file it does not include"
    )]
    ConfigurePresetUnreachable {
        kind: PresetKind,
        name: String,
        configure: String,
    },

    #[error("cyclic inheritance in {kind} preset \"{name}\"")]
    CyclicInheritance { kind: PresetKind, name: String },

    #[error("{kind} preset \"{name}\": environment variable \"{variable}\" references itself")]
    CyclicMacroExpansion {
        kind: PresetKind,
        name: String,
        variable: String,
    },

    #[error("{kind} preset \"{name}\": invalid macro expansion: {message}")]
    InvalidMacroExpansion {
        kind: PresetKind,
        name: String,
        message: String,
    },

    #[error("{kind} preset \"{name}\": invalid condition: {message}")]
    InvalidCondition {
        kind: PresetKind,
        name: String,
        message: String,
    },

    #[error("workflow preset \"{workflow}\": first workflow step \"{step}\" must be a configure step")]
    FirstWorkflowStepNotConfigure { workflow: String, step: String },

    #[error("workflow preset \"{workflow}\": configure workflow step \"{step}\" must be the first step")]
    ConfigureWorkflowStepNotFirst { workflow: String, step: String },

    #[error("workflow preset \"{workflow}\": invalid workflow step \"{step}\": {reason}")]
    InvalidWorkflowStep {
        workflow: String,
        step: String,
        reason: String,
    },

    #[error("workflow preset \"{workflow}\": workflow step \"{step}\" is unreachable from its file")]
    WorkflowStepUnreachable { workflow: String, step: String },

    #[error("no workflow steps specified for \"{workflow}\"")]
    NoWorkflowSteps { workflow: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Where a schema violation was found in its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Line and column reported by the JSON parser.
    Position { line: usize, column: usize },
    /// JSON pointer to the offending value, for checks made after parsing.
    Pointer(String),
}

impl Location {
    pub fn pointer(pointer: impl Into<String>) -> Self {
        Location::Pointer(pointer.into())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Position { line, column } => write!(f, "{line}:{column}"),
            Location::Pointer(pointer) if pointer.is_empty() => f.write_str("/"),
            Location::Pointer(pointer) => f.write_str(pointer),
        }
    }
}

impl ConfigError {
    /// Position-bearing error from a serde_json failure.
    pub(crate) fn from_json(path: &std::path::Path, err: &serde_json::Error) -> Self {
        let message = strip_position(&err.to_string());
        let (line, column) = (err.line(), err.column());
        match err.classify() {
            serde_json::error::Category::Data => ConfigError::SchemaViolation {
                path: path.to_path_buf(),
                location: Location::Position { line, column },
                message,
            },
            _ => ConfigError::Parse {
                path: path.to_path_buf(),
                line,
                column,
                message,
            },
        }
    }
}

/// serde_json appends " at line L column C"; the path prefix already says so.
fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(index) => message[..index].to_string(),
        None => message.to_string(),
    }
}
