//! Preset file loading and resolution for PresetGraph.
//!
//! This crate handles:
//! - Reading preset files and their includes
//! - Inheritance between presets of the same kind
//! - Macro expansion and condition evaluation
//! - Workflow step validation

pub mod condition;
pub mod diagnostics;
pub mod error;
mod expand;
pub mod graph;
pub mod inherit;
pub mod macros;
pub mod paths;
pub mod reader;
pub mod store;
pub mod version;
pub mod workflow;

pub use diagnostics::{Diagnostic, Diagnostics, Level};
pub use error::{ConfigError, ConfigResult, Location};
pub use graph::{DEFAULT_TOOL_VERSION, ListEntry, LoadOptions, PresetGraph, format_listing};
pub use macros::{Environment, MacroContext, MacroError, MacroExpander, ProcessEnvironment};
pub use store::{PresetMap, PresetStore, StoredPreset};
pub use version::ToolVersion;
