//! Core data model for PresetGraph.
//!
//! This crate contains:
//! - The preset file table and reachability sets
//! - The five preset kinds and their inheritance merge rules
//! - Preset condition expressions
//! - Validation errors raised by individual presets

pub mod condition;
pub mod error;
pub mod file;
pub mod preset;

pub use condition::{Condition, ConditionType};
pub use error::{Error, Result};
pub use file::{FileId, FileTable, PresetFile};
pub use preset::{
    BuildPreset, ConfigurePreset, PackagePreset, Preset, PresetBase, PresetKind, PresetPair,
    TestPreset, WorkflowPreset,
};
