//! Preset records and their inheritance merge rules.
//!
//! Every kind shares a [`PresetBase`] (name, inherits, hidden, environment,
//! condition) and adds its own fields on top. The JSON form of each kind is
//! bound with serde; the base is flattened into the kind struct and collects
//! any field nobody claimed so the loader can reject it.

mod build;
mod configure;
mod package;
mod test;
mod workflow;

pub use build::{BuildPreset, PackageResolveMode};
pub use configure::{
    ArchToolset, ArchToolsetStrategy, CacheVariable, ConfigurePreset, DebugOptions, ErrorOptions,
    TraceFormat, TraceMode, TraceOptions, WarningOptions,
};
pub use package::{PackageOutputOptions, PackagePreset};
pub use test::{
    ExcludeOptions, ExecutionOptions, FilterOptions, FixturesOptions, IncludeOptions, IndexOptions,
    IndexRange, NoTestsAction, OutputOptions, RepeatMode, RepeatOptions, ShowOnlyFormat,
    TestOutputTruncation, TestPreset, Verbosity,
};
pub use workflow::{WorkflowPreset, WorkflowStep, WorkflowStepType};

use std::collections::BTreeMap;
use std::fmt;

use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{Condition, Error, FileId, Result};

/// The five preset kinds. Names are unique within a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub enum PresetKind {
    #[display("configure")]
    Configure,
    #[display("build")]
    Build,
    #[display("test")]
    Test,
    #[display("package")]
    Package,
    #[display("workflow")]
    Workflow,
}

impl PresetKind {
    pub const ALL: [PresetKind; 5] = [
        PresetKind::Configure,
        PresetKind::Build,
        PresetKind::Test,
        PresetKind::Package,
        PresetKind::Workflow,
    ];

    /// Key of the root-level array holding presets of this kind.
    pub fn array_key(self) -> &'static str {
        match self {
            PresetKind::Configure => "configurePresets",
            PresetKind::Build => "buildPresets",
            PresetKind::Test => "testPresets",
            PresetKind::Package => "packagePresets",
            PresetKind::Workflow => "workflowPresets",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.to_string() == name)
    }
}

/// Fields every preset kind carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetBase {
    pub name: String,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub inherits: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,

    /// Opaque vendor data; type-checked as an object and otherwise ignored.
    #[serde(default, skip_serializing)]
    pub vendor: Option<BTreeMap<String, Value>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// A `None` value unsets the variable and stops it being inherited.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, Option<String>>,

    /// The condition exactly as written, until [`PresetBase::bind_condition`].
    #[serde(
        rename = "condition",
        default,
        deserialize_with = "present",
        skip_serializing
    )]
    pub raw_condition: Option<Value>,

    #[serde(skip)]
    pub condition: Option<Condition>,

    #[serde(skip_deserializing, default = "default_true")]
    pub condition_result: bool,

    #[serde(skip)]
    pub origin_file: FileId,

    /// Fields not claimed by the kind or the base.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

impl Default for PresetBase {
    fn default() -> Self {
        Self {
            name: String::new(),
            inherits: Vec::new(),
            hidden: false,
            vendor: None,
            display_name: String::new(),
            description: String::new(),
            environment: BTreeMap::new(),
            raw_condition: None,
            condition: None,
            condition_result: true,
            origin_file: FileId::default(),
            unknown: BTreeMap::new(),
        }
    }
}

impl PresetBase {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Turn the raw `condition` JSON into a [`Condition`].
    pub fn bind_condition(&mut self) -> Result<()> {
        if let Some(raw) = self.raw_condition.take() {
            self.condition = Some(Condition::from_json(&raw)?);
        }
        Ok(())
    }

    pub fn validate_before_inherit(&self) -> Result<()> {
        if self.environment.contains_key("") {
            return Err(Error::EmptyEnvironmentKey);
        }
        Ok(())
    }

    /// Merge the shared fields of `parent` into `self`, child entries first.
    pub fn inherit_from(&mut self, parent: &PresetBase) {
        inherit_map(&mut self.environment, &parent.environment);
        if self.condition.is_none() {
            self.condition = parent.condition.clone();
        }
    }

    /// Drop a `null` condition so it reads the same as an absent one.
    pub fn collapse_null_condition(&mut self) {
        if self.condition.as_ref().is_some_and(Condition::is_null) {
            self.condition = None;
        }
    }
}

/// Behaviour shared by the five preset kinds.
pub trait Preset: Clone + fmt::Debug {
    const KIND: PresetKind;

    fn base(&self) -> &PresetBase;

    fn base_mut(&mut self) -> &mut PresetBase;

    fn name(&self) -> &str {
        &self.base().name
    }

    /// Merge the kind-specific fields of `parent` into `self`.
    fn inherit_fields(&mut self, parent: &Self);

    /// Checks run on the merged preset. `version` is the schema version of
    /// the file that declared it.
    fn validate_after_inherit(&self, _version: u32) -> Result<()> {
        Ok(())
    }

    /// The configure preset this preset builds on, if the kind has one.
    fn configure_preset(&self) -> Option<&str> {
        None
    }

    /// Whether the configure preset's environment is merged in.
    fn inherits_configure_environment(&self) -> bool {
        false
    }

    /// Every string field that undergoes macro expansion, besides the
    /// environment and condition operands.
    fn macro_fields_mut(&mut self) -> Vec<&mut String>;
}

/// A preset as written plus, once expansion succeeds, its expanded form.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetPair<T> {
    pub unexpanded: T,
    pub expanded: Option<T>,
}

impl<T> PresetPair<T> {
    pub fn new(unexpanded: T) -> Self {
        Self {
            unexpanded,
            expanded: None,
        }
    }
}

pub(crate) fn inherit_string(child: &mut String, parent: &str) {
    if child.is_empty() {
        *child = parent.to_string();
    }
}

pub(crate) fn inherit_option<T: Clone>(child: &mut Option<T>, parent: &Option<T>) {
    if child.is_none() {
        *child = parent.clone();
    }
}

pub(crate) fn inherit_vec<T: Clone>(child: &mut Vec<T>, parent: &[T]) {
    if child.is_empty() {
        *child = parent.to_vec();
    }
}

pub(crate) fn inherit_map<V: Clone>(
    child: &mut BTreeMap<String, V>,
    parent: &BTreeMap<String, V>,
) {
    for (key, value) in parent {
        child.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

/// Option groups merge field by field when both sides have one, and are
/// copied wholesale when only the parent does.
pub(crate) fn inherit_group<T: Clone>(
    child: &mut Option<T>,
    parent: &Option<T>,
    merge: impl FnOnce(&mut T, &T),
) {
    match (child.as_mut(), parent) {
        (Some(child), Some(parent)) => merge(child, parent),
        (None, Some(parent)) => *child = Some(parent.clone()),
        (_, None) => {}
    }
}

fn default_true() -> bool {
    true
}

/// Accept either a single string or an array of strings.
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Distinguish an explicit `null` from a missing field.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names() {
        assert_eq!(PresetKind::Configure.to_string(), "configure");
        assert_eq!(PresetKind::parse("package"), Some(PresetKind::Package));
        assert_eq!(PresetKind::parse("deploy"), None);
        assert_eq!(PresetKind::Workflow.array_key(), "workflowPresets");
    }

    #[test]
    fn test_base_condition_presence() {
        let missing: PresetBase = serde_json::from_value(json!({"name": "a"})).unwrap();
        assert_eq!(missing.raw_condition, None);
        assert!(missing.condition_result);

        let mut null: PresetBase =
            serde_json::from_value(json!({"name": "a", "condition": null})).unwrap();
        assert_eq!(null.raw_condition, Some(Value::Null));
        null.bind_condition().unwrap();
        assert_eq!(null.condition, Some(Condition::Null));
        null.collapse_null_condition();
        assert_eq!(null.condition, None);
    }

    #[test]
    fn test_base_collects_unknown_fields() {
        let base: PresetBase =
            serde_json::from_value(json!({"name": "a", "inherits": "b", "colour": 1})).unwrap();
        assert_eq!(base.inherits, vec!["b".to_string()]);
        assert!(base.unknown.contains_key("colour"));
    }

    #[test]
    fn test_environment_child_wins() {
        let mut child = PresetBase::named("child");
        child.environment.insert("A".into(), Some("child".into()));
        child.environment.insert("B".into(), None);

        let mut parent = PresetBase::named("parent");
        parent.environment.insert("A".into(), Some("parent".into()));
        parent.environment.insert("B".into(), Some("parent".into()));
        parent.environment.insert("C".into(), Some("parent".into()));
        parent.condition = Some(Condition::Const(false));

        child.inherit_from(&parent);
        assert_eq!(child.environment["A"].as_deref(), Some("child"));
        assert_eq!(child.environment["B"], None);
        assert_eq!(child.environment["C"].as_deref(), Some("parent"));
        assert_eq!(child.condition, Some(Condition::Const(false)));
    }

    #[test]
    fn test_empty_environment_key_rejected() {
        let mut base = PresetBase::named("a");
        base.environment.insert(String::new(), Some("x".into()));
        assert_eq!(base.validate_before_inherit(), Err(Error::EmptyEnvironmentKey));
    }

    #[test]
    fn test_inherit_group() {
        let mut child = Some((1, None::<i32>));
        inherit_group(&mut child, &Some((5, Some(7))), |c, p| {
            inherit_option(&mut c.1, &p.1);
        });
        assert_eq!(child, Some((1, Some(7))));

        let mut empty = None;
        inherit_group(&mut empty, &Some((5, Some(7))), |_, _| {});
        assert_eq!(empty, Some((5, Some(7))));
    }
}
