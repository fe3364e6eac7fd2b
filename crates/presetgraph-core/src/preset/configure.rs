//! Configure presets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    PresetBase, PresetKind, inherit_group, inherit_map, inherit_option, inherit_string,
    one_or_many,
};
use crate::{Error, Preset, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurePreset {
    #[serde(flatten)]
    pub base: PresetBase,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generator: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<ArchToolset>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolset: Option<ArchToolset>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub toolchain_file: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub binary_dir: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub install_dir: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub graphviz: String,

    /// Accepted for compatibility and otherwise unused.
    #[serde(default, skip_serializing)]
    pub cmake_executable: Option<String>,

    /// A `None` value unsets the variable.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cache_variables: BTreeMap<String, Option<CacheVariable>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<WarningOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<ErrorOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceOptions>,
}

/// `architecture` and `toolset` are a bare string or `{value, strategy}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawArchToolset")]
pub struct ArchToolset {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ArchToolsetStrategy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchToolsetStrategy {
    Set,
    External,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawArchToolset {
    Value(String),
    Object(ArchToolsetObject),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ArchToolsetObject {
    #[serde(default)]
    value: String,
    #[serde(default)]
    strategy: Option<ArchToolsetStrategy>,
}

impl From<RawArchToolset> for ArchToolset {
    fn from(raw: RawArchToolset) -> Self {
        match raw {
            RawArchToolset::Value(value) => Self {
                value,
                strategy: None,
            },
            RawArchToolset::Object(object) => Self {
                value: object.value,
                strategy: object.strategy,
            },
        }
    }
}

/// A cache variable. Booleans are stored as `BOOL` with `TRUE`/`FALSE`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCacheVariable")]
pub struct CacheVariable {
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub var_type: String,
    pub value: String,
}

impl CacheVariable {
    pub fn new(var_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            var_type: var_type.into(),
            value: value.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCacheVariable {
    Bool(bool),
    String(String),
    Object(CacheVariableObject),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CacheVariableObject {
    #[serde(rename = "type", default)]
    var_type: String,
    value: RawCacheValue,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCacheValue {
    Bool(bool),
    String(String),
}

fn bool_value(value: bool) -> String {
    if value { "TRUE" } else { "FALSE" }.to_string()
}

impl From<RawCacheVariable> for CacheVariable {
    fn from(raw: RawCacheVariable) -> Self {
        match raw {
            RawCacheVariable::Bool(b) => CacheVariable::new("BOOL", bool_value(b)),
            RawCacheVariable::String(value) => CacheVariable::new("", value),
            RawCacheVariable::Object(object) => match object.value {
                RawCacheValue::String(value) => CacheVariable::new(object.var_type, value),
                RawCacheValue::Bool(b) => {
                    let var_type = if object.var_type.is_empty() {
                        "BOOL".to_string()
                    } else {
                        object.var_type
                    };
                    CacheVariable::new(var_type, bool_value(b))
                }
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WarningOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninitialized: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unused_cli: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_vars: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ErrorOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DebugOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub try_compile: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TraceOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<TraceMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<TraceFormat>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub source: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub redirect: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceMode {
    On,
    Off,
    Expand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceFormat {
    #[serde(rename = "human")]
    Human,
    #[serde(rename = "json-v1")]
    JsonV1,
}

fn merge_arch_toolset(child: &mut ArchToolset, parent: &ArchToolset) {
    inherit_string(&mut child.value, &parent.value);
    inherit_option(&mut child.strategy, &parent.strategy);
}

impl Preset for ConfigurePreset {
    const KIND: PresetKind = PresetKind::Configure;

    fn base(&self) -> &PresetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PresetBase {
        &mut self.base
    }

    fn inherit_fields(&mut self, parent: &Self) {
        inherit_string(&mut self.generator, &parent.generator);
        inherit_group(&mut self.architecture, &parent.architecture, merge_arch_toolset);
        inherit_group(&mut self.toolset, &parent.toolset, merge_arch_toolset);
        inherit_string(&mut self.toolchain_file, &parent.toolchain_file);
        inherit_string(&mut self.binary_dir, &parent.binary_dir);
        inherit_string(&mut self.install_dir, &parent.install_dir);
        inherit_string(&mut self.graphviz, &parent.graphviz);
        inherit_option(&mut self.cmake_executable, &parent.cmake_executable);
        inherit_map(&mut self.cache_variables, &parent.cache_variables);

        inherit_group(&mut self.warnings, &parent.warnings, |c, p| {
            inherit_option(&mut c.dev, &p.dev);
            inherit_option(&mut c.deprecated, &p.deprecated);
            inherit_option(&mut c.uninitialized, &p.uninitialized);
            inherit_option(&mut c.unused_cli, &p.unused_cli);
            inherit_option(&mut c.system_vars, &p.system_vars);
        });
        inherit_group(&mut self.errors, &parent.errors, |c, p| {
            inherit_option(&mut c.dev, &p.dev);
            inherit_option(&mut c.deprecated, &p.deprecated);
        });
        inherit_group(&mut self.debug, &parent.debug, |c, p| {
            inherit_option(&mut c.output, &p.output);
            inherit_option(&mut c.try_compile, &p.try_compile);
            inherit_option(&mut c.find, &p.find);
        });
        inherit_group(&mut self.trace, &parent.trace, |c, p| {
            inherit_option(&mut c.mode, &p.mode);
            inherit_option(&mut c.format, &p.format);
            if c.source.is_empty() {
                c.source = p.source.clone();
            }
            inherit_string(&mut c.redirect, &p.redirect);
        });
    }

    fn validate_after_inherit(&self, version: u32) -> Result<()> {
        if self.base.hidden {
            return Ok(());
        }

        if version < 3 {
            if self.generator.is_empty() {
                return Err(Error::MissingField("generator"));
            }
            if self.binary_dir.is_empty() {
                return Err(Error::MissingField("binaryDir"));
            }
        }

        if self.warn_dev() == Some(false) && self.error_dev() == Some(true) {
            return Err(Error::ConflictingDiagnostics("dev"));
        }
        if self.warn_deprecated() == Some(false) && self.error_deprecated() == Some(true) {
            return Err(Error::ConflictingDiagnostics("deprecated"));
        }
        if self.cache_variables.contains_key("") {
            return Err(Error::EmptyCacheVariableName);
        }
        Ok(())
    }

    fn macro_fields_mut(&mut self) -> Vec<&mut String> {
        let mut fields = vec![
            &mut self.binary_dir,
            &mut self.install_dir,
            &mut self.toolchain_file,
            &mut self.graphviz,
        ];
        for variable in self.cache_variables.values_mut().flatten() {
            fields.push(&mut variable.value);
        }
        if let Some(trace) = self.trace.as_mut() {
            fields.push(&mut trace.redirect);
            fields.extend(trace.source.iter_mut());
        }
        fields
    }
}

impl ConfigurePreset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: PresetBase::named(name),
            ..Self::default()
        }
    }

    pub fn warn_dev(&self) -> Option<bool> {
        self.warnings.as_ref().and_then(|w| w.dev)
    }

    pub fn warn_deprecated(&self) -> Option<bool> {
        self.warnings.as_ref().and_then(|w| w.deprecated)
    }

    pub fn error_dev(&self) -> Option<bool> {
        self.errors.as_ref().and_then(|e| e.dev)
    }

    pub fn error_deprecated(&self) -> Option<bool> {
        self.errors.as_ref().and_then(|e| e.deprecated)
    }
}
