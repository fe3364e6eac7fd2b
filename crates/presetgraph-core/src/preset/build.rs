//! Build presets.

use serde::{Deserialize, Serialize};

use super::{PresetBase, PresetKind, inherit_option, inherit_string, inherit_vec, one_or_many};
use crate::{Error, Preset, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPreset {
    #[serde(flatten)]
    pub base: PresetBase,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub configure_preset: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit_configure_environment: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<u32>,

    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub targets: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub configuration: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean_first: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub native_tool_options: Vec<String>,

    #[serde(
        rename = "resolvePackageReferences",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub package_resolve_mode: Option<PackageResolveMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageResolveMode {
    On,
    Off,
    Only,
}

impl Preset for BuildPreset {
    const KIND: PresetKind = PresetKind::Build;

    fn base(&self) -> &PresetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PresetBase {
        &mut self.base
    }

    fn inherit_fields(&mut self, parent: &Self) {
        inherit_string(&mut self.configure_preset, &parent.configure_preset);
        inherit_option(
            &mut self.inherit_configure_environment,
            &parent.inherit_configure_environment,
        );
        inherit_option(&mut self.jobs, &parent.jobs);
        inherit_vec(&mut self.targets, &parent.targets);
        inherit_string(&mut self.configuration, &parent.configuration);
        inherit_option(&mut self.clean_first, &parent.clean_first);
        inherit_option(&mut self.verbose, &parent.verbose);
        inherit_vec(&mut self.native_tool_options, &parent.native_tool_options);
        inherit_option(&mut self.package_resolve_mode, &parent.package_resolve_mode);
    }

    fn validate_after_inherit(&self, _version: u32) -> Result<()> {
        if !self.base.hidden && self.configure_preset.is_empty() {
            return Err(Error::MissingField("configurePreset"));
        }
        Ok(())
    }

    fn configure_preset(&self) -> Option<&str> {
        Some(&self.configure_preset)
    }

    fn inherits_configure_environment(&self) -> bool {
        self.inherit_configure_environment != Some(false)
    }

    fn macro_fields_mut(&mut self) -> Vec<&mut String> {
        self.targets
            .iter_mut()
            .chain(self.native_tool_options.iter_mut())
            .collect()
    }
}

impl BuildPreset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: PresetBase::named(name),
            ..Self::default()
        }
    }
}
