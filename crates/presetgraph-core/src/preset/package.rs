//! Package presets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    PresetBase, PresetKind, inherit_group, inherit_map, inherit_option, inherit_string,
    inherit_vec,
};
use crate::{Error, Preset, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagePreset {
    #[serde(flatten)]
    pub base: PresetBase,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub configure_preset: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit_configure_environment: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generators: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configurations: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config_file: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PackageOutputOptions>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package_directory: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vendor_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PackageOutputOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl Preset for PackagePreset {
    const KIND: PresetKind = PresetKind::Package;

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
        inherit_vec(&mut self.generators, &parent.generators);
        inherit_vec(&mut self.configurations, &parent.configurations);
        inherit_map(&mut self.variables, &parent.variables);
        inherit_string(&mut self.config_file, &parent.config_file);
        inherit_group(&mut self.output, &parent.output, |c, p| {
            inherit_option(&mut c.debug, &p.debug);
            inherit_option(&mut c.verbose, &p.verbose);
        });
        inherit_string(&mut self.package_name, &parent.package_name);
        inherit_string(&mut self.package_version, &parent.package_version);
        inherit_string(&mut self.package_directory, &parent.package_directory);
        inherit_string(&mut self.vendor_name, &parent.vendor_name);
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
        let mut fields: Vec<&mut String> = self.variables.values_mut().collect();
        fields.push(&mut self.config_file);
        fields.push(&mut self.package_name);
        fields.push(&mut self.package_version);
        fields.push(&mut self.package_directory);
        fields.push(&mut self.vendor_name);
        fields
    }
}

impl PackagePreset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: PresetBase::named(name),
            ..Self::default()
        }
    }
}
