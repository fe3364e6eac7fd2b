//! Test presets.
//!
//! The `output`, `filter` and `execution` option groups are carried through
//! untouched apart from inheritance and macro expansion of their path and
//! pattern fields.

use serde::{Deserialize, Serialize};

use super::{PresetBase, PresetKind, inherit_group, inherit_option, inherit_string, inherit_vec};
use crate::{Error, Preset, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPreset {
    #[serde(flatten)]
    pub base: PresetBase,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub configure_preset: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit_configure_environment: Option<bool>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub configuration: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overwrite_configuration_file: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_progress: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<Verbosity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_on_failure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output_log_file: String,
    #[serde(
        rename = "outputJUnitFile",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub output_junit_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_summary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subproject_summary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_passed_test_output_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_failed_test_output_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_output_truncation: Option<TestOutputTruncation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_test_name_width: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Default,
    Verbose,
    Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutputTruncation {
    Tail,
    Middle,
    Head,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<IncludeOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<ExcludeOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IncludeOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_union: Option<bool>,
}

/// Test index selection: a file naming the tests, or an explicit range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexOptions {
    File(String),
    Range(IndexRange),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IndexRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stride: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specific_tests: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExcludeOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<FixturesOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FixturesOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub any: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub setup: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cleanup: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExecutionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_on_failure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_failover: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<u32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_spec_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_load: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_only: Option<ShowOnlyFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive_debugging: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_random: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_tests_action: Option<NoTestsAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShowOnlyFormat {
    #[serde(rename = "human")]
    Human,
    #[serde(rename = "json-v1")]
    JsonV1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepeatOptions {
    pub mode: RepeatMode,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatMode {
    UntilFail,
    UntilPass,
    AfterTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoTestsAction {
    Default,
    Error,
    Ignore,
}

fn merge_output(child: &mut OutputOptions, parent: &OutputOptions) {
    inherit_option(&mut child.short_progress, &parent.short_progress);
    inherit_option(&mut child.verbosity, &parent.verbosity);
    inherit_option(&mut child.debug, &parent.debug);
    inherit_option(&mut child.output_on_failure, &parent.output_on_failure);
    inherit_option(&mut child.quiet, &parent.quiet);
    inherit_string(&mut child.output_log_file, &parent.output_log_file);
    inherit_string(&mut child.output_junit_file, &parent.output_junit_file);
    inherit_option(&mut child.label_summary, &parent.label_summary);
    inherit_option(&mut child.subproject_summary, &parent.subproject_summary);
    inherit_option(
        &mut child.max_passed_test_output_size,
        &parent.max_passed_test_output_size,
    );
    inherit_option(
        &mut child.max_failed_test_output_size,
        &parent.max_failed_test_output_size,
    );
    inherit_option(&mut child.test_output_truncation, &parent.test_output_truncation);
    inherit_option(&mut child.max_test_name_width, &parent.max_test_name_width);
}

fn merge_include(child: &mut IncludeOptions, parent: &IncludeOptions) {
    inherit_string(&mut child.name, &parent.name);
    inherit_string(&mut child.label, &parent.label);
    inherit_option(&mut child.index, &parent.index);
    inherit_option(&mut child.use_union, &parent.use_union);
}

fn merge_exclude(child: &mut ExcludeOptions, parent: &ExcludeOptions) {
    inherit_string(&mut child.name, &parent.name);
    inherit_string(&mut child.label, &parent.label);
    inherit_option(&mut child.fixtures, &parent.fixtures);
}

fn merge_execution(child: &mut ExecutionOptions, parent: &ExecutionOptions) {
    inherit_option(&mut child.stop_on_failure, &parent.stop_on_failure);
    inherit_option(&mut child.enable_failover, &parent.enable_failover);
    inherit_option(&mut child.jobs, &parent.jobs);
    inherit_string(&mut child.resource_spec_file, &parent.resource_spec_file);
    inherit_option(&mut child.test_load, &parent.test_load);
    inherit_option(&mut child.show_only, &parent.show_only);
    inherit_option(&mut child.repeat, &parent.repeat);
    inherit_option(&mut child.interactive_debugging, &parent.interactive_debugging);
    inherit_option(&mut child.schedule_random, &parent.schedule_random);
    inherit_option(&mut child.timeout, &parent.timeout);
    inherit_option(&mut child.no_tests_action, &parent.no_tests_action);
}

impl Preset for TestPreset {
    const KIND: PresetKind = PresetKind::Test;

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
        inherit_string(&mut self.configuration, &parent.configuration);
        inherit_vec(
            &mut self.overwrite_configuration_file,
            &parent.overwrite_configuration_file,
        );
        inherit_group(&mut self.output, &parent.output, merge_output);

        if let Some(parent_filter) = &parent.filter {
            if parent_filter.include.is_some() {
                let filter = self.filter.get_or_insert_with(FilterOptions::default);
                inherit_group(&mut filter.include, &parent_filter.include, merge_include);
            }
            if parent_filter.exclude.is_some() {
                let filter = self.filter.get_or_insert_with(FilterOptions::default);
                inherit_group(&mut filter.exclude, &parent_filter.exclude, merge_exclude);
            }
        }

        inherit_group(&mut self.execution, &parent.execution, merge_execution);
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
        let mut fields: Vec<&mut String> = self.overwrite_configuration_file.iter_mut().collect();

        if let Some(output) = self.output.as_mut() {
            fields.push(&mut output.output_log_file);
            fields.push(&mut output.output_junit_file);
        }

        if let Some(filter) = self.filter.as_mut() {
            if let Some(include) = filter.include.as_mut() {
                fields.push(&mut include.name);
                fields.push(&mut include.label);
                if let Some(IndexOptions::File(file)) = include.index.as_mut() {
                    fields.push(file);
                }
            }
            if let Some(exclude) = filter.exclude.as_mut() {
                fields.push(&mut exclude.name);
                fields.push(&mut exclude.label);
                if let Some(fixtures) = exclude.fixtures.as_mut() {
                    fields.push(&mut fixtures.any);
                    fields.push(&mut fixtures.setup);
                    fields.push(&mut fixtures.cleanup);
                }
            }
        }

        if let Some(execution) = self.execution.as_mut() {
            fields.push(&mut execution.resource_spec_file);
        }
        fields
    }
}

impl TestPreset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: PresetBase::named(name),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> TestPreset {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_option_groups() {
        let preset = parse(json!({
            "name": "t",
            "configurePreset": "c",
            "output": {"verbosity": "extra", "testOutputTruncation": "middle"},
            "filter": {"include": {"index": {"start": 1, "specificTests": [3, 4]}}},
            "execution": {"repeat": {"mode": "until-pass", "count": 3}, "noTestsAction": "error"}
        }));
        let output = preset.output.unwrap();
        assert_eq!(output.verbosity, Some(Verbosity::Extra));
        assert_eq!(output.test_output_truncation, Some(TestOutputTruncation::Middle));
        assert_eq!(
            preset.filter.unwrap().include.unwrap().index,
            Some(IndexOptions::Range(IndexRange {
                start: Some(1),
                specific_tests: vec![3, 4],
                ..IndexRange::default()
            }))
        );
        let execution = preset.execution.unwrap();
        assert_eq!(
            execution.repeat,
            Some(RepeatOptions {
                mode: RepeatMode::UntilPass,
                count: 3
            })
        );
        assert_eq!(execution.no_tests_action, Some(NoTestsAction::Error));
    }

    #[test]
    fn test_index_file_form() {
        let preset = parse(json!({
            "name": "t",
            "filter": {"include": {"index": "tests.txt"}}
        }));
        assert_eq!(
            preset.filter.unwrap().include.unwrap().index,
            Some(IndexOptions::File("tests.txt".into()))
        );
    }

    #[test]
    fn test_groups_merge_field_by_field() {
        let mut child = parse(json!({
            "name": "child",
            "output": {"verbosity": "verbose"},
            "filter": {"exclude": {"label": "slow"}}
        }));
        let parent = parse(json!({
            "name": "parent",
            "configurePreset": "c",
            "output": {"verbosity": "extra", "outputOnFailure": true},
            "filter": {
                "include": {"name": "unit"},
                "exclude": {"label": "flaky", "name": "net"}
            },
            "execution": {"jobs": 8}
        }));

        child.inherit_fields(&parent);

        let output = child.output.as_ref().unwrap();
        assert_eq!(output.verbosity, Some(Verbosity::Verbose));
        assert_eq!(output.output_on_failure, Some(true));

        let filter = child.filter.as_ref().unwrap();
        assert_eq!(filter.include.as_ref().unwrap().name, "unit");
        let exclude = filter.exclude.as_ref().unwrap();
        assert_eq!(exclude.label, "slow");
        assert_eq!(exclude.name, "net");

        assert_eq!(child.execution.as_ref().and_then(|e| e.jobs), Some(8));
        assert_eq!(child.configure_preset, "c");
    }

    #[test]
    fn test_macro_fields_cover_nested_groups() {
        let mut preset = parse(json!({
            "name": "t",
            "output": {"outputLogFile": "log"},
            "filter": {
                "include": {"index": "idx"},
                "exclude": {"fixtures": {"setup": "db"}}
            },
            "execution": {"resourceSpecFile": "spec.json"}
        }));
        let mut fields: Vec<String> = preset
            .macro_fields_mut()
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.clone())
            .collect();
        fields.sort();
        assert_eq!(fields, vec!["db", "idx", "log", "spec.json"]);
    }
}
