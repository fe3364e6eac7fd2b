//! Per-preset macro expansion.
//!
//! Runs after inheritance. Each preset is cloned, its environment expanded,
//! its condition evaluated and its macro-capable fields rewritten. A `vendor`
//! macro anywhere drops the preset's expanded form entirely.

use std::path::Path;

use presetgraph_core::{
    BuildPreset, Condition, ConfigurePreset, FileTable, PackagePreset, Preset, PresetKind,
    TestPreset, WorkflowPreset,
};
use tracing::{debug, info, warn};

use crate::condition::evaluate;
use crate::diagnostics::Diagnostics;
use crate::macros::{Environment, MacroContext, MacroError, MacroExpander, MacroResult};
use crate::paths::{absolute_from, file_name, parent_dir, to_slash};
use crate::store::{PresetStore, StoredPreset};
use crate::{ConfigError, ConfigResult};

/// Inputs shared by every preset of one pass.
pub(crate) struct ExpandEnv<'a> {
    pub source_dir: &'a Path,
    pub files: &'a FileTable,
    pub process: &'a dyn Environment,
    pub host_system_name: &'a str,
}

/// Result of expanding one preset.
#[derive(Debug)]
pub(crate) enum Expansion<T> {
    Expanded(T),
    /// A `vendor` macro was met; carries the macro name.
    Ignored(String),
}

/// Expand every preset, configure presets first.
pub(crate) fn expand_all(
    store: &mut PresetStore,
    env: &ExpandEnv<'_>,
    diagnostics: &mut Diagnostics,
) -> ConfigResult<()> {
    expand_kind::<ConfigurePreset>(store, env, diagnostics, normalize_directories)?;
    expand_kind::<BuildPreset>(store, env, diagnostics, |_, _| {})?;
    expand_kind::<TestPreset>(store, env, diagnostics, |_, _| {})?;
    expand_kind::<PackagePreset>(store, env, diagnostics, |_, _| {})?;
    expand_kind::<WorkflowPreset>(store, env, diagnostics, |_, _| {})?;
    Ok(())
}

fn expand_kind<T: StoredPreset>(
    store: &mut PresetStore,
    env: &ExpandEnv<'_>,
    diagnostics: &mut Diagnostics,
    finish: impl Fn(&mut T, &Path),
) -> ConfigResult<()> {
    let names = store.map::<T>().names().to_vec();
    for name in &names {
        let Some(pair) = store.map::<T>().get(name) else {
            continue;
        };
        let mut preset = pair.unexpanded.clone();
        link_configure_preset(&mut preset, store, env.files)?;
        let generator = generator_for(store, &preset);

        let expanded = match expand_preset(&preset, generator, env)? {
            Expansion::Expanded(mut expanded) => {
                finish(&mut expanded, env.source_dir);
                if !expanded.base().condition_result && !expanded.base().hidden {
                    info!(kind = %T::KIND, preset = %name, "Preset condition is false");
                    diagnostics.note(format!(
                        "{} preset \"{name}\" is inactive: its condition evaluated to false",
                        T::KIND
                    ));
                }
                Some(expanded)
            }
            Expansion::Ignored(vendor) => {
                if !preset.base().hidden {
                    warn!(
                        kind = %T::KIND,
                        preset = %name,
                        %vendor,
                        "Ignoring preset with vendor macro"
                    );
                    diagnostics.warning(format!(
                        "{} preset \"{name}\" ignored: vendor macro \"{vendor}\" is not supported",
                        T::KIND
                    ));
                }
                None
            }
        };

        if let Some(pair) = store.map_mut::<T>().get_mut(name) {
            pair.unexpanded = preset;
            pair.expanded = expanded;
        }
    }
    debug!(kind = %T::KIND, count = names.len(), "Expanded presets");
    Ok(())
}

/// Check a non-hidden preset's `configurePreset` and merge in its
/// environment. Configure and workflow presets have no such reference.
fn link_configure_preset<T: Preset>(
    preset: &mut T,
    store: &PresetStore,
    files: &FileTable,
) -> ConfigResult<()> {
    if preset.base().hidden {
        return Ok(());
    }
    let Some(configure_name) = preset.configure_preset() else {
        return Ok(());
    };

    let Some(configure) = store.configure.get(configure_name) else {
        return Err(ConfigError::InvalidPresetReference {
            kind: T::KIND,
            name: preset.name().to_string(),
            reference: configure_name.to_string(),
        });
    };
    let configure = &configure.unexpanded;
    if !files.is_reachable(preset.base().origin_file, configure.base.origin_file) {
        return Err(ConfigError::ConfigurePresetUnreachable {
            kind: T::KIND,
            name: preset.name().to_string(),
            configure: configure_name.to_string(),
        });
    }

    if preset.inherits_configure_environment() {
        let environment = &mut preset.base_mut().environment;
        for (key, value) in &configure.base.environment {
            environment
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
    Ok(())
}

/// The unexpanded generator `${generator}` reports for `preset`.
fn generator_for<T: Preset>(store: &PresetStore, preset: &T) -> String {
    if preset.base().hidden {
        return String::new();
    }
    match T::KIND {
        PresetKind::Configure => store.configure_generator(preset.name()),
        _ => preset
            .configure_preset()
            .map(|name| store.configure_generator(name))
            .unwrap_or_default(),
    }
}

/// Expand one preset in isolation.
pub(crate) fn expand_preset<T: Preset>(
    preset: &T,
    generator: String,
    env: &ExpandEnv<'_>,
) -> ConfigResult<Expansion<T>> {
    let file = env.files.get(preset.base().origin_file);
    let context = MacroContext {
        source_dir: to_slash(env.source_dir),
        source_parent_dir: parent_dir(env.source_dir),
        source_dir_name: file_name(env.source_dir),
        preset_name: preset.name().to_string(),
        generator,
        file_dir: to_slash(file.directory()),
        host_system_name: env.host_system_name.to_string(),
    };

    let mut out = preset.clone();
    let environment = std::mem::take(&mut out.base_mut().environment);
    let mut expander = MacroExpander::new(&context, environment, env.process, file.version);

    let result = expand_fields(&mut out, preset.base().condition.as_ref(), &mut expander);

    match result {
        Ok(active) => {
            let base = out.base_mut();
            base.environment = expander.into_environment();
            base.condition_result = active;
            Ok(Expansion::Expanded(out))
        }
        Err(MacroError::VendorIgnored(vendor)) => Ok(Expansion::Ignored(vendor)),
        Err(err) => Err(macro_error::<T>(preset.name(), &file.path, file.version, err)),
    }
}

/// Expand the environment, evaluate the condition and rewrite the
/// macro-capable fields, in that order.
fn expand_fields<T: Preset>(
    out: &mut T,
    condition: Option<&Condition>,
    expander: &mut MacroExpander<'_>,
) -> MacroResult<bool> {
    expander.expand_environment()?;
    let active = match condition {
        Some(condition) => evaluate(condition, expander)?,
        None => true,
    };
    for field in out.macro_fields_mut() {
        expander.expand_in_place(field)?;
    }
    Ok(active)
}

fn macro_error<T: Preset>(name: &str, path: &Path, version: u32, err: MacroError) -> ConfigError {
    let kind = T::KIND;
    let name = name.to_string();
    match err {
        MacroError::Cycle(variable) => ConfigError::CyclicMacroExpansion {
            kind,
            name,
            variable,
        },
        MacroError::VersionTooLow {
            name: macro_name,
            required,
        } => ConfigError::VersionUnsupported {
            path: path.to_path_buf(),
            field: format!("\"${{{macro_name}}}\""),
            required,
            found: version,
        },
        err @ MacroError::InvalidRegex { .. } => ConfigError::InvalidCondition {
            kind,
            name,
            message: err.to_string(),
        },
        err => ConfigError::InvalidMacroExpansion {
            kind,
            name,
            message: err.to_string(),
        },
    }
}

/// Make `binaryDir` and `installDir` absolute against the source directory.
fn normalize_directories(preset: &mut ConfigurePreset, source_dir: &Path) {
    for dir in [&mut preset.binary_dir, &mut preset.install_dir] {
        if !dir.is_empty() {
            *dir = to_slash(&absolute_from(source_dir, dir));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presetgraph_core::preset::CacheVariable;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    struct Fixture {
        files: FileTable,
        process: BTreeMap<String, String>,
        source_dir: PathBuf,
    }

    impl Fixture {
        fn new(version: u32) -> Self {
            let mut files = FileTable::new();
            files.push(PathBuf::from("/work/project/CMakePresets.json"), version);
            Self {
                files,
                process: BTreeMap::from([("HOME".to_string(), "/home/me".to_string())]),
                source_dir: PathBuf::from("/work/project"),
            }
        }

        fn env(&self) -> ExpandEnv<'_> {
            ExpandEnv {
                source_dir: &self.source_dir,
                files: &self.files,
                process: &self.process,
                host_system_name: "Linux",
            }
        }
    }

    fn configure(value: serde_json::Value) -> ConfigurePreset {
        let mut preset: ConfigurePreset = serde_json::from_value(value).unwrap();
        preset.base.bind_condition().unwrap();
        preset
    }

    fn expanded(expansion: Expansion<ConfigurePreset>) -> ConfigurePreset {
        match expansion {
            Expansion::Expanded(preset) => preset,
            Expansion::Ignored(vendor) => panic!("unexpectedly ignored by {vendor}"),
        }
    }

    #[test]
    fn test_expands_fields_and_environment() {
        let fixture = Fixture::new(4);
        let preset = configure(json!({
            "name": "dev",
            "binaryDir": "${sourceDir}/out/${presetName}",
            "cacheVariables": {
                "ROOT": "$env{ROOT}",
                "GEN": "${generator}",
                "UNSET": null
            },
            "environment": {
                "ROOT": "$penv{HOME}/sdk",
                "LIB": "$env{ROOT}/lib"
            }
        }));

        let out = expanded(expand_preset(&preset, "Ninja".into(), &fixture.env()).unwrap());
        assert_eq!(out.binary_dir, "/work/project/out/dev");
        assert_eq!(
            out.cache_variables["ROOT"],
            Some(CacheVariable::new("", "/home/me/sdk"))
        );
        assert_eq!(out.cache_variables["GEN"], Some(CacheVariable::new("", "Ninja")));
        assert_eq!(out.cache_variables["UNSET"], None);
        assert_eq!(
            out.base.environment["LIB"],
            Some("/home/me/sdk/lib".to_string())
        );
        assert!(out.base.condition_result);
    }

    #[test]
    fn test_relative_binary_dir_made_absolute() {
        let fixture = Fixture::new(3);
        let mut preset = configure(json!({"name": "rel", "binaryDir": "build/../out", "installDir": ""}));
        normalize_directories(&mut preset, &fixture.source_dir);
        assert_eq!(preset.binary_dir, "/work/project/out");
        assert_eq!(preset.install_dir, "");
    }

    #[test]
    fn test_environment_cycle() {
        let fixture = Fixture::new(3);
        let preset = configure(json!({
            "name": "loop",
            "environment": {"A": "$env{B}", "B": "$env{A}"}
        }));
        assert!(matches!(
            expand_preset(&preset, String::new(), &fixture.env()),
            Err(ConfigError::CyclicMacroExpansion { .. })
        ));
    }

    #[test]
    fn test_vendor_macro_ignores_preset() {
        let fixture = Fixture::new(3);
        let preset = configure(json!({
            "name": "ide",
            "binaryDir": "$vendor{ide.dir}"
        }));
        assert!(matches!(
            expand_preset(&preset, String::new(), &fixture.env()).unwrap(),
            Expansion::Ignored(_)
        ));
    }

    #[test]
    fn test_condition_false_keeps_expansion() {
        let fixture = Fixture::new(3);
        let preset = configure(json!({
            "name": "windows-only",
            "condition": {"type": "equals", "lhs": "${hostSystemName}", "rhs": "Windows"}
        }));
        let out = expanded(expand_preset(&preset, String::new(), &fixture.env()).unwrap());
        assert!(!out.base.condition_result);
    }

    #[test]
    fn test_macro_version_gate() {
        let fixture = Fixture::new(2);
        let preset = configure(json!({"name": "old", "binaryDir": "${hostSystemName}"}));
        match expand_preset(&preset, String::new(), &fixture.env()) {
            Err(ConfigError::VersionUnsupported {
                field,
                required,
                found,
                ..
            }) => {
                assert_eq!(field, "\"${hostSystemName}\"");
                assert_eq!(required, 3);
                assert_eq!(found, 2);
            }
            other => panic!("expected a version error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_macro_is_error() {
        let fixture = Fixture::new(3);
        let preset = configure(json!({"name": "bad", "binaryDir": "${nope}"}));
        assert!(matches!(
            expand_preset(&preset, String::new(), &fixture.env()),
            Err(ConfigError::InvalidMacroExpansion { .. })
        ));
    }

    #[test]
    fn test_build_preset_links_configure_environment() {
        let fixture = Fixture::new(3);
        let mut store = PresetStore::new();
        store
            .configure
            .insert(configure(json!({
                "name": "cfg",
                "generator": "Ninja",
                "environment": {"CC": "clang", "MODE": "release"}
            })))
            .unwrap();
        let mut build: BuildPreset = serde_json::from_value(json!({
            "name": "b",
            "configurePreset": "cfg",
            "environment": {"MODE": "debug"}
        }))
        .unwrap();

        link_configure_preset(&mut build, &store, &fixture.files).unwrap();
        assert_eq!(build.base.environment["CC"], Some("clang".to_string()));
        assert_eq!(build.base.environment["MODE"], Some("debug".to_string()));
        assert_eq!(generator_for(&store, &build), "Ninja");

        build.inherit_configure_environment = Some(false);
        build.base.environment.remove("CC");
        link_configure_preset(&mut build, &store, &fixture.files).unwrap();
        assert!(!build.base.environment.contains_key("CC"));

        build.configure_preset = "ghost".into();
        assert!(matches!(
            link_configure_preset(&mut build, &store, &fixture.files),
            Err(ConfigError::InvalidPresetReference { .. })
        ));
    }

    #[test]
    fn test_hidden_presets_have_no_generator() {
        let mut store = PresetStore::new();
        let mut cfg = ConfigurePreset::new("cfg");
        cfg.generator = "Ninja".into();
        store.configure.insert(cfg.clone()).unwrap();
        assert_eq!(generator_for(&store, &cfg), "Ninja");

        let mut build = BuildPreset::new("b");
        build.configure_preset = "cfg".into();
        build.base.hidden = true;
        assert_eq!(generator_for(&store, &build), "");

        let mut hidden_cfg = ConfigurePreset::new("base");
        hidden_cfg.generator = "Ninja".into();
        hidden_cfg.base.hidden = true;
        store.configure.insert(hidden_cfg.clone()).unwrap();
        assert_eq!(generator_for(&store, &hidden_cfg), "");
    }
}
