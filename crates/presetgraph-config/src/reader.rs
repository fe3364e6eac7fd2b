//! Preset file reading.
//!
//! Builds the file table and fills the preset store. Files are identified by
//! canonical path; a file that is reached again while still on the include
//! stack is an include cycle, a file reached again after it finished loading
//! only contributes its reachability.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use presetgraph_core::{
    BuildPreset, ConfigurePreset, FileId, FileTable, PackagePreset, TestPreset, WorkflowPreset,
};
use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::Location;
use crate::macros::{Environment, expand_process_env};
use crate::store::{PresetStore, StoredPreset};
use crate::version::{self, ToolVersion};
use crate::{ConfigError, ConfigResult};

pub const PROJECT_FILE: &str = "CMakePresets.json";
pub const USER_FILE: &str = "CMakeUserPresets.json";

/// First version whose `include` entries undergo `$penv{}` expansion.
const INCLUDE_MACRO_VERSION: u32 = 7;

/// How a file entered the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// The user file; implicitly includes the project file.
    User,
    Project,
    Included,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PresetDocument {
    #[serde(rename = "version")]
    _version: IgnoredAny,
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,
    #[serde(rename = "vendor", default)]
    _vendor: Option<BTreeMap<String, IgnoredAny>>,
    #[serde(default)]
    cmake_minimum_required: Option<ToolVersion>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    configure_presets: Vec<ConfigurePreset>,
    #[serde(default)]
    build_presets: Vec<BuildPreset>,
    #[serde(default)]
    test_presets: Vec<TestPreset>,
    #[serde(default)]
    package_presets: Vec<PackagePreset>,
    #[serde(default)]
    workflow_presets: Vec<WorkflowPreset>,
}

/// Reads preset files into a [`FileTable`] and [`PresetStore`].
pub struct Reader<'a> {
    files: FileTable,
    store: PresetStore,
    /// Canonical paths of files whose includes are still being read.
    stack: Vec<PathBuf>,
    tool_version: ToolVersion,
    process: &'a dyn Environment,
}

impl<'a> Reader<'a> {
    pub fn new(tool_version: ToolVersion, process: &'a dyn Environment) -> Self {
        Self {
            files: FileTable::new(),
            store: PresetStore::new(),
            stack: Vec::new(),
            tool_version,
            process,
        }
    }

    pub fn finish(self) -> (FileTable, PresetStore) {
        (self.files, self.store)
    }

    /// Read `path` and everything it includes.
    pub fn read_file(&mut self, path: &Path, root: RootKind) -> ConfigResult<FileId> {
        let path = canonical(path)?;
        if self.stack.contains(&path) {
            return Err(ConfigError::CyclicInclude { path });
        }
        if let Some(id) = self.files.find(&path) {
            debug!(file = %path.display(), "Preset file already loaded");
            return Ok(id);
        }

        info!(file = %path.display(), ?root, "Reading preset file");
        let text = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
        let value: Value =
            serde_json::from_str(&text).map_err(|e| ConfigError::from_json(&path, &e))?;
        let version = version::file_version(&path, &value)?;
        version::check_gates(&path, version, &value)?;

        let document: PresetDocument =
            serde_json::from_str(&text).map_err(|e| ConfigError::from_json(&path, &e))?;
        version::check_minimum_required(
            &path,
            document.cmake_minimum_required,
            self.tool_version,
        )?;

        let id = self.files.push(path.clone(), version);
        self.stack.push(path.clone());

        self.add_presets(&path, id, document.configure_presets)?;
        self.add_presets(&path, id, document.build_presets)?;
        self.add_presets(&path, id, document.test_presets)?;
        self.add_presets(&path, id, document.package_presets)?;
        self.add_presets(&path, id, document.workflow_presets)?;

        let directory = self.files.get(id).directory().to_path_buf();
        for include in &document.include {
            let expanded = if version >= INCLUDE_MACRO_VERSION {
                expand_process_env(include, self.process).map_err(|_| {
                    ConfigError::InvalidInclude {
                        path: path.clone(),
                        include: include.clone(),
                    }
                })?
            } else {
                include.clone()
            };
            if expanded.is_empty() {
                return Err(ConfigError::InvalidInclude {
                    path: path.clone(),
                    include: include.clone(),
                });
            }

            let target = directory.join(&expanded);
            debug!(file = %path.display(), include = %target.display(), "Following include");
            let included = self.read_file(&target, RootKind::Included)?;
            self.files.absorb_reachable(id, included);
        }

        if root == RootKind::User {
            let project = directory.join(PROJECT_FILE);
            if project.is_file() {
                let included = self.read_file(&project, RootKind::Project)?;
                self.files.absorb_reachable(id, included);
            }
        }

        self.stack.pop();
        Ok(id)
    }

    fn add_presets<T: StoredPreset>(
        &mut self,
        path: &Path,
        file: FileId,
        presets: Vec<T>,
    ) -> ConfigResult<()> {
        for (index, mut preset) in presets.into_iter().enumerate() {
            let pointer = format!("/{}/{index}", T::KIND.array_key());
            if preset.name().is_empty() {
                return Err(schema(
                    path,
                    format!("{pointer}/name"),
                    format!("{} preset name must not be empty", T::KIND),
                ));
            }
            if let Some(field) = preset.base().unknown.keys().next() {
                return Err(schema(
                    path,
                    format!("{pointer}/{field}"),
                    format!(
                        "unknown field `{field}` in {} preset \"{}\"",
                        T::KIND,
                        preset.name()
                    ),
                ));
            }

            let base = preset.base_mut();
            base.origin_file = file;
            base.bind_condition()
                .map_err(|e| ConfigError::InvalidCondition {
                    kind: T::KIND,
                    name: base.name.clone(),
                    message: e.to_string(),
                })?;

            debug!(kind = %T::KIND, preset = %preset.name(), "Adding preset");
            self.store.map_mut::<T>().insert(preset)?;
        }
        Ok(())
    }
}

fn canonical(path: &Path) -> ConfigResult<PathBuf> {
    fs::canonicalize(path).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: io::Error) -> ConfigError {
    if source.kind() == io::ErrorKind::NotFound {
        ConfigError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn schema(path: &Path, pointer: String, message: String) -> ConfigError {
    ConfigError::SchemaViolation {
        path: path.to_path_buf(),
        location: Location::Pointer(pointer),
        message,
    }
}
