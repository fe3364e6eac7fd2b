//! The resolved preset graph of one source directory.
//!
//! A pass reads the files, resolves inheritance for every kind, expands every
//! preset and validates workflows. The first failure aborts the pass and
//! leaves the graph empty apart from the error diagnostic.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use presetgraph_core::{
    BuildPreset, ConfigurePreset, FileTable, PackagePreset, PresetKind, TestPreset,
    WorkflowPreset,
};
use tracing::{error, info};

use crate::diagnostics::Diagnostics;
use crate::expand::{self, ExpandEnv};
use crate::inherit::resolve_all;
use crate::macros::{Environment, ProcessEnvironment, host_system_name};
use crate::reader::{PROJECT_FILE, Reader, RootKind, USER_FILE};
use crate::store::{PresetStore, StoredPreset};
use crate::version::ToolVersion;
use crate::workflow;
use crate::{ConfigError, ConfigResult};

/// Tool version compared against `cmakeMinimumRequired` by default.
pub const DEFAULT_TOOL_VERSION: ToolVersion = ToolVersion::new(3, 28, 0);

/// Settings for one load.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Succeed with an empty graph when neither preset file exists.
    pub allow_no_files: bool,
    pub tool_version: ToolVersion,
    /// Replaces the process environment for `$env{}` and `$penv{}`.
    pub process_env: Option<BTreeMap<String, String>>,
    /// Replaces the detected `${hostSystemName}`.
    pub host_system_name: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            allow_no_files: false,
            tool_version: DEFAULT_TOOL_VERSION,
            process_env: None,
            host_system_name: None,
        }
    }
}

/// One line of a preset listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct PresetGraph {
    source_dir: PathBuf,
    files: FileTable,
    store: PresetStore,
    diagnostics: Diagnostics,
}

impl PresetGraph {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            files: FileTable::new(),
            store: PresetStore::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Create a graph and run one pass over `source_dir`.
    pub fn load(source_dir: impl Into<PathBuf>, options: &LoadOptions) -> ConfigResult<Self> {
        let mut graph = Self::new(source_dir);
        graph.read_project(options)?;
        Ok(graph)
    }

    /// Run a fresh pass, discarding anything from the previous one.
    pub fn read_project(&mut self, options: &LoadOptions) -> ConfigResult<()> {
        self.files = FileTable::new();
        self.store = PresetStore::new();
        self.diagnostics.clear();

        if let Err(err) = self.resolve(options) {
            error!(source_dir = %self.source_dir.display(), error = %err, "Failed to load presets");
            self.files = FileTable::new();
            self.store = PresetStore::new();
            self.diagnostics.error(err.to_string());
            return Err(err);
        }
        Ok(())
    }

    fn resolve(&mut self, options: &LoadOptions) -> ConfigResult<()> {
        let source_dir = canonical_dir(&self.source_dir)?;
        let process: &dyn Environment = match &options.process_env {
            Some(env) => env,
            None => &ProcessEnvironment,
        };

        let mut reader = Reader::new(options.tool_version, process);
        let user = source_dir.join(USER_FILE);
        let project = source_dir.join(PROJECT_FILE);
        if user.is_file() {
            reader.read_file(&user, RootKind::User)?;
        } else if project.is_file() {
            reader.read_file(&project, RootKind::Project)?;
        } else if options.allow_no_files {
            info!(source_dir = %source_dir.display(), "No preset files found");
            self.source_dir = source_dir;
            return Ok(());
        } else {
            return Err(ConfigError::FileNotFound { path: project });
        }
        let (files, mut store) = reader.finish();

        info!(files = files.len(), "Resolving inheritance");
        resolve_all(&mut store.configure, &files)?;
        resolve_all(&mut store.build, &files)?;
        resolve_all(&mut store.test, &files)?;
        resolve_all(&mut store.package, &files)?;
        resolve_all(&mut store.workflow, &files)?;

        let host = options
            .host_system_name
            .clone()
            .unwrap_or_else(host_system_name);
        let env = ExpandEnv {
            source_dir: &source_dir,
            files: &files,
            process,
            host_system_name: &host,
        };
        let mut diagnostics = Diagnostics::new();
        expand::expand_all(&mut store, &env, &mut diagnostics)?;

        workflow::validate_all(&store, &files)?;

        info!(
            configure = store.configure.len(),
            build = store.build.len(),
            test = store.test.len(),
            package = store.package.len(),
            workflow = store.workflow.len(),
            "Presets resolved"
        );
        self.source_dir = source_dir;
        self.files = files;
        self.store = store;
        self.diagnostics = diagnostics;
        Ok(())
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn files(&self) -> &FileTable {
        &self.files
    }

    pub fn store(&self) -> &PresetStore {
        &self.store
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Expanded presets that are visible to users, in declaration order:
    /// not hidden, expanded, and with a true condition.
    pub fn visible<'a, T: StoredPreset + 'a>(&'a self) -> impl Iterator<Item = &'a T> {
        self.store
            .map::<T>()
            .iter()
            .filter(|pair| !pair.unexpanded.base().hidden)
            .filter_map(|pair| pair.expanded.as_ref())
            .filter(|preset| preset.base().condition_result)
    }

    /// Expanded form of a visible preset.
    pub fn expanded<T: StoredPreset>(&self, name: &str) -> Option<&T> {
        self.visible::<T>().find(|preset| preset.name() == name)
    }

    pub fn listing(&self, kind: PresetKind) -> Vec<ListEntry> {
        match kind {
            PresetKind::Configure => self.entries::<ConfigurePreset>(),
            PresetKind::Build => self.entries::<BuildPreset>(),
            PresetKind::Test => self.entries::<TestPreset>(),
            PresetKind::Package => self.entries::<PackagePreset>(),
            PresetKind::Workflow => self.entries::<WorkflowPreset>(),
        }
    }

    fn entries<T: StoredPreset>(&self) -> Vec<ListEntry> {
        self.visible::<T>()
            .map(|preset| ListEntry {
                name: preset.name().to_string(),
                display_name: preset.base().display_name.clone(),
            })
            .collect()
    }
}

/// Render a listing as a padded table. Empty when there is nothing to list.
pub fn format_listing(kind: PresetKind, entries: &[ListEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let width = entries
        .iter()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(0)
        + 2;

    let mut out = format!("Available {kind} presets:\n\n");
    for entry in entries {
        let quoted = format!("\"{}\"", entry.name);
        if entry.display_name.is_empty() {
            out.push_str(&format!("  {quoted}\n"));
        } else {
            out.push_str(&format!("  {quoted:<width$} - {}\n", entry.display_name));
        }
    }
    out
}

fn canonical_dir(path: &Path) -> ConfigResult<PathBuf> {
    fs::canonicalize(path).map_err(|source| {
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
    })
}
