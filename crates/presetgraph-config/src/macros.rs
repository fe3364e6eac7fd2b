//! Macro expansion for preset string fields.
//!
//! Supports macros like:
//! - `${sourceDir}` - Absolute source directory
//! - `${sourceParentDir}` - Parent of the source directory
//! - `${sourceDirName}` - Last component of the source directory
//! - `${presetName}` - Name of the preset being expanded
//! - `${generator}` - Generator of the preset's configure preset
//! - `${dollar}` - A literal `$`
//! - `${hostSystemName}` - Host operating system (file version 3+)
//! - `${fileDir}` - Directory of the file declaring the preset (version 4+)
//! - `${pathListSep}` - Native path list separator (version 5+)
//! - `$env{NAME}` - Preset environment, falling back to the process environment
//! - `$penv{NAME}` - Process environment only
//! - `$vendor{NAME}` - Never expanded; the whole preset is skipped
//!
//! `${env.NAME}`, `${penv.NAME}` and `${vendor.NAME}` are accepted as
//! aliases of the namespaced forms.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::version::MAX_VERSION;

/// Why a string could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacroError {
    /// A `vendor` macro was found. Not a failure: the preset is dropped.
    #[error("vendor macro \"{0}\" is not understood by this tool")]
    VendorIgnored(String),

    #[error("unterminated macro in \"{0}\"")]
    Unterminated(String),

    #[error("unknown macro \"{0}\"")]
    UnknownMacro(String),

    #[error("macro \"{name}\" requires file version {required} or higher")]
    VersionTooLow { name: String, required: u32 },

    #[error("environment macro names must not be empty")]
    EmptyEnvName,

    #[error("environment variable \"{0}\" references itself")]
    Cycle(String),

    #[error("invalid regular expression \"{regex}\": {message}")]
    InvalidRegex { regex: String, message: String },
}

pub type MacroResult<T> = std::result::Result<T, MacroError>;

const VALID_NAMESPACES: [&str; 4] = ["", "env", "penv", "vendor"];

fn is_valid_namespace(namespace: &str) -> bool {
    VALID_NAMESPACES.contains(&namespace)
}

/// True while `partial` can still grow into a valid namespace.
fn prefixes_valid_namespace(partial: &str) -> bool {
    VALID_NAMESPACES.iter().any(|ns| ns.starts_with(partial))
}

/// Source of process environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Values for the default-namespace macros of one preset.
#[derive(Debug, Clone, Default)]
pub struct MacroContext {
    pub source_dir: String,
    pub source_parent_dir: String,
    pub source_dir_name: String,
    pub preset_name: String,
    /// Empty for hidden presets.
    pub generator: String,
    pub file_dir: String,
    pub host_system_name: String,
}

impl MacroContext {
    /// Resolve a default-namespace macro. `Ok(None)` means the name is not
    /// one of ours.
    pub fn resolve(&self, name: &str, version: u32) -> MacroResult<Option<String>> {
        let value = match name {
            "sourceDir" => self.source_dir.clone(),
            "sourceParentDir" => self.source_parent_dir.clone(),
            "sourceDirName" => self.source_dir_name.clone(),
            "presetName" => self.preset_name.clone(),
            "generator" => self.generator.clone(),
            "dollar" => "$".to_string(),
            "hostSystemName" => {
                require(name, 3, version)?;
                self.host_system_name.clone()
            }
            "fileDir" => {
                require(name, 4, version)?;
                self.file_dir.clone()
            }
            "pathListSep" => {
                require(name, 5, version)?;
                path_list_separator().to_string()
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }
}

fn require(name: &str, required: u32, version: u32) -> MacroResult<()> {
    if version < required {
        return Err(MacroError::VersionTooLow {
            name: name.to_string(),
            required,
        });
    }
    Ok(())
}

fn path_list_separator() -> &'static str {
    if cfg!(windows) { ";" } else { ":" }
}

/// The name `${hostSystemName}` reports for the running host.
pub fn host_system_name() -> String {
    match std::env::consts::OS {
        "linux" => "Linux".to_string(),
        "macos" => "Darwin".to_string(),
        "windows" => "Windows".to_string(),
        "freebsd" => "FreeBSD".to_string(),
        "netbsd" => "NetBSD".to_string(),
        "openbsd" => "OpenBSD".to_string(),
        "android" => "Android".to_string(),
        "ios" => "iOS".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleStatus {
    InProgress,
    Verified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Default,
    Namespace,
    Name,
}

/// Expands macros for a single preset.
///
/// The preset's environment is owned by the expander and expanded in place
/// on first use, so `$env{}` references between entries resolve to expanded
/// values and reference cycles are caught.
pub struct MacroExpander<'a> {
    context: &'a MacroContext,
    environment: BTreeMap<String, Option<String>>,
    status: HashMap<String, CycleStatus>,
    process: &'a dyn Environment,
    version: u32,
    penv_only: bool,
}

impl<'a> MacroExpander<'a> {
    pub fn new(
        context: &'a MacroContext,
        environment: BTreeMap<String, Option<String>>,
        process: &'a dyn Environment,
        version: u32,
    ) -> Self {
        Self {
            context,
            environment,
            status: HashMap::new(),
            process,
            version,
            penv_only: false,
        }
    }

    /// Expand every environment entry, in key order.
    pub fn expand_environment(&mut self) -> MacroResult<()> {
        let names: Vec<String> = self
            .environment
            .iter()
            .filter(|(_, value)| value.is_some())
            .map(|(name, _)| name.clone())
            .collect();
        for name in names {
            self.visit_env(&name)?;
        }
        Ok(())
    }

    /// Hand back the (possibly expanded) environment.
    pub fn into_environment(self) -> BTreeMap<String, Option<String>> {
        self.environment
    }

    pub fn expand_in_place(&mut self, field: &mut String) -> MacroResult<()> {
        *field = self.expand(field)?;
        Ok(())
    }

    /// Expand all macros in `input`.
    pub fn expand(&mut self, input: &str) -> MacroResult<String> {
        let mut result = String::with_capacity(input.len());
        let mut namespace = String::new();
        let mut name = String::new();
        let mut state = State::Default;

        for c in input.chars() {
            match state {
                State::Default => {
                    if c == '$' {
                        state = State::Namespace;
                    } else {
                        result.push(c);
                    }
                }
                State::Namespace => {
                    if c == '{' {
                        if is_valid_namespace(&namespace) {
                            state = State::Name;
                        } else {
                            result.push('$');
                            result.push_str(&namespace);
                            result.push('{');
                            namespace.clear();
                            state = State::Default;
                        }
                    } else {
                        namespace.push(c);
                        if !prefixes_valid_namespace(&namespace) {
                            result.push('$');
                            result.push_str(&namespace);
                            namespace.clear();
                            state = State::Default;
                        }
                    }
                }
                State::Name => {
                    if c == '}' {
                        let value = self.expand_macro(&namespace, &name)?;
                        result.push_str(&value);
                        namespace.clear();
                        name.clear();
                        state = State::Default;
                    } else {
                        name.push(c);
                    }
                }
            }
        }

        match state {
            State::Default => {}
            State::Namespace => {
                result.push('$');
                result.push_str(&namespace);
            }
            State::Name => return Err(MacroError::Unterminated(input.to_string())),
        }
        Ok(result)
    }

    fn expand_macro(&mut self, namespace: &str, name: &str) -> MacroResult<String> {
        let (namespace, name) = match (namespace, name.split_once('.')) {
            ("", Some((prefix, rest))) if !prefix.is_empty() && is_valid_namespace(prefix) => {
                (prefix, rest)
            }
            _ => (namespace, name),
        };

        if self.penv_only && namespace != "penv" {
            return Err(MacroError::UnknownMacro(format!("${namespace}{{{name}}}")));
        }

        match namespace {
            "" => self
                .context
                .resolve(name, self.version)?
                .ok_or_else(|| MacroError::UnknownMacro(format!("${{{name}}}"))),
            "env" | "penv" if name.is_empty() => Err(MacroError::EmptyEnvName),
            "env" if matches!(self.environment.get(name), Some(Some(_))) => {
                self.visit_env(name)?;
                Ok(self
                    .environment
                    .get(name)
                    .cloned()
                    .flatten()
                    .unwrap_or_default())
            }
            "env" | "penv" => Ok(self.process.var(name).unwrap_or_default()),
            "vendor" => Err(MacroError::VendorIgnored(name.to_string())),
            other => Err(MacroError::UnknownMacro(format!("${other}{{{name}}}"))),
        }
    }

    fn visit_env(&mut self, name: &str) -> MacroResult<()> {
        match self.status.get(name) {
            Some(CycleStatus::Verified) => return Ok(()),
            Some(CycleStatus::InProgress) => return Err(MacroError::Cycle(name.to_string())),
            None => {}
        }

        self.status.insert(name.to_string(), CycleStatus::InProgress);
        let raw = self.environment.get(name).cloned().flatten().unwrap_or_default();
        let expanded = self.expand(&raw)?;
        self.environment.insert(name.to_string(), Some(expanded));
        self.status.insert(name.to_string(), CycleStatus::Verified);
        Ok(())
    }
}

/// Expand only `$penv{}` macros, as allowed in `include` paths.
pub fn expand_process_env(input: &str, process: &dyn Environment) -> MacroResult<String> {
    let context = MacroContext::default();
    let mut expander = MacroExpander::new(&context, BTreeMap::new(), process, MAX_VERSION);
    expander.penv_only = true;
    expander.expand(input)
}
