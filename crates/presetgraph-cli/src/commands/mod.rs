//! CLI command implementations.

pub mod presets;

use std::path::PathBuf;

use anyhow::{Context, Result};
use presetgraph_config::{Level, LoadOptions, PresetGraph};
use tracing::debug;

/// Load settings shared by every command.
pub struct LoadArgs {
    pub source_dir: PathBuf,
    pub allow_no_files: bool,
}

impl LoadArgs {
    fn options(&self) -> LoadOptions {
        LoadOptions {
            allow_no_files: self.allow_no_files,
            ..LoadOptions::default()
        }
    }

    pub fn load(&self) -> Result<PresetGraph> {
        debug!(source_dir = %self.source_dir.display(), "Loading presets");
        PresetGraph::load(&self.source_dir, &self.options())
            .with_context(|| format!("failed to load presets from {}", self.source_dir.display()))
    }
}

pub fn validate(args: &LoadArgs) -> Result<()> {
    let mut graph = PresetGraph::new(&args.source_dir);
    let result = graph.read_project(&args.options());

    // A failed pass is reported through the returned error.
    for diagnostic in graph.diagnostics().iter() {
        if diagnostic.level != Level::Error {
            eprintln!("{diagnostic}");
        }
    }
    result.context("preset validation failed")?;
    println!("Presets are valid");
    Ok(())
}
