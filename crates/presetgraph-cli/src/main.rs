//! PresetGraph CLI tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use presetgraph_core::PresetKind;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "presetgraph")]
#[command(about = "Resolve and inspect CMake preset files", long_about = None)]
struct Cli {
    /// Directory containing CMakePresets.json
    #[arg(long, global = true, env = "PRESETGRAPH_SOURCE_DIR", default_value = ".")]
    source_dir: PathBuf,

    /// Succeed when no preset file exists
    #[arg(long, global = true)]
    allow_no_files: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the presets available for use
    List {
        /// Only list presets of this kind
        #[arg(long, value_parser = parse_kind)]
        kind: Option<PresetKind>,
    },
    /// Print an expanded preset as JSON
    Show {
        /// Preset name
        name: String,
        /// Preset kind
        #[arg(long, value_parser = parse_kind, default_value = "configure")]
        kind: PresetKind,
    },
    /// Load every preset and report problems
    Validate,
}

fn parse_kind(value: &str) -> Result<PresetKind, String> {
    PresetKind::parse(value).ok_or_else(|| {
        format!("unknown preset kind \"{value}\" (expected configure, build, test, package or workflow)")
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = commands::LoadArgs {
        source_dir: cli.source_dir,
        allow_no_files: cli.allow_no_files,
    };

    match cli.command {
        Commands::List { kind } => {
            commands::presets::list(&options, kind)?;
        }
        Commands::Show { name, kind } => {
            commands::presets::show(&options, &name, kind)?;
        }
        Commands::Validate => {
            commands::validate(&options)?;
        }
    }

    Ok(())
}
