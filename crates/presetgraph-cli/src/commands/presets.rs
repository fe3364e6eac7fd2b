//! Preset listing and inspection.

use anyhow::{Result, bail};
use presetgraph_config::format_listing;
use presetgraph_core::{
    BuildPreset, ConfigurePreset, PackagePreset, PresetKind, TestPreset, WorkflowPreset,
};

use super::LoadArgs;

pub fn list(args: &LoadArgs, kind: Option<PresetKind>) -> Result<()> {
    let graph = args.load()?;
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => PresetKind::ALL.to_vec(),
    };

    let sections: Vec<String> = kinds
        .into_iter()
        .map(|kind| format_listing(kind, &graph.listing(kind)))
        .filter(|section| !section.is_empty())
        .collect();
    if sections.is_empty() {
        println!("No presets available");
    } else {
        print!("{}", sections.join("\n"));
    }
    Ok(())
}

pub fn show(args: &LoadArgs, name: &str, kind: PresetKind) -> Result<()> {
    let graph = args.load()?;
    let json = match kind {
        PresetKind::Configure => graph
            .expanded::<ConfigurePreset>(name)
            .map(serde_json::to_string_pretty),
        PresetKind::Build => graph
            .expanded::<BuildPreset>(name)
            .map(serde_json::to_string_pretty),
        PresetKind::Test => graph
            .expanded::<TestPreset>(name)
            .map(serde_json::to_string_pretty),
        PresetKind::Package => graph
            .expanded::<PackagePreset>(name)
            .map(serde_json::to_string_pretty),
        PresetKind::Workflow => graph
            .expanded::<WorkflowPreset>(name)
            .map(serde_json::to_string_pretty),
    };

    match json {
        Some(json) => {
            println!("{}", json?);
            Ok(())
        }
        None => bail!("no usable {kind} preset named \"{name}\""),
    }
}
