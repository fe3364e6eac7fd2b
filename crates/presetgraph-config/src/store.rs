//! The preset store: one name-keyed map per kind plus declaration order.

use std::collections::BTreeMap;

use presetgraph_core::{
    BuildPreset, ConfigurePreset, PackagePreset, Preset, PresetPair, TestPreset, WorkflowPreset,
};

use crate::{ConfigError, ConfigResult};

/// Presets of one kind, keyed by name, remembering declaration order.
#[derive(Debug, Clone)]
pub struct PresetMap<T> {
    presets: BTreeMap<String, PresetPair<T>>,
    order: Vec<String>,
}

impl<T> Default for PresetMap<T> {
    fn default() -> Self {
        Self {
            presets: BTreeMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Preset> PresetMap<T> {
    /// Add a preset. Names must be unique across every loaded file.
    pub fn insert(&mut self, preset: T) -> ConfigResult<()> {
        let name = preset.name().to_string();
        if self.presets.contains_key(&name) {
            return Err(ConfigError::DuplicatePreset {
                kind: T::KIND,
                name,
            });
        }
        self.presets.insert(name.clone(), PresetPair::new(preset));
        self.order.push(name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PresetPair<T>> {
        self.presets.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PresetPair<T>> {
        self.presets.get_mut(name)
    }

    /// Names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Presets in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &PresetPair<T>> {
        self.order.iter().filter_map(|name| self.presets.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// All presets of a load, by kind.
#[derive(Debug, Clone, Default)]
pub struct PresetStore {
    pub configure: PresetMap<ConfigurePreset>,
    pub build: PresetMap<BuildPreset>,
    pub test: PresetMap<TestPreset>,
    pub package: PresetMap<PackagePreset>,
    pub workflow: PresetMap<WorkflowPreset>,
}

impl PresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map<T: StoredPreset>(&self) -> &PresetMap<T> {
        T::map(self)
    }

    pub fn map_mut<T: StoredPreset>(&mut self) -> &mut PresetMap<T> {
        T::map_mut(self)
    }

    /// Unexpanded generator of the configure preset `name`, or empty.
    pub fn configure_generator(&self, name: &str) -> String {
        self.configure
            .get(name)
            .map(|pair| pair.unexpanded.generator.clone())
            .unwrap_or_default()
    }
}

/// Selects the map holding a preset kind.
pub trait StoredPreset: Preset + Sized {
    fn map(store: &PresetStore) -> &PresetMap<Self>;
    fn map_mut(store: &mut PresetStore) -> &mut PresetMap<Self>;
}

impl StoredPreset for ConfigurePreset {
    fn map(store: &PresetStore) -> &PresetMap<Self> {
        &store.configure
    }
    fn map_mut(store: &mut PresetStore) -> &mut PresetMap<Self> {
        &mut store.configure
    }
}

impl StoredPreset for BuildPreset {
    fn map(store: &PresetStore) -> &PresetMap<Self> {
        &store.build
    }
    fn map_mut(store: &mut PresetStore) -> &mut PresetMap<Self> {
        &mut store.build
    }
}

impl StoredPreset for TestPreset {
    fn map(store: &PresetStore) -> &PresetMap<Self> {
        &store.test
    }
    fn map_mut(store: &mut PresetStore) -> &mut PresetMap<Self> {
        &mut store.test
    }
}

impl StoredPreset for PackagePreset {
    fn map(store: &PresetStore) -> &PresetMap<Self> {
        &store.package
    }
    fn map_mut(store: &mut PresetStore) -> &mut PresetMap<Self> {
        &mut store.package
    }
}

impl StoredPreset for WorkflowPreset {
    fn map(store: &PresetStore) -> &PresetMap<Self> {
        &store.workflow
    }
    fn map_mut(store: &mut PresetStore) -> &mut PresetMap<Self> {
        &mut store.workflow
    }
}
