//! Preset files and the include reachability relation.

use derive_more::Display;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Handle to a file in a [`FileTable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("file#{_0}")]
pub struct FileId(usize);

impl FileId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A loaded preset document.
#[derive(Debug, Clone)]
pub struct PresetFile {
    /// Canonical path of the document.
    pub path: PathBuf,
    /// Declared schema version.
    pub version: u32,
    /// Files whose presets may be referenced from this one. Always contains
    /// the file itself.
    pub reachable: BTreeSet<FileId>,
}

impl PresetFile {
    /// Directory containing the document.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Arena of every file read during one load.
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    files: Vec<PresetFile>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file. The new file can reach itself and nothing else.
    pub fn push(&mut self, path: PathBuf, version: u32) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(PresetFile {
            path,
            version,
            reachable: BTreeSet::from([id]),
        });
        id
    }

    pub fn get(&self, id: FileId) -> &PresetFile {
        &self.files[id.0]
    }

    pub fn find(&self, path: &Path) -> Option<FileId> {
        self.files
            .iter()
            .position(|f| f.path == path)
            .map(FileId)
    }

    pub fn version(&self, id: FileId) -> u32 {
        self.get(id).version
    }

    /// Make everything reachable from `included` reachable from `file`.
    pub fn absorb_reachable(&mut self, file: FileId, included: FileId) {
        let extra = self.files[included.0].reachable.clone();
        self.files[file.0].reachable.extend(extra);
    }

    /// Whether presets in `to` may be referenced from presets in `from`.
    pub fn is_reachable(&self, from: FileId, to: FileId) -> bool {
        self.get(from).reachable.contains(&to)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileId, &PresetFile)> {
        self.files.iter().enumerate().map(|(i, f)| (FileId(i), f))
    }
}
