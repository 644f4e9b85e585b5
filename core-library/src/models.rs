//! Domain models for the library index
//!
//! The index is the serialized form of the cache file.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::iter;
use std::path::{Path, PathBuf};

// =============================================================================
// Library Index
// =============================================================================

/// Directories under a library root that hold audio, and the files in them.
///
/// `dirs` are relative to `base_path`. `files` is keyed by the absolute
/// directory and holds absolute file paths, so every file under the root
/// appears exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryIndex {
    /// Root of the library
    pub base_path: PathBuf,
    /// Directories containing music, relative to the root
    pub dirs: BTreeSet<PathBuf>,
    /// Audio files by containing directory
    pub files: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

impl LibraryIndex {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            dirs: BTreeSet::new(),
            files: BTreeMap::new(),
        }
    }

    /// Record an audio file under its parent directory.
    ///
    /// Returns `false` if the file was already indexed.
    pub fn insert_file(&mut self, path: &Path) -> bool {
        let Some(parent) = path.parent() else {
            return false;
        };
        self.files
            .entry(parent.to_path_buf())
            .or_default()
            .insert(path.to_path_buf())
    }

    /// Record a directory (relative to the root) as holding audio.
    pub fn insert_dir(&mut self, relative: &Path) {
        if !relative.as_os_str().is_empty() {
            self.dirs.insert(relative.to_path_buf());
        }
    }

    /// The root followed by every directory holding audio.
    pub fn directories(&self) -> impl Iterator<Item = &PathBuf> {
        iter::once(&self.base_path).chain(self.dirs.iter())
    }

    /// Number of entries in [`directories`](Self::directories).
    pub fn directory_count(&self) -> usize {
        self.dirs.len() + 1
    }

    /// Entry `index` of [`directories`](Self::directories). Index 0 is the root.
    pub fn directory_at(&self, index: usize) -> Option<&PathBuf> {
        self.directories().nth(index)
    }

    /// Audio files directly inside `dir`, which may be absolute or relative
    /// to the root.
    pub fn files_in(&self, dir: &Path) -> Option<&BTreeSet<PathBuf>> {
        if dir.is_relative() {
            self.files.get(&self.base_path.join(dir))
        } else {
            self.files.get(dir)
        }
    }

    /// File `index` of `dir`, in sorted order.
    pub fn file_in(&self, dir: &Path, index: usize) -> Option<&PathBuf> {
        self.files_in(dir)?.iter().nth(index)
    }

    /// Whether `path` is an indexed audio file.
    pub fn contains(&self, path: &Path) -> bool {
        let path = if path.is_relative() {
            self.base_path.join(path)
        } else {
            path.to_path_buf()
        };

        path.parent()
            .and_then(|parent| self.files.get(parent))
            .is_some_and(|files| files.contains(&path))
    }

    /// Total number of indexed audio files.
    pub fn file_count(&self) -> usize {
        self.files.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
