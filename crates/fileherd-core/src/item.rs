//! Filesystem item references.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of filesystem item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Regular file (shortcuts and links included).
    File,
    /// Directory.
    Directory,
}

impl ItemKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, ItemKind::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, ItemKind::File)
    }
}

/// An immutable reference to a filesystem entry.
///
/// Two references are equal when their paths are equal ignoring case, which
/// matches how the host filesystem resolves names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRef {
    /// Full path of the item.
    pub path: PathBuf,
    /// Whether the item is a file or a directory.
    pub kind: ItemKind,
}

impl ItemRef {
    /// Create a new item reference.
    pub fn new(path: impl Into<PathBuf>, kind: ItemKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Create a reference to a file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ItemKind::File)
    }

    /// Create a reference to a directory.
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ItemKind::Directory)
    }

    /// Derive a reference to another path that keeps this item's kind.
    pub fn with_path(&self, path: impl Into<PathBuf>) -> Self {
        Self::new(path, self.kind)
    }

    /// Check whether this item lives at `path` (case-insensitive).
    pub fn is_at(&self, path: &Path) -> bool {
        paths_equal(&self.path, path)
    }

    /// Final component of the path, accepting both separator styles.
    pub fn file_name(&self) -> String {
        file_name_of(&self.path.to_string_lossy()).to_string()
    }
}

impl PartialEq for ItemRef {
    fn eq(&self, other: &Self) -> bool {
        paths_equal(&self.path, &other.path)
    }
}

impl Eq for ItemRef {}

impl Hash for ItemRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        path_key(&self.path).hash(state);
    }
}

/// Normalized comparison key for a path.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

/// Compare two paths the way the host filesystem does (ignoring case).
pub fn paths_equal(a: &Path, b: &Path) -> bool {
    a.as_os_str() == b.as_os_str() || path_key(a) == path_key(b)
}

/// Split a textual path into its parent and final component.
///
/// Both `\` and `/` are treated as separators because executor paths use the
/// host's native style regardless of the platform this crate runs on.
pub fn split_file_name(path: &str) -> (&str, &str) {
    match path.rfind(['\\', '/']) {
        Some(index) => (&path[..index], &path[index + 1..]),
        None => ("", path),
    }
}

/// Final component of a textual path.
pub fn file_name_of(path: &str) -> &str {
    split_file_name(path).1
}
