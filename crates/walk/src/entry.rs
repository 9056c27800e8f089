use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// A directory reached by the walker.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WalkEntry {
    pub(crate) full_path: PathBuf,
    pub(crate) relative_path: PathBuf,
    pub(crate) depth: usize,
}

impl WalkEntry {
    /// Returns the path of the directory as reachable from the caller.
    #[must_use]
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Returns the path relative to the walk root (empty for the root).
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Returns the final component of the relative path, `None` for the root.
    #[must_use]
    pub fn file_name(&self) -> Option<&OsStr> {
        self.relative_path.file_name()
    }

    /// Depth below the root; the root has depth `0`.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Indicates whether this entry is the walk root.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.depth == 0
    }
}
