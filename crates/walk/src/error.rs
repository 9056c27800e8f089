use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Error returned when part of the tree cannot be walked.
#[derive(Debug)]
pub struct WalkError {
    kind: WalkErrorKind,
}

impl WalkError {
    pub(crate) fn new(kind: WalkErrorKind) -> Self {
        Self { kind }
    }

    pub(crate) fn root_metadata(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::RootMetadata { path, source })
    }

    pub(crate) fn root_not_directory(path: PathBuf) -> Self {
        Self::new(WalkErrorKind::RootNotDirectory { path })
    }

    pub(crate) fn read_dir(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::ReadDir { path, source })
    }

    pub(crate) fn read_dir_entry(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::ReadDirEntry { path, source })
    }

    /// Returns the specific failure.
    #[must_use]
    pub fn kind(&self) -> &WalkErrorKind {
        &self.kind
    }

    /// Returns the directory the failure relates to.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.kind.path()
    }
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WalkErrorKind::RootMetadata { path, source } => {
                write!(f, "failed to inspect walk root '{}': {}", path.display(), source)
            }
            WalkErrorKind::RootNotDirectory { path } => {
                write!(f, "walk root '{}' is not a directory", path.display())
            }
            WalkErrorKind::ReadDir { path, source } => {
                write!(f, "failed to read directory '{}': {}", path.display(), source)
            }
            WalkErrorKind::ReadDirEntry { path, source } => {
                write!(f, "failed to read entry in '{}': {}", path.display(), source)
            }
        }
    }
}

impl Error for WalkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            WalkErrorKind::RootMetadata { source, .. }
            | WalkErrorKind::ReadDir { source, .. }
            | WalkErrorKind::ReadDirEntry { source, .. } => Some(source),
            WalkErrorKind::RootNotDirectory { .. } => None,
        }
    }
}

/// Classification of walk failures.
#[derive(Debug)]
pub enum WalkErrorKind {
    /// The root could not be inspected.
    RootMetadata {
        /// Root path.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// The root exists but is not a directory.
    RootNotDirectory {
        /// Root path.
        path: PathBuf,
    },
    /// A directory's contents could not be listed.
    ReadDir {
        /// Directory whose contents could not be read.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// Iterating a directory failed part way.
    ReadDirEntry {
        /// Directory containing the problematic entry.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
}

impl WalkErrorKind {
    /// Returns the filesystem path tied to the failure.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::RootMetadata { path, .. }
            | Self::RootNotDirectory { path }
            | Self::ReadDir { path, .. }
            | Self::ReadDirEntry { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_error(message: &'static str) -> io::Error {
        io::Error::other(message)
    }

    #[test]
    fn display_names_the_directory() {
        let read_dir = WalkError::read_dir(PathBuf::from("dir"), io_error("boom"));
        assert_eq!(read_dir.to_string(), "failed to read directory 'dir': boom");

        let not_dir = WalkError::root_not_directory(PathBuf::from("file.fits"));
        assert_eq!(
            not_dir.to_string(),
            "walk root 'file.fits' is not a directory"
        );
    }

    #[test]
    fn path_matches_variant_path() {
        let root = WalkError::root_metadata(PathBuf::from("root"), io_error("root"));
        assert_eq!(root.path(), Path::new("root"));

        let entry = WalkError::read_dir_entry(PathBuf::from("entry"), io_error("entry"));
        assert_eq!(entry.kind().path(), Path::new("entry"));
    }

    #[test]
    fn source_exposes_io_error_when_present() {
        let error = WalkError::read_dir(PathBuf::from("dir"), io_error("source"));
        let inner = error
            .source()
            .and_then(|err| err.downcast_ref::<io::Error>())
            .expect("io source");
        assert_eq!(inner.to_string(), "source");

        assert!(WalkError::root_not_directory(PathBuf::from("f")).source().is_none());
    }
}
