/// Kind of a listed entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Anything the endpoint reports that is neither (devices, dangling links).
    Other,
}

/// One row of a remote directory listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteEntry {
    name: String,
    kind: EntryKind,
    size: u64,
}

impl RemoteEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: EntryKind, size: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
        }
    }

    /// Regular file with its declared size.
    #[must_use]
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self::new(name, EntryKind::File, size)
    }

    /// Directory entry.
    #[must_use]
    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Directory, 0)
    }

    /// Entry name within its directory.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry kind.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Convenience check for [`EntryKind::Directory`].
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    /// Size in bytes as declared by the listing.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// The `.` and `..` markers some servers include in every listing.
    #[must_use]
    pub fn is_self_or_parent(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}
