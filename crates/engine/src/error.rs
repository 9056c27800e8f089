use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use remote::{RemoteError, RemotePath};
use thiserror::Error;

/// Failure that abandons the share being mirrored.
///
/// Files already placed stay in place; remaining siblings of the failing
/// directory are not visited.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// A remote directory could not be listed.
    #[error(transparent)]
    List(RemoteError),

    /// A local directory could not be created.
    #[error("failed to create directory '{}': {source}", path.display())]
    CreateDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// Cancellation was requested while the share was being mirrored.
    #[error("mirroring cancelled")]
    Cancelled,
}

/// Failure of a single file transfer. Never aborts the traversal.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The remote read failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// No temporary file could be created next to the destination.
    #[error("failed to create temporary file for '{}': {source}", path.display())]
    CreateTemp {
        /// Final destination path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// Flushing or syncing the temporary file failed.
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        /// Temporary file path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// The retrieved byte count differs from the size the listing declared.
    #[error("'{path}' delivered {actual} bytes, listing declared {expected}")]
    SizeMismatch {
        /// Remote file path.
        path: RemotePath,
        /// Size from the directory listing.
        expected: u64,
        /// Bytes actually received.
        actual: u64,
    },

    /// Renaming the temporary file into place failed.
    #[error("failed to rename '{}' to '{}': {source}", from.display(), to.display())]
    Rename {
        /// Temporary file path.
        from: PathBuf,
        /// Final destination path.
        to: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// The transfer exceeded its deadline.
    #[error("transfer exceeded {:.1}s deadline", limit.as_secs_f64())]
    TimedOut {
        /// Configured per-transfer limit.
        limit: Duration,
    },

    /// Cancellation was requested mid-transfer.
    #[error("transfer cancelled")]
    Cancelled,
}

impl TransferError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// A directory the pruner could not inspect or remove.
#[derive(Debug, Error)]
pub enum PruneError {
    /// Part of the tree could not be read.
    #[error(transparent)]
    Walk(#[from] walk::WalkError),

    /// An empty directory could not be removed.
    #[error("failed to remove '{}': {source}", path.display())]
    Remove {
        /// Directory that stayed in place.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
}

impl PruneError {
    /// Directory involved.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Walk(error) => error.path(),
            Self::Remove { path, .. } => path,
        }
    }
}
