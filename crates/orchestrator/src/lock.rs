use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::date_stamp::DateStamp;

/// Why a run lock was not obtained.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another run holds the lock.
    #[error("'{}' is held by another run", path.display())]
    Held {
        /// Lock file path.
        path: PathBuf,
    },

    /// The lock file could not be created or locked.
    #[error("failed to create lock '{}': {source}", path.display())]
    Io {
        /// Lock file path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
}

/// Exclusive claim on one server's run directory for one date.
///
/// The claim is an advisory lock on `<server_root>/.<stamp>.lock`, so the
/// kernel releases it when the owning process dies however it exits. A lock
/// file left behind by such a process is simply reclaimed. The file sits next
/// to the run directory so the pruner never sees it, and dropping the lock
/// removes it.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    file: File,
}

impl RunLock {
    /// `<server_root>/.<stamp>.lock`.
    #[must_use]
    pub fn path_for(server_root: &Path, stamp: &DateStamp) -> PathBuf {
        server_root.join(format!(".{stamp}.lock"))
    }

    /// Locks the run directory, creating `server_root` if needed.
    ///
    /// The holder's process id is recorded in the file for operators.
    pub fn acquire(server_root: &Path, stamp: &DateStamp) -> Result<Self, LockError> {
        let path = Self::path_for(server_root, stamp);
        let io_error = |source| LockError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(server_root).map_err(io_error)?;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_error)?;
        if let Err(error) = file.try_lock_exclusive() {
            if error.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Err(LockError::Held { path });
            }
            return Err(io_error(error));
        }

        let recorded = file
            .set_len(0)
            .and_then(|()| writeln!(file, "{}", std::process::id()));
        if let Err(source) = recorded {
            return Err(LockError::Io { path, source });
        }
        Ok(Self { path, file })
    }

    /// Lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        let _ = FileExt::unlock(&self.file);
    }
}
