use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use logging::trace_prune;
use walk::WalkBuilder;

use crate::error::PruneError;

/// Directories removed and failures met by one prune pass.
#[derive(Debug, Default)]
pub struct PruneSummary {
    /// Directories removed, children before parents.
    pub removed: Vec<PathBuf>,
    /// Directories left in place because of an error.
    pub failures: Vec<PruneError>,
}

/// Removes empty directories below a run directory, bottom-up.
///
/// The root itself is never removed, even when it ends up empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyDirPruner;

impl EmptyDirPruner {
    /// Creates a pruner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Prunes every empty directory beneath `root`.
    ///
    /// Failing to open `root` is returned as an error. Failures below it are
    /// collected in the summary and the pass continues.
    pub fn prune(&self, root: &Path) -> Result<PruneSummary, PruneError> {
        let mut summary = PruneSummary::default();
        for entry in WalkBuilder::new(root).include_root(false).build()? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(target: logging::targets::PRUNE, "{error}");
                    summary.failures.push(error.into());
                    continue;
                }
            };
            let path = entry.full_path();
            match remove_if_empty(path) {
                Ok(true) => {
                    trace_prune!("removed empty directory {}", path.display());
                    summary.removed.push(path.to_path_buf());
                }
                Ok(false) => {}
                Err(source) => {
                    let error = PruneError::Remove {
                        path: path.to_path_buf(),
                        source,
                    };
                    tracing::warn!(target: logging::targets::PRUNE, "{error}");
                    summary.failures.push(error);
                }
            }
        }
        Ok(summary)
    }
}

fn remove_if_empty(path: &Path) -> io::Result<bool> {
    if fs::read_dir(path)?.next().is_some() {
        return Ok(false);
    }
    fs::remove_dir(path)?;
    Ok(true)
}
