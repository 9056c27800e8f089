use crate::error::WalkError;
use crate::walker::Walker;
use std::path::PathBuf;

/// Configures a children-first walk over the directories below a root.
#[derive(Clone, Debug)]
pub struct WalkBuilder {
    root: PathBuf,
    include_root: bool,
}

impl WalkBuilder {
    /// Creates a builder for the directory tree rooted at `root`.
    ///
    /// The root itself is not yielded unless [`include_root`](Self::include_root)
    /// is enabled.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            include_root: false,
        }
    }

    /// Controls whether the root is yielded as the final entry.
    #[must_use]
    pub const fn include_root(mut self, include: bool) -> Self {
        self.include_root = include;
        self
    }

    /// Builds a [`Walker`] using the configured options.
    pub fn build(self) -> Result<Walker, WalkError> {
        Walker::new(self.root, self.include_root)
    }
}
