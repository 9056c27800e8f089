#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` enumerates the directories of a local tree in children-first
//! (post-order) sequence. The empty-directory pruner relies on that order:
//! by the time a directory is yielded, every directory beneath it has already
//! been yielded, so a caller that removes empty children first sees the parent
//! in its final state.
//!
//! # Design
//!
//! - [`WalkBuilder`] configures whether the root itself is yielded last.
//! - [`Walker`] implements [`Iterator`] over `Result<WalkEntry, WalkError>`.
//!   Sub-directory names are read and sorted when a directory is entered, so
//!   the sequence is deterministic regardless of the filesystem's own order.
//! - Only real directories are descended into. Symbolic links are never
//!   followed, so the walk cannot leave the root or loop.
//!
//! # Errors
//!
//! Failing to inspect the root aborts [`WalkBuilder::build`]. A directory
//! below the root that cannot be read is reported as an `Err` item and
//! skipped together with its subtree; the walk continues with its siblings.
//!
//! # Examples
//!
//! ```
//! use walk::WalkBuilder;
//! use std::fs;
//! use std::path::PathBuf;
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! let root = temp.path().join("run");
//! fs::create_dir_all(root.join("a/b"))?;
//!
//! let order: Vec<PathBuf> = WalkBuilder::new(&root)
//!     .build()?
//!     .map(|entry| entry.map(|entry| entry.relative_path().to_path_buf()))
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(order, vec![PathBuf::from("a/b"), PathBuf::from("a")]);
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

mod builder;
mod entry;
mod error;
mod walker;


pub use crate::builder::WalkBuilder;
pub use crate::entry::WalkEntry;
pub use crate::error::{WalkError, WalkErrorKind};
pub use crate::walker::Walker;
