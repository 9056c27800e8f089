#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `engine` turns one remote share into a local directory tree and cleans up
//! afterwards. It knows nothing about servers, configuration or dates: the
//! caller hands it an open [`remote::RemoteFilesystemClient`], a share name
//! and a local directory.
//!
//! # Components
//!
//! - [`ChangeDetector`] decides whether a file must be copied. Equal byte
//!   length means unchanged; [`VerifyMode::Checksum`] additionally compares
//!   XXH3-64 digests.
//! - [`TreeMirror`] walks the share depth-first, creating directories and
//!   copying changed files through [`transfer_file`].
//! - [`transfer_file`] streams into a hidden temporary sibling, checks the
//!   received length against the listing, syncs and renames into place.
//! - [`EmptyDirPruner`] removes empty directories bottom-up, never the root.
//!
//! # Failure granularity
//!
//! | Error | Scope abandoned |
//! |---|---|
//! | [`TransferError`] | one file; recorded as [`TransferOutcome::Failed`] |
//! | [`MirrorError`] | the share |
//! | [`PruneError`] | one directory |
//!
//! # Cancellation
//!
//! A [`CancellationToken`] is checked before every listing and file, and on
//! every write of an in-flight transfer. A cancelled transfer never leaves a
//! file at its destination.
//!
//! # Examples
//!
//! ```
//! use engine::{ChangeDetector, VerifyMode};
//!
//! # fn demo() -> std::io::Result<()> {
//! let temp = tempfile::tempdir()?;
//! let photo = temp.path().join("photo.jpg");
//! std::fs::write(&photo, vec![0u8; 100])?;
//!
//! let detector = ChangeDetector::new(VerifyMode::Size);
//! assert!(detector.needs_transfer(&photo, 150));
//! assert!(!detector.needs_transfer(&photo, 100));
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

mod cancel;
mod checksum;
mod detector;
mod error;
mod mirror;
mod prune;
mod record;
mod temp_guard;
mod transfer;

pub use crate::cancel::CancellationToken;
pub use crate::checksum::{DigestWriter, local_digest};
pub use crate::detector::{ChangeDetector, VerifyMode};
pub use crate::error::{MirrorError, PruneError, TransferError};
pub use crate::mirror::TreeMirror;
pub use crate::prune::{EmptyDirPruner, PruneSummary};
pub use crate::record::{
    MirrorAction, MirrorRecord, MirrorRecordHandler, MirrorStats, TransferOutcome, throughput,
};
pub use crate::temp_guard::{TempFileGuard, open_tmpfile, remove_stale_tmpfiles};
pub use crate::transfer::{TransferOptions, Transferred, transfer_file};
