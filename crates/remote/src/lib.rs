#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `remote` describes what the mirror needs from a file-serving endpoint and
//! nothing more: enumerate shares, list a directory, stream a file, close.
//! The wire protocol behind those verbs is deliberately opaque. The
//! [`RemoteFilesystemClient`] trait is the seam, and [`Connector`] opens one
//! client per endpoint.
//!
//! # Provided connectors
//!
//! - [`MountedConnector`] serves shares that the operating system already
//!   mounted under a common root (`<mount_root>/<address>/<share>`), which is
//!   how SMB exports are usually reached on Linux hosts.
//! - `MemoryConnector` (feature `test-support`) keeps whole servers in memory
//!   and injects connection, listing and mid-stream transfer failures.
//!
//! # Invariants
//!
//! - [`RemotePath`] values are absolute, `/`-separated and never contain
//!   `.` or `..` segments.
//! - A client call never retries; failures surface as [`RemoteError`] and the
//!   retry policy belongs to the caller.

mod client;
mod entry;
mod error;
mod mounted;
mod path;
mod share;

#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use crate::client::{Connector, Credentials, DEFAULT_PORT, Endpoint, RemoteFilesystemClient};
pub use crate::entry::{EntryKind, RemoteEntry};
pub use crate::error::RemoteError;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub use crate::memory::{MemoryClient, MemoryConnector};
pub use crate::mounted::{MountedClient, MountedConnector};
pub use crate::path::{InvalidRemotePath, RemotePath};
pub use crate::share::{RESERVED_PRINT_SHARE, ShareDescriptor};
