#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `orchestrator` drives a whole mirror run: it validates the configuration,
//! computes the run's [`DateStamp`], then walks the configured servers and
//! their shares, handing each share to [`engine::TreeMirror`]. Once every
//! server is done, each server's run directory is pruned of empty
//! directories.
//!
//! # Boundaries
//!
//! - A server that cannot be reached, whose shares cannot be listed, or whose
//!   run directory is locked by another process is reported and skipped.
//! - A share whose tree cannot be listed is reported and abandoned; sibling
//!   shares and later servers still run.
//! - Per-file failures are counted inside the share's statistics.
//!
//! The run returns a [`RunReport`] by value. Only configuration errors
//! ([`ConfigError`]) and signals ([`install_signal_handlers`]) change the
//! process exit status, see [`ExitCode`].
//!
//! # Layout
//!
//! ```text
//! <destination>/<local_folder>/.<stamp>.lock
//! <destination>/<local_folder>/<stamp>/<share>/<subtree>
//! ```
//!
//! # Examples
//!
//! ```
//! use orchestrator::{DateStamp, ServerSpec};
//!
//! let server = ServerSpec::parse_pair("192.168.10.83=asiair4").unwrap();
//! assert_eq!(server.local_folder, "asiair4");
//! assert!(DateStamp::new("20240511").is_ok());
//! ```

mod config;
mod date_stamp;
mod error;
mod exit_code;
mod lock;
mod orchestrator;
mod report;
mod session;
mod signal;

pub use crate::config::{
    CredentialsConfig, DEFAULT_CLIENT_NAME, DEFAULT_DOMAIN, PartialConfig, ServerSpec, SyncConfig,
};
pub use crate::date_stamp::{
    DEFAULT_DATE_FORMAT, DateStamp, LEGACY_DATE_FORMAT, validate_date_format,
};
pub use crate::error::ConfigError;
pub use crate::exit_code::ExitCode;
pub use crate::lock::{LockError, RunLock};
pub use crate::orchestrator::SyncOrchestrator;
pub use crate::report::{
    PruneReport, RunReport, ServerOutcome, ServerReport, ShareOutcome, ShareReport,
};
pub use crate::session::{SessionState, SyncSession};
pub use crate::signal::install_signal_handlers;
