#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` owns the progress stream of a mirror run. Every component emits
//! [`tracing`] events under a fixed set of targets (see [`targets`]) through
//! the `trace_*!` macros exported here, and the binary installs a single
//! subscriber with [`init_tracing`] that renders those events as one
//! human-readable line each on standard output.
//!
//! # Design
//!
//! - [`Verbosity`] maps the command-line `-q`/`-v` flags onto an
//!   [`EnvFilter`](tracing_subscriber::EnvFilter) directive string. The
//!   `SHARE_MIRROR_LOG` environment variable replaces the computed directives
//!   entirely when set.
//! - The subscriber is shared by every worker thread; `tracing` serialises
//!   writes per event so lines from concurrently mirrored servers never
//!   interleave mid-line.
//!
//! # Examples
//!
//! ```
//! use logging::{Verbosity, targets};
//!
//! let verbosity = Verbosity::from_flags(false, 1);
//! assert_eq!(verbosity, Verbosity::Verbose);
//! assert!(verbosity.directives().contains(targets::ROOT));
//! ```

mod config;
mod init;
mod macros;

pub use config::Verbosity;
pub use init::{LOG_ENV_VAR, build_filter, init_tracing};

/// Event targets used across the workspace.
///
/// Filters match targets by prefix, so [`ROOT`](targets::ROOT) selects every
/// mirror event at once.
pub mod targets {
    /// Common prefix shared by all mirror targets.
    pub const ROOT: &str = "mirror";
    /// Server connection lifecycle.
    pub const CONNECT: &str = "mirror::connect";
    /// Share enumeration and per-share outcome.
    pub const SHARE: &str = "mirror::share";
    /// Local directory creation.
    pub const MKDIR: &str = "mirror::mkdir";
    /// File transfers.
    pub const COPY: &str = "mirror::copy";
    /// Files left untouched by the change detector.
    pub const SKIP: &str = "mirror::skip";
    /// Empty directory removal.
    pub const PRUNE: &str = "mirror::prune";
    /// Run and server summaries.
    pub const STATS: &str = "mirror::stats";
    /// Directory walking internals.
    pub const WALK: &str = "mirror::walk";
}
