//! crates/logging/src/macros.rs
//! Convenience macros binding events to the mirror targets.
//!
//! Callers must depend on `tracing` directly; the macros expand to
//! `::tracing` paths.

/// Emit a connection lifecycle event.
///
/// # Example
/// ```ignore
/// trace_connect!("connected to {}", address);
/// ```
#[macro_export]
macro_rules! trace_connect {
    ($($arg:tt)*) => {{
        ::tracing::info!(target: "mirror::connect", $($arg)*);
    }};
}

/// Emit a share-level event.
#[macro_export]
macro_rules! trace_share {
    ($($arg:tt)*) => {{
        ::tracing::info!(target: "mirror::share", $($arg)*);
    }};
}

/// Emit a local directory creation event.
#[macro_export]
macro_rules! trace_mkdir {
    ($($arg:tt)*) => {{
        ::tracing::info!(target: "mirror::mkdir", $($arg)*);
    }};
}

/// Emit a completed file transfer.
///
/// # Example
/// ```ignore
/// trace_copy!("copied file: {} to {}", remote, local.display());
/// ```
#[macro_export]
macro_rules! trace_copy {
    ($($arg:tt)*) => {{
        ::tracing::info!(target: "mirror::copy", $($arg)*);
    }};
}

/// Emit a skipped (already synchronised) file.
#[macro_export]
macro_rules! trace_skip {
    ($($arg:tt)*) => {{
        ::tracing::info!(target: "mirror::skip", $($arg)*);
    }};
}

/// Emit a removed empty directory.
#[macro_export]
macro_rules! trace_prune {
    ($($arg:tt)*) => {{
        ::tracing::info!(target: "mirror::prune", $($arg)*);
    }};
}

/// Emit a summary line.
#[macro_export]
macro_rules! trace_stats {
    ($($arg:tt)*) => {{
        ::tracing::info!(target: "mirror::stats", $($arg)*);
    }};
}

/// Emit a walker debug event.
#[macro_export]
macro_rules! trace_walk {
    ($($arg:tt)*) => {{
        ::tracing::trace!(target: "mirror::walk", $($arg)*);
    }};
}
