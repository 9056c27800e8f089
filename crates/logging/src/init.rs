//! crates/logging/src/init.rs
//! Subscriber installation for the progress stream.

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::Verbosity;

/// Environment variable whose value replaces the computed filter directives.
pub const LOG_ENV_VAR: &str = "SHARE_MIRROR_LOG";

/// Builds the event filter for a run.
///
/// A non-empty `override_directives` (normally the value of [`LOG_ENV_VAR`])
/// takes precedence over the verbosity-derived directives.
pub fn build_filter(
    verbosity: Verbosity,
    override_directives: Option<&str>,
) -> Result<EnvFilter, ParseError> {
    match override_directives.map(str::trim) {
        Some(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(verbosity.directives()),
    }
}

/// Installs the global subscriber that renders progress lines on stdout.
///
/// An unparsable [`LOG_ENV_VAR`] value falls back to the verbosity-derived
/// filter. Installing twice is reported through the returned error rather
/// than panicking, so tests and embedders may call this freely.
pub fn init_tracing(verbosity: Verbosity) -> Result<(), TryInitError> {
    let from_env = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(verbosity, from_env.as_deref())
        .or_else(|_| build_filter(verbosity, None))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
}
