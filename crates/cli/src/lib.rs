#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the thin command-line front-end of `share-mirror`. It parses the
//! arguments with [`clap`](https://docs.rs/clap/), layers them over the JSON
//! configuration file, validates the result and hands it to
//! [`orchestrator::SyncOrchestrator`] together with a
//! [`remote::MountedConnector`].
//!
//! # Design
//!
//! [`run`] accepts an iterator of arguments together with handles for
//! standard output and error and returns the process exit status, so the
//! binary stays a one-liner and tests drive the whole front-end in-process.
//! Progress lines are emitted through `tracing` and go to the process's
//! standard output once the subscriber is installed.
//!
//! # Invariants
//!
//! - `run` never panics.
//! - Every configuration problem is reported before any endpoint is contacted
//!   and yields [`ExitCode::Usage`].
//! - A completed run yields [`ExitCode::Ok`] whatever individual servers,
//!   shares or files did; an interrupted run yields [`ExitCode::Signal`].
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = cli::run(["share-mirror", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("share-mirror "));
//! assert!(stderr.is_empty());
//! ```

mod arguments;

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use engine::CancellationToken;
use logging::{Verbosity, init_tracing};
use orchestrator::{
    ConfigError, DateStamp, ExitCode, PartialConfig, SyncConfig, SyncOrchestrator,
    install_signal_handlers,
};
use remote::MountedConnector;

use crate::arguments::{ParsedArgs, parse_args};

/// Parser entry points for integration tests.
#[doc(hidden)]
pub mod test_utils {
    pub use crate::arguments::{ParsedArgs, parse_args};
}

/// Deterministic help text.
const HELP_TEXT: &str = concat!(
    "share-mirror ",
    env!("CARGO_PKG_VERSION"),
    "\n",
    "\n",
    "Mirrors the user shares of one or more file servers into\n",
    "<dest>/<folder>/<date>/<share>, copying only files whose size changed,\n",
    "then removes directories left empty.\n",
    "\n",
    "Usage: share-mirror [OPTIONS]\n",
    "\n",
    "Options:\n",
    "  -c, --config FILE          Read settings from a JSON file.\n",
    "      --dest DIR             Destination base directory.\n",
    "      --server ADDR=FOLDER   Mirror ADDR into FOLDER (repeatable; replaces configured servers).\n",
    "      --user NAME            Account name.\n",
    "      --password SECRET      Account password.\n",
    "      --domain DOMAIN        Authentication domain (default WORKGROUP).\n",
    "      --port PORT            Endpoint port (default 445).\n",
    "      --date-format FORMAT   Run directory format (default [year][month][day]).\n",
    "      --date YYYY-MM-DD      Date the run directory instead of using today.\n",
    "  -j, --jobs N               Servers mirrored concurrently (default 1).\n",
    "      --checksum             Compare XXH3 digests when sizes match.\n",
    "      --retries N            Re-attempt failed file transfers N times.\n",
    "      --timeout SECONDS      Abort a single file transfer after SECONDS.\n",
    "      --mount-root DIR       Directory holding one mounted tree per server address.\n",
    "  -q, --quiet                Only report warnings and errors.\n",
    "  -v, --verbose              Report more detail (repeat for more).\n",
    "  -h, --help                 Show this help message and exit.\n",
    "  -V, --version              Output version information and exit.\n",
    "\n",
    "Set SHARE_MIRROR_LOG to override the log filter.\n",
);

/// Runs the CLI using the provided argument iterator and output handles.
///
/// Returns the process exit status.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    match parse_args(arguments) {
        Ok(parsed) => execute(parsed, stdout, stderr).as_i32(),
        Err(error) => {
            let _ = write!(stderr, "share-mirror: {error}");
            ExitCode::Usage.as_i32()
        }
    }
}

fn execute<Out, Err>(parsed: ParsedArgs, stdout: &mut Out, stderr: &mut Err) -> ExitCode
where
    Out: Write,
    Err: Write,
{
    if parsed.show_help {
        let _ = stdout.write_all(HELP_TEXT.as_bytes());
        return ExitCode::Ok;
    }
    if parsed.show_version {
        let _ = writeln!(stdout, "share-mirror {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::Ok;
    }

    // Before `prepare`: dating the run may warn about a time zone fallback.
    if let Err(error) = init_tracing(Verbosity::from_flags(parsed.quiet, parsed.verbose)) {
        tracing::debug!("tracing subscriber already installed: {error}");
    }

    let (config, stamp, mount_root) = match prepare(&parsed) {
        Ok(prepared) => prepared,
        Err(error) => {
            let _ = writeln!(stderr, "share-mirror: {error}");
            return ExitCode::Usage;
        }
    };
    let cancel = install_signal_handlers().unwrap_or_else(|error| {
        let _ = writeln!(stderr, "share-mirror: signal handlers unavailable: {error}");
        CancellationToken::new()
    });

    let orchestrator = SyncOrchestrator::new(MountedConnector::new(mount_root), config, cancel);
    orchestrator.run_configured(&stamp).exit_code()
}

/// Loads, merges and validates the configuration, then computes the run date.
fn prepare(parsed: &ParsedArgs) -> Result<(SyncConfig, DateStamp, PathBuf), ConfigError> {
    let file = match &parsed.config {
        Some(path) => PartialConfig::from_file(path)?,
        None => PartialConfig::default(),
    };
    let config = file.merge(parsed.overrides()?).validate()?;
    let stamp = match &parsed.date {
        Some(date) => DateStamp::for_calendar_date(&config.date_format, date)?,
        None => DateStamp::today(&config.date_format)?,
    };
    let mount_root = config
        .mount_root
        .clone()
        .ok_or(ConfigError::Missing("mount_root"))?;
    config.prepare_destination()?;
    Ok((config, stamp, mount_root))
}

/// Converts a numeric exit status into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    u8::try_from(status).map_or(std::process::ExitCode::FAILURE, std::process::ExitCode::from)
}
