//! Process exit statuses.

use std::fmt;

/// Exit statuses of a `share-mirror` run.
///
/// Individual server, share and file failures never change the status: a run
/// that visited every configured server exits with [`ExitCode::Ok`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// The run completed.
    Ok = 0,

    /// Invalid command line or configuration; nothing was contacted.
    Usage = 1,

    /// Interrupted by SIGINT, SIGTERM or SIGHUP.
    Signal = 20,
}

impl ExitCode {
    /// Numeric status.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Usage => "syntax or usage error",
            Self::Signal => "received SIGINT, SIGTERM, or SIGHUP",
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(u8::try_from(code.as_i32()).unwrap_or(u8::MAX))
    }
}
