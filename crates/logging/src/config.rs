//! crates/logging/src/config.rs
//! Verbosity levels and their filter directives.

use tracing_subscriber::filter::LevelFilter;

/// Output verbosity selected on the command line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Verbosity {
    /// Warnings and errors only (`-q`).
    Quiet,
    /// Progress lines: created directories, copies, skips, pruned directories.
    #[default]
    Normal,
    /// Adds listing and decision details (`-v`).
    Verbose,
    /// Everything, including walker internals (`-vv` and beyond).
    Trace,
}

impl Verbosity {
    /// Maps the `--quiet` flag and the number of `-v` occurrences to a level.
    ///
    /// `--quiet` wins over any number of `-v` flags.
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Trace,
        }
    }

    /// Most detailed level emitted for mirror targets.
    #[must_use]
    pub const fn level_filter(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::WARN,
            Self::Normal => LevelFilter::INFO,
            Self::Verbose => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }

    /// Filter directives understood by [`tracing_subscriber::EnvFilter`].
    ///
    /// Third-party crates stay at `warn` unless tracing everything.
    #[must_use]
    pub fn directives(self) -> String {
        let root = crate::targets::ROOT;
        match self {
            Self::Quiet => "warn".to_owned(),
            Self::Normal => format!("warn,{root}=info"),
            Self::Verbose => format!("warn,{root}=debug"),
            Self::Trace => format!("info,{root}=trace"),
        }
    }
}
