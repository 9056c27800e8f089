use std::fmt;
use std::path::PathBuf;

use engine::MirrorStats;

use crate::date_stamp::DateStamp;
use crate::exit_code::ExitCode;

/// What happened to one share.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ShareOutcome {
    /// The whole tree was visited. Individual files may still have failed.
    Mirrored,
    /// Administrative or reserved share; not mirrored.
    Skipped,
    /// Abandoned part-way with this reason.
    Failed(String),
    /// Stopped by a shutdown request.
    Cancelled,
}

/// Outcome and counters of one share.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShareReport {
    /// Share name.
    pub name: String,
    /// Share outcome.
    pub outcome: ShareOutcome,
    /// Counters, including work done before a failure.
    pub stats: MirrorStats,
}

impl ShareReport {
    pub(crate) fn skipped(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            outcome: ShareOutcome::Skipped,
            stats: MirrorStats::default(),
        }
    }
}

/// What happened to one server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ServerOutcome {
    /// Every eligible share was attempted and the session closed.
    Completed,
    /// Connection or authentication failed.
    ConnectFailed(String),
    /// Connected, but shares could not be enumerated.
    SharesUnavailable(String),
    /// Another run holds this server's lock for the same date.
    Locked(String),
    /// The local run directory could not be prepared.
    DestinationFailed(String),
    /// Stopped by a shutdown request.
    Cancelled,
}

/// Result of pruning one server's run directory.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PruneReport {
    /// Directories removed.
    pub removed: usize,
    /// Directories that could not be inspected or removed.
    pub failures: usize,
}

/// Outcome of one server within a run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerReport {
    /// Endpoint address.
    pub address: String,
    /// Local folder below the destination base.
    pub local_folder: String,
    /// `<destination>/<folder>/<date stamp>`.
    pub run_dir: PathBuf,
    /// Server outcome.
    pub outcome: ServerOutcome,
    /// Shares in enumeration order.
    pub shares: Vec<ShareReport>,
    /// Prune result, when the directory was pruned.
    pub prune: Option<PruneReport>,
}

impl ServerReport {
    pub(crate) fn new(address: &str, local_folder: &str, run_dir: PathBuf) -> Self {
        Self {
            address: address.to_owned(),
            local_folder: local_folder.to_owned(),
            run_dir,
            outcome: ServerOutcome::Completed,
            shares: Vec::new(),
            prune: None,
        }
    }

    /// Sum of every share's counters.
    #[must_use]
    pub fn totals(&self) -> MirrorStats {
        self.shares.iter().fold(MirrorStats::default(), |mut acc, share| {
            acc.merge(&share.stats);
            acc
        })
    }

    /// Shares with the given outcome kind.
    fn count(&self, matches: impl Fn(&ShareOutcome) -> bool) -> usize {
        self.shares.iter().filter(|share| matches(&share.outcome)).count()
    }

    /// One-line human summary.
    #[must_use]
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ServerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): ", self.address, self.local_folder)?;
        match &self.outcome {
            ServerOutcome::Completed | ServerOutcome::Cancelled => {}
            ServerOutcome::ConnectFailed(reason) => return write!(f, "connection failed: {reason}"),
            ServerOutcome::SharesUnavailable(reason) => {
                return write!(f, "share enumeration failed: {reason}");
            }
            ServerOutcome::Locked(reason) => return write!(f, "skipped: {reason}"),
            ServerOutcome::DestinationFailed(reason) => {
                return write!(f, "destination unavailable: {reason}");
            }
        }

        let totals = self.totals();
        write!(
            f,
            "{} shares mirrored, {} failed, {} skipped; {} files copied, {} skipped, {} failed; {} bytes",
            self.count(|outcome| matches!(outcome, ShareOutcome::Mirrored)),
            self.count(|outcome| matches!(outcome, ShareOutcome::Failed(_))),
            self.count(|outcome| matches!(outcome, ShareOutcome::Skipped)),
            totals.files_copied,
            totals.files_skipped,
            totals.files_failed,
            totals.bytes_copied,
        )?;
        if let Some(prune) = &self.prune {
            write!(f, "; {} directories pruned", prune.removed)?;
        }
        if self.outcome == ServerOutcome::Cancelled {
            f.write_str(" (cancelled)")?;
        }
        Ok(())
    }
}

/// Everything a run did, returned by value once all servers are done.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunReport {
    /// Run directory name used below every server folder.
    pub date_stamp: DateStamp,
    /// Servers in configured order.
    pub servers: Vec<ServerReport>,
    /// Whether a shutdown request cut the run short.
    pub cancelled: bool,
}

impl RunReport {
    /// Exit status for this run.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        if self.cancelled {
            ExitCode::Signal
        } else {
            ExitCode::Ok
        }
    }
}
