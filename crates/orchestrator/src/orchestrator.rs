use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::{
    CancellationToken, ChangeDetector, EmptyDirPruner, MirrorError, MirrorRecord, MirrorStats,
    TreeMirror,
};
use logging::{trace_mkdir, trace_share, trace_stats};
use rayon::prelude::*;
use remote::{Connector, RemoteFilesystemClient, RemotePath, ShareDescriptor};

use crate::config::{ServerSpec, SyncConfig};
use crate::date_stamp::DateStamp;
use crate::lock::{LockError, RunLock};
use crate::report::{
    PruneReport, RunReport, ServerOutcome, ServerReport, ShareOutcome, ShareReport,
};
use crate::session::SyncSession;

/// A server's report together with the lock guarding its run directory.
///
/// The lock outlives the mirroring phase so that pruning happens under it.
type ServerRun = (ServerReport, Option<RunLock>);

/// Mirrors every configured server, then prunes their run directories.
///
/// Failures are contained at the narrowest boundary that can absorb them: a
/// file failure stays inside the share, a share failure inside the server, and
/// a server failure inside the run. Only the cancellation token cuts a run
/// short.
#[derive(Debug)]
pub struct SyncOrchestrator<K: Connector> {
    connector: K,
    config: SyncConfig,
    cancel: CancellationToken,
    mirror: TreeMirror,
}

impl<K: Connector> SyncOrchestrator<K> {
    /// Creates an orchestrator over a validated configuration.
    #[must_use]
    pub fn new(connector: K, config: SyncConfig, cancel: CancellationToken) -> Self {
        let mirror = TreeMirror::new(
            ChangeDetector::new(config.verify),
            config.transfer,
            cancel.clone(),
        );
        Self {
            connector,
            config,
            cancel,
            mirror,
        }
    }

    /// Validated configuration of this orchestrator.
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Runs over the configured servers.
    pub fn run_configured(&self, stamp: &DateStamp) -> RunReport {
        self.run(&self.config.servers, stamp)
    }

    /// Mirrors `servers` into `<destination>/<folder>/<stamp>`.
    ///
    /// Servers run on up to `jobs` workers; reports keep the order of
    /// `servers`. Pruning starts once every server has finished and is
    /// skipped entirely when the run was cancelled.
    pub fn run(&self, servers: &[ServerSpec], stamp: &DateStamp) -> RunReport {
        let runs = self.mirror_servers(servers, stamp);
        let cancelled = self.cancel.is_cancelled();

        let servers = runs
            .into_iter()
            .map(|(mut report, lock)| {
                if lock.is_some() && !cancelled {
                    report.prune = Some(prune_run_dir(&report.run_dir));
                }
                drop(lock);
                trace_stats!("{}", report.summary());
                report
            })
            .collect();

        if cancelled {
            tracing::warn!(target: logging::targets::STATS, "run interrupted; pruning skipped");
        }
        RunReport {
            date_stamp: stamp.clone(),
            servers,
            cancelled,
        }
    }

    fn mirror_servers(&self, servers: &[ServerSpec], stamp: &DateStamp) -> Vec<ServerRun> {
        let jobs = self.config.jobs.get();
        if jobs == 1 || servers.len() < 2 {
            return servers
                .iter()
                .map(|server| self.sync_server(server, stamp))
                .collect();
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.min(servers.len()))
            .thread_name(|index| format!("mirror-{index}"))
            .build()
        {
            Ok(pool) => pool.install(|| {
                servers
                    .par_iter()
                    .map(|server| self.sync_server(server, stamp))
                    .collect()
            }),
            Err(error) => {
                tracing::warn!(
                    target: logging::targets::ROOT,
                    "failed to start {jobs} workers, mirroring sequentially: {error}"
                );
                servers
                    .iter()
                    .map(|server| self.sync_server(server, stamp))
                    .collect()
            }
        }
    }

    fn sync_server(&self, server: &ServerSpec, stamp: &DateStamp) -> ServerRun {
        let server_root = self.config.server_root(server);
        let run_dir = server_root.join(stamp.as_str());
        let mut report = ServerReport::new(&server.address, &server.local_folder, run_dir);

        if self.cancel.is_cancelled() {
            report.outcome = ServerOutcome::Cancelled;
            return (report, None);
        }

        let lock = match RunLock::acquire(&server_root, stamp) {
            Ok(lock) => lock,
            Err(error @ LockError::Held { .. }) => {
                tracing::warn!(
                    target: logging::targets::CONNECT,
                    "skipping server {} ({}): {error}",
                    server.address,
                    server.local_folder
                );
                report.outcome = ServerOutcome::Locked(error.to_string());
                return (report, None);
            }
            Err(error) => {
                tracing::error!(
                    target: logging::targets::CONNECT,
                    "skipping server {} ({}): {error}",
                    server.address,
                    server.local_folder
                );
                report.outcome = ServerOutcome::DestinationFailed(error.to_string());
                return (report, None);
            }
        };

        let endpoint = self.config.endpoint(server);
        let mut session = SyncSession::new(server.clone(), stamp.clone());
        if let Err(error) = session.connect(&self.connector, &endpoint, &self.config.credentials)
        {
            tracing::error!(target: logging::targets::CONNECT, "{error}");
            report.outcome = ServerOutcome::ConnectFailed(error.to_string());
            return (report, Some(lock));
        }

        let shares = match session.shares() {
            Ok(shares) => shares,
            Err(error) => {
                tracing::error!(target: logging::targets::SHARE, "{error}");
                report.outcome = ServerOutcome::SharesUnavailable(error.to_string());
                session.close();
                return (report, Some(lock));
            }
        };

        if let Err(error) = fs::create_dir_all(&report.run_dir) {
            tracing::error!(
                target: logging::targets::MKDIR,
                "failed to create {}: {error}",
                report.run_dir.display()
            );
            report.outcome = ServerOutcome::DestinationFailed(error.to_string());
            session.close();
            return (report, Some(lock));
        }

        for share in &shares {
            if self.cancel.is_cancelled() {
                report.outcome = ServerOutcome::Cancelled;
                break;
            }
            let share_report = self.sync_share(&mut session, share, &report.run_dir);
            let cancelled = share_report.outcome == ShareOutcome::Cancelled;
            report.shares.push(share_report);
            if cancelled {
                report.outcome = ServerOutcome::Cancelled;
                break;
            }
        }

        session.close();
        (report, Some(lock))
    }

    fn sync_share<C>(
        &self,
        session: &mut SyncSession<C>,
        share: &ShareDescriptor,
        run_dir: &Path,
    ) -> ShareReport
    where
        C: RemoteFilesystemClient,
    {
        let name = share.name();
        let address = session.server().address.clone();
        if !share.is_mirrorable() {
            tracing::debug!(
                target: logging::targets::SHARE,
                "skipping reserved share {name} on {address}"
            );
            return ShareReport::skipped(name);
        }

        let mut stats = MirrorStats::default();
        let mut observe = |record: MirrorRecord| stats.observe(&record);
        let result = prepare_share_dir(name, run_dir).and_then(|local_dir| {
            session
                .mirror_share(&self.mirror, name, &local_dir, &mut observe)
                .map_err(ShareFailure::Mirror)
        });

        let outcome = match result {
            Ok(_) => {
                trace_share!("Successfully copied share {name} from {address}");
                ShareOutcome::Mirrored
            }
            Err(ShareFailure::Mirror(MirrorError::Cancelled)) => {
                tracing::warn!(
                    target: logging::targets::SHARE,
                    "share {name} on {address} interrupted"
                );
                ShareOutcome::Cancelled
            }
            Err(error) => {
                tracing::error!(
                    target: logging::targets::SHARE,
                    "failed to copy share {name} from {address}: {error}"
                );
                ShareOutcome::Failed(error.to_string())
            }
        };

        ShareReport {
            name: name.to_owned(),
            outcome,
            stats,
        }
    }
}

/// Why a share could not be mirrored.
#[derive(Debug, thiserror::Error)]
enum ShareFailure {
    #[error("share name cannot be used as a directory name")]
    Name,
    #[error("failed to create '{}': {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Mirror(MirrorError),
}

/// Creates `<run_dir>/<share>` and returns it.
fn prepare_share_dir(share: &str, run_dir: &Path) -> Result<PathBuf, ShareFailure> {
    RemotePath::root()
        .join(share)
        .map_err(|_| ShareFailure::Name)?;
    let local_dir = run_dir.join(share);
    if !local_dir.is_dir() {
        fs::create_dir_all(&local_dir).map_err(|source| ShareFailure::Directory {
            path: local_dir.clone(),
            source,
        })?;
        trace_mkdir!("created {}", local_dir.display());
    }
    Ok(local_dir)
}

fn prune_run_dir(run_dir: &Path) -> PruneReport {
    if !run_dir.is_dir() {
        return PruneReport::default();
    }
    match EmptyDirPruner::new().prune(run_dir) {
        Ok(summary) => PruneReport {
            removed: summary.removed.len(),
            failures: summary.failures.len(),
        },
        Err(error) => {
            tracing::warn!(target: logging::targets::PRUNE, "{error}");
            PruneReport {
                removed: 0,
                failures: 1,
            }
        }
    }
}
