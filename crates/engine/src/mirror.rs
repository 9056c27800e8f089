use std::fs;
use std::path::Path;

use logging::{trace_copy, trace_mkdir, trace_skip};
use remote::{EntryKind, RemoteEntry, RemoteFilesystemClient, RemotePath};

use crate::detector::{ChangeDetector, local_len};
use crate::error::{MirrorError, TransferError};
use crate::record::{MirrorAction, MirrorRecord, MirrorRecordHandler, MirrorStats, TransferOutcome};
use crate::temp_guard::remove_stale_tmpfiles;
use crate::transfer::{TransferOptions, transfer_file};
use crate::CancellationToken;

/// Depth-first copy of one share into a local directory.
///
/// Directory listings and local directory creation are share-level: a
/// failure returns [`MirrorError`] and the rest of the share is abandoned.
/// File transfers are isolated: a failed file is recorded and the walk moves
/// on to its siblings.
#[derive(Clone, Debug, Default)]
pub struct TreeMirror {
    detector: ChangeDetector,
    options: TransferOptions,
    cancel: CancellationToken,
}

impl TreeMirror {
    /// Creates a mirror.
    #[must_use]
    pub const fn new(
        detector: ChangeDetector,
        options: TransferOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            detector,
            options,
            cancel,
        }
    }

    /// Mirrors `remote_dir` of `share` into `local_dir`.
    ///
    /// `local_dir` must exist. Every record is passed to `handler` as it is
    /// produced; the returned counters summarise them.
    pub fn mirror<C, H>(
        &self,
        client: &mut C,
        share: &str,
        remote_dir: &RemotePath,
        local_dir: &Path,
        handler: &mut H,
    ) -> Result<MirrorStats, MirrorError>
    where
        C: RemoteFilesystemClient + ?Sized,
        H: MirrorRecordHandler + ?Sized,
    {
        let mut stats = MirrorStats::default();
        let mut emit = |record: MirrorRecord| {
            stats.observe(&record);
            handler.handle(record);
        };
        self.mirror_directory(client, share, remote_dir, local_dir, &mut emit)?;
        Ok(stats)
    }

    fn mirror_directory<C>(
        &self,
        client: &mut C,
        share: &str,
        remote_dir: &RemotePath,
        local_dir: &Path,
        emit: &mut dyn FnMut(MirrorRecord),
    ) -> Result<(), MirrorError>
    where
        C: RemoteFilesystemClient + ?Sized,
    {
        if self.cancel.is_cancelled() {
            return Err(MirrorError::Cancelled);
        }

        let address = client.endpoint().address().to_owned();
        let entries: Vec<RemoteEntry> = client
            .list_path(share, remote_dir)
            .map_err(MirrorError::List)?
            .into_iter()
            .filter(|entry| !entry.is_self_or_parent())
            .collect();
        tracing::debug!(
            target: logging::targets::SHARE,
            "{share}:{remote_dir} on {address} lists {} entries",
            entries.len()
        );
        sweep_leftovers(&address, share, remote_dir, local_dir, &entries);

        for entry in entries {
            if self.cancel.is_cancelled() {
                return Err(MirrorError::Cancelled);
            }

            let remote_path = match remote_dir.join(entry.name()) {
                Ok(path) => path,
                Err(error) => {
                    tracing::warn!(
                        target: logging::targets::COPY,
                        "skipping entry in {share}:{remote_dir} on {address}: {error}"
                    );
                    emit(MirrorRecord::new(
                        share,
                        remote_dir.clone(),
                        MirrorAction::File(TransferOutcome::Failed(error.to_string())),
                    ));
                    continue;
                }
            };
            let local_path = local_dir.join(entry.name());

            match entry.kind() {
                EntryKind::Directory => {
                    if ensure_directory(&local_path)? {
                        trace_mkdir!("created {}", local_path.display());
                        emit(MirrorRecord::new(
                            share,
                            remote_path.clone(),
                            MirrorAction::DirectoryCreated,
                        ));
                    }
                    self.mirror_directory(client, share, &remote_path, &local_path, emit)?;
                }
                EntryKind::File => {
                    self.mirror_file(client, share, &remote_path, entry.size(), &local_path, emit)?;
                }
                EntryKind::Other => {
                    tracing::warn!(
                        target: logging::targets::COPY,
                        "{share}:{remote_path} on {address} has an unknown type; treating it as a file"
                    );
                    self.mirror_file(client, share, &remote_path, entry.size(), &local_path, emit)?;
                }
            }
        }
        Ok(())
    }

    fn mirror_file<C>(
        &self,
        client: &mut C,
        share: &str,
        remote_path: &RemotePath,
        size: u64,
        local_path: &Path,
        emit: &mut dyn FnMut(MirrorRecord),
    ) -> Result<(), MirrorError>
    where
        C: RemoteFilesystemClient + ?Sized,
    {
        let address = client.endpoint().address().to_owned();
        let changed = if self.detector.needs_transfer(local_path, size) {
            Ok(true)
        } else {
            self.detector.content_differs(
                client,
                share,
                remote_path,
                local_path,
                &self.options,
                &self.cancel,
            )
        };
        let changed = match changed {
            Ok(changed) => changed,
            Err(TransferError::Cancelled) => return Err(MirrorError::Cancelled),
            Err(error) => {
                emit(failed_file(&address, share, remote_path, size, &error));
                return Ok(());
            }
        };
        if !changed {
            trace_skip!(
                "skipped {share}:{remote_path} on {address} (already present with the same size)"
            );
            emit(MirrorRecord::new(
                share,
                remote_path.clone(),
                MirrorAction::File(TransferOutcome::Skipped),
            ));
            return Ok(());
        }

        if let Ok(Some(previous)) = local_len(local_path) {
            tracing::debug!(
                target: logging::targets::COPY,
                "{share}:{remote_path} on {address} changed: local {previous} bytes, remote {size} bytes"
            );
        }

        match transfer_file(
            client,
            share,
            remote_path,
            size,
            local_path,
            &self.options,
            &self.cancel,
        ) {
            Ok(done) => {
                let record = MirrorRecord::new(
                    share,
                    remote_path.clone(),
                    MirrorAction::File(TransferOutcome::Copied),
                )
                .with_transfer(done.bytes, done.elapsed);
                let size_mb = megabytes(done.bytes);
                match record.throughput() {
                    Some(rate) => trace_copy!(
                        "copied {share}:{remote_path} from {address} to {} ({size_mb:.2} MB in {:.2} seconds, {rate:.2} MB/s)",
                        local_path.display(),
                        done.elapsed.as_secs_f64()
                    ),
                    None => trace_copy!(
                        "copied {share}:{remote_path} from {address} to {} ({size_mb:.2} MB, instantaneous)",
                        local_path.display()
                    ),
                }
                emit(record);
                Ok(())
            }
            Err(TransferError::Cancelled) => Err(MirrorError::Cancelled),
            Err(error) => {
                emit(failed_file(&address, share, remote_path, size, &error));
                Ok(())
            }
        }
    }
}

/// Logs a file failure and builds its record.
fn failed_file(
    address: &str,
    share: &str,
    remote_path: &RemotePath,
    size: u64,
    error: &TransferError,
) -> MirrorRecord {
    tracing::warn!(
        target: logging::targets::COPY,
        "failed to copy {share}:{remote_path} from {address}: {error}"
    );
    MirrorRecord::new(
        share,
        remote_path.clone(),
        MirrorAction::File(TransferOutcome::Failed(error.to_string())),
    )
    .with_transfer(size, std::time::Duration::ZERO)
}

/// Clears temporary files an interrupted run left next to this listing's files.
fn sweep_leftovers(
    address: &str,
    share: &str,
    remote_dir: &RemotePath,
    local_dir: &Path,
    entries: &[RemoteEntry],
) {
    let names: Vec<&str> = entries
        .iter()
        .filter(|entry| !entry.is_directory())
        .map(RemoteEntry::name)
        .collect();
    match remove_stale_tmpfiles(local_dir, &names) {
        Ok(removed) => {
            for path in removed {
                tracing::debug!(
                    target: logging::targets::COPY,
                    "removed leftover {} of {share}:{remote_dir} on {address}",
                    path.display()
                );
            }
        }
        Err(error) => tracing::warn!(
            target: logging::targets::COPY,
            "could not clear leftovers in {}: {error}",
            local_dir.display()
        ),
    }
}

#[allow(clippy::cast_precision_loss)]
fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Creates `path` when absent. Returns whether it was created.
fn ensure_directory(path: &Path) -> Result<bool, MirrorError> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir(path).map_err(|source| MirrorError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}
