use std::time::Duration;

use remote::RemotePath;

/// Bytes per megabyte in throughput figures.
const MEGABYTE: f64 = 1024.0 * 1024.0;

/// Outcome of one file visited by the mirror.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransferOutcome {
    /// Retrieved and renamed into place.
    Copied,
    /// Local copy already up to date.
    Skipped,
    /// Transfer failed; the traversal continued.
    Failed(String),
}

/// What happened to one path during mirroring.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MirrorAction {
    /// A local directory was created.
    DirectoryCreated,
    /// A file was visited.
    File(TransferOutcome),
}

/// Record emitted for each directory created and each file visited.
#[derive(Clone, Debug)]
pub struct MirrorRecord {
    share: String,
    path: RemotePath,
    action: MirrorAction,
    size: u64,
    elapsed: Duration,
}

impl MirrorRecord {
    pub(crate) fn new(share: &str, path: RemotePath, action: MirrorAction) -> Self {
        Self {
            share: share.to_owned(),
            path,
            action,
            size: 0,
            elapsed: Duration::ZERO,
        }
    }

    #[must_use]
    pub(crate) const fn with_transfer(mut self, size: u64, elapsed: Duration) -> Self {
        self.size = size;
        self.elapsed = elapsed;
        self
    }

    /// Share the path belongs to.
    #[must_use]
    pub fn share(&self) -> &str {
        &self.share
    }

    /// Path inside the share.
    #[must_use]
    pub const fn path(&self) -> &RemotePath {
        &self.path
    }

    /// Action taken.
    #[must_use]
    pub const fn action(&self) -> &MirrorAction {
        &self.action
    }

    /// File outcome, when this record is about a file.
    #[must_use]
    pub const fn outcome(&self) -> Option<&TransferOutcome> {
        match &self.action {
            MirrorAction::File(outcome) => Some(outcome),
            MirrorAction::DirectoryCreated => None,
        }
    }

    /// Declared size of the file in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Wall time spent transferring.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Throughput in MB/s, `None` when the transfer took no measurable time.
    #[must_use]
    pub fn throughput(&self) -> Option<f64> {
        throughput(self.size, self.elapsed)
    }
}

/// Megabytes (1024²) per second for `bytes` moved in `elapsed`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn throughput(bytes: u64, elapsed: Duration) -> Option<f64> {
    let seconds = elapsed.as_secs_f64();
    (seconds > 0.0).then(|| bytes as f64 / MEGABYTE / seconds)
}

/// Observer invoked for each [`MirrorRecord`].
pub trait MirrorRecordHandler {
    /// Handles a newly produced record.
    fn handle(&mut self, record: MirrorRecord);
}

impl<F> MirrorRecordHandler for F
where
    F: FnMut(MirrorRecord),
{
    fn handle(&mut self, record: MirrorRecord) {
        self(record);
    }
}

/// Counters for one mirrored share.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MirrorStats {
    /// Local directories created.
    pub directories_created: u64,
    /// Files copied.
    pub files_copied: u64,
    /// Files already up to date.
    pub files_skipped: u64,
    /// Files whose transfer failed.
    pub files_failed: u64,
    /// Bytes written by successful copies.
    pub bytes_copied: u64,
}

impl MirrorStats {
    /// Counts one record.
    pub fn observe(&mut self, record: &MirrorRecord) {
        match record.action() {
            MirrorAction::DirectoryCreated => self.directories_created += 1,
            MirrorAction::File(TransferOutcome::Copied) => {
                self.files_copied += 1;
                self.bytes_copied += record.size();
            }
            MirrorAction::File(TransferOutcome::Skipped) => self.files_skipped += 1,
            MirrorAction::File(TransferOutcome::Failed(_)) => self.files_failed += 1,
        }
    }

    /// Adds another share's counters.
    pub fn merge(&mut self, other: &Self) {
        self.directories_created += other.directories_created;
        self.files_copied += other.files_copied;
        self.files_skipped += other.files_skipped;
        self.files_failed += other.files_failed;
        self.bytes_copied += other.bytes_copied;
    }
}
