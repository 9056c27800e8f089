use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

use remote::{RemoteFilesystemClient, RemotePath};

use crate::CancellationToken;
use crate::checksum::{DigestWriter, local_digest};
use crate::error::TransferError;
use crate::transfer::{GuardedSink, TransferOptions};

/// How a size match is confirmed before a file is skipped.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VerifyMode {
    /// Equal byte length means unchanged.
    #[default]
    Size,
    /// Equal length must also produce equal XXH3-64 digests.
    Checksum,
}

/// Decides whether a remote file has to be copied.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChangeDetector {
    mode: VerifyMode,
}

impl ChangeDetector {
    /// Creates a detector.
    #[must_use]
    pub const fn new(mode: VerifyMode) -> Self {
        Self { mode }
    }

    /// Active verification mode.
    #[must_use]
    pub const fn mode(&self) -> VerifyMode {
        self.mode
    }

    /// Size-only comparison against the listing's declared size.
    ///
    /// A missing local file, an unreadable one or a directory in the way all
    /// count as needing a transfer.
    #[must_use]
    pub fn needs_transfer(&self, local: &Path, remote_size: u64) -> bool {
        match fs::metadata(local) {
            Ok(metadata) => !metadata.is_file() || metadata.len() != remote_size,
            Err(_) => true,
        }
    }

    /// Second opinion for a size match under [`VerifyMode::Checksum`].
    ///
    /// Streams the remote file through a hasher and compares digests. The
    /// stream honours `cancel` and the per-transfer deadline of `options`
    /// exactly like a transfer does, and a tripped stop is returned as the
    /// matching [`TransferError`]. Any other failure while hashing reports
    /// the file as changed so the transfer path gets a chance to surface it.
    pub fn content_differs<C>(
        &self,
        client: &mut C,
        share: &str,
        remote: &RemotePath,
        local: &Path,
        options: &TransferOptions,
        cancel: &CancellationToken,
    ) -> Result<bool, TransferError>
    where
        C: RemoteFilesystemClient + ?Sized,
    {
        if self.mode == VerifyMode::Size {
            return Ok(false);
        }
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        let Ok(local_digest) = local_digest(local) else {
            return Ok(true);
        };

        let deadline = options.timeout.map(|limit| Instant::now() + limit);
        let mut sink = GuardedSink::new(DigestWriter::new(), cancel, deadline);
        match client.retrieve_file(share, remote, &mut sink) {
            Ok(_) => Ok(sink.inner.digest() != local_digest),
            Err(error) => {
                if let Some(stopped) = sink.stop_error(options) {
                    return Err(stopped);
                }
                tracing::debug!(
                    target: logging::targets::SKIP,
                    "checksum of '{remote}' on '{share}' at {} unavailable: {error}",
                    client.endpoint().address()
                );
                Ok(true)
            }
        }
    }
}

/// Length of a local file, or `None` when absent.
pub(crate) fn local_len(path: &Path) -> io::Result<Option<u64>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata.len())),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use remote::{Connector, Credentials, Endpoint, MemoryConnector};

    #[test]
    fn missing_file_needs_transfer() {
        let temp = tempfile::tempdir().expect("tempdir");
        let detector = ChangeDetector::default();
        assert!(detector.needs_transfer(&temp.path().join("absent.fit"), 0));
    }

    #[test]
    fn zero_byte_files_match_only_zero() {
        let temp = tempfile::tempdir().expect("tempdir");
        let empty = temp.path().join("empty");
        fs::write(&empty, b"").expect("write");
        let detector = ChangeDetector::default();
        assert!(!detector.needs_transfer(&empty, 0));
        assert!(detector.needs_transfer(&empty, 1));
    }

    #[test]
    fn directory_in_the_way_needs_transfer() {
        let temp = tempfile::tempdir().expect("tempdir");
        let detector = ChangeDetector::default();
        assert!(detector.needs_transfer(temp.path(), 0));
    }

    #[test]
    fn checksum_mode_catches_same_length_edit() {
        let temp = tempfile::tempdir().expect("tempdir");
        let local = temp.path().join("log.txt");
        fs::write(&local, b"exposure=60").expect("write");

        let connector = MemoryConnector::new();
        connector.add_file("host", "data", "/log.txt", b"exposure=90");
        let mut client = connector
            .connect(&Endpoint::new("host", 445), &Credentials::default())
            .expect("connect");
        let remote = RemotePath::parse("/log.txt").expect("path");

        let options = TransferOptions::default();
        let cancel = CancellationToken::new();
        let mut differs = |detector: ChangeDetector| {
            detector
                .content_differs(&mut client, "data", &remote, &local, &options, &cancel)
                .expect("hash pass")
        };

        let size_only = ChangeDetector::new(VerifyMode::Size);
        assert!(!size_only.needs_transfer(&local, 11));
        assert!(!differs(size_only));

        let strict = ChangeDetector::new(VerifyMode::Checksum);
        assert!(differs(strict));

        fs::write(&local, b"exposure=90").expect("rewrite");
        assert!(!differs(strict));
    }

    #[test]
    fn checksum_pass_stops_when_cancelled() {
        let temp = tempfile::tempdir().expect("tempdir");
        let local = temp.path().join("log.txt");
        fs::write(&local, b"exposure=60").expect("write");

        let connector = MemoryConnector::new();
        connector.add_file("host", "data", "/log.txt", b"exposure=90");
        let mut client = connector
            .connect(&Endpoint::new("host", 445), &Credentials::default())
            .expect("connect");
        let remote = RemotePath::parse("/log.txt").expect("path");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = ChangeDetector::new(VerifyMode::Checksum).content_differs(
            &mut client,
            "data",
            &remote,
            &local,
            &TransferOptions::default(),
            &cancel,
        );
        assert!(matches!(result, Err(TransferError::Cancelled)));
        assert_eq!(connector.retrieve_count(), 0);
    }

    #[test]
    fn local_len_reports_absence() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert_eq!(local_len(&temp.path().join("nope")).expect("len"), None);
    }

    proptest! {
        #[test]
        fn transfer_needed_iff_lengths_differ(local in 0usize..512, remote in 0u64..512) {
            let temp = tempfile::tempdir().expect("tempdir");
            let path = temp.path().join("frame.fit");
            fs::write(&path, vec![0u8; local]).expect("write");
            let detector = ChangeDetector::default();
            prop_assert_eq!(detector.needs_transfer(&path, remote), local as u64 != remote);
        }
    }
}
