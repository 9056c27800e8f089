//! Streaming one remote file into place.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use remote::{RemoteFilesystemClient, RemotePath};

use crate::error::TransferError;
use crate::temp_guard::open_tmpfile;
use crate::CancellationToken;

const WRITE_BUFFER: usize = 256 * 1024;

/// Retry and deadline policy for file transfers.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TransferOptions {
    /// Extra attempts after a failed transfer.
    pub retries: u32,
    /// Upper bound on the wall time of one attempt.
    pub timeout: Option<Duration>,
}

/// A completed transfer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Transferred {
    /// Bytes written to the destination.
    pub bytes: u64,
    /// Wall time of the successful attempt.
    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Stop {
    Cancelled,
    Deadline,
}

/// Sink that counts bytes and refuses writes once cancelled or late.
pub(crate) struct GuardedSink<'a, W> {
    pub(crate) inner: W,
    pub(crate) written: u64,
    cancel: &'a CancellationToken,
    deadline: Option<Instant>,
    pub(crate) stop: Option<Stop>,
}

impl<'a, W: Write> GuardedSink<'a, W> {
    pub(crate) const fn new(
        inner: W,
        cancel: &'a CancellationToken,
        deadline: Option<Instant>,
    ) -> Self {
        Self {
            inner,
            written: 0,
            cancel,
            deadline,
            stop: None,
        }
    }

    fn check(&mut self) -> io::Result<()> {
        if self.cancel.is_cancelled() {
            self.stop = Some(Stop::Cancelled);
        } else if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            self.stop = Some(Stop::Deadline);
        }
        // Interrupted would be retried by write_all.
        match self.stop {
            Some(Stop::Cancelled) => Err(io::Error::other("transfer cancelled")),
            Some(Stop::Deadline) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "transfer deadline exceeded",
            )),
            None => Ok(()),
        }
    }

    /// Error for the reason writes were refused, if they were.
    pub(crate) fn stop_error(&self, options: &TransferOptions) -> Option<TransferError> {
        self.stop.map(|stop| match stop {
            Stop::Cancelled => TransferError::Cancelled,
            Stop::Deadline => TransferError::TimedOut {
                limit: options.timeout.unwrap_or_default(),
            },
        })
    }
}

impl<W: Write> Write for GuardedSink<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check()?;
        let written = self.inner.write(buf)?;
        self.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Copies `remote` into `destination` through a temporary sibling file.
///
/// The destination is only replaced after the retrieved byte count matches
/// `declared_size` and the data is synced. Failed attempts leave no
/// temporary file behind and are retried per `options`, except for
/// cancellation.
pub fn transfer_file<C>(
    client: &mut C,
    share: &str,
    remote: &RemotePath,
    declared_size: u64,
    destination: &Path,
    options: &TransferOptions,
    cancel: &CancellationToken,
) -> Result<Transferred, TransferError>
where
    C: RemoteFilesystemClient + ?Sized,
{
    let mut attempt = 0;
    loop {
        match transfer_once(client, share, remote, declared_size, destination, options, cancel) {
            Err(error) if error.is_retryable() && attempt < options.retries => {
                attempt += 1;
                tracing::warn!(
                    target: logging::targets::COPY,
                    "retrying '{remote}' on '{share}' at {} ({attempt}/{}): {error}",
                    client.endpoint().address(),
                    options.retries
                );
            }
            result => return result,
        }
    }
}

fn transfer_once<C>(
    client: &mut C,
    share: &str,
    remote: &RemotePath,
    declared_size: u64,
    destination: &Path,
    options: &TransferOptions,
    cancel: &CancellationToken,
) -> Result<Transferred, TransferError>
where
    C: RemoteFilesystemClient + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(TransferError::Cancelled);
    }

    let started = Instant::now();
    let (file, mut guard) = open_tmpfile(destination).map_err(|source| TransferError::CreateTemp {
        path: destination.to_path_buf(),
        source,
    })?;

    let deadline = options.timeout.map(|limit| started + limit);
    let mut sink = GuardedSink::new(
        BufWriter::with_capacity(WRITE_BUFFER, file),
        cancel,
        deadline,
    );
    let retrieved = client.retrieve_file(share, remote, &mut sink);
    if let Err(error) = retrieved {
        return Err(sink
            .stop_error(options)
            .unwrap_or(TransferError::Remote(error)));
    }

    let written = sink.written;
    let write_error = |source| TransferError::Write {
        path: guard.path().to_path_buf(),
        source,
    };
    let file: File = sink
        .inner
        .into_inner()
        .map_err(|error| write_error(error.into_error()))?;
    file.sync_all().map_err(write_error)?;
    drop(file);

    if written != declared_size {
        return Err(TransferError::SizeMismatch {
            path: remote.clone(),
            expected: declared_size,
            actual: written,
        });
    }

    guard
        .persist(destination)
        .map_err(|source| TransferError::Rename {
            from: guard.path().to_path_buf(),
            to: destination.to_path_buf(),
            source,
        })?;

    Ok(Transferred {
        bytes: written,
        elapsed: started.elapsed(),
    })
}
