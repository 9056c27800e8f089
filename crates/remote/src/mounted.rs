//! Shares reached through a local mount point.
//!
//! Layout: `<mount_root>/<endpoint address>/<share>/...`. Every directory
//! directly below the endpoint directory is a share; names ending in `$`
//! follow the SMB convention for administrative exports and are flagged as
//! special. Credentials and port are accepted for interface parity but the
//! operating system already authenticated the mount.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use logging::trace_connect;

use crate::{
    Connector, Credentials, Endpoint, EntryKind, RemoteEntry, RemoteError, RemoteFilesystemClient,
    RemotePath, ShareDescriptor,
};

/// Connector for shares mounted under a common root directory.
#[derive(Clone, Debug)]
pub struct MountedConnector {
    mount_root: PathBuf,
}

impl MountedConnector {
    /// Creates a connector rooted at `mount_root`.
    #[must_use]
    pub fn new(mount_root: impl Into<PathBuf>) -> Self {
        Self {
            mount_root: mount_root.into(),
        }
    }

    /// Directory holding one sub-directory per endpoint address.
    #[must_use]
    pub fn mount_root(&self) -> &Path {
        &self.mount_root
    }
}

impl Connector for MountedConnector {
    type Client = MountedClient;

    fn connect(
        &self,
        endpoint: &Endpoint,
        _credentials: &Credentials,
    ) -> Result<Self::Client, RemoteError> {
        let root = self.mount_root.join(endpoint.address());
        let connect_error = |source| RemoteError::Connect {
            endpoint: endpoint.to_string(),
            source,
        };

        let metadata = fs::metadata(&root).map_err(connect_error)?;
        if !metadata.is_dir() {
            return Err(connect_error(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a mounted endpoint", root.display()),
            )));
        }

        trace_connect!("using mounted endpoint {} at {}", endpoint, root.display());
        Ok(MountedClient {
            endpoint: endpoint.clone(),
            root,
            open: true,
        })
    }
}

/// Session over one mounted endpoint directory.
#[derive(Debug)]
pub struct MountedClient {
    endpoint: Endpoint,
    root: PathBuf,
    open: bool,
}

impl MountedClient {
    fn ensure_open(&self) -> io::Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "session already closed",
            ))
        }
    }

    fn resolve(&self, share: &str, path: &RemotePath) -> PathBuf {
        let mut resolved = self.root.join(share);
        for segment in path.segments() {
            resolved.push(segment);
        }
        resolved
    }

    fn list_directory(&self, share: &str, path: &RemotePath) -> io::Result<Vec<RemoteEntry>> {
        self.ensure_open()?;
        let directory = self.resolve(share, path);
        let mut entries = Vec::new();
        for entry in fs::read_dir(&directory)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follow links the way a file server presents them to clients.
            let remote = match fs::metadata(entry.path()) {
                Ok(metadata) if metadata.is_dir() => RemoteEntry::directory(name),
                Ok(metadata) if metadata.is_file() => RemoteEntry::file(name, metadata.len()),
                Ok(metadata) => RemoteEntry::new(name, EntryKind::Other, metadata.len()),
                Err(_) => RemoteEntry::new(name, EntryKind::Other, 0),
            };
            entries.push(remote);
        }
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(entries)
    }
}

impl RemoteFilesystemClient for MountedClient {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn list_shares(&mut self) -> Result<Vec<ShareDescriptor>, RemoteError> {
        let list = || -> io::Result<Vec<ShareDescriptor>> {
            self.ensure_open()?;
            let mut shares = Vec::new();
            for entry in fs::read_dir(&self.root)? {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                let special = name.ends_with('$');
                shares.push(ShareDescriptor::new(name, special));
            }
            shares.sort_by(|a, b| a.name().cmp(b.name()));
            Ok(shares)
        };
        list().map_err(|source| RemoteError::ListShares {
            endpoint: self.endpoint.to_string(),
            source,
        })
    }

    fn list_path(
        &mut self,
        share: &str,
        path: &RemotePath,
    ) -> Result<Vec<RemoteEntry>, RemoteError> {
        self.list_directory(share, path)
            .map_err(|source| RemoteError::ListPath {
                share: share.to_owned(),
                path: path.clone(),
                source,
            })
    }

    fn retrieve_file(
        &mut self,
        share: &str,
        path: &RemotePath,
        sink: &mut dyn Write,
    ) -> Result<u64, RemoteError> {
        let mut retrieve = || -> io::Result<u64> {
            self.ensure_open()?;
            let mut file = fs::File::open(self.resolve(share, path))?;
            io::copy(&mut file, sink)
        };
        retrieve().map_err(|source| RemoteError::Retrieve {
            share: share.to_owned(),
            path: path.clone(),
            source,
        })
    }

    fn close(&mut self) -> Result<(), RemoteError> {
        self.open = false;
        Ok(())
    }
}
