//! In-memory endpoints for tests.
//!
//! A [`MemoryConnector`] holds any number of servers keyed by address. Clones
//! share state, so a test keeps one handle to seed content and inspect
//! counters while the code under test connects through another.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    Connector, Credentials, Endpoint, EntryKind, RemoteEntry, RemoteError, RemoteFilesystemClient,
    RemotePath, ShareDescriptor,
};

const CHUNK: usize = 8 * 1024;

type Key = Vec<String>;

fn key_of(path: &str) -> Key {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect()
}

fn remote_key(path: &RemotePath) -> Key {
    path.segments().map(str::to_owned).collect()
}

#[derive(Clone, Debug)]
enum Node {
    Directory,
    File {
        data: Vec<u8>,
        declared: Option<u64>,
        fail_after: Option<usize>,
    },
    Other,
}

#[derive(Debug, Default)]
struct Share {
    special: bool,
    nodes: BTreeMap<Key, Node>,
    failing_listings: BTreeSet<Key>,
}

impl Share {
    fn ensure_parents(&mut self, key: &[String]) {
        for depth in 1..key.len() {
            self.nodes
                .entry(key[..depth].to_vec())
                .or_insert(Node::Directory);
        }
    }
}

#[derive(Debug, Default)]
struct Server {
    unreachable: bool,
    failing_enumeration: bool,
    shares: BTreeMap<String, Share>,
}

#[derive(Debug, Default)]
struct State {
    servers: BTreeMap<String, Server>,
    connections: Vec<String>,
    closes: usize,
    retrievals: usize,
}

/// Connector over servers held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryConnector {
    state: Arc<Mutex<State>>,
}

impl MemoryConnector {
    /// Creates a connector with no servers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    fn with_share<R>(&self, address: &str, share: &str, op: impl FnOnce(&mut Share) -> R) -> R {
        let mut state = self.lock();
        let server = state.servers.entry(address.to_owned()).or_default();
        let share = server.shares.entry(share.to_owned()).or_default();
        op(share)
    }

    /// Registers a server with no shares.
    pub fn add_server(&self, address: &str) -> &Self {
        self.lock().servers.entry(address.to_owned()).or_default();
        self
    }

    /// Registers a share, creating the server when needed.
    pub fn add_share(&self, address: &str, share: &str, special: bool) -> &Self {
        self.with_share(address, share, |entry| entry.special = special);
        self
    }

    /// Adds or replaces a file, creating missing parent directories.
    pub fn add_file(&self, address: &str, share: &str, path: &str, data: &[u8]) -> &Self {
        let key = key_of(path);
        self.with_share(address, share, |entry| {
            entry.ensure_parents(&key);
            entry.nodes.insert(
                key,
                Node::File {
                    data: data.to_vec(),
                    declared: None,
                    fail_after: None,
                },
            );
        });
        self
    }

    /// Adds a directory and its parents.
    pub fn add_directory(&self, address: &str, share: &str, path: &str) -> &Self {
        let key = key_of(path);
        self.with_share(address, share, |entry| {
            entry.ensure_parents(&key);
            entry.nodes.insert(key, Node::Directory);
        });
        self
    }

    /// Adds an entry the listing reports as neither file nor directory.
    pub fn add_other(&self, address: &str, share: &str, path: &str) -> &Self {
        let key = key_of(path);
        self.with_share(address, share, |entry| {
            entry.ensure_parents(&key);
            entry.nodes.insert(key, Node::Other);
        });
        self
    }

    /// Removes an entry and everything below it.
    pub fn remove(&self, address: &str, share: &str, path: &str) -> &Self {
        let key = key_of(path);
        self.with_share(address, share, |entry| {
            entry.nodes.retain(|candidate, _| !candidate.starts_with(&key));
        });
        self
    }

    /// Makes the listing advertise `size` for a file regardless of its content.
    pub fn declare_size(&self, address: &str, share: &str, path: &str, size: u64) -> &Self {
        let key = key_of(path);
        self.with_share(address, share, |entry| {
            if let Some(Node::File { declared, .. }) = entry.nodes.get_mut(&key) {
                *declared = Some(size);
            }
        });
        self
    }

    /// Makes listing `path` fail with a permission error.
    pub fn fail_listing(&self, address: &str, share: &str, path: &str) -> &Self {
        let key = key_of(path);
        self.with_share(address, share, |entry| {
            entry.failing_listings.insert(key);
        });
        self
    }

    /// Makes retrieving `path` drop the connection after `bytes` bytes.
    pub fn fail_retrieve_after(&self, address: &str, share: &str, path: &str, bytes: usize) -> &Self {
        let key = key_of(path);
        self.with_share(address, share, |entry| {
            if let Some(Node::File { fail_after, .. }) = entry.nodes.get_mut(&key) {
                *fail_after = Some(bytes);
            }
        });
        self
    }

    /// Clears a transfer failure set by [`Self::fail_retrieve_after`].
    pub fn heal_retrieve(&self, address: &str, share: &str, path: &str) -> &Self {
        let key = key_of(path);
        self.with_share(address, share, |entry| {
            if let Some(Node::File { fail_after, .. }) = entry.nodes.get_mut(&key) {
                *fail_after = None;
            }
        });
        self
    }

    /// Makes connecting to `address` time out.
    pub fn set_unreachable(&self, address: &str) -> &Self {
        self.lock()
            .servers
            .entry(address.to_owned())
            .or_default()
            .unreachable = true;
        self
    }

    /// Makes share enumeration on `address` fail.
    pub fn fail_share_enumeration(&self, address: &str) -> &Self {
        self.lock()
            .servers
            .entry(address.to_owned())
            .or_default()
            .failing_enumeration = true;
        self
    }

    /// Number of file retrievals started so far, across all servers.
    #[must_use]
    pub fn retrieve_count(&self) -> usize {
        self.lock().retrievals
    }

    /// Addresses connected to so far, in connection order.
    #[must_use]
    pub fn connections(&self) -> Vec<String> {
        self.lock().connections.clone()
    }

    /// Sessions opened and not yet closed.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        let state = self.lock();
        state.connections.len().saturating_sub(state.closes)
    }
}

impl Connector for MemoryConnector {
    type Client = MemoryClient;

    fn connect(
        &self,
        endpoint: &Endpoint,
        _credentials: &Credentials,
    ) -> Result<Self::Client, RemoteError> {
        let mut state = self.lock();
        let failure = match state.servers.get(endpoint.address()) {
            None => Some(io::ErrorKind::ConnectionRefused),
            Some(server) if server.unreachable => Some(io::ErrorKind::TimedOut),
            Some(_) => None,
        };
        if let Some(kind) = failure {
            return Err(RemoteError::Connect {
                endpoint: endpoint.to_string(),
                source: io::Error::from(kind),
            });
        }
        state.connections.push(endpoint.address().to_owned());
        drop(state);

        Ok(MemoryClient {
            connector: self.clone(),
            endpoint: endpoint.clone(),
            open: true,
        })
    }
}

/// Session produced by [`MemoryConnector`].
#[derive(Debug)]
pub struct MemoryClient {
    connector: MemoryConnector,
    endpoint: Endpoint,
    open: bool,
}

impl MemoryClient {
    fn ensure_open(&self) -> io::Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(io::Error::from(io::ErrorKind::NotConnected))
        }
    }

    fn list(&self, share: &str, path: &RemotePath) -> io::Result<Vec<RemoteEntry>> {
        self.ensure_open()?;
        let state = self.connector.lock();
        let share = state
            .servers
            .get(self.endpoint.address())
            .and_then(|server| server.shares.get(share))
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;

        let key = remote_key(path);
        if share.failing_listings.contains(&key) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        match share.nodes.get(&key) {
            Some(Node::Directory) => {}
            None if key.is_empty() => {}
            Some(_) => return Err(io::Error::from(io::ErrorKind::NotADirectory)),
            None => return Err(io::Error::from(io::ErrorKind::NotFound)),
        }

        let mut entries = vec![RemoteEntry::directory("."), RemoteEntry::directory("..")];
        for (candidate, node) in &share.nodes {
            if candidate.len() != key.len() + 1 || !candidate.starts_with(&key) {
                continue;
            }
            let name = candidate[key.len()].clone();
            entries.push(match node {
                Node::Directory => RemoteEntry::directory(name),
                Node::File { data, declared, .. } => {
                    RemoteEntry::file(name, declared.unwrap_or(data.len() as u64))
                }
                Node::Other => RemoteEntry::new(name, EntryKind::Other, 0),
            });
        }
        Ok(entries)
    }

    fn retrieve(&self, share: &str, path: &RemotePath, sink: &mut dyn Write) -> io::Result<u64> {
        self.ensure_open()?;
        let (data, fail_after) = {
            let mut state = self.connector.lock();
            state.retrievals += 1;
            let node = state
                .servers
                .get(self.endpoint.address())
                .and_then(|server| server.shares.get(share))
                .and_then(|share| share.nodes.get(&remote_key(path)));
            match node {
                Some(Node::File {
                    data, fail_after, ..
                }) => (data.clone(), *fail_after),
                Some(Node::Directory) => {
                    return Err(io::Error::from(io::ErrorKind::IsADirectory));
                }
                Some(Node::Other) => return Err(io::Error::from(io::ErrorKind::Unsupported)),
                None => return Err(io::Error::from(io::ErrorKind::NotFound)),
            }
        };

        let limit = fail_after.map_or(data.len(), |bytes| bytes.min(data.len()));
        let mut written = 0u64;
        for chunk in data[..limit].chunks(CHUNK) {
            sink.write_all(chunk)?;
            written += chunk.len() as u64;
        }
        if fail_after.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection dropped mid-transfer",
            ));
        }
        Ok(written)
    }
}

impl RemoteFilesystemClient for MemoryClient {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn list_shares(&mut self) -> Result<Vec<ShareDescriptor>, RemoteError> {
        let list = || -> io::Result<Vec<ShareDescriptor>> {
            self.ensure_open()?;
            let state = self.connector.lock();
            let server = state
                .servers
                .get(self.endpoint.address())
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;
            if server.failing_enumeration {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            Ok(server
                .shares
                .iter()
                .map(|(name, share)| ShareDescriptor::new(name.clone(), share.special))
                .collect())
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
        self.list(share, path).map_err(|source| RemoteError::ListPath {
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
        self.retrieve(share, path, sink)
            .map_err(|source| RemoteError::Retrieve {
                share: share.to_owned(),
                path: path.clone(),
                source,
            })
    }

    fn close(&mut self) -> Result<(), RemoteError> {
        if self.open {
            self.open = false;
            self.connector.lock().closes += 1;
        }
        Ok(())
    }
}
