use std::io;
use std::path::Path;

use engine::{MirrorError, MirrorRecordHandler, MirrorStats, TreeMirror};
use logging::trace_connect;
use remote::{
    Connector, Credentials, Endpoint, RemoteError, RemoteFilesystemClient, RemotePath,
    ShareDescriptor,
};

use crate::config::ServerSpec;
use crate::date_stamp::DateStamp;

/// Lifecycle of one server's session within a run.
///
/// `Disconnected -> Connected -> Enumerating -> Mirroring* -> Closed`, or
/// `Disconnected -> FailedToConnect`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// Not connected yet.
    Disconnected,
    /// Connected and authenticated.
    Connected,
    /// Listing shares.
    Enumerating,
    /// Mirroring a share.
    Mirroring,
    /// Connection released.
    Closed,
    /// The connection attempt failed.
    FailedToConnect,
}

/// Per-run state of one server: its configured entry, the open client and the run date.
///
/// The client is closed exactly once, either by [`SyncSession::close`] or when
/// the session is dropped.
#[derive(Debug)]
pub struct SyncSession<C: RemoteFilesystemClient> {
    server: ServerSpec,
    stamp: DateStamp,
    client: Option<C>,
    state: SessionState,
}

impl<C: RemoteFilesystemClient> SyncSession<C> {
    /// Creates a disconnected session.
    #[must_use]
    pub const fn new(server: ServerSpec, stamp: DateStamp) -> Self {
        Self {
            server,
            stamp,
            client: None,
            state: SessionState::Disconnected,
        }
    }

    /// Server this session belongs to.
    #[must_use]
    pub const fn server(&self) -> &ServerSpec {
        &self.server
    }

    /// Run date stamp.
    #[must_use]
    pub const fn stamp(&self) -> &DateStamp {
        &self.stamp
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Opens the connection through `connector`.
    pub fn connect<K>(
        &mut self,
        connector: &K,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<(), RemoteError>
    where
        K: Connector<Client = C> + ?Sized,
    {
        match connector.connect(endpoint, credentials) {
            Ok(client) => {
                trace_connect!("connected to {endpoint} ({})", self.server.local_folder);
                self.client = Some(client);
                self.state = SessionState::Connected;
                Ok(())
            }
            Err(error) => {
                self.state = SessionState::FailedToConnect;
                Err(error)
            }
        }
    }

    fn client(client: &mut Option<C>) -> io::Result<&mut C> {
        client
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "session is not connected"))
    }

    /// Lists every share advertised by the server.
    pub fn shares(&mut self) -> Result<Vec<ShareDescriptor>, RemoteError> {
        let address = self.server.address.clone();
        let client = Self::client(&mut self.client).map_err(|source| RemoteError::ListShares {
            endpoint: address,
            source,
        })?;
        let shares = client.list_shares()?;
        self.state = SessionState::Enumerating;
        Ok(shares)
    }

    /// Mirrors the root of `share` into `local_dir`.
    ///
    /// The session reads [`SessionState::Mirroring`] from the moment the walk
    /// starts until the next share or [`SyncSession::close`].
    pub fn mirror_share<H>(
        &mut self,
        mirror: &TreeMirror,
        share: &str,
        local_dir: &Path,
        handler: &mut H,
    ) -> Result<MirrorStats, MirrorError>
    where
        H: MirrorRecordHandler + ?Sized,
    {
        let root = RemotePath::root();
        let client = Self::client(&mut self.client).map_err(|source| {
            MirrorError::List(RemoteError::ListPath {
                share: share.to_owned(),
                path: root.clone(),
                source,
            })
        })?;
        self.state = SessionState::Mirroring;
        mirror.mirror(client, share, &root, local_dir, handler)
    }

    /// Closes the connection. Calling it again is a no-op.
    pub fn close(&mut self) {
        if let Some(mut client) = self.client.take() {
            match client.close() {
                Ok(()) => trace_connect!("closed connection to {}", client.endpoint()),
                Err(error) => tracing::warn!(target: logging::targets::CONNECT, "{error}"),
            }
            self.state = SessionState::Closed;
        }
    }
}

impl<C: RemoteFilesystemClient> Drop for SyncSession<C> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use remote::{MemoryClient, MemoryConnector};

    use super::*;

    fn session() -> SyncSession<MemoryClient> {
        SyncSession::new(
            ServerSpec::new("192.168.10.83", "asiair4"),
            DateStamp::new("20240511").expect("stamp"),
        )
    }

    #[test]
    fn walks_through_the_lifecycle() {
        let connector = MemoryConnector::new();
        connector
            .add_server("192.168.10.83")
            .add_share("192.168.10.83", "data", false)
            .add_share("192.168.10.83", "print$", true)
            .add_file("192.168.10.83", "data", "/a.fit", b"abc");
        let temp = tempfile::tempdir().expect("tempdir");

        let mut session = session();
        assert_eq!(session.state(), SessionState::Disconnected);
        session
            .connect(
                &connector,
                &Endpoint::new("192.168.10.83", 445),
                &Credentials::default(),
            )
            .expect("connect");
        assert_eq!(session.state(), SessionState::Connected);

        let shares = session.shares().expect("shares");
        assert_eq!(session.state(), SessionState::Enumerating);
        assert_eq!(
            shares,
            vec![
                ShareDescriptor::new("data", false),
                ShareDescriptor::new("print$", true)
            ]
        );

        let stats = session
            .mirror_share(
                &TreeMirror::default(),
                "data",
                temp.path(),
                &mut |_record: engine::MirrorRecord| {},
            )
            .expect("mirror");
        assert_eq!(stats.files_copied, 1);
        assert_eq!(session.state(), SessionState::Mirroring);

        session.close();
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(connector.open_sessions(), 0);
    }

    #[test]
    fn failed_connection_is_terminal() {
        let connector = MemoryConnector::new();
        let mut session = session();
        assert!(
            session
                .connect(
                    &connector,
                    &Endpoint::new("192.168.10.83", 445),
                    &Credentials::default(),
                )
                .is_err()
        );
        assert_eq!(session.state(), SessionState::FailedToConnect);
        assert!(session.shares().is_err());
    }

    #[test]
    fn dropping_closes_the_client() {
        let connector = MemoryConnector::new();
        connector.add_server("192.168.10.83");
        {
            let mut session = session();
            session
                .connect(
                    &connector,
                    &Endpoint::new("192.168.10.83", 445),
                    &Credentials::default(),
                )
                .expect("connect");
            assert_eq!(connector.open_sessions(), 1);
        }
        assert_eq!(connector.open_sessions(), 0);
    }

    #[test]
    fn failed_walk_still_reads_mirroring() {
        let connector = MemoryConnector::new();
        connector
            .add_share("192.168.10.83", "data", false)
            .fail_listing("192.168.10.83", "data", "/");
        let temp = tempfile::tempdir().expect("tempdir");
        let mut session = session();
        session
            .connect(
                &connector,
                &Endpoint::new("192.168.10.83", 445),
                &Credentials::default(),
            )
            .expect("connect");
        session.shares().expect("shares");

        let result = session.mirror_share(
            &TreeMirror::default(),
            "data",
            temp.path(),
            &mut |_record: engine::MirrorRecord| {},
        );
        assert!(matches!(result, Err(MirrorError::List(_))));
        assert_eq!(session.state(), SessionState::Mirroring);
    }

    #[test]
    fn mirroring_without_a_connection_keeps_the_state() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut session = session();
        let result = session.mirror_share(
            &TreeMirror::default(),
            "data",
            temp.path(),
            &mut |_record: engine::MirrorRecord| {},
        );
        assert!(result.is_err());
        assert_eq!(session.state(), SessionState::Disconnected);
    }
}
