use std::fmt;
use std::io::Write;

use crate::{RemoteEntry, RemoteError, RemotePath, ShareDescriptor};

/// Port used when the configuration does not name one (SMB over TCP).
pub const DEFAULT_PORT: u16 = 445;

/// Network location of a file-serving endpoint.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Endpoint {
    address: String,
    port: u16,
}

impl Endpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Host name or IP address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Opaque session credentials handed to the connector unchanged.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Credentials {
    /// Account name.
    pub user: String,
    /// Account password.
    pub password: String,
    /// Authentication domain or workgroup.
    pub domain: String,
    /// Name this host announces to the endpoint.
    pub client_name: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .field("client_name", &self.client_name)
            .finish()
    }
}

/// An open session with one endpoint.
///
/// Sessions are not assumed to support concurrent verbs: every method takes
/// `&mut self`, and callers wanting parallelism open one client per worker.
pub trait RemoteFilesystemClient {
    /// Endpoint this session is connected to.
    fn endpoint(&self) -> &Endpoint;

    /// Enumerates the shares exported by the endpoint.
    fn list_shares(&mut self) -> Result<Vec<ShareDescriptor>, RemoteError>;

    /// Lists one directory of a share.
    ///
    /// Implementations may include `.` and `..` markers; callers filter them.
    fn list_path(&mut self, share: &str, path: &RemotePath)
    -> Result<Vec<RemoteEntry>, RemoteError>;

    /// Streams the full contents of a file into `sink`, returning the number
    /// of bytes written.
    ///
    /// A failing `sink` aborts the retrieval and is reported as
    /// [`RemoteError::Retrieve`].
    fn retrieve_file(
        &mut self,
        share: &str,
        path: &RemotePath,
        sink: &mut dyn Write,
    ) -> Result<u64, RemoteError>;

    /// Ends the session. Further calls fail.
    fn close(&mut self) -> Result<(), RemoteError>;
}

/// Opens sessions. Shared by every worker of a run.
pub trait Connector: Send + Sync {
    /// Session type produced by this connector.
    type Client: RemoteFilesystemClient;

    /// Connects and authenticates to `endpoint`.
    fn connect(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Self::Client, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_display_includes_port() {
        let endpoint = Endpoint::new("192.168.10.83", DEFAULT_PORT);
        assert_eq!(endpoint.to_string(), "192.168.10.83:445");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let credentials = Credentials {
            user: "asiair".to_owned(),
            password: "12345678".to_owned(),
            domain: "WORKGROUP".to_owned(),
            client_name: "localhost".to_owned(),
        };
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("12345678"));
        assert!(rendered.contains("asiair"));
    }
}
