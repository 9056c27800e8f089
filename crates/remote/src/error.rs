use std::io;

use thiserror::Error;

use crate::RemotePath;

/// Failure of a remote filesystem call.
///
/// Every variant carries the underlying [`io::Error`]; clients translate their
/// protocol-level failures into the closest [`io::ErrorKind`].
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The endpoint could not be reached or refused the session.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        /// `address:port` of the endpoint.
        endpoint: String,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// Share enumeration failed.
    #[error("failed to list shares on {endpoint}: {source}")]
    ListShares {
        /// `address:port` of the endpoint.
        endpoint: String,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// A directory inside a share could not be listed.
    #[error("failed to list '{path}' on share '{share}': {source}")]
    ListPath {
        /// Share name.
        share: String,
        /// Directory path inside the share.
        path: RemotePath,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// Reading a file, or writing it into the caller's sink, failed.
    #[error("failed to retrieve '{path}' from share '{share}': {source}")]
    Retrieve {
        /// Share name.
        share: String,
        /// File path inside the share.
        path: RemotePath,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// Closing the session failed.
    #[error("failed to close connection to {endpoint}: {source}")]
    Close {
        /// `address:port` of the endpoint.
        endpoint: String,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
}

impl RemoteError {
    /// The underlying I/O error.
    #[must_use]
    pub fn io_error(&self) -> &io::Error {
        match self {
            Self::Connect { source, .. }
            | Self::ListShares { source, .. }
            | Self::ListPath { source, .. }
            | Self::Retrieve { source, .. }
            | Self::Close { source, .. } => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_share_and_path() {
        let error = RemoteError::ListPath {
            share: "EMMC Images".to_owned(),
            path: RemotePath::parse("/Autorun/Light").expect("path"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let rendered = error.to_string();
        assert!(rendered.contains("'/Autorun/Light'"), "{rendered}");
        assert!(rendered.contains("'EMMC Images'"), "{rendered}");
        assert_eq!(error.io_error().kind(), io::ErrorKind::PermissionDenied);
    }
}
