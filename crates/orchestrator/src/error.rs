use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Configuration problem detected before any network activity. Fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration '{}': {source}", path.display())]
    Read {
        /// Configuration file path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid JSON for the expected shape.
    #[error("invalid configuration '{}': {source}", path.display())]
    Parse {
        /// Configuration file path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },

    /// A required value is absent.
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    /// No server was configured.
    #[error("no servers configured")]
    NoServers,

    /// A value is present but unusable.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Two servers write into the same local folder.
    #[error("local folder '{0}' is used by more than one server")]
    DuplicateFolder(String),

    /// The date format description does not parse.
    #[error("invalid date format '{format}': {reason}")]
    DateFormat {
        /// Format description as configured.
        format: String,
        /// Parser message.
        reason: String,
    },

    /// The destination base cannot be created or written.
    #[error("destination '{}' is not writable: {source}", path.display())]
    Destination {
        /// Destination base directory.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
