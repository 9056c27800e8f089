//! Run configuration: JSON file plus command-line overrides, validated once.

use std::collections::HashSet;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use engine::{TransferOptions, VerifyMode};
use remote::{Credentials, DEFAULT_PORT, Endpoint};
use serde::{Deserialize, Serialize};

use crate::date_stamp::{DEFAULT_DATE_FORMAT, validate_date_format};
use crate::error::ConfigError;

/// Domain announced when none is configured.
pub const DEFAULT_DOMAIN: &str = "WORKGROUP";

/// Client name announced to endpoints.
pub const DEFAULT_CLIENT_NAME: &str = "localhost";

/// One endpoint and the local folder its shares land in.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerSpec {
    /// Host name or IP address.
    pub address: String,
    /// Folder below the destination base.
    pub local_folder: String,
}

impl ServerSpec {
    /// Creates a server entry.
    #[must_use]
    pub fn new(address: impl Into<String>, local_folder: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            local_folder: local_folder.into(),
        }
    }

    /// Parses the `ADDRESS=FOLDER` command-line form.
    pub fn parse_pair(pair: &str) -> Result<Self, ConfigError> {
        match pair.split_once('=') {
            Some((address, folder)) => Ok(Self::new(address.trim(), folder.trim())),
            None => Err(ConfigError::invalid(
                "server",
                format!("'{pair}' is not of the form ADDRESS=FOLDER"),
            )),
        }
    }
}

/// Credential fields as they appear in the file.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Account name.
    pub user: Option<String>,
    /// Account password.
    pub password: Option<String>,
    /// Domain or workgroup.
    pub domain: Option<String>,
}

/// Configuration before validation. Every field is optional so that a file
/// and command-line overrides can be layered with [`PartialConfig::merge`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfig {
    /// Destination base directory.
    pub destination: Option<PathBuf>,
    /// Session credentials.
    pub credentials: CredentialsConfig,
    /// Endpoint port.
    pub port: Option<u16>,
    /// Servers, in processing order.
    pub servers: Vec<ServerSpec>,
    /// `time` format description for the run directory.
    pub date_format: Option<String>,
    /// Servers mirrored concurrently.
    pub jobs: Option<usize>,
    /// Change confirmation mode.
    pub verify: Option<VerifyMode>,
    /// Extra attempts per failed file.
    pub transfer_retries: Option<u32>,
    /// Per-file deadline in seconds.
    pub transfer_timeout_secs: Option<u64>,
    /// Directory holding one mounted tree per endpoint address.
    pub mount_root: Option<PathBuf>,
}

impl PartialConfig {
    /// Reads a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layers `overrides` on top of `self`. A non-empty server list replaces
    /// the configured one.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            destination: overrides.destination.or(self.destination),
            credentials: CredentialsConfig {
                user: overrides.credentials.user.or(self.credentials.user),
                password: overrides.credentials.password.or(self.credentials.password),
                domain: overrides.credentials.domain.or(self.credentials.domain),
            },
            port: overrides.port.or(self.port),
            servers: if overrides.servers.is_empty() {
                self.servers
            } else {
                overrides.servers
            },
            date_format: overrides.date_format.or(self.date_format),
            jobs: overrides.jobs.or(self.jobs),
            verify: overrides.verify.or(self.verify),
            transfer_retries: overrides.transfer_retries.or(self.transfer_retries),
            transfer_timeout_secs: overrides.transfer_timeout_secs.or(self.transfer_timeout_secs),
            mount_root: overrides.mount_root.or(self.mount_root),
        }
    }

    /// Applies defaults and validates every field.
    ///
    /// Does not touch the filesystem; see [`SyncConfig::prepare_destination`].
    pub fn validate(self) -> Result<SyncConfig, ConfigError> {
        let destination = self
            .destination
            .ok_or(ConfigError::Missing("destination"))?;
        if destination.as_os_str().is_empty() {
            return Err(ConfigError::invalid("destination", "empty path"));
        }

        let user = non_empty(self.credentials.user, "credentials.user")?;
        let password = non_empty(self.credentials.password, "credentials.password")?;
        let domain = match self.credentials.domain {
            Some(domain) if domain.trim().is_empty() => {
                return Err(ConfigError::invalid("credentials.domain", "empty value"));
            }
            Some(domain) => domain,
            None => DEFAULT_DOMAIN.to_owned(),
        };

        let port = self.port.unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(ConfigError::invalid("port", "must be between 1 and 65535"));
        }

        if self.servers.is_empty() {
            return Err(ConfigError::NoServers);
        }
        let mut folders = HashSet::new();
        for server in &self.servers {
            if server.address.trim().is_empty() {
                return Err(ConfigError::invalid("server address", "empty value"));
            }
            validate_folder(&server.local_folder)?;
            if !folders.insert(server.local_folder.as_str()) {
                return Err(ConfigError::DuplicateFolder(server.local_folder.clone()));
            }
        }

        let date_format = self
            .date_format
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_owned());
        validate_date_format(&date_format)?;

        let jobs = NonZeroUsize::new(self.jobs.unwrap_or(1))
            .ok_or_else(|| ConfigError::invalid("jobs", "must be at least 1"))?;

        let timeout = match self.transfer_timeout_secs {
            Some(0) => {
                return Err(ConfigError::invalid(
                    "transfer_timeout_secs",
                    "must be at least 1",
                ));
            }
            Some(seconds) => Some(Duration::from_secs(seconds)),
            None => None,
        };

        Ok(SyncConfig {
            destination,
            credentials: Credentials {
                user,
                password,
                domain,
                client_name: DEFAULT_CLIENT_NAME.to_owned(),
            },
            port,
            servers: self.servers,
            date_format,
            jobs,
            verify: self.verify.unwrap_or_default(),
            transfer: TransferOptions {
                retries: self.transfer_retries.unwrap_or(0),
                timeout,
            },
            mount_root: self.mount_root,
        })
    }
}

fn non_empty(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    match value {
        None => Err(ConfigError::Missing(field)),
        Some(value) if value.is_empty() => Err(ConfigError::invalid(field, "empty value")),
        Some(value) => Ok(value),
    }
}

fn validate_folder(folder: &str) -> Result<(), ConfigError> {
    let mut components = Path::new(folder).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !folder.contains(['/', '\\']) => Ok(()),
        _ => Err(ConfigError::invalid(
            "local folder",
            format!("'{folder}' must be a single relative path component"),
        )),
    }
}

/// Validated configuration for one run.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Destination base directory.
    pub destination: PathBuf,
    /// Credentials handed to the connector.
    pub credentials: Credentials,
    /// Endpoint port.
    pub port: u16,
    /// Servers, in processing order.
    pub servers: Vec<ServerSpec>,
    /// `time` format description for the run directory.
    pub date_format: String,
    /// Servers mirrored concurrently.
    pub jobs: NonZeroUsize,
    /// Change confirmation mode.
    pub verify: VerifyMode,
    /// Retry and deadline policy per file.
    pub transfer: TransferOptions,
    /// Directory holding one mounted tree per endpoint address.
    pub mount_root: Option<PathBuf>,
}

impl SyncConfig {
    /// Endpoint for `server`.
    #[must_use]
    pub fn endpoint(&self, server: &ServerSpec) -> Endpoint {
        Endpoint::new(server.address.clone(), self.port)
    }

    /// `<destination>/<folder>` for `server`.
    #[must_use]
    pub fn server_root(&self, server: &ServerSpec) -> PathBuf {
        self.destination.join(&server.local_folder)
    }

    /// Creates the destination base and proves it writable with a scratch file.
    pub fn prepare_destination(&self) -> Result<(), ConfigError> {
        let destination_error = |source| ConfigError::Destination {
            path: self.destination.clone(),
            source,
        };
        fs::create_dir_all(&self.destination).map_err(destination_error)?;
        let (scratch, guard) =
            engine::open_tmpfile(&self.destination.join("write-check")).map_err(destination_error)?;
        drop(scratch);
        drop(guard);
        Ok(())
    }
}
