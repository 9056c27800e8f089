use std::path::PathBuf;

use engine::VerifyMode;
use orchestrator::{ConfigError, CredentialsConfig, PartialConfig, ServerSpec};

/// Parsed command-line arguments.
///
/// **Warning**: exposed through `cli::test_utils` for integration tests only;
/// not a stable interface.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParsedArgs {
    /// `--help`.
    pub show_help: bool,
    /// `--version`.
    pub show_version: bool,
    /// `--config FILE`.
    pub config: Option<PathBuf>,
    /// `--dest DIR`.
    pub destination: Option<PathBuf>,
    /// `--server ADDR=FOLDER`, in command-line order.
    pub servers: Vec<String>,
    /// `--user`.
    pub user: Option<String>,
    /// `--password`.
    pub password: Option<String>,
    /// `--domain`.
    pub domain: Option<String>,
    /// `--port`.
    pub port: Option<u16>,
    /// `--date-format`.
    pub date_format: Option<String>,
    /// `--date YYYY-MM-DD`.
    pub date: Option<String>,
    /// `--jobs`.
    pub jobs: Option<usize>,
    /// `--checksum`.
    pub checksum: bool,
    /// `--retries`.
    pub retries: Option<u32>,
    /// `--timeout SECONDS`.
    pub timeout: Option<u64>,
    /// `--mount-root DIR`.
    pub mount_root: Option<PathBuf>,
    /// `-q`.
    pub quiet: bool,
    /// Number of `-v` occurrences.
    pub verbose: u8,
}

impl ParsedArgs {
    /// Configuration layer made of the values given on the command line.
    pub fn overrides(&self) -> Result<PartialConfig, ConfigError> {
        let servers = self
            .servers
            .iter()
            .map(|pair| ServerSpec::parse_pair(pair))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PartialConfig {
            destination: self.destination.clone(),
            credentials: CredentialsConfig {
                user: self.user.clone(),
                password: self.password.clone(),
                domain: self.domain.clone(),
            },
            port: self.port,
            servers,
            date_format: self.date_format.clone(),
            jobs: self.jobs,
            verify: self.checksum.then_some(VerifyMode::Checksum),
            transfer_retries: self.retries,
            transfer_timeout_secs: self.timeout,
            mount_root: self.mount_root.clone(),
        })
    }
}
