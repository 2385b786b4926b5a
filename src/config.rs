//! Server configuration from command-line arguments.

use crate::{DEFAULT_COMMANDS_DIR, DEFAULT_HOST, DEFAULT_PORT};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("invalid port number: {0}")]
    InvalidPort(String),

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Directory holding the command descriptor files
    pub commands_dir: PathBuf,
    /// Close connections idle for longer than this (None = never)
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            commands_dir: PathBuf::from(DEFAULT_COMMANDS_DIR),
            idle_timeout: None,
        }
    }
}

/// What the command line asked the binary to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Run(ServerConfig),
    Help,
    Version,
}

impl ServerConfig {
    /// Parses arguments, excluding the program name.
    pub fn from_args<I>(args: I) -> Result<CliAction, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = ServerConfig::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => {
                    config.host = args
                        .next()
                        .ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                }
                "--port" | "-p" => {
                    let value = args
                        .next()
                        .ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                    config.port = value.parse().map_err(|_| ConfigError::InvalidPort(value))?;
                }
                "--commands-dir" | "-c" => {
                    let value = args
                        .next()
                        .ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                    config.commands_dir = PathBuf::from(value);
                }
                "--timeout" | "-t" => {
                    let value = args
                        .next()
                        .ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                    let secs: u64 = value
                        .parse()
                        .map_err(|_| ConfigError::InvalidTimeout(value))?;
                    config.idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
                }
                "--help" => return Ok(CliAction::Help),
                "--version" | "-v" => return Ok(CliAction::Version),
                _ => return Err(ConfigError::UnknownArgument(arg.clone())),
            }
        }

        Ok(CliAction::Run(config))
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub const HELP: &str = r#"
mintkv - A small Redis-compatible in-memory key-value server

USAGE:
    mintkv [OPTIONS]

OPTIONS:
    -h, --host <HOST>           Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>           Port to listen on (default: 6379)
    -c, --commands-dir <DIR>    Command descriptor directory (default: commands)
    -t, --timeout <SECS>        Close idle connections after SECS (default: 0, never)
    -v, --version               Print version information
        --help                  Print this help message

ENVIRONMENT:
    RUST_LOG                    Log filter, e.g. `debug` or `mintkv=trace` (default: info)

CONNECTING:
    $ redis-cli -p 6379
    127.0.0.1:6379> PING
    PONG
    127.0.0.1:6379> SET name "Ariz" PX 60000
    OK
    127.0.0.1:6379> GET name
    "Ariz"
"#;
