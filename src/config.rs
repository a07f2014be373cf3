//! Server configuration and command-line parsing.

use std::time::Duration;
use thiserror::Error;

/// Default maximum number of clients served at once
pub const DEFAULT_MAX_CLIENTS: usize = 100;

/// Default time between statistics snapshots
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(10);

pub const USAGE: &str = "\
USAGE:
    tuplespace <PORT> [OPTIONS]

OPTIONS:
    -h, --host <HOST>              Host to bind to (default: 0.0.0.0)
    -c, --max-clients <N>          Clients served at once (default: 100)
    -s, --stats-interval <SECS>    Seconds between statistics reports (default: 10)
    -v, --version                  Print version information
        --help                     Print this help message

EXAMPLES:
    tuplespace 51234
    tuplespace 51234 --max-clients 8 --stats-interval 2
";

/// Errors from parsing the command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required argument <PORT>")]
    MissingPort,

    #[error("invalid port number: {0}")]
    InvalidPort(String),

    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidValue { flag: String, value: String },

    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

/// What the server binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Serve(ServerConfig),
    Help,
    Version,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Capacity of the admission semaphore
    pub max_clients: usize,
    pub stats_interval: Duration,
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port,
            max_clients: DEFAULT_MAX_CLIENTS,
            stats_interval: DEFAULT_STATS_INTERVAL,
        }
    }

    /// Parses the arguments that follow the program name.
    pub fn from_args<I>(args: I) -> Result<CliAction, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut port = None;
        let mut host = None;
        let mut max_clients = DEFAULT_MAX_CLIENTS;
        let mut stats_interval = DEFAULT_STATS_INTERVAL;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => host = Some(required_value(&arg, args.next())?),
                "--max-clients" | "-c" => {
                    let value = required_value(&arg, args.next())?;
                    max_clients = match value.parse::<usize>() {
                        Ok(n) if n > 0 => n,
                        _ => return Err(invalid_value(&arg, value)),
                    };
                }
                "--stats-interval" | "-s" => {
                    let value = required_value(&arg, args.next())?;
                    stats_interval = match value.parse::<u64>() {
                        Ok(secs) if secs > 0 => Duration::from_secs(secs),
                        _ => return Err(invalid_value(&arg, value)),
                    };
                }
                "--help" => return Ok(CliAction::Help),
                "--version" | "-v" => return Ok(CliAction::Version),
                other if other.starts_with('-') => {
                    return Err(ConfigError::UnknownArgument(arg));
                }
                _ if port.is_none() => {
                    port = Some(
                        arg.parse::<u16>()
                            .map_err(|_| ConfigError::InvalidPort(arg.clone()))?,
                    );
                }
                _ => return Err(ConfigError::UnknownArgument(arg)),
            }
        }

        let mut config = ServerConfig::new(port.ok_or(ConfigError::MissingPort)?);
        if let Some(host) = host {
            config.host = host;
        }
        config.max_clients = max_clients;
        config.stats_interval = stats_interval;

        Ok(CliAction::Serve(config))
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required_value(flag: &str, value: Option<String>) -> Result<String, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

fn invalid_value(flag: &str, value: String) -> ConfigError {
    ConfigError::InvalidValue {
        flag: flag.to_string(),
        value,
    }
}
