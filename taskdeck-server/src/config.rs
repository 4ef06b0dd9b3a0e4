//! Task service settings.
//!
//! Two settings, each taken from the first source that has it: command line
//! (or its environment variable), then the `[server]` table of
//! `~/.config/taskdeck-server/config.toml`, then the built-in default.
//! Values are checked here so the service never starts half-configured.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Listen address when nothing else is configured.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Request body limit when nothing else is configured (64 KB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Why the service settings could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The bind address is not an `ip:port` pair.
    #[error("invalid bind address {value:?}: {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },

    /// A zero body limit would reject every create and update.
    #[error("max_body_size must be greater than zero")]
    ZeroBodySize,
}

/// Command line of `taskdeck-server`.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "TaskDeck reference task service")]
pub struct ServiceCliArgs {
    /// Address to listen on, as `ip:port` (hostnames are not resolved).
    #[arg(short, long, env = "TASKDECK_BIND")]
    pub bind: Option<String>,

    /// Config file (default: `~/.config/taskdeck-server/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Largest accepted request body, in bytes.
    #[arg(long)]
    pub max_body_size: Option<usize>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDECK_SERVER_LOG")]
    pub log_level: String,
}

/// The `[server]` table; the only table the file may contain.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ServerTable {
    bind_addr: Option<String>,
    max_body_size: Option<usize>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServiceFile {
    server: ServerTable,
}

/// Validated service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub max_body_size: usize,
    pub log_level: String,
}

impl ServiceConfig {
    /// Reads the config file (if any) and resolves against `cli`.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for an unreadable or malformed file (a missing
    /// default file is fine), an unparsable bind address or a zero body
    /// limit.
    pub fn load(cli: &ServiceCliArgs) -> Result<Self, ConfigError> {
        let table = match cli.config.as_deref() {
            Some(path) => read_table(path)?,
            None => match dirs::config_dir() {
                Some(dir) => {
                    let path = dir.join("taskdeck-server").join("config.toml");
                    if path.exists() { read_table(&path)? } else { ServerTable::default() }
                }
                None => ServerTable::default(),
            },
        };
        Self::resolve(cli, table)
    }

    fn resolve(cli: &ServiceCliArgs, table: ServerTable) -> Result<Self, ConfigError> {
        let bind = cli
            .bind
            .clone()
            .or(table.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr { value: bind.clone(), source })?;

        let max_body_size = cli
            .max_body_size
            .or(table.max_body_size)
            .unwrap_or(DEFAULT_MAX_BODY_SIZE);
        if max_body_size == 0 {
            return Err(ConfigError::ZeroBodySize);
        }

        Ok(Self {
            bind_addr,
            max_body_size,
            log_level: cli.log_level.clone(),
        })
    }
}

fn read_table(path: &Path) -> Result<ServerTable, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str::<ServiceFile>(&text)?.server)
}
