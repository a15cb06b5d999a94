//! Configuration module for the framed-echo server.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line arguments for the echo server
#[derive(Parser, Debug)]
#[command(name = "framed-echo")]
#[command(version = "0.1.0")]
#[command(about = "A blocking echo server with length-framed messaging", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// IPv4 address to bind to (e.g., 127.0.0.1)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Use SO_REUSEPORT instead of SO_REUSEADDR on the listener
    #[arg(long)]
    pub reuse_port: bool,

    /// Maximum connections accepted per acceptor pass
    #[arg(short = 'b', long)]
    pub accept_batch: Option<usize>,

    /// Send/receive timeout per connection in seconds (0 = unbounded)
    #[arg(short = 't', long)]
    pub timeout_secs: Option<u64>,

    /// Samples kept per metric key in the percentile window
    #[arg(short = 'w', long)]
    pub stat_window: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// IPv4 address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Use SO_REUSEPORT instead of SO_REUSEADDR
    #[serde(default)]
    pub reuse_port: bool,
    /// Maximum connections accepted per acceptor pass
    #[serde(default = "default_accept_batch")]
    pub accept_batch: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            reuse_port: false,
            accept_batch: default_accept_batch(),
        }
    }
}

/// Per-connection transport configuration
#[derive(Debug, Deserialize)]
pub struct TransportConfig {
    /// Send/receive timeout, whole seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Send/receive timeout, additional microseconds
    #[serde(default)]
    pub timeout_usecs: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            timeout_usecs: 0,
        }
    }
}

/// Admission statistics configuration
#[derive(Debug, Deserialize)]
pub struct StatsConfig {
    /// Samples kept per metric key
    #[serde(default = "default_stat_window")]
    pub window_len: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            window_len: default_stat_window(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7000
}

fn default_accept_batch() -> usize {
    128
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_stat_window() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub reuse_port: bool,
    pub accept_batch: usize,
    pub timeout_secs: u64,
    pub timeout_usecs: u32,
    pub stat_window: usize,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();
        Self::resolve(cli)
    }

    fn resolve(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Ok(Config {
            host: cli.host.unwrap_or(toml_config.server.host),
            port: cli.port.unwrap_or(toml_config.server.port),
            reuse_port: cli.reuse_port || toml_config.server.reuse_port,
            accept_batch: cli.accept_batch.unwrap_or(toml_config.server.accept_batch),
            timeout_secs: cli.timeout_secs.unwrap_or(toml_config.transport.timeout_secs),
            timeout_usecs: toml_config.transport.timeout_usecs,
            stat_window: cli.stat_window.unwrap_or(toml_config.stats.window_len),
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        })
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
