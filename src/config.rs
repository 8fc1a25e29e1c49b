use config::{Config, Environment, File};
pub use config::ConfigError;
use serde::Deserialize;

use crate::monitor::health::DEFAULT_FRESHNESS_MINUTES;
use crate::monitor::{Period, WindowAnchor};

/// Main configuration struct
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Where the monitoring and positions tables come from
    pub feed: FeedConfig,
    /// Pipeline defaults
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    /// CSV files on disk
    Local,
    /// CSV exports fetched over HTTP
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// "local" or "remote"
    pub source: FeedSource,
    /// Path or URL of the monitoring time series
    pub monitoring: String,
    /// Path or URL of the positions snapshot
    pub positions: String,
    /// CSV field delimiter (default ",")
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ','
}

impl FeedConfig {
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b',')
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Period used when a request does not name one
    #[serde(default)]
    pub default_period: Period,
    /// "latest" (window ends at the newest row) or "now" (window ends at the wall clock)
    #[serde(default)]
    pub window_anchor: WindowAnchor,
    /// Snapshots older than this are flagged as stale
    #[serde(default = "default_freshness_minutes")]
    pub freshness_minutes: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            default_period: Period::default(),
            window_anchor: WindowAnchor::default(),
            freshness_minutes: default_freshness_minutes(),
        }
    }
}

fn default_freshness_minutes() -> i64 {
    DEFAULT_FRESHNESS_MINUTES
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Enable the status API server
    #[serde(default = "default_server_enabled")]
    pub enabled: bool,
    /// Server port (default 3000)
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Server host (default 127.0.0.1)
    #[serde(default = "default_server_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_server_enabled(),
            port: default_server_port(),
            host: default_server_host(),
        }
    }
}

fn default_server_enabled() -> bool {
    false
}

fn default_server_port() -> u16 {
    3000
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

impl Settings {
    /// Load settings from a configuration file
    pub fn new(config_path: &str) -> Result<Self, ConfigError> {
        Self::with_env(config_path, env_overrides())
    }

    fn with_env(config_path: &str, env: Environment) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(config_path))
            .add_source(env)
            .build()?;

        s.try_deserialize()
    }
}

/// Environment variables override the file, e.g. APP__FEED__SOURCE=remote
fn env_overrides() -> Environment {
    Environment::with_prefix("APP").separator("__")
}
