//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use srtp_types::{BlockClass, RtpSettings, WorldKind};
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub economy: EconomyConfig,

    /// Random-teleport behavior and messages.
    #[serde(default)]
    pub rtp: RtpSettings,

    /// Worlds served by the built-in superflat terrain.
    #[serde(default = "default_worlds")]
    pub worlds: Vec<WorldConfig>,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "srtp_core=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Built-in ledger toggle. When disabled no economy is bound, so any
/// configured cost yields the "no economy" outcome.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EconomyConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// One world of the superflat terrain.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    pub name: String,

    #[serde(default)]
    pub kind: WorldKind,

    #[serde(default = "default_min_height")]
    pub min_height: i32,

    #[serde(default = "default_max_height")]
    pub max_height: i32,

    /// Y of the top surface block. At or below `min_height` the world is void.
    #[serde(default = "default_surface_y")]
    pub surface_y: i32,

    /// Class of every block from `min_height` up to `surface_y`.
    #[serde(default = "default_surface")]
    pub surface: BlockClass,

    /// Class of every block above `surface_y`.
    #[serde(default)]
    pub fill: BlockClass,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "srtp.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_min_height() -> i32 {
    -64
}

fn default_max_height() -> i32 {
    320
}

fn default_surface_y() -> i32 {
    64
}

fn default_surface() -> BlockClass {
    BlockClass::Solid
}

fn default_worlds() -> Vec<WorldConfig> {
    vec![WorldConfig {
        name: "world".to_string(),
        kind: WorldKind::Normal,
        min_height: default_min_height(),
        max_height: default_max_height(),
        surface_y: default_surface_y(),
        surface: default_surface(),
        fill: BlockClass::Air,
    }]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            economy: EconomyConfig::default(),
            rtp: RtpSettings::default(),
            worlds: default_worlds(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `SRTP_HOST` overrides `server.host`
/// - `SRTP_PORT` overrides `server.port`
/// - `SRTP_DB_PATH` overrides `database.path`
/// - `SRTP_LOG_LEVEL` overrides `logging.level`
/// - `SRTP_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Ok(host) = std::env::var("SRTP_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("SRTP_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(db_path) = std::env::var("SRTP_DB_PATH") {
        config.database.path = db_path;
    }
    if let Ok(level) = std::env::var("SRTP_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("SRTP_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use srtp_types::RtpFrom;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml");
        let config = load_config(path.to_str()).expect("defaults");

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, "srtp.db");
        assert_eq!(config.worlds.len(), 1);
        assert_eq!(config.worlds[0].name, "world");
        assert!(!config.economy.enabled);
    }

    #[test]
    fn parses_rtp_and_world_tables() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"
            [database]
            path = "rtp.sqlite"
            pool_max_size = 2

            [economy]
            enabled = true

            [rtp]
            cooldown = 45
            rtp-from = "player"
            prefix = "&8[RTP] "

            [[worlds]]
            name = "world_nether"
            kind = "nether"
            min_height = 0
            max_height = 256
            surface_y = 100
            fill = "air"

            [[worlds]]
            name = "ocean"
            surface_y = 62
            fill = "liquid"
            "#
        )
        .expect("write config");

        let config = load_config(file.path().to_str()).expect("should parse");

        assert_eq!(config.database.path, "rtp.sqlite");
        assert_eq!(config.database.pool_max_size, 2);
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert!(config.economy.enabled);
        assert_eq!(config.rtp.cooldown, 45);
        assert_eq!(config.rtp.rtp_from, RtpFrom::Player);
        assert_eq!(config.worlds.len(), 2);
        assert_eq!(config.worlds[0].kind, WorldKind::Nether);
        assert_eq!(config.worlds[0].surface, BlockClass::Solid);
        assert_eq!(config.worlds[1].fill, BlockClass::Liquid);
        assert_eq!(config.worlds[1].min_height, -64);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "[rtp\ncooldown = ").expect("write config");

        let err = load_config(file.path().to_str()).expect_err("must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
