//! Configuration loading for the payroll server.
//!
//! The canonical configuration lives in `payroll-config.yaml` next to
//! the binary; every field has a default so the file is optional. The
//! enumerated environment variables (`PORT`, `DATA_DIR`,
//! `STORAGE_MODE`, `DATABASE_URL`, `EXPORT_URL`, `EXPORT_AUTH_TOKEN`,
//! `EXPORT_CRON`, `EXPORT_RUN_ON_STARTUP`) override file values. The
//! result is resolved exactly once at startup and passed by value into
//! the rest of the system; the environment is never re-read after boot.

use std::path::{Path, PathBuf};
use std::time::Duration;

use payroll_store::{PostgresConfig, StorageMode};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    /// HTTP listener and static asset settings.
    #[serde(default)]
    pub server: HttpConfig,

    /// Storage mode and backend connection settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Scheduled export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration, treating a missing file as an empty one.
    ///
    /// Environment overrides are applied either way.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if an existing file cannot be read,
    /// or [`ConfigError::Yaml`] if its content is not valid YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string, without environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Override file values with the enumerated environment variables
    /// when set. Unparseable values are ignored, keeping the existing
    /// setting.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("DATA_DIR") {
            self.storage.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("STORAGE_MODE")
            && let Ok(mode) = val.parse()
        {
            self.storage.mode = mode;
        }
        if let Ok(val) = std::env::var("DATABASE_URL") {
            self.storage.database_url = Some(val);
        }
        if let Ok(val) = std::env::var("EXPORT_URL") {
            self.export.url = Some(val);
        }
        if let Ok(val) = std::env::var("EXPORT_AUTH_TOKEN") {
            self.export.auth_token = Some(val);
        }
        if let Ok(val) = std::env::var("EXPORT_CRON") {
            self.export.schedule = val;
        }
        if let Ok(val) = std::env::var("EXPORT_RUN_ON_STARTUP") {
            self.export.run_on_startup = val.eq_ignore_ascii_case("true");
        }
    }
}

/// HTTP listener and static asset configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the static client assets.
    #[serde(default = "default_static_root")]
    pub static_root: PathBuf,

    /// Document served at `GET /`, relative to `static_root`.
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_root: default_static_root(),
            index_file: default_index_file(),
        }
    }
}

/// Storage mode and backend connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Storage mode: `auto`, `postgres`, or `file`.
    #[serde(default)]
    pub mode: StorageMode,

    /// Directory for the file backend's state document.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// `PostgreSQL` connection URL. Absent means the relational backend
    /// is not configured.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Maximum connections in the `PostgreSQL` pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// `PostgreSQL` connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl StorageConfig {
    /// Build the `PostgreSQL` pool configuration, when a URL is set.
    pub fn postgres_config(&self) -> Option<PostgresConfig> {
        self.database_url.as_deref().map(|url| {
            PostgresConfig::new(url)
                .with_max_connections(self.max_connections)
                .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
        })
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::default(),
            data_dir: default_data_dir(),
            database_url: None,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Scheduled export configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportConfig {
    /// Destination URL for exported snapshots. Absent disables exports.
    #[serde(default)]
    pub url: Option<String>,

    /// Bearer token sent with each export request.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Cron expression (with seconds field) for scheduled exports.
    #[serde(default = "default_export_schedule")]
    pub schedule: String,

    /// Whether to run one export immediately at startup.
    #[serde(default)]
    pub run_on_startup: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            url: None,
            auth_token: None,
            schedule: default_export_schedule(),
            run_on_startup: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG`
    /// is unset.
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

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    3000
}

fn default_static_root() -> PathBuf {
    PathBuf::from("public")
}

fn default_index_file() -> String {
    "index.html".to_owned()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_export_schedule() -> String {
    // Hourly, at the top of the hour.
    "0 0 * * * *".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.mode, StorageMode::Auto);
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
        assert!(config.storage.database_url.is_none());
        assert!(config.export.url.is_none());
        assert!(!config.export.run_on_startup);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8088
  static_root: "assets"
  index_file: "payroll.html"

storage:
  mode: postgres
  data_dir: "/var/lib/payroll"
  database_url: "postgresql://payroll:payroll@db:5432/payroll"
  max_connections: 10
  connect_timeout_secs: 3

export:
  url: "https://backup.example.com/append"
  auth_token: "secret"
  schedule: "0 */15 * * * *"
  run_on_startup: true

logging:
  level: "debug"
"#;

        let config = AppConfig::parse(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.index_file, "payroll.html");
        assert_eq!(config.storage.mode, StorageMode::Postgres);
        assert_eq!(
            config.storage.database_url.as_deref(),
            Some("postgresql://payroll:payroll@db:5432/payroll")
        );
        assert_eq!(config.export.schedule, "0 */15 * * * *");
        assert!(config.export.run_on_startup);
        assert_eq!(config.logging.level, "debug");

        let postgres = config.storage.postgres_config().unwrap();
        assert_eq!(postgres.max_connections, 10);
        assert_eq!(postgres.connect_timeout, Duration::from_secs(3));
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = AppConfig::parse("storage:\n  mode: file\n").unwrap();
        // Mode is overridden, everything else uses defaults.
        assert_eq!(config.storage.mode, StorageMode::File);
        assert_eq!(config.server.port, 3000);
        assert!(config.storage.postgres_config().is_none());
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(AppConfig::parse("").is_ok());
    }
}
