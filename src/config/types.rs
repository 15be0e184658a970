//! Core configuration types and loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use super::defaults::*;
use crate::web::AuthenticationType;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server identity and HTTP listener.
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// In-memory cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Usage metrics and daily summaries.
    #[serde(default)]
    pub usage: UsageConfig,
    /// Start page gadgets.
    #[serde(default)]
    pub gadgets: GadgetsConfig,
    /// Web client header.
    #[serde(default)]
    pub header: HeaderConfig,
    /// Accounts ensured at startup.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name shown in logs (e.g., "streams.example.org").
    pub name: String,
    /// HTTP listen address (default: 0.0.0.0:8080).
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Seconds an entry stays valid (default: 300).
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    /// Seconds between expired-entry sweeps (default: 60).
    #[serde(default = "default_cache_prune_interval")]
    pub prune_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            prune_interval_secs: default_cache_prune_interval(),
        }
    }
}

/// Usage summary configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageConfig {
    /// Seconds between daily summary checks (default: 3600).
    #[serde(default = "default_summary_interval")]
    pub summary_interval_secs: u64,
    /// Days of raw usage metrics kept (default: 7).
    #[serde(default = "default_metric_retention_days")]
    pub metric_retention_days: i64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            summary_interval_secs: default_summary_interval(),
            metric_retention_days: default_metric_retention_days(),
        }
    }
}

/// Gadget configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GadgetsConfig {
    /// Days a deleted gadget can still be undeleted (default: 7).
    #[serde(default = "default_undelete_window_days")]
    pub undelete_window_days: i64,
    /// Seconds between purges of expired deleted gadgets (default: 3600).
    #[serde(default = "default_gadget_purge_interval")]
    pub purge_interval_secs: u64,
}

impl Default for GadgetsConfig {
    fn default() -> Self {
        Self {
            undelete_window_days: default_undelete_window_days(),
            purge_interval_secs: default_gadget_purge_interval(),
        }
    }
}

/// Header configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeaderConfig {
    /// FORM shows a logout link; PRE_AUTHENTICATED does not.
    #[serde(default)]
    pub authentication_type: AuthenticationType,
    /// HTML for the site-labeling container; `%SITELABEL%` is replaced.
    pub site_label_template: Option<String>,
    pub site_label: Option<String>,
}

/// Startup bootstrap configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfig {
    /// Account ids created or promoted to administrator at startup.
    #[serde(default)]
    pub administrators: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: Config = toml::from_str("[server]\nname = \"streams\"\n").unwrap();

        assert_eq!(config.server.listen, default_listen());
        assert_eq!(config.database.path, "eureka.db");
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.usage.summary_interval_secs, 3600);
        assert_eq!(config.usage.metric_retention_days, 7);
        assert_eq!(config.gadgets.undelete_window_days, 7);
        assert_eq!(config.header.authentication_type, AuthenticationType::Form);
        assert!(config.bootstrap.administrators.is_empty());
    }

    #[test]
    fn server_section_is_required() {
        assert!(toml::from_str::<Config>("[database]\npath = \"x.db\"\n").is_err());
    }

    #[test]
    fn load_full_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
name = "streams.example.org"
listen = "127.0.0.1:9000"

[database]
path = ":memory:"

[usage]
metric_retention_days = 30

[header]
authentication_type = "PRE_AUTHENTICATED"
site_label_template = "<span>%SITELABEL%</span>"
site_label = "INTERNAL"

[bootstrap]
administrators = ["root"]
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.listen.port(), 9000);
        assert_eq!(config.database.path, ":memory:");
        assert_eq!(config.usage.metric_retention_days, 30);
        assert_eq!(
            config.header.authentication_type,
            AuthenticationType::PreAuthenticated
        );
        assert_eq!(config.header.site_label.as_deref(), Some("INTERNAL"));
        assert_eq!(config.bootstrap.administrators, vec!["root"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::load("/nonexistent/eureka.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[server\nname = ").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
