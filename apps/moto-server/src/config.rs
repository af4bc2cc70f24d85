//! Server configuration module.
//!
//! Layered with the `config` crate, later layers overriding earlier ones:
//!
//! ```text
//! built-in defaults ──► moto.toml (or $MOTO_CONFIG) ──► MOTO_* environment
//! ```
//!
//! Environment examples: `MOTO_PORT=9000`, `MOTO_DATABASE_PATH=/var/lib/moto.db`,
//! `MOTO_JWT_SECRET=...`, `MOTO_CORS_ORIGINS=http://localhost:5173,https://app.example`.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

/// Default location of the optional config file.
pub const DEFAULT_CONFIG_FILE: &str = "moto.toml";

const DEV_JWT_SECRET: &str = "moto-dealer-dev-secret-change-in-production";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Use an in-memory database (tests, demos)
    pub in_memory_database: bool,

    /// Pool size
    pub max_connections: u32,

    /// HMAC secret for access tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Allowed browser origins; empty allows any
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: "moto.db".to_string(),
            in_memory_database: false,
            max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: 8 * 3600, // one shift
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Loads defaults, then the config file named by `MOTO_CONFIG` (or
    /// `moto.toml` when present), then `MOTO_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let file = env::var("MOTO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_sources(Some(&file), true)
    }

    /// Builds the configuration from an optional file and, optionally, the
    /// environment.
    pub fn from_sources(file: Option<&str>, with_env: bool) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let mut builder = Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port as i64)?
            .set_default("database_path", defaults.database_path)?
            .set_default("in_memory_database", defaults.in_memory_database)?
            .set_default("max_connections", defaults.max_connections as i64)?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_lifetime_secs", defaults.jwt_lifetime_secs)?
            .set_default("cors_origins", Vec::<String>::new())?;

        if let Some(path) = file {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        if with_env {
            builder = builder.add_source(
                Environment::with_prefix("MOTO")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_origins"),
            );
        }

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue("jwt_secret".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_secs".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if !self.in_memory_database && self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        Ok(())
    }

    /// Whether the well-known development secret is still in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::from_sources(None, false).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.uses_dev_secret());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = env::temp_dir().join(format!("moto-config-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "port = 9100").unwrap();
        writeln!(file, "jwt_secret = \"from-file\"").unwrap();
        writeln!(file, "cors_origins = [\"http://localhost:5173\"]").unwrap();
        drop(file);

        let config = ServerConfig::from_sources(path.to_str(), false).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.jwt_secret, "from-file");
        assert_eq!(config.cors_origins, vec!["http://localhost:5173".to_string()]);
        assert_eq!(config.database_path, "moto.db");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let config = ServerConfig::from_sources(Some("/nonexistent/moto.toml"), false).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_validation() {
        let empty_secret = ServerConfig {
            jwt_secret: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(empty_secret.validate(), Err(ConfigError::InvalidValue(_))));

        let zero_lifetime = ServerConfig {
            jwt_lifetime_secs: 0,
            ..Default::default()
        };
        assert!(zero_lifetime.validate().is_err());
    }
}
