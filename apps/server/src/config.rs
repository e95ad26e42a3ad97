//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//! The store's business settings (tax rate, currency, receipt texts) are not
//! process configuration; they live in the `store_settings` row.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use kasir_core::report::MAX_PER_PAGE;
use kasir_db::DbConfig;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind (default: 0.0.0.0)
    pub host: IpAddr,

    /// HTTP port (default: 8080)
    pub port: u16,

    /// SQLite database file (default: ./kasir.db)
    pub database_path: PathBuf,

    /// Pool size (default: 5)
    pub db_max_connections: u32,

    /// Apply pending migrations at startup (default: true)
    pub run_migrations: bool,

    /// Listing page size when the client sends none (default: 10)
    pub page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            database_path: PathBuf::from("./kasir.db"),
            db_max_connections: 5,
            run_migrations: true,
            page_size: kasir_core::report::DEFAULT_PER_PAGE,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();

        let config = ServerConfig {
            host: parse_or(&lookup, "KASIR_HOST", defaults.host)?,
            port: parse_or(&lookup, "KASIR_PORT", defaults.port)?,
            database_path: lookup("KASIR_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            db_max_connections: parse_or(&lookup, "KASIR_DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            run_migrations: parse_or(&lookup, "KASIR_RUN_MIGRATIONS", defaults.run_migrations)?,
            page_size: parse_or(&lookup, "KASIR_PAGE_SIZE", defaults.page_size)?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("KASIR_DB_MAX_CONNECTIONS".to_string()));
        }
        if config.page_size == 0 || config.page_size > MAX_PER_PAGE {
            return Err(ConfigError::InvalidValue("KASIR_PAGE_SIZE".to_string()));
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .run_migrations(self.run_migrations)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
