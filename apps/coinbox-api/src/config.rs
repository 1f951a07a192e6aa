//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use coinbox_db::DbConfig;

/// Signing secret used when `COINBOX_JWT_SECRET` is unset. Startup warns.
pub const DEV_JWT_SECRET: &str = "coinbox-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind
    pub bind_addr: IpAddr,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// Token lifetime in seconds
    pub token_lifetime_secs: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: 3000,
            database_path: PathBuf::from("./data/coinbox.db"),
            db_max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_lifetime_secs: 86_400,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            bind_addr: parse_or(&lookup, "COINBOX_BIND_ADDR", defaults.bind_addr)?,
            port: parse_or(&lookup, "COINBOX_PORT", defaults.port)?,
            database_path: lookup("COINBOX_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            db_max_connections: parse_or(
                &lookup,
                "COINBOX_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
            jwt_secret: lookup("COINBOX_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            token_lifetime_secs: parse_or(
                &lookup,
                "COINBOX_TOKEN_LIFETIME_SECS",
                defaults.token_lifetime_secs,
            )?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "COINBOX_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if config.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "COINBOX_TOKEN_LIFETIME_SECS".to_string(),
            ));
        }
        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("COINBOX_JWT_SECRET".to_string()));
        }

        Ok(config)
    }

    /// Address the HTTP listener binds.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Pool settings for the configured database file.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.db_max_connections)
    }

    /// Whether the well-known development secret is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
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

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3000");
        assert_eq!(config.database_path, PathBuf::from("./data/coinbox.db"));
        assert_eq!(config.token_lifetime_secs, 86_400);
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("COINBOX_BIND_ADDR", "127.0.0.1"),
            ("COINBOX_PORT", "8080"),
            ("COINBOX_DATABASE_PATH", "/var/lib/coinbox/db.sqlite"),
            ("COINBOX_DB_MAX_CONNECTIONS", "2"),
            ("COINBOX_JWT_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.db_config().max_connections, 2);
        assert!(!config.uses_dev_secret());
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let err = ApiConfig::from_lookup(lookup(&[("COINBOX_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "COINBOX_PORT"));

        let err = ApiConfig::from_lookup(lookup(&[("COINBOX_TOKEN_LIFETIME_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
