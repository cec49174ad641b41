//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use dealer_core::{NumberingPolicy, DEFAULT_FY_START_MONTH, DEFAULT_SEQUENCE_PADDING};
use dealer_db::DbConfig;

/// Deployment environment. Decides whether error bodies carry internal detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(()),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub db_path: PathBuf,

    /// Connection pool size
    pub db_max_connections: u32,

    /// development / production
    pub environment: Environment,

    /// Month (1-12) on which the financial year starts
    pub fy_start_month: u32,

    /// Zero-padding width of document sequences
    pub number_padding: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_port: 8080,
            db_path: PathBuf::from("./data/dealer.db"),
            db_max_connections: 5,
            environment: Environment::Development,
            fy_start_month: DEFAULT_FY_START_MONTH,
            number_padding: DEFAULT_SEQUENCE_PADDING,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            http_port: parse_or(&lookup, "DEALER_HTTP_PORT", defaults.http_port)?,

            db_path: lookup("DEALER_DB_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),

            db_max_connections: parse_or(
                &lookup,
                "DEALER_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,

            environment: parse_or(&lookup, "DEALER_ENV", defaults.environment)?,

            fy_start_month: parse_or(&lookup, "DEALER_FY_START_MONTH", defaults.fy_start_month)?,

            number_padding: parse_or(&lookup, "DEALER_NUMBER_PADDING", defaults.number_padding)?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DEALER_DB_MAX_CONNECTIONS".to_string()));
        }

        // Surfaces month/padding range errors at startup
        config.numbering_policy()?;

        Ok(config)
    }

    /// Numbering rules handed to the coordinator.
    pub fn numbering_policy(&self) -> Result<NumberingPolicy, ConfigError> {
        NumberingPolicy::new(self.fy_start_month, self.number_padding)
            .map_err(|e| ConfigError::OutOfRange(e.to_string()))
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.db_path).max_connections(self.db_max_connections)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        _ => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Numbering setting out of range: {0}")]
    OutOfRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.db_path, PathBuf::from("./data/dealer.db"));
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.numbering_policy().unwrap(), NumberingPolicy::default());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DEALER_HTTP_PORT", "9000"),
            ("DEALER_ENV", "Production"),
            ("DEALER_FY_START_MONTH", "1"),
            ("DEALER_NUMBER_PADDING", "5"),
        ])
        .unwrap();

        assert_eq!(config.http_port, 9000);
        assert!(!config.environment.is_development());
        assert_eq!(config.fy_start_month, 1);
        assert_eq!(config.number_padding, 5);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("DEALER_HTTP_PORT", "http")]),
            Err(ConfigError::InvalidValue(key)) if key == "DEALER_HTTP_PORT"
        ));
        assert!(matches!(
            load(&[("DEALER_ENV", "staging")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            load(&[("DEALER_FY_START_MONTH", "13")]),
            Err(ConfigError::OutOfRange(_))
        ));
        assert!(matches!(
            load(&[("DEALER_DB_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
