//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use taquilla_db::DbConfig;
use taquilla_engine::config::DEFAULT_ADMISSION_WINDOW;
use taquilla_engine::EngineConfig;
use taquilla_core::{
    DEFAULT_MAX_TICKETS_PER_CLIENT, DEFAULT_STALE_TURN_SECS, DEFAULT_SWEEP_INTERVAL_SECS,
};

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Connection pool size
    pub db_max_connections: u32,

    /// How long a write waits behind another writer
    pub db_busy_timeout_ms: u64,

    /// Heartbeat age after which a turn is evicted
    pub stale_turn_secs: u64,

    /// Cadence of the stale-turn sweep
    pub sweep_interval_secs: u64,

    /// Per-event ticket limit per client
    pub max_tickets_per_client: i64,

    /// Head-of-queue positions allowed to place orders
    pub admission_window: i64,

    /// Require a queue turn within the window to place orders
    pub require_admission: bool,

    /// Run the sweeper on this instance
    pub run_sweeper: bool,
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
        let config = ApiConfig {
            http_port: parse(&lookup, "HTTP_PORT", 8080)?,
            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("taquilla.db")),
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            db_busy_timeout_ms: parse(&lookup, "DB_BUSY_TIMEOUT_MS", 5_000)?,
            stale_turn_secs: parse(&lookup, "STALE_TURN_SECS", DEFAULT_STALE_TURN_SECS)?,
            sweep_interval_secs: parse(&lookup, "SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?,
            max_tickets_per_client: parse(
                &lookup,
                "MAX_TICKETS_PER_CLIENT",
                DEFAULT_MAX_TICKETS_PER_CLIENT,
            )?,
            admission_window: parse(&lookup, "ADMISSION_WINDOW", DEFAULT_ADMISSION_WINDOW)?,
            require_admission: parse(&lookup, "REQUIRE_ADMISSION", true)?,
            run_sweeper: parse(&lookup, "RUN_SWEEPER", true)?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue("SWEEP_INTERVAL_SECS".to_string()));
        }
        if config.max_tickets_per_client < 1 {
            return Err(ConfigError::InvalidValue("MAX_TICKETS_PER_CLIENT".to_string()));
        }
        if config.admission_window < 1 {
            return Err(ConfigError::InvalidValue("ADMISSION_WINDOW".to_string()));
        }

        Ok(config)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.db_max_connections)
            .busy_timeout(Duration::from_millis(self.db_busy_timeout_ms))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .stale_turn_secs(self.stale_turn_secs)
            .sweep_interval_secs(self.sweep_interval_secs)
            .max_tickets_per_client(self.max_tickets_per_client)
            .admission_window(self.admission_window)
            .run_sweeper(self.run_sweeper)
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.database_path, PathBuf::from("taquilla.db"));
        assert_eq!(config.stale_turn_secs, 60);
        assert_eq!(config.max_tickets_per_client, 4);
        assert_eq!(config.admission_window, 1);
        assert!(config.require_admission);
        assert!(config.run_sweeper);
    }

    #[test]
    fn test_overrides_flow_into_engine_config() {
        let config = load(&[
            ("HTTP_PORT", "9000"),
            ("STALE_TURN_SECS", "30"),
            ("ADMISSION_WINDOW", "25"),
            ("RUN_SWEEPER", "false"),
        ])
        .unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.db_config().busy_timeout, Duration::from_secs(5));

        let engine = config.engine_config();
        assert_eq!(engine.stale_turn_secs, 30);
        assert_eq!(engine.admission_window, 25);
        assert!(!engine.run_sweeper);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("HTTP_PORT", "eighty")]),
            Err(ConfigError::InvalidValue(key)) if key == "HTTP_PORT"
        ));
        assert!(load(&[("ADMISSION_WINDOW", "0")]).is_err());
        assert!(load(&[("REQUIRE_ADMISSION", "maybe")]).is_err());
    }
}
