//! Configuration module for the collections CRM backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to the customer search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Capacity given to callers created without an explicit max load
    pub default_max_load: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("CRM_API_PSK").ok().filter(|k| !k.is_empty());

        let db_path = env::var("CRM_DB_PATH")
            .unwrap_or_else(|_| "./data/crm.sqlite".to_string())
            .into();

        let index_path = env::var("CRM_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr = env::var("CRM_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid CRM_BIND_ADDR: {}", e)))?;

        let log_level = env::var("CRM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("CRM_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") | Err(_) => LogFormat::Pretty,
            Ok(other) => {
                return Err(AppError::Config(format!(
                    "Invalid CRM_LOG_FORMAT '{}': expected 'pretty' or 'json'",
                    other
                )))
            }
        };

        let default_max_load = match env::var("CRM_DEFAULT_MAX_LOAD") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "Invalid CRM_DEFAULT_MAX_LOAD '{}': expected a positive integer",
                        raw
                    ))
                })?,
            Err(_) => 20,
        };

        Ok(Self {
            api_psk,
            db_path,
            index_path,
            bind_addr,
            log_level,
            log_format,
            default_max_load,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    // Environment variables are process-wide; config tests must not interleave.
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const VARS: [&str; 7] = [
        "CRM_API_PSK",
        "CRM_DB_PATH",
        "CRM_INDEX_PATH",
        "CRM_BIND_ADDR",
        "CRM_LOG_LEVEL",
        "CRM_LOG_FORMAT",
        "CRM_DEFAULT_MAX_LOAD",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/crm.sqlite"));
        assert_eq!(config.index_path, PathBuf::from("./data/index"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.default_max_load, 20);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        env::set_var("CRM_DEFAULT_MAX_LOAD", "0");
        assert!(matches!(Config::from_env(), Err(AppError::Config(_))));
        env::remove_var("CRM_DEFAULT_MAX_LOAD");

        env::set_var("CRM_BIND_ADDR", "not-an-address");
        assert!(matches!(Config::from_env(), Err(AppError::Config(_))));
        env::remove_var("CRM_BIND_ADDR");

        env::set_var("CRM_LOG_FORMAT", "xml");
        assert!(matches!(Config::from_env(), Err(AppError::Config(_))));
        clear_env();
    }

    #[test]
    fn test_json_log_format_and_custom_load() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        env::set_var("CRM_LOG_FORMAT", "json");
        env::set_var("CRM_DEFAULT_MAX_LOAD", "35");
        let config = Config::from_env().unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.default_max_load, 35);
        clear_env();
    }
}
