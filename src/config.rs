//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

/// Path that selects a private in-memory SQLite database.
pub const IN_MEMORY: &str = ":memory:";

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file, or `:memory:`
    pub database_path: String,
    /// Create the `kvstore` table on startup if it is missing
    pub create_schema: bool,
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds, 0 disables it
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_PATH` - SQLite file path (default: `:memory:`)
    /// - `CREATE_SCHEMA` - Create the table if missing (default: true)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expired-entry sweep frequency in seconds (default: 60, 0 = off)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_path: env::var("DATABASE_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.database_path),
            create_schema: env::var("CREATE_SCHEMA")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.create_schema),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            sweep_interval: env::var("SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path == IN_MEMORY
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: IN_MEMORY.to_string(),
            create_schema: true,
            server_port: 3000,
            sweep_interval: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.database_path, ":memory:");
        assert!(config.create_schema);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.sweep_interval, 60);
        assert!(config.is_in_memory());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("DATABASE_PATH");
        env::remove_var("CREATE_SCHEMA");
        env::remove_var("SERVER_PORT");
        env::remove_var("SWEEP_INTERVAL");

        let config = Config::from_env();
        assert_eq!(config.database_path, ":memory:");
        assert!(config.create_schema);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.sweep_interval, 60);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
