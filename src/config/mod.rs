//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `NEO_ANALYTICS` prefix and nested values use double underscores as separators.
//! Every value has a default, so an empty environment yields a runnable setup.
//!
//! # Example
//!
//! ```no_run
//! use neo_analytics::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Listening on port {}", config.server.port);
//! ```

mod broker;
mod dashboard;
mod error;
mod server;

pub use broker::{BrokerConfig, BrokerMode};
pub use dashboard::DashboardConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Broker configuration (mode, Redis URL, topic, timings)
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Dashboard push-channel configuration
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `NEO_ANALYTICS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `NEO_ANALYTICS__SERVER__PORT=3001` -> `server.port = 3001`
    /// - `NEO_ANALYTICS__BROKER__MODE=memory` -> `broker.mode = memory`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("NEO_ANALYTICS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.broker.validate()?;
        self.dashboard.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "NEO_ANALYTICS__SERVER__PORT",
        "NEO_ANALYTICS__SERVER__ENVIRONMENT",
        "NEO_ANALYTICS__BROKER__MODE",
        "NEO_ANALYTICS__BROKER__TOPIC",
        "NEO_ANALYTICS__BROKER__URL",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_with_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.broker.topic, "user_events");
        assert_eq!(config.broker.mode, BrokerMode::Redis);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_broker_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("NEO_ANALYTICS__BROKER__MODE", "memory");
        env::set_var("NEO_ANALYTICS__BROKER__TOPIC", "frontend-events");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.broker.mode, BrokerMode::Memory);
        assert_eq!(config.broker.topic, "frontend-events");
    }

    #[test]
    fn test_custom_server_port() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("NEO_ANALYTICS__SERVER__PORT", "3000");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("NEO_ANALYTICS__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_broker_url_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("NEO_ANALYTICS__BROKER__URL", "http://localhost:6379");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidRedisUrl)
        ));
    }
}
