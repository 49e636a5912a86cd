// Configuration management

use crate::auth::gateway_key::GatewayKey;
use crate::core::codes::{MAX_CODE_TTL_SECS, MIN_CODE_TTL_SECS};
use crate::core::errors::InboxError;
use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration loaded from environment variables
///
/// Supports both database-backed and in-memory operation modes.
/// All configuration is validated on load with clear error messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub bind_address: String,
    pub port: u16,

    // Database configuration (optional; in-memory store when absent)
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Verification codes
    pub verify_code_length: usize,
    pub verify_code_ttl_secs: u64,

    // Inbox limits
    pub message_max_chars: usize,

    // SHA-256 hex of the shared key the auth gateway must present
    pub gateway_key_hash: Option<String>,

    // Middleware configuration
    pub request_timeout_secs: u64,
    pub body_size_limit_bytes: usize,

    // Logging configuration
    pub log_level: String,
    pub log_format: String, // "json" or "text"
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Supports `.env` file loading in development (via dotenv crate).
    pub fn from_env() -> Result<Self, InboxError> {
        #[cfg(not(test))]
        {
            dotenv::dotenv().ok();
        }

        let config = Self {
            bind_address: Self::get_env_or_default("BIND_ADDRESS", "0.0.0.0")?,
            port: Self::parse_port()?,
            database_url: Self::get_optional_env("DATABASE_URL")?,
            database_max_connections: Self::parse_or_default("DATABASE_MAX_CONNECTIONS", 10u32)?,
            verify_code_length: Self::parse_or_default("VERIFY_CODE_LENGTH", 6usize)?,
            verify_code_ttl_secs: Self::parse_or_default("VERIFY_CODE_TTL_SECS", 3600u64)?,
            message_max_chars: Self::parse_or_default("MESSAGE_MAX_CHARS", 1000usize)?,
            gateway_key_hash: Self::get_optional_env("GATEWAY_KEY")?.map(|key| Self::hash_key(&key)),
            request_timeout_secs: Self::parse_or_default("REQUEST_TIMEOUT_SECS", 30u64)?,
            body_size_limit_bytes: Self::parse_or_default("BODY_SIZE_LIMIT_BYTES", 64 * 1024usize)?,
            log_level: Self::get_env_or_default("LOG_LEVEL", "info")?,
            log_format: Self::get_env_or_default("LOG_FORMAT", "json")?,
        };

        config.validate()?;

        Ok(config)
    }

    /// SHA-256 hex digest used to compare gateway keys without keeping the key
    pub fn hash_key(key: &str) -> String {
        GatewayKey::new(key).hash()
    }

    /// Get environment variable or return default value
    fn get_env_or_default(key: &str, default: &str) -> Result<String, InboxError> {
        Ok(env::var(key).unwrap_or_else(|_| default.to_string()))
    }

    /// Get optional environment variable
    fn get_optional_env(key: &str) -> Result<Option<String>, InboxError> {
        match env::var(key) {
            Ok(value) if !value.is_empty() => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    /// Parse port from PORT environment variable
    fn parse_port() -> Result<u16, InboxError> {
        let port_str = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
        let port = port_str.parse::<u16>().map_err(|e| {
            InboxError::ConfigurationError(format!("Invalid PORT value '{}': {}", port_str, e))
        })?;

        if port == 0 {
            return Err(InboxError::ConfigurationError(
                "PORT must be between 1 and 65535".to_string(),
            ));
        }

        Ok(port)
    }

    /// Parse a positive number from environment variable or return default
    fn parse_or_default<T>(key: &str, default: T) -> Result<T, InboxError>
    where
        T: std::str::FromStr + PartialEq + Default,
        T::Err: std::fmt::Display,
    {
        match env::var(key) {
            Ok(value) => {
                let parsed = value.parse::<T>().map_err(|e| {
                    InboxError::ConfigurationError(format!("Invalid {} value '{}': {}", key, value, e))
                })?;

                if parsed == T::default() {
                    return Err(InboxError::ConfigurationError(format!(
                        "{} must be greater than 0",
                        key
                    )));
                }

                Ok(parsed)
            }
            _ => Ok(default),
        }
    }

    /// Validate all configuration values
    fn validate(&self) -> Result<(), InboxError> {
        if let Some(ref url) = self.database_url {
            Self::validate_url(url, "Database URL")?;
        }

        if !(4..=12).contains(&self.verify_code_length) {
            return Err(InboxError::ConfigurationError(format!(
                "Invalid VERIFY_CODE_LENGTH '{}': must be between 4 and 12",
                self.verify_code_length
            )));
        }

        if !(MIN_CODE_TTL_SECS..=MAX_CODE_TTL_SECS).contains(&self.verify_code_ttl_secs) {
            return Err(InboxError::ConfigurationError(format!(
                "Invalid VERIFY_CODE_TTL_SECS '{}': must be between {} and {}",
                self.verify_code_ttl_secs, MIN_CODE_TTL_SECS, MAX_CODE_TTL_SECS
            )));
        }

        Self::validate_log_level(&self.log_level)?;
        Self::validate_log_format(&self.log_format)?;

        Ok(())
    }

    /// Validate URL format
    fn validate_url(url: &str, description: &str) -> Result<(), InboxError> {
        url::Url::parse(url).map_err(|e| {
            InboxError::ConfigurationError(format!("Invalid {} '{}': {}", description, url, e))
        })?;
        Ok(())
    }

    /// Validate log level
    fn validate_log_level(level: &str) -> Result<(), InboxError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&level.to_lowercase().as_str()) {
            return Err(InboxError::ConfigurationError(format!(
                "Invalid LOG_LEVEL '{}': must be one of {}",
                level,
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }

    /// Validate log format
    fn validate_log_format(format: &str) -> Result<(), InboxError> {
        if format != "json" && format != "text" {
            return Err(InboxError::ConfigurationError(format!(
                "Invalid LOG_FORMAT '{}': must be 'json' or 'text'",
                format
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Create a test configuration for unit tests
    ///
    /// This bypasses environment variable loading for use in tests that
    /// don't need real configuration.
    pub fn test_config() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8000,
            database_url: None,
            database_max_connections: 5,
            verify_code_length: 6,
            verify_code_ttl_secs: 3600,
            message_max_chars: 1000,
            gateway_key_hash: None,
            request_timeout_secs: 30,
            body_size_limit_bytes: 64 * 1024,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}
