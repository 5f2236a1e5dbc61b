//! Configuration management for Newsdesk
//!
//! Environment-based configuration with defaults, file loading, and
//! validation. The session-token signing secret lives here and is injected
//! into the authenticator at construction; nothing in the crate reads it
//! from ambient global state.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Store configuration
    pub store: StoreConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Data directory for the SQLite database
    pub data_dir: PathBuf,

    /// Database file name within the data directory
    pub db_file: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Hex-encoded 32-byte signing secret for session tokens
    pub token_secret: String,

    /// Session token lifetime
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,

    /// Workspace invite lifetime
    #[serde(with = "humantime_serde")]
    pub invite_ttl: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            db_file: "newsdesk.db".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // Placeholder secret; deployments must override via file or env
            token_secret: hex::encode([0u8; 32]),
            token_ttl: Duration::from_secs(7 * 24 * 3600),
            invite_ttl: Duration::from_secs(7 * 24 * 3600),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl AuthConfig {
    /// Decode the signing secret into key bytes
    pub fn secret_bytes(&self) -> Result<[u8; 32], ConfigError> {
        let bytes = hex::decode(&self.token_secret)
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid token secret hex: {}", e)))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            ConfigError::InvalidValue("Token secret must be exactly 32 bytes".to_string())
        })?;
        Ok(arr)
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: NEWSDESK_<SECTION>_<KEY>
    /// Example: NEWSDESK_STORE_DATA_DIR=/var/lib/newsdesk
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Store config
        if let Ok(data_dir) = env::var("NEWSDESK_STORE_DATA_DIR") {
            config.store.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(db_file) = env::var("NEWSDESK_STORE_DB_FILE") {
            config.store.db_file = db_file;
        }

        // Auth config
        if let Ok(secret) = env::var("NEWSDESK_AUTH_TOKEN_SECRET") {
            config.auth.token_secret = secret;
        }
        if let Ok(ttl) = env::var("NEWSDESK_AUTH_TOKEN_TTL") {
            config.auth.token_ttl = humantime::parse_duration(&ttl)
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid token TTL: {}", e)))?;
        }
        if let Ok(ttl) = env::var("NEWSDESK_AUTH_INVITE_TTL") {
            config.auth.invite_ttl = humantime::parse_duration(&ttl)
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid invite TTL: {}", e)))?;
        }

        // Logging config
        if let Ok(level) = env::var("NEWSDESK_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = env::var("NEWSDESK_LOG_JSON") {
            config.logging.json_format = json
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid JSON flag: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.secret_bytes()?;

        if self.auth.token_ttl.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "Token TTL must be non-zero".to_string(),
            ));
        }
        if self.auth.invite_ttl.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "Invite TTL must be non-zero".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }
}
