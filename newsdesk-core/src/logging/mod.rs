//! Logging subsystem for Newsdesk
//!
//! Unified logging interface built on the `tracing` crate. Supports plain
//! and JSON output; the `RUST_LOG` environment filter wins over the
//! configured level when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod error;
mod level;

pub use error::LoggingError;
pub use level::LogLevel;

/// Configuration for the logging subsystem
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// The minimum log level to display
    pub level: LogLevel,
    /// Whether to include timestamps
    pub with_timestamp: bool,
    /// Whether to include target module information
    pub with_target: bool,
    /// Whether to use JSON formatting
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            with_timestamp: true,
            with_target: true,
            json_format: false,
        }
    }
}

impl LogConfig {
    /// Create a new LogConfig with specified level
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Build a LogConfig from the application configuration section
    pub fn from_settings(settings: &crate::config::LoggingConfig) -> Result<Self, LoggingError> {
        let level = LogLevel::from_str(&settings.level).ok_or_else(|| {
            LoggingError::InvalidConfiguration(format!("Unknown log level: {}", settings.level))
        })?;

        Ok(Self {
            level,
            with_timestamp: settings.with_timestamp,
            with_target: settings.with_target,
            json_format: settings.json_format,
        })
    }

    /// Set whether to include timestamps
    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.with_timestamp = enabled;
        self
    }

    /// Set whether to include target information
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Set whether to use JSON formatting
    pub fn json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }
}

/// Initialize the logging subsystem with default configuration
pub fn init_logging() -> Result<(), LoggingError> {
    init_logging_with_config(LogConfig::default())
}

/// Initialize the logging subsystem with custom configuration
pub fn init_logging_with_config(config: LogConfig) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    if config.json_format {
        let fmt_layer = fmt::layer().with_target(config.with_target).json();
        if config.with_timestamp {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer.without_time())
                .try_init()
                .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;
        }
    } else {
        let fmt_layer = fmt::layer().with_target(config.with_target);
        if config.with_timestamp {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer.without_time())
                .try_init()
                .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;
        }
    }

    Ok(())
}
