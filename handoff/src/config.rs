//! Configuration for completion logging and tracing output.

use crate::errors::HandoffError;
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Environment variable holding a JSON-encoded [`HandoffConfig`].
pub const CONFIG_ENV_VAR: &str = "HANDOFF_CONFIG";

/// Log level names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    Info,
    /// Warn level.
    Warn,
    /// Error level.
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// Subscriber setup.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// How completion records are logged and published.
    #[serde(default)]
    pub completion_log: CompletionLogConfig,
}

impl HandoffConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, HandoffError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads the configuration from [`CONFIG_ENV_VAR`], falling back to defaults when unset.
    pub fn from_env() -> Result<Self, HandoffError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(json) => Self::from_json_str(&json),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(HandoffError::Config(format!("{CONFIG_ENV_VAR}: {e}"))),
        }
    }
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

/// Settings for logging and publishing completion records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionLogConfig {
    /// Level for records whose processing succeeded.
    #[serde(default = "default_level")]
    pub level: LogLevel,
    /// Level for records whose processing failed.
    #[serde(default = "default_failure_level")]
    pub failure_level: LogLevel,
    /// Whether header values are included.
    #[serde(default)]
    pub include_headers: bool,
    /// Regex patterns; matching header names have their values redacted.
    #[serde(default)]
    pub redacted_headers: Vec<String>,
    /// Event type used when publishing to an event sink.
    #[serde(default = "default_event_type")]
    pub event_type: String,
}

fn default_level() -> LogLevel {
    LogLevel::Info
}

fn default_failure_level() -> LogLevel {
    LogLevel::Warn
}

fn default_event_type() -> String {
    "message.completed".to_string()
}

impl Default for CompletionLogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            failure_level: default_failure_level(),
            include_headers: false,
            redacted_headers: Vec::new(),
            event_type: default_event_type(),
        }
    }
}

impl CompletionLogConfig {
    /// Creates a completion log configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Includes header values in logs and events.
    #[must_use]
    pub fn with_headers(mut self) -> Self {
        self.include_headers = true;
        self
    }

    /// Adds a header-name pattern whose values are redacted.
    #[must_use]
    pub fn with_redacted_header(mut self, pattern: impl Into<String>) -> Self {
        self.redacted_headers.push(pattern.into());
        self
    }

    /// Sets the event type.
    #[must_use]
    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    /// Returns the level for a record with the given failure flag.
    #[must_use]
    pub fn level_for(&self, on_message_failed: bool) -> Level {
        if on_message_failed {
            self.failure_level.into()
        } else {
            self.level.into()
        }
    }
}
