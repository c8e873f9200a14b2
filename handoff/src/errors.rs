//! Error types for the completion hand-off.
//!
//! Construction failures of a completion record are reported as
//! [`ValidationError`], absent context entries as [`NotFoundError`]. Both
//! convert into the umbrella [`HandoffError`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// The main error type for hand-off operations.
#[derive(Debug, Error)]
pub enum HandoffError {
    /// A completion record failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A required context entry was absent.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// A completion handler rejected a record.
    #[error("Completion handler error: {0}")]
    Handler(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl HandoffError {
    /// Creates a handler error.
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}

impl From<serde_json::Error> for HandoffError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// The kind of invariant a constructor argument violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    /// The value was not supplied at all.
    Null,
    /// The value was supplied but empty or whitespace-only.
    Empty,
    /// A timestamp was absent or carried an uninitialised sentinel.
    Missing,
}

impl Violation {
    /// Returns the violation as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Empty => "empty",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a completion record is constructed from invalid input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid completion record: '{field}' is {violation}")]
pub struct ValidationError {
    /// The name of the offending field.
    pub field: &'static str,
    /// What was wrong with it.
    pub violation: Violation,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub const fn new(field: &'static str, violation: Violation) -> Self {
        Self { field, violation }
    }

    /// Shorthand for a [`Violation::Null`] error.
    #[must_use]
    pub const fn null(field: &'static str) -> Self {
        Self::new(field, Violation::Null)
    }

    /// Shorthand for a [`Violation::Empty`] error.
    #[must_use]
    pub const fn empty(field: &'static str) -> Self {
        Self::new(field, Violation::Empty)
    }

    /// Shorthand for a [`Violation::Missing`] error.
    #[must_use]
    pub const fn missing(field: &'static str) -> Self {
        Self::new(field, Violation::Missing)
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("field".to_string(), serde_json::Value::String(self.field.to_string()));
        map.insert(
            "violation".to_string(),
            serde_json::Value::String(self.violation.as_str().to_string()),
        );
        map.insert("message".to_string(), serde_json::Value::String(self.to_string()));
        map
    }
}

/// Error raised when a context lookup finds no entry.
///
/// Absence is an expected outcome; callers that can proceed without the
/// entry should prefer the `try_get` family instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No context entry '{key}' of type {type_name}")]
pub struct NotFoundError {
    /// The key that was looked up.
    pub key: String,
    /// The value type the key declares.
    pub type_name: &'static str,
}

impl NotFoundError {
    /// Creates a new not-found error.
    #[must_use]
    pub fn new(key: impl Into<String>, type_name: &'static str) -> Self {
        Self {
            key: key.into(),
            type_name,
        }
    }
}
