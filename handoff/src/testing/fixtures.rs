//! Test fixtures for completion records.

use chrono::{DateTime, Duration};
use std::collections::HashMap;

use crate::context::{ContextBag, ContextKey};
use crate::errors::ValidationError;
use crate::transport::{CompleteContext, CompleteContextBuilder};
use crate::utils::{now, Timestamp};

/// Builds completion records that are valid unless a test says otherwise.
///
/// Defaults: id `msg-1`, acknowledged, not failed, one `NServiceBus.MessageId`
/// header, started at 2024-01-01T00:00:00Z and completed 50ms later.
#[derive(Debug, Clone)]
pub struct CompleteContextFixture {
    /// Native message id.
    pub native_message_id: String,
    /// Acknowledgement flag.
    pub was_acknowledged: bool,
    /// Message headers.
    pub headers: HashMap<String, String>,
    /// Processing start.
    pub started_at: Timestamp,
    /// Time between start and completion.
    pub elapsed: Duration,
    /// Failure flag.
    pub on_message_failed: bool,
    context: ContextBag,
}

impl Default for CompleteContextFixture {
    fn default() -> Self {
        let started_at = DateTime::from_timestamp(1_704_067_200, 0).map_or_else(now, Into::into);
        Self {
            native_message_id: "msg-1".to_string(),
            was_acknowledged: true,
            headers: HashMap::from([(
                "NServiceBus.MessageId".to_string(),
                "msg-1".to_string(),
            )]),
            started_at,
            elapsed: Duration::milliseconds(50),
            on_message_failed: false,
            context: ContextBag::new(),
        }
    }
}

impl CompleteContextFixture {
    /// Creates a fixture with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the native message id (and the matching message id header).
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.headers
            .insert("NServiceBus.MessageId".to_string(), id.clone());
        self.native_message_id = id;
        self
    }

    /// Sets the acknowledgement flag.
    #[must_use]
    pub fn acknowledged(mut self, acknowledged: bool) -> Self {
        self.was_acknowledged = acknowledged;
        self
    }

    /// Sets the failure flag.
    #[must_use]
    pub fn failed(mut self, failed: bool) -> Self {
        self.on_message_failed = failed;
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the processing window.
    #[must_use]
    pub fn window(mut self, started_at: Timestamp, elapsed: Duration) -> Self {
        self.started_at = started_at;
        self.elapsed = elapsed;
        self
    }

    /// Stores a context entry.
    #[must_use]
    pub fn with_entry<T: Send + Sync + 'static>(self, key: &ContextKey<T>, value: T) -> Self {
        self.context.set(key, value);
        self
    }

    /// The writable bag whose projection the record will carry.
    #[must_use]
    pub const fn context(&self) -> &ContextBag {
        &self.context
    }

    /// Returns a builder preloaded with every fixture field.
    #[must_use]
    pub fn builder(&self) -> CompleteContextBuilder {
        CompleteContext::builder()
            .native_message_id(self.native_message_id.clone())
            .was_acknowledged(self.was_acknowledged)
            .headers(self.headers.clone())
            .started_at(self.started_at)
            .completed_at(self.started_at + self.elapsed)
            .on_message_failed(self.on_message_failed)
            .extensions(self.context.as_read_only())
    }

    /// Builds the record.
    pub fn build(&self) -> Result<CompleteContext, ValidationError> {
        self.builder().build()
    }
}
