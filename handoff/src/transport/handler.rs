//! The pipeline's completion entry point and stock handlers.

use super::CompleteContext;
use crate::config::CompletionLogConfig;
use crate::errors::HandoffError;
use crate::events::EventSink;
use crate::observability::CompletionEventBuilder;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Consumes completion records reported by transports.
///
/// Handlers see the record and its context read-only. They drive recovery
/// and telemetry decisions but never retry inside the call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionHandler: Send + Sync {
    /// Handles one completion record.
    async fn on_complete(&self, context: &CompleteContext) -> Result<(), HandoffError>;
}

/// Logs every completion record through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct LoggingCompletionHandler {
    config: CompletionLogConfig,
    events: CompletionEventBuilder,
}

impl LoggingCompletionHandler {
    /// Creates a logging handler.
    ///
    /// # Errors
    ///
    /// Returns `HandoffError::Config` if a redaction pattern does not compile.
    pub fn new(config: CompletionLogConfig) -> Result<Self, HandoffError> {
        let events = CompletionEventBuilder::from_config(&config)?;
        Ok(Self { config, events })
    }
}

#[async_trait]
impl CompletionHandler for LoggingCompletionHandler {
    async fn on_complete(&self, context: &CompleteContext) -> Result<(), HandoffError> {
        let attrs = self.events.attributes(context);
        event_at_level!(
            self.config.level_for(attrs.on_message_failed),
            native_message_id = %attrs.native_message_id,
            outcome = attrs.outcome(),
            was_acknowledged = attrs.was_acknowledged,
            on_message_failed = attrs.on_message_failed,
            duration_ms = attrs.duration_ms,
            headers = ?attrs.headers,
            context_keys = ?attrs.extension_keys,
            "Message completed"
        );
        Ok(())
    }
}

/// Publishes one wide event per completion record.
pub struct EventSinkCompletionHandler {
    sink: Arc<dyn EventSink>,
    events: CompletionEventBuilder,
}

impl EventSinkCompletionHandler {
    /// Creates a handler emitting `message.completed` events without headers.
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            events: CompletionEventBuilder::default(),
        }
    }

    /// Creates a handler with event type and header settings from configuration.
    pub fn from_config(
        sink: Arc<dyn EventSink>,
        config: &CompletionLogConfig,
    ) -> Result<Self, HandoffError> {
        Ok(Self {
            sink,
            events: CompletionEventBuilder::from_config(config)?,
        })
    }
}

#[async_trait]
impl CompletionHandler for EventSinkCompletionHandler {
    async fn on_complete(&self, context: &CompleteContext) -> Result<(), HandoffError> {
        let payload = self.events.build_payload(context);
        self.sink.emit(&self.events.event_type, payload).await;
        Ok(())
    }
}

/// Runs several handlers in registration order.
///
/// The first failing handler stops the chain and its error is returned.
#[derive(Default, Clone)]
pub struct CompositeCompletionHandler {
    handlers: Vec<Arc<dyn CompletionHandler>>,
}

impl CompositeCompletionHandler {
    /// Creates an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    #[must_use]
    pub fn with_handler(mut self, handler: impl CompletionHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Appends a shared handler.
    pub fn push(&mut self, handler: Arc<dyn CompletionHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl CompletionHandler for CompositeCompletionHandler {
    async fn on_complete(&self, context: &CompleteContext) -> Result<(), HandoffError> {
        for (index, handler) in self.handlers.iter().enumerate() {
            if let Err(e) = handler.on_complete(context).await {
                warn!(
                    native_message_id = %context.native_message_id(),
                    handler_index = index,
                    error = %e,
                    "Completion handler failed"
                );
                return Err(e);
            }
        }
        Ok(())
    }
}
