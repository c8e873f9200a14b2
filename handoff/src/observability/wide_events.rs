//! Wide event payloads for completion records.

use super::tracing::{CompletionSpanAttributes, HeaderRedactor};
use crate::config::CompletionLogConfig;
use crate::errors::HandoffError;
use crate::transport::CompleteContext;

/// Builds one self-contained event payload per completion record.
#[derive(Debug, Clone)]
pub struct CompletionEventBuilder {
    /// Event type attached to emitted payloads.
    pub event_type: String,
    include_headers: bool,
    redactor: HeaderRedactor,
}

impl Default for CompletionEventBuilder {
    fn default() -> Self {
        Self {
            event_type: "message.completed".to_string(),
            include_headers: false,
            redactor: HeaderRedactor::default(),
        }
    }
}

impl CompletionEventBuilder {
    /// Creates a builder that omits headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from configuration, compiling redaction patterns.
    pub fn from_config(config: &CompletionLogConfig) -> Result<Self, HandoffError> {
        Ok(Self {
            event_type: config.event_type.clone(),
            include_headers: config.include_headers,
            redactor: HeaderRedactor::new(&config.redacted_headers)?,
        })
    }

    /// Reads the span attributes of a record, honouring header settings.
    #[must_use]
    pub fn attributes(&self, ctx: &CompleteContext) -> CompletionSpanAttributes {
        let attrs = CompletionSpanAttributes::from_context(ctx);
        if self.include_headers {
            attrs.with_headers(self.redactor.apply(ctx.headers()))
        } else {
            attrs
        }
    }

    /// Builds the event payload for a record.
    #[must_use]
    pub fn build_payload(&self, ctx: &CompleteContext) -> serde_json::Value {
        let attrs = self.attributes(ctx);

        let mut payload = serde_json::json!({
            "native_message_id": attrs.native_message_id,
            "outcome": attrs.outcome(),
            "was_acknowledged": attrs.was_acknowledged,
            "on_message_failed": attrs.on_message_failed,
            "started_at": attrs.started_at,
            "completed_at": attrs.completed_at,
            "duration_ms": attrs.duration_ms,
            "header_count": attrs.header_count,
            "context_keys": attrs.extension_keys,
        });

        if let Some(headers) = attrs.headers {
            payload["headers"] = serde_json::json!(headers);
        }

        payload
    }
}
