//! Tracing integration for completion records.
//!
//! Provides subscriber setup, header redaction and the span attribute set
//! that describes one completed receive attempt.

use crate::config::LoggingConfig;
use crate::errors::HandoffError;
use crate::transport::CompleteContext;
use crate::utils::format_iso8601;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing_subscriber::EnvFilter;

/// Replacement value for redacted headers.
pub const REDACTED: &str = "[REDACTED]";

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.filter`.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), HandoffError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| HandoffError::Config(e.to_string()))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| HandoffError::Config(e.to_string()))
}

/// Signed processing time in milliseconds.
///
/// Negative when the transport reported `completed_at` before `started_at`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn processing_duration_ms(ctx: &CompleteContext) -> f64 {
    let elapsed = ctx.completed_at() - ctx.started_at();
    elapsed.num_microseconds().map_or_else(
        || elapsed.num_milliseconds() as f64,
        |us| us as f64 / 1000.0,
    )
}

/// Masks the values of headers whose names match any configured pattern.
#[derive(Debug, Clone, Default)]
pub struct HeaderRedactor {
    patterns: Vec<Regex>,
}

impl HeaderRedactor {
    /// Compiles the given patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self, HandoffError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                Regex::new(p.as_ref())
                    .map_err(|e| HandoffError::Config(format!("invalid header pattern: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Returns true if the header's value must not be emitted.
    #[must_use]
    pub fn is_redacted(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(name))
    }

    /// Returns a sorted copy of `headers` with matching values masked.
    #[must_use]
    pub fn apply(&self, headers: &HashMap<String, String>) -> BTreeMap<String, String> {
        headers
            .iter()
            .map(|(k, v)| {
                let value = if self.is_redacted(k) {
                    REDACTED.to_string()
                } else {
                    v.clone()
                };
                (k.clone(), value)
            })
            .collect()
    }
}

/// Span attributes describing one completed receive attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSpanAttributes {
    /// Native message id.
    pub native_message_id: String,
    /// Whether the transport acknowledged the message.
    pub was_acknowledged: bool,
    /// Whether processing failed.
    pub on_message_failed: bool,
    /// Processing start, RFC 3339.
    pub started_at: String,
    /// Processing end, RFC 3339.
    pub completed_at: String,
    /// Signed processing time.
    pub duration_ms: f64,
    /// Number of headers on the message.
    pub header_count: usize,
    /// Header values, present only when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// Sorted names of the context entries visible to the consumer.
    #[serde(default)]
    pub extension_keys: Vec<String>,
}

impl CompletionSpanAttributes {
    /// Reads the attributes of a completion record.
    #[must_use]
    pub fn from_context(ctx: &CompleteContext) -> Self {
        let mut extension_keys = ctx.extensions().keys();
        extension_keys.sort();

        Self {
            native_message_id: ctx.native_message_id().to_string(),
            was_acknowledged: ctx.was_acknowledged(),
            on_message_failed: ctx.on_message_failed(),
            started_at: format_iso8601(&ctx.started_at()),
            completed_at: format_iso8601(&ctx.completed_at()),
            duration_ms: processing_duration_ms(ctx),
            header_count: ctx.headers().len(),
            headers: None,
            extension_keys,
        }
    }

    /// Attaches (already redacted) header values.
    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Returns the outcome label used in logs.
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match (self.was_acknowledged, self.on_message_failed) {
            (true, false) => "acknowledged",
            (true, true) => "acknowledged_after_failure",
            (false, false) => "not_acknowledged",
            (false, true) => "failed",
        }
    }

    /// Converts to OpenTelemetry attributes.
    #[must_use]
    pub fn to_otel_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        attrs.insert("message.native_id".to_string(), self.native_message_id.clone());
        attrs.insert("message.acknowledged".to_string(), self.was_acknowledged.to_string());
        attrs.insert("message.failed".to_string(), self.on_message_failed.to_string());
        attrs.insert("message.outcome".to_string(), self.outcome().to_string());
        attrs.insert("processing.started_at".to_string(), self.started_at.clone());
        attrs.insert("processing.completed_at".to_string(), self.completed_at.clone());
        attrs.insert("processing.duration_ms".to_string(), self.duration_ms.to_string());
        attrs.insert("message.header_count".to_string(), self.header_count.to_string());

        if let Some(ref headers) = self.headers {
            for (k, v) in headers {
                attrs.insert(format!("message.header.{k}"), v.clone());
            }
        }
        if !self.extension_keys.is_empty() {
            attrs.insert("context.keys".to_string(), self.extension_keys.join(","));
        }

        attrs
    }
}
