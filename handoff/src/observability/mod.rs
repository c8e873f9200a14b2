//! Observability utilities for completion records.

mod tracing;
mod wide_events;

pub use self::tracing::{
    init_tracing, processing_duration_ms, CompletionSpanAttributes, HeaderRedactor, REDACTED,
};
pub use wide_events::CompletionEventBuilder;
