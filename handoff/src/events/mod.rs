//! Event sinks that completion handlers publish to.
//!
//! Sinks only ever receive serialised payloads, so they stay independent of
//! the record and bag types.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
