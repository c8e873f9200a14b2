//! # Handoff
//!
//! The completion hand-off between message transports and the processing pipeline.
//!
//! When a transport finishes with a message it reports a [`CompleteContext`]
//! to the pipeline:
//!
//! - **Outcome flags**: whether the transport acknowledged the message and
//!   whether the processing callback failed
//! - **Timing**: when processing started and completed, as reported by the transport
//! - **Context**: a read-only view of the per-attempt [`ContextBag`] so the
//!   consumer can see what the receive path recorded
//!
//! ## Quick Start
//!
//! ```rust
//! use handoff::prelude::*;
//! use std::collections::HashMap;
//!
//! const RETRY_COUNT: ContextKey<u32> = ContextKey::new("retryCount");
//!
//! let bag = ContextBag::new();
//! bag.set(&RETRY_COUNT, 1);
//!
//! let started = now();
//! let record = CompleteContext::new(
//!     "msg-42",
//!     true,
//!     HashMap::from([("NServiceBus.MessageId".to_string(), "msg-42".to_string())]),
//!     started,
//!     now(),
//!     false,
//!     bag.as_read_only(),
//! )?;
//!
//! assert!(record.was_acknowledged());
//! assert_eq!(record.extensions().get(&RETRY_COUNT)?, 1);
//! # Ok::<(), HandoffError>(())
//! ```
//!
//! [`CompleteContext`]: transport::CompleteContext
//! [`ContextBag`]: context::ContextBag

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

/// Emits a tracing event at a level chosen at runtime.
macro_rules! event_at_level {
    ($level:expr, $($arg:tt)+) => {{
        let level: ::tracing::Level = $level;
        if level == ::tracing::Level::TRACE {
            ::tracing::trace!($($arg)+);
        } else if level == ::tracing::Level::DEBUG {
            ::tracing::debug!($($arg)+);
        } else if level == ::tracing::Level::INFO {
            ::tracing::info!($($arg)+);
        } else if level == ::tracing::Level::WARN {
            ::tracing::warn!($($arg)+);
        } else {
            ::tracing::error!($($arg)+);
        }
    }};
}

pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod observability;
pub mod testing;
pub mod transport;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{CompletionLogConfig, HandoffConfig, LoggingConfig};
    pub use crate::context::{ContextBag, ContextKey, ReadOnlyContextBag};
    pub use crate::errors::{HandoffError, NotFoundError, ValidationError, Violation};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_tracing, CompletionEventBuilder};
    pub use crate::transport::{
        CompleteContext, CompleteContextBuilder, CompletionHandler,
        CompositeCompletionHandler, EventSinkCompletionHandler, IncomingMessage,
        LoggingCompletionHandler, ReceiveAttempt, PROCESSING_ERROR,
    };
    pub use crate::utils::{generate_native_message_id, now, Timestamp};
}
