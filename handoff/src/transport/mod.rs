//! The hand-off between transport adapters and the processing pipeline.
//!
//! An adapter runs a [`ReceiveAttempt`] per message, builds an immutable
//! [`CompleteContext`] when it is done and passes it to the pipeline's
//! [`CompletionHandler`].

mod complete;
mod handler;
mod receive;
#[cfg(test)]
mod transport_tests;

pub use complete::{CompleteContext, CompleteContextBuilder};
#[cfg(test)]
pub use handler::MockCompletionHandler;
pub use handler::{
    CompletionHandler, CompositeCompletionHandler, EventSinkCompletionHandler,
    LoggingCompletionHandler,
};
pub use receive::{IncomingMessage, ReceiveAttempt, PROCESSING_ERROR};
