//! Producer-side helper that turns one receive attempt into a completion record.

use super::{CompleteContext, CompletionHandler};
use crate::context::{ContextBag, ContextKey, ReadOnlyContextBag};
use crate::errors::{HandoffError, ValidationError};
use crate::utils::{now, Timestamp};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

/// Description of the processing failure, set when the callback fails.
pub const PROCESSING_ERROR: ContextKey<String> = ContextKey::new("handoff.processing_error");

/// What the application callback receives for one message.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    native_message_id: String,
    headers: HashMap<String, String>,
    context: ContextBag,
}

impl IncomingMessage {
    /// The id the transport assigned to the message.
    #[must_use]
    pub fn native_message_id(&self) -> &str {
        &self.native_message_id
    }

    /// The message headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// The attempt's writable context, shared with the transport.
    #[must_use]
    pub const fn context(&self) -> &ContextBag {
        &self.context
    }
}

/// State of one receive attempt, from dequeue to completion report.
///
/// The attempt owns a fresh [`ContextBag`]; concurrent attempts never share one.
#[derive(Debug)]
pub struct ReceiveAttempt {
    native_message_id: String,
    headers: HashMap<String, String>,
    started_at: Timestamp,
    context: ContextBag,
    on_message_failed: bool,
}

impl ReceiveAttempt {
    /// Starts an attempt now.
    #[must_use]
    pub fn begin(native_message_id: impl Into<String>, headers: HashMap<String, String>) -> Self {
        Self::begin_at(native_message_id, headers, now())
    }

    /// Starts an attempt with a transport-reported start time.
    #[must_use]
    pub fn begin_at(
        native_message_id: impl Into<String>,
        headers: HashMap<String, String>,
        started_at: Timestamp,
    ) -> Self {
        Self {
            native_message_id: native_message_id.into(),
            headers,
            started_at,
            context: ContextBag::new(),
            on_message_failed: false,
        }
    }

    /// Replaces the attempt's bag with a child of `parent`.
    ///
    /// Call before writing to the context; earlier entries are discarded.
    #[must_use]
    pub fn with_parent_context(mut self, parent: &ReadOnlyContextBag) -> Self {
        self.context = ContextBag::with_parent(parent);
        self
    }

    /// The native message id.
    #[must_use]
    pub fn native_message_id(&self) -> &str {
        &self.native_message_id
    }

    /// The message headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// When the attempt started.
    #[must_use]
    pub const fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// The attempt's writable context.
    #[must_use]
    pub const fn context(&self) -> &ContextBag {
        &self.context
    }

    /// True once a callback invoked through [`invoke`](Self::invoke) has failed.
    #[must_use]
    pub const fn on_message_failed(&self) -> bool {
        self.on_message_failed
    }

    /// Returns the view handed to the application callback.
    #[must_use]
    pub fn message(&self) -> IncomingMessage {
        IncomingMessage {
            native_message_id: self.native_message_id.clone(),
            headers: self.headers.clone(),
            context: self.context.clone(),
        }
    }

    /// Runs the application callback and records whether it failed.
    ///
    /// Errors and panics are caught, described under [`PROCESSING_ERROR`]
    /// and summarised in the failure flag; they are never propagated.
    /// Returns true if the callback succeeded.
    pub async fn invoke<F, Fut>(&mut self, on_message: F) -> bool
    where
        F: FnOnce(IncomingMessage) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let outcome = AssertUnwindSafe(on_message(self.message()))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(())) => return true,
            Ok(Err(e)) => format!("{e:#}"),
            Err(panic) => panic_message(&*panic),
        };

        warn!(
            native_message_id = %self.native_message_id,
            error = %failure,
            "Processing callback failed"
        );
        self.context.set(&PROCESSING_ERROR, failure);
        self.on_message_failed = true;
        false
    }

    /// Builds the completion record, stamping `completed_at` now.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the attempt's id is empty.
    pub fn complete(self, was_acknowledged: bool) -> Result<CompleteContext, ValidationError> {
        self.complete_at(was_acknowledged, now())
    }

    /// Builds the completion record with a transport-reported completion time.
    pub fn complete_at(
        self,
        was_acknowledged: bool,
        completed_at: Timestamp,
    ) -> Result<CompleteContext, ValidationError> {
        let extensions = self.context.as_read_only();
        CompleteContext::new(
            self.native_message_id,
            was_acknowledged,
            self.headers,
            self.started_at,
            completed_at,
            self.on_message_failed,
            extensions,
        )
    }

    /// Builds the record and hands it to the pipeline's completion handler.
    ///
    /// An invalid record is never reported.
    pub async fn report<H>(self, was_acknowledged: bool, handler: &H) -> Result<(), HandoffError>
    where
        H: CompletionHandler + ?Sized,
    {
        let record = self.complete(was_acknowledged)?;
        debug!(
            native_message_id = %record.native_message_id(),
            was_acknowledged,
            on_message_failed = record.on_message_failed(),
            "Reporting completion"
        );
        handler.on_complete(&record).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "processing callback panicked".to_string()
    }
}
