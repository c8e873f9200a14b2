//! The completion record a transport reports after each receive attempt.

use crate::context::ReadOnlyContextBag;
use crate::errors::ValidationError;
use crate::utils::guard::{against_missing_timestamp, against_null, against_null_and_empty};
use crate::utils::Timestamp;
use std::collections::HashMap;

/// Signals that a transport has finished with one message.
///
/// A `CompleteContext` is an immutable snapshot: it is built once through
/// [`CompleteContext::new`] or [`CompleteContextBuilder::build`], both of
/// which validate every field, and offers read access only.
///
/// `completed_at` is not required to follow `started_at`; transports report
/// their own clocks.
#[derive(Debug, Clone)]
pub struct CompleteContext {
    native_message_id: String,
    was_acknowledged: bool,
    headers: HashMap<String, String>,
    started_at: Timestamp,
    completed_at: Timestamp,
    on_message_failed: bool,
    extensions: ReadOnlyContextBag,
}

impl CompleteContext {
    /// Creates a completion record.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `native_message_id` is empty or a
    /// timestamp is an uninitialised sentinel.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        native_message_id: impl Into<String>,
        was_acknowledged: bool,
        headers: HashMap<String, String>,
        started_at: Timestamp,
        completed_at: Timestamp,
        on_message_failed: bool,
        extensions: ReadOnlyContextBag,
    ) -> Result<Self, ValidationError> {
        Self::builder()
            .native_message_id(native_message_id)
            .was_acknowledged(was_acknowledged)
            .headers(headers)
            .started_at(started_at)
            .completed_at(completed_at)
            .on_message_failed(on_message_failed)
            .extensions(extensions)
            .build()
    }

    /// Returns a builder whose fields start out absent.
    #[must_use]
    pub fn builder() -> CompleteContextBuilder {
        CompleteContextBuilder::default()
    }

    /// The id the transport assigned to the message.
    #[must_use]
    pub fn native_message_id(&self) -> &str {
        &self.native_message_id
    }

    /// True if the message was acknowledged and removed from the queue.
    #[must_use]
    pub const fn was_acknowledged(&self) -> bool {
        self.was_acknowledged
    }

    /// The message headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Looks up a single header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// When processing started.
    #[must_use]
    pub const fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// When processing completed.
    #[must_use]
    pub const fn completed_at(&self) -> Timestamp {
        self.completed_at
    }

    /// True if the processing callback failed.
    #[must_use]
    pub const fn on_message_failed(&self) -> bool {
        self.on_message_failed
    }

    /// Additional information attached during the receive attempt.
    #[must_use]
    pub const fn extensions(&self) -> &ReadOnlyContextBag {
        &self.extensions
    }
}

/// Collects the fields of a [`CompleteContext`] before validation.
///
/// Unset fields are reported by [`build`](Self::build) as null or missing.
#[derive(Debug, Clone, Default)]
pub struct CompleteContextBuilder {
    native_message_id: Option<String>,
    was_acknowledged: bool,
    headers: Option<HashMap<String, String>>,
    started_at: Option<Timestamp>,
    completed_at: Option<Timestamp>,
    on_message_failed: bool,
    extensions: Option<ReadOnlyContextBag>,
}

impl CompleteContextBuilder {
    /// Sets the native message id.
    #[must_use]
    pub fn native_message_id(mut self, id: impl Into<String>) -> Self {
        self.native_message_id = Some(id.into());
        self
    }

    /// Sets whether the transport acknowledged the message.
    #[must_use]
    pub fn was_acknowledged(mut self, acknowledged: bool) -> Self {
        self.was_acknowledged = acknowledged;
        self
    }

    /// Sets the headers.
    #[must_use]
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Adds one header, starting an empty header map if none was set.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Sets the processing start time.
    #[must_use]
    pub fn started_at(mut self, at: Timestamp) -> Self {
        self.started_at = Some(at);
        self
    }

    /// Sets the processing completion time.
    #[must_use]
    pub fn completed_at(mut self, at: Timestamp) -> Self {
        self.completed_at = Some(at);
        self
    }

    /// Sets whether the processing callback failed.
    #[must_use]
    pub fn on_message_failed(mut self, failed: bool) -> Self {
        self.on_message_failed = failed;
        self
    }

    /// Sets the read-only context of the receive attempt.
    #[must_use]
    pub fn extensions(mut self, extensions: ReadOnlyContextBag) -> Self {
        self.extensions = Some(extensions);
        self
    }

    /// Validates the collected fields and builds the record.
    ///
    /// Fields are checked in declaration order and the first violation wins.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` naming the first invalid field.
    pub fn build(self) -> Result<CompleteContext, ValidationError> {
        let native_message_id = against_null_and_empty("native_message_id", self.native_message_id)?;
        let headers = against_null("headers", self.headers)?;
        let started_at = against_missing_timestamp("started_at", self.started_at)?;
        let completed_at = against_missing_timestamp("completed_at", self.completed_at)?;
        let extensions = against_null("extensions", self.extensions)?;

        Ok(CompleteContext {
            native_message_id,
            was_acknowledged: self.was_acknowledged,
            headers,
            started_at,
            completed_at,
            on_message_failed: self.on_message_failed,
            extensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextBag, ContextKey};
    use crate::errors::Violation;
    use crate::utils::now;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn headers() -> HashMap<String, String> {
        HashMap::from([("NServiceBus.MessageId".to_string(), "msg-42".to_string())])
    }

    fn valid_builder() -> CompleteContextBuilder {
        let t0 = now();
        CompleteContext::builder()
            .native_message_id("msg-42")
            .headers(headers())
            .started_at(t0)
            .completed_at(t0 + Duration::milliseconds(50))
            .extensions(ReadOnlyContextBag::empty())
    }

    #[test]
    fn test_accessors_return_inputs() {
        let t0 = now();
        let t1 = t0 + Duration::milliseconds(50);
        let bag = ContextBag::new();
        let view = bag.as_read_only();

        let ctx = CompleteContext::new("msg-42", true, headers(), t0, t1, false, view.clone()).unwrap();

        assert_eq!(ctx.native_message_id(), "msg-42");
        assert!(ctx.was_acknowledged());
        assert_eq!(ctx.headers(), &headers());
        assert_eq!(ctx.header("NServiceBus.MessageId"), Some("msg-42"));
        assert_eq!(ctx.started_at(), t0);
        assert_eq!(ctx.completed_at(), t1);
        assert!(!ctx.on_message_failed());
        assert!(ctx.extensions().same_bag(&view));
    }

    #[test]
    fn test_flag_combinations_preserved() {
        for acknowledged in [false, true] {
            for failed in [false, true] {
                let ctx = valid_builder()
                    .was_acknowledged(acknowledged)
                    .on_message_failed(failed)
                    .build()
                    .unwrap();
                assert_eq!(ctx.was_acknowledged(), acknowledged);
                assert_eq!(ctx.on_message_failed(), failed);
            }
        }
    }

    #[test]
    fn test_empty_headers_allowed() {
        let ctx = valid_builder().headers(HashMap::new()).build().unwrap();
        assert!(ctx.headers().is_empty());
    }

    #[test]
    fn test_completed_before_started_allowed() {
        let t0 = now();
        let ctx = valid_builder()
            .started_at(t0)
            .completed_at(t0 - Duration::seconds(2))
            .build()
            .unwrap();
        assert!(ctx.completed_at() < ctx.started_at());
    }

    #[test]
    fn test_missing_native_message_id() {
        let err = CompleteContextBuilder {
            native_message_id: None,
            ..valid_builder()
        }
        .build()
        .unwrap_err();
        assert_eq!(err, ValidationError::null("native_message_id"));
    }

    #[test]
    fn test_empty_native_message_id() {
        let err = valid_builder().native_message_id("").build().unwrap_err();
        assert_eq!(err.field, "native_message_id");
        assert_eq!(err.violation, Violation::Empty);
    }

    #[test]
    fn test_null_headers() {
        let err = CompleteContextBuilder {
            headers: None,
            ..valid_builder()
        }
        .build()
        .unwrap_err();
        assert_eq!(err, ValidationError::null("headers"));
    }

    #[test]
    fn test_epoch_timestamps_are_accepted() {
        let epoch = Timestamp::default();
        let record = valid_builder()
            .started_at(epoch)
            .completed_at(epoch)
            .build()
            .unwrap();
        assert_eq!(record.started_at(), epoch);
    }

    #[test]
    fn test_sentinel_timestamps() {
        let err = valid_builder()
            .started_at(chrono::DateTime::<chrono::Utc>::MIN_UTC.into())
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::missing("started_at"));

        let err = CompleteContextBuilder {
            completed_at: None,
            ..valid_builder()
        }
        .build()
        .unwrap_err();
        assert_eq!(err, ValidationError::missing("completed_at"));
    }

    #[test]
    fn test_null_extensions() {
        let err = CompleteContextBuilder {
            extensions: None,
            ..valid_builder()
        }
        .build()
        .unwrap_err();
        assert_eq!(err, ValidationError::null("extensions"));
    }

    #[test]
    fn test_header_helper_starts_map() {
        let ctx = CompleteContextBuilder {
            headers: None,
            ..valid_builder()
        }
        .header("NServiceBus.EnclosedMessageTypes", "OrderPlaced")
        .build()
        .unwrap();
        assert_eq!(ctx.headers().len(), 1);
    }

    #[test]
    fn test_record_holds_reference_not_copy() {
        const STAGE: ContextKey<&'static str> = ContextKey::new("stage");
        let bag = ContextBag::new();
        let ctx = valid_builder().extensions(bag.as_read_only()).build().unwrap();

        bag.set(&STAGE, "late");
        assert_eq!(ctx.extensions().try_get(&STAGE), Some("late"));
    }

    #[test]
    fn test_record_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompleteContext>();
    }
}
