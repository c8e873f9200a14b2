//! Completion handler doubles for testing.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::HandoffError;
use crate::transport::{CompleteContext, CompletionHandler};

/// Keeps every record it is handed.
#[derive(Debug, Default)]
pub struct RecordingCompletionHandler {
    records: Mutex<Vec<CompleteContext>>,
}

impl RecordingCompletionHandler {
    /// Creates a new recording handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the records received so far.
    #[must_use]
    pub fn records(&self) -> Vec<CompleteContext> {
        self.records.lock().clone()
    }

    /// Returns the most recent record.
    #[must_use]
    pub fn last(&self) -> Option<CompleteContext> {
        self.records.lock().last().cloned()
    }

    /// Returns the number of records received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.records.lock().len()
    }

    /// Forgets all records.
    pub fn reset(&self) {
        self.records.lock().clear();
    }
}

#[async_trait]
impl CompletionHandler for RecordingCompletionHandler {
    async fn on_complete(&self, context: &CompleteContext) -> Result<(), HandoffError> {
        self.records.lock().push(context.clone());
        Ok(())
    }
}

/// Rejects every record with a handler error.
#[derive(Debug, Clone)]
pub struct FailingCompletionHandler {
    message: String,
}

impl FailingCompletionHandler {
    /// Creates a handler that fails with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingCompletionHandler {
    fn default() -> Self {
        Self::new("completion rejected")
    }
}

#[async_trait]
impl CompletionHandler for FailingCompletionHandler {
    async fn on_complete(&self, _context: &CompleteContext) -> Result<(), HandoffError> {
        Err(HandoffError::handler(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CompleteContextFixture;

    #[tokio::test]
    async fn test_recording_handler() {
        let handler = RecordingCompletionHandler::new();
        let record = CompleteContextFixture::new().with_id("m-1").build().unwrap();

        handler.on_complete(&record).await.unwrap();
        assert_eq!(handler.call_count(), 1);
        assert_eq!(handler.last().unwrap().native_message_id(), "m-1");

        handler.reset();
        assert!(handler.records().is_empty());
    }

    #[test]
    fn test_failing_handler() {
        let handler = FailingCompletionHandler::new("nope");
        let record = CompleteContextFixture::new().build().unwrap();

        let err = tokio_test::block_on(handler.on_complete(&record)).unwrap_err();
        assert_eq!(err.to_string(), "Completion handler error: nope");
    }
}
