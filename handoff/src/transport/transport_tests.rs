//! End-to-end tests for the transport to pipeline hand-off.

#[cfg(test)]
mod tests {
    use crate::context::{ContextBag, ContextKey};
    use crate::errors::{HandoffError, Violation};
    use crate::events::CollectingEventSink;
    use crate::testing::{
        assert_acknowledged, assert_extension_eq, assert_processing_failed,
        assert_processing_succeeded, assert_validation_error, CompleteContextFixture,
        FailingCompletionHandler, RecordingCompletionHandler,
    };
    use crate::transport::{
        CompleteContext, CompletionHandler, CompositeCompletionHandler,
        EventSinkCompletionHandler, IncomingMessage, MockCompletionHandler, ReceiveAttempt,
        PROCESSING_ERROR,
    };
    use crate::utils::parse_timestamp;
    use anyhow::anyhow;
    use chrono::Duration;
    use futures::future::join_all;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Arc;

    const RETRY_COUNT: ContextKey<u32> = ContextKey::new("retryCount");
    const WORKER: ContextKey<usize> = ContextKey::new("worker");

    fn headers(id: &str) -> HashMap<String, String> {
        HashMap::from([("NServiceBus.MessageId".to_string(), id.to_string())])
    }

    #[tokio::test]
    async fn test_successful_attempt_reaches_consumer() {
        let t0 = parse_timestamp("2024-03-01T10:00:00Z").unwrap();
        let t1 = t0 + Duration::milliseconds(50);

        let bag = ContextBag::new();
        bag.set(&RETRY_COUNT, 1);
        let record = CompleteContext::new(
            "msg-42",
            true,
            headers("msg-42"),
            t0,
            t1,
            false,
            bag.as_read_only(),
        )
        .unwrap();

        let recorder = RecordingCompletionHandler::new();
        recorder.on_complete(&record).await.unwrap();

        let seen = recorder.last().unwrap();
        assert_acknowledged(&seen);
        assert_processing_succeeded(&seen);
        assert_extension_eq(&seen, &RETRY_COUNT, &1);
        assert_eq!(seen.header("NServiceBus.MessageId"), Some("msg-42"));
        assert_eq!(seen.completed_at() - seen.started_at(), Duration::milliseconds(50));
    }

    #[tokio::test]
    async fn test_receive_attempt_report_carries_callback_context() {
        let recorder = RecordingCompletionHandler::new();

        let mut attempt = ReceiveAttempt::begin("msg-42", headers("msg-42"));
        attempt
            .invoke(|msg: IncomingMessage| async move {
                msg.context().set(&RETRY_COUNT, 1);
                Ok::<(), anyhow::Error>(())
            })
            .await;
        attempt.report(true, &recorder).await.unwrap();

        assert_eq!(recorder.call_count(), 1);
        let record = recorder.last().unwrap();
        assert_eq!(record.native_message_id(), "msg-42");
        assert_extension_eq(&record, &RETRY_COUNT, &1);
    }

    #[tokio::test]
    async fn test_failed_attempt_reports_failure_flag() {
        let recorder = RecordingCompletionHandler::new();

        let mut attempt = ReceiveAttempt::begin("msg-43", headers("msg-43"));
        attempt
            .invoke(|_| async { Err::<(), _>(anyhow!("timeout talking to inventory")) })
            .await;
        attempt.report(false, &recorder).await.unwrap();

        let record = recorder.last().unwrap();
        assert_processing_failed(&record);
        assert!(!record.was_acknowledged());
        assert_eq!(
            record.extensions().get(&PROCESSING_ERROR).unwrap(),
            "timeout talking to inventory"
        );
    }

    #[test]
    fn test_absent_headers_are_rejected() {
        let t0 = parse_timestamp("2024-03-01T10:00:00Z").unwrap();
        let result = CompleteContext::builder()
            .native_message_id("msg-44")
            .started_at(t0)
            .completed_at(t0)
            .extensions(ContextBag::new().as_read_only())
            .build();

        assert_validation_error(&result, "headers", Violation::Null);
    }

    #[test]
    fn test_invalid_record_is_never_reported() {
        let mut handler = MockCompletionHandler::new();
        handler.expect_on_complete().never();

        let result =
            tokio_test::block_on(ReceiveAttempt::begin("   ", headers("x")).report(true, &handler));

        match result {
            Err(HandoffError::Validation(err)) => {
                assert_eq!(err.field, "native_message_id");
                assert_eq!(err.violation, Violation::Empty);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_attempts_keep_separate_contexts() {
        let recorder = Arc::new(RecordingCompletionHandler::new());

        let attempts = (0..8_usize).map(|worker| {
            let recorder = Arc::clone(&recorder);
            async move {
                let id = format!("msg-{worker}");
                let mut attempt = ReceiveAttempt::begin(id.clone(), headers(&id));
                attempt
                    .invoke(|msg| async move {
                        msg.context().set(&WORKER, worker);
                        Ok::<(), anyhow::Error>(())
                    })
                    .await;
                attempt.report(true, recorder.as_ref()).await
            }
        });

        for result in join_all(attempts).await {
            result.unwrap();
        }

        let records = recorder.records();
        assert_eq!(records.len(), 8);
        for record in &records {
            let worker = record.extensions().get(&WORKER).unwrap();
            assert_eq!(record.native_message_id(), format!("msg-{worker}"));
            assert_eq!(record.extensions().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_composite_pipeline_entry_point() {
        let sink = Arc::new(CollectingEventSink::new());
        let recorder = Arc::new(RecordingCompletionHandler::new());

        let mut composite =
            CompositeCompletionHandler::new().with_handler(EventSinkCompletionHandler::new(sink.clone()));
        composite.push(recorder.clone());

        let record = CompleteContextFixture::new()
            .with_id("msg-45")
            .with_entry(&RETRY_COUNT, 3)
            .build()
            .unwrap();
        composite.on_complete(&record).await.unwrap();

        assert_eq!(recorder.call_count(), 1);
        let payloads = sink.payloads_of("message.completed");
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0]["native_message_id"], "msg-45");
        assert_eq!(payloads[0]["outcome"], "acknowledged");
    }

    #[tokio::test]
    async fn test_handler_error_reaches_transport() {
        let attempt = ReceiveAttempt::begin("msg-46", headers("msg-46"));
        let err = attempt
            .report(true, &FailingCompletionHandler::new("recoverability offline"))
            .await
            .unwrap_err();

        assert!(matches!(err, HandoffError::Handler(ref m) if m == "recoverability offline"));
    }

    #[test]
    fn test_handler_is_object_safe() {
        let handlers: Vec<Box<dyn CompletionHandler>> = vec![
            Box::new(RecordingCompletionHandler::new()),
            Box::new(FailingCompletionHandler::default()),
        ];
        assert_eq!(handlers.len(), 2);
    }
}
