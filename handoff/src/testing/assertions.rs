//! Test assertions for completion records.

use std::fmt::Debug;

use crate::context::ContextKey;
use crate::errors::{ValidationError, Violation};
use crate::transport::CompleteContext;

/// Asserts that the transport acknowledged the message.
pub fn assert_acknowledged(ctx: &CompleteContext) {
    assert!(
        ctx.was_acknowledged(),
        "Expected message '{}' to be acknowledged",
        ctx.native_message_id()
    );
}

/// Asserts that the transport did not acknowledge the message.
pub fn assert_not_acknowledged(ctx: &CompleteContext) {
    assert!(
        !ctx.was_acknowledged(),
        "Expected message '{}' not to be acknowledged",
        ctx.native_message_id()
    );
}

/// Asserts that the processing callback failed.
pub fn assert_processing_failed(ctx: &CompleteContext) {
    assert!(
        ctx.on_message_failed(),
        "Expected processing of '{}' to have failed",
        ctx.native_message_id()
    );
}

/// Asserts that the processing callback succeeded.
pub fn assert_processing_succeeded(ctx: &CompleteContext) {
    assert!(
        !ctx.on_message_failed(),
        "Expected processing of '{}' to have succeeded",
        ctx.native_message_id()
    );
}

/// Asserts that the record's context holds `expected` under `key`.
pub fn assert_extension_eq<T>(ctx: &CompleteContext, key: &ContextKey<T>, expected: &T)
where
    T: Clone + PartialEq + Debug + 'static,
{
    let actual = ctx.extensions().try_get(key);
    assert_eq!(
        actual.as_ref(),
        Some(expected),
        "Expected context entry '{}' to be {:?}, got {:?}. Keys: {:?}",
        key,
        expected,
        actual,
        ctx.extensions().keys()
    );
}

/// Asserts that construction failed on `field` with `violation`.
pub fn assert_validation_error<T: Debug>(
    result: &Result<T, ValidationError>,
    field: &str,
    violation: Violation,
) {
    match result {
        Err(err) => {
            assert_eq!(err.field, field, "Validation failed on an unexpected field");
            assert_eq!(err.violation, violation, "Unexpected violation for '{field}'");
        }
        Ok(value) => panic!("Expected validation error on '{field}', got {value:?}"),
    }
}
