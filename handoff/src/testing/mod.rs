//! Testing utilities for transports and completion handlers.
//!
//! This module provides:
//! - A fixture that builds valid completion records with overridable fields
//! - Handler doubles that record or reject completions
//! - Assertions over completion records

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_acknowledged, assert_extension_eq, assert_not_acknowledged,
    assert_processing_failed, assert_processing_succeeded, assert_validation_error,
};
pub use fixtures::CompleteContextFixture;
pub use mocks::{FailingCompletionHandler, RecordingCompletionHandler};
