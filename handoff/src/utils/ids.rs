//! Identifier generation for transports that lack a native message id.

use uuid::Uuid;

/// Generates a native message id from a random UUID v4.
///
/// Transports whose broker does not assign ids use this to satisfy the
/// non-empty id requirement of a completion record.
#[must_use]
pub fn generate_native_message_id() -> String {
    Uuid::new_v4().to_string()
}
