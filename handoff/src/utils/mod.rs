//! Utility functions for identifiers, timestamps and argument guards.

pub mod guard;
mod ids;
pub mod timestamps;

pub use ids::generate_native_message_id;
pub use timestamps::{format_iso8601, is_sentinel, now, parse_timestamp, Timestamp};
