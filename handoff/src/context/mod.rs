//! Capability-keyed context bags for receive attempts.
//!
//! This module provides:
//! - Typed keys that carry the type of the value stored under them
//! - A writable bag shared by the stages of one receive attempt
//! - A read-only projection handed to completion consumers

mod bags;
mod key;

pub use bags::{ContextBag, ReadOnlyContextBag};
pub use key::ContextKey;
