//! Typed capability keys for context bags.

use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A named key that declares the type of the value stored under it.
///
/// Two keys address the same entry only when both the name and the value
/// type match, so a lookup can never observe a value of the wrong type.
///
/// ```
/// use handoff::context::{ContextBag, ContextKey};
///
/// const RETRY_COUNT: ContextKey<u32> = ContextKey::new("retryCount");
///
/// let bag = ContextBag::new();
/// bag.set(&RETRY_COUNT, 1);
/// assert_eq!(bag.try_get(&RETRY_COUNT), Some(1));
/// ```
pub struct ContextKey<T> {
    name: Cow<'static, str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> ContextKey<T> {
    /// Creates a key with a static name, usable in `const` items.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _marker: PhantomData,
        }
    }

    /// Creates a key with a runtime-built name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _marker: PhantomData,
        }
    }

    /// Creates the key identified by the value type alone.
    #[must_use]
    pub fn of_type() -> Self {
        Self::new(type_name::<T>())
    }

    /// Returns the key name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name of the declared value type.
    #[must_use]
    pub fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    pub(crate) fn slot(&self) -> Slot {
        Slot {
            name: self.name.clone(),
            type_id: TypeId::of::<T>(),
        }
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for ContextKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for ContextKey<T> {}

impl<T> Hash for ContextKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextKey")
            .field("name", &self.name)
            .field("type", &type_name::<T>())
            .finish()
    }
}

impl<T> fmt::Display for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Storage address of an entry: key name plus value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Slot {
    pub(crate) name: Cow<'static, str>,
    pub(crate) type_id: TypeId,
}
