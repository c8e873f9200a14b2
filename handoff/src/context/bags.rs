//! Writable and read-only context bags.
//!
//! Both bag types are handles onto the same shared storage. Producers hold a
//! [`ContextBag`]; downstream consumers receive a [`ReadOnlyContextBag`],
//! whose type offers lookups only.

use super::key::{ContextKey, Slot};
use crate::errors::NotFoundError;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
struct BagStore {
    entries: RwLock<HashMap<Slot, Entry>>,
    parent: Option<ReadOnlyContextBag>,
}

impl BagStore {
    fn lookup(&self, slot: &Slot) -> Option<Entry> {
        if let Some(entry) = self.entries.read().get(slot) {
            return Some(Arc::clone(entry));
        }
        self.parent.as_ref().and_then(|p| p.store.lookup(slot))
    }

    fn try_get<T: Clone + 'static>(&self, key: &ContextKey<T>) -> Option<T> {
        self.lookup(&key.slot())
            .and_then(|entry| entry.downcast_ref::<T>().cloned())
    }

    fn get<T: Clone + 'static>(&self, key: &ContextKey<T>) -> Result<T, NotFoundError> {
        self.try_get(key)
            .ok_or_else(|| NotFoundError::new(key.name(), key.value_type_name()))
    }

    fn visible_slots(&self) -> Vec<Slot> {
        let mut slots: Vec<Slot> = self.entries.read().keys().cloned().collect();
        if let Some(parent) = &self.parent {
            for slot in parent.store.visible_slots() {
                if !slots.contains(&slot) {
                    slots.push(slot);
                }
            }
        }
        slots
    }

    /// Entry names, each listed once even when several value types share it.
    fn visible_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for slot in self.visible_slots() {
            if !names.iter().any(|n| *n == slot.name) {
                names.push(slot.name.into_owned());
            }
        }
        names
    }
}

/// The writable context bag of one receive attempt.
///
/// Cloning yields another handle onto the same entries, which is how the
/// stages of one attempt share a bag. Writes take an internal lock, so the
/// handles may live on different threads.
#[derive(Clone, Default)]
pub struct ContextBag {
    store: Arc<BagStore>,
}

impl ContextBag {
    /// Creates a new empty context bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a child bag whose lookups fall through to `parent`.
    ///
    /// Writes to the child never reach the parent.
    #[must_use]
    pub fn with_parent(parent: &ReadOnlyContextBag) -> Self {
        Self {
            store: Arc::new(BagStore {
                entries: RwLock::default(),
                parent: Some(parent.clone()),
            }),
        }
    }

    /// Sets a value, overwriting any previous value under the same key.
    pub fn set<T: Send + Sync + 'static>(&self, key: &ContextKey<T>, value: T) {
        self.store.entries.write().insert(key.slot(), Arc::new(value));
    }

    /// Sets a value keyed by its type alone.
    pub fn set_typed<T: Send + Sync + 'static>(&self, value: T) {
        self.set(&ContextKey::<T>::of_type(), value);
    }

    /// Gets a value, or `None` when absent.
    #[must_use]
    pub fn try_get<T: Clone + 'static>(&self, key: &ContextKey<T>) -> Option<T> {
        self.store.try_get(key)
    }

    /// Gets a value.
    ///
    /// # Errors
    ///
    /// Returns `NotFoundError` if no entry exists for the key.
    pub fn get<T: Clone + 'static>(&self, key: &ContextKey<T>) -> Result<T, NotFoundError> {
        self.store.get(key)
    }

    /// Gets a value keyed by its type alone, or `None` when absent.
    #[must_use]
    pub fn try_get_typed<T: Clone + 'static>(&self) -> Option<T> {
        self.try_get(&ContextKey::<T>::of_type())
    }

    /// Gets a value keyed by its type alone.
    pub fn get_typed<T: Clone + 'static>(&self) -> Result<T, NotFoundError> {
        self.get(&ContextKey::<T>::of_type())
    }

    /// Returns the existing value, or stores and returns the one `init` creates.
    ///
    /// `init` runs under the bag's write lock and must not touch this bag.
    pub fn get_or_insert_with<T, F>(&self, key: &ContextKey<T>, init: F) -> T
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let slot = key.slot();
        let mut entries = self.store.entries.write();

        if let Some(value) = entries.get(&slot).and_then(|e| e.downcast_ref::<T>()) {
            return value.clone();
        }
        if let Some(value) = self.store.parent.as_ref().and_then(|p| p.try_get(key)) {
            return value;
        }

        let value = init();
        entries.insert(slot, Arc::new(value.clone()));
        value
    }

    /// Checks if a key resolves to a value.
    #[must_use]
    pub fn contains<T: 'static>(&self, key: &ContextKey<T>) -> bool {
        self.store.lookup(&key.slot()).is_some()
    }

    /// Copies the entries visible through `other` into this bag.
    ///
    /// Entries already present here are overwritten.
    pub fn merge(&self, other: &ReadOnlyContextBag) {
        if Arc::ptr_eq(&self.store, &other.store) {
            return;
        }

        let incoming: Vec<(Slot, Entry)> = other
            .store
            .visible_slots()
            .into_iter()
            .filter_map(|slot| other.store.lookup(&slot).map(|e| (slot, e)))
            .collect();

        self.store.entries.write().extend(incoming);
    }

    /// Returns the distinct names of all visible entries, own entries first.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.store.visible_names()
    }

    /// Returns the number of visible entries, one per name and value type.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.visible_slots().len()
    }

    /// Returns true if no entries are visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the read-only projection of this bag.
    ///
    /// The projection shares storage, so later writes through this bag are
    /// visible to it.
    #[must_use]
    pub fn as_read_only(&self) -> ReadOnlyContextBag {
        ReadOnlyContextBag {
            store: Arc::clone(&self.store),
        }
    }
}

impl fmt::Debug for ContextBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBag")
            .field("keys", &self.keys())
            .finish()
    }
}

/// The read-only projection of a [`ContextBag`].
///
/// This is what completion handlers, recovery policies and telemetry see.
/// It has no mutating methods.
#[derive(Clone, Default)]
pub struct ReadOnlyContextBag {
    store: Arc<BagStore>,
}

impl ReadOnlyContextBag {
    /// Returns a projection over a fresh, empty bag.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Gets a value, or `None` when absent.
    #[must_use]
    pub fn try_get<T: Clone + 'static>(&self, key: &ContextKey<T>) -> Option<T> {
        self.store.try_get(key)
    }

    /// Gets a value.
    ///
    /// # Errors
    ///
    /// Returns `NotFoundError` if no entry exists for the key.
    pub fn get<T: Clone + 'static>(&self, key: &ContextKey<T>) -> Result<T, NotFoundError> {
        self.store.get(key)
    }

    /// Gets a value keyed by its type alone, or `None` when absent.
    #[must_use]
    pub fn try_get_typed<T: Clone + 'static>(&self) -> Option<T> {
        self.try_get(&ContextKey::<T>::of_type())
    }

    /// Gets a value keyed by its type alone.
    pub fn get_typed<T: Clone + 'static>(&self) -> Result<T, NotFoundError> {
        self.get(&ContextKey::<T>::of_type())
    }

    /// Checks if a key resolves to a value.
    #[must_use]
    pub fn contains<T: 'static>(&self, key: &ContextKey<T>) -> bool {
        self.store.lookup(&key.slot()).is_some()
    }

    /// Returns the distinct names of all visible entries.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.store.visible_names()
    }

    /// Returns the number of visible entries, one per name and value type.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.visible_slots().len()
    }

    /// Returns true if no entries are visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if both projections view the same bag.
    #[must_use]
    pub fn same_bag(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }
}

impl From<&ContextBag> for ReadOnlyContextBag {
    fn from(bag: &ContextBag) -> Self {
        bag.as_read_only()
    }
}

impl fmt::Debug for ReadOnlyContextBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnlyContextBag")
            .field("keys", &self.keys())
            .finish()
    }
}
