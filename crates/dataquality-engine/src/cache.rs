//! Compute-once cache for schemas and classifications
//!
//! Each key owns its own slot. The first caller for a key builds the value
//! while holding that slot's lock, so concurrent callers for the same key wait
//! for the one build instead of duplicating it; other keys are unaffected.
//! A failed build leaves the slot empty and the next caller retries.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

type Slot<V> = Arc<Mutex<Option<Arc<V>>>>;

/// Per-key compute-once cache
pub struct OnceCache<K, V> {
    slots: RwLock<HashMap<K, Slot<V>>>,
}

impl<K, V> OnceCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Cached value for `key`, building it at most once on success
    pub fn get_or_try_build<E>(
        &self,
        key: &K,
        build: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let slot = {
            let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = guard.as_ref() {
            return Ok(Arc::clone(value));
        }

        let value = Arc::new(build()?);
        *guard = Some(Arc::clone(&value));
        Ok(value)
    }

    /// Cached value for `key` if it is built and not being rebuilt
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.get(key)?;
        let guard = slot.try_lock().ok()?;
        guard.as_ref().map(Arc::clone)
    }

    /// Drop the entry for `key`
    pub fn invalidate(&self, key: &K) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of keys with a slot (built or not)
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for OnceCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
