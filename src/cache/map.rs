//! Concurrent key/value container used for whole-entity caches.

use std::{
    borrow::Borrow,
    collections::HashMap,
    hash::Hash,
    sync::{Arc, RwLock},
};

use super::lock::{rw_read, rw_write};

/// Key/value map behind a single reader/writer lock.
///
/// Values are owned by the map and handed out as `Arc<V>`, so a reader holds
/// an immutable snapshot of the entry that survives a later `clear`.
pub struct SyncMap<K, V> {
    name: &'static str,
    entries: RwLock<HashMap<K, Arc<V>>>,
}

impl<K, V> SyncMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace the entry for `key`.
    pub fn add(&self, key: K, value: V) {
        self.add_shared(key, Arc::new(value));
    }

    /// Insert or replace the entry for `key` with an already shared value.
    ///
    /// Lets several maps index the same value without copying it.
    pub fn add_shared(&self, key: K, value: Arc<V>) {
        rw_write(&self.entries, self.name, "add").insert(key, value);
    }

    /// Stored value for `key`, or `None` on a miss.
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        rw_read(&self.entries, self.name, "get").get(key).cloned()
    }

    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        rw_write(&self.entries, self.name, "delete").remove(key);
    }

    /// Replace the whole map with `entries`.
    ///
    /// The new map is built before the lock is taken and swapped in under one
    /// write hold, so readers see either the previous contents or the new
    /// ones, never an empty or half-filled map. Later duplicates of a key win,
    /// as with repeated `add`.
    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.replace_all_shared(
            entries
                .into_iter()
                .map(|(key, value)| (key, Arc::new(value))),
        );
    }

    pub fn replace_all_shared<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, Arc<V>)>,
    {
        let fresh: HashMap<K, Arc<V>> = entries.into_iter().collect();
        *rw_write(&self.entries, self.name, "replace_all") = fresh;
    }

    /// Drop every entry by installing a fresh backing map.
    pub fn clear(&self) {
        *rw_write(&self.entries, self.name, "clear") = HashMap::new();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, self.name, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn values(&self) -> Vec<Arc<V>> {
        rw_read(&self.entries, self.name, "values")
            .values()
            .cloned()
            .collect()
    }
}

impl<K, V> SyncMap<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Point-in-time copy of every entry, taken under one read lock.
    pub fn snapshot(&self) -> HashMap<K, Arc<V>> {
        rw_read(&self.entries, self.name, "snapshot").clone()
    }
}
