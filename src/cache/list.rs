use std::{
    borrow::Borrow,
    collections::HashMap,
    hash::Hash,
    sync::RwLock,
};

use super::lock::{rw_read, rw_write};

/// Key to append-only sequence. Elements keep the order they were added in;
/// individual elements are never removed, only the whole map is cleared.
pub struct SyncListMap<K, V> {
    name: &'static str,
    lists: RwLock<HashMap<K, Vec<V>>>,
}

impl<K, V> SyncListMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            lists: RwLock::new(HashMap::new()),
        }
    }

    pub fn add(&self, key: K, value: V) {
        rw_write(&self.lists, self.name, "add")
            .entry(key)
            .or_default()
            .push(value);
    }

    /// Copy of the sequence stored for `key`; empty on a miss.
    pub fn get<Q>(&self, key: &Q) -> Vec<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        rw_read(&self.lists, self.name, "get")
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace every sequence with `entries`, appended in iteration order and
    /// swapped in under one write hold.
    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut fresh: HashMap<K, Vec<V>> = HashMap::new();
        for (key, value) in entries {
            fresh.entry(key).or_default().push(value);
        }
        *rw_write(&self.lists, self.name, "replace_all") = fresh;
    }

    pub fn clear(&self) {
        *rw_write(&self.lists, self.name, "clear") = HashMap::new();
    }

    /// Number of keys with at least one element.
    pub fn len(&self) -> usize {
        rw_read(&self.lists, self.name, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> SyncListMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn snapshot(&self) -> HashMap<K, Vec<V>> {
        rw_read(&self.lists, self.name, "snapshot").clone()
    }
}
