use std::{
    borrow::Borrow,
    collections::HashMap,
    hash::Hash,
    ops::AddAssign,
    sync::RwLock,
};

use super::lock::{rw_read, rw_write};

/// Key to accumulating total. `add` sums into the existing value and a
/// missing key reads as zero.
pub struct SyncCounterMap<K, V> {
    name: &'static str,
    totals: RwLock<HashMap<K, V>>,
}

impl<K, V> SyncCounterMap<K, V>
where
    K: Eq + Hash,
    V: Copy + Default + AddAssign,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            totals: RwLock::new(HashMap::new()),
        }
    }

    pub fn add(&self, key: K, value: V) {
        *rw_write(&self.totals, self.name, "add")
            .entry(key)
            .or_default() += value;
    }

    pub fn get<Q>(&self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        rw_read(&self.totals, self.name, "get")
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        rw_write(&self.totals, self.name, "delete").remove(key);
    }

    /// Replace every total with the sums of `entries`, swapped in under one
    /// write hold. Repeated keys accumulate, as with repeated `add`.
    pub fn replace_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut fresh: HashMap<K, V> = HashMap::new();
        for (key, value) in entries {
            *fresh.entry(key).or_default() += value;
        }
        *rw_write(&self.totals, self.name, "replace_all") = fresh;
    }

    pub fn clear(&self) {
        *rw_write(&self.totals, self.name, "clear") = HashMap::new();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.totals, self.name, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> SyncCounterMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Copy,
{
    pub fn snapshot(&self) -> HashMap<K, V> {
        rw_read(&self.totals, self.name, "snapshot").clone()
    }
}
