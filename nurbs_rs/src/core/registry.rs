//! Memoizing key/value store used by the basis builders.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use log::warn;

/// A cache of computed values keyed by structural identity.
///
/// Values are cloned on the way in and on the way out; no caller holds a value that aliases
/// a cached one.
#[derive(Debug, Clone)]
pub struct Registry<K, V> {
    name: &'static str,
    entries: HashMap<K, V>,
}

impl<K, V> Registry<K, V>
where
    K: Eq + Hash + Debug,
    V: Clone,
{
    /// Creates an empty registry. `name` only appears in diagnostics.
    pub fn new(name: &'static str) -> Self {
        Registry { name, entries: HashMap::new() }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stores a copy of `value` under `key`.
    ///
    /// An existing entry is overwritten after a warning.
    pub fn store(&mut self, key: K, value: &V) {
        if self.entries.contains_key(&key) {
            warn!("{}: overwriting cached entry for key {:?}", self.name, key);
        }
        self.entries.insert(key, value.clone());
    }

    /// Returns a fresh copy of the value stored under `key`.
    pub fn retrieve(&self, key: &K) -> Option<V> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }
}
