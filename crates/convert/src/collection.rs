//! Ordered, keyed collection used on both sides of a bulk conversion.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Key of a collection entry: a positional index or a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionKey {
    Index(u64),
    Name(String),
}

impl core::fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CollectionKey::Index(i) => write!(f, "{i}"),
            CollectionKey::Name(n) => f.write_str(n),
        }
    }
}

impl From<u64> for CollectionKey {
    fn from(value: u64) -> Self {
        CollectionKey::Index(value)
    }
}

impl From<usize> for CollectionKey {
    fn from(value: usize) -> Self {
        CollectionKey::Index(value as u64)
    }
}

impl From<&str> for CollectionKey {
    fn from(value: &str) -> Self {
        CollectionKey::Name(value.to_string())
    }
}

impl From<String> for CollectionKey {
    fn from(value: String) -> Self {
        CollectionKey::Name(value)
    }
}

/// Insertion-ordered keyed container.
///
/// `put` on an existing key replaces the value in place: the entry keeps its
/// original position.
#[derive(Debug, Clone)]
pub struct Collection<V> {
    items: IndexMap<CollectionKey, V>,
    next_index: u64,
}

// Order-sensitive, unlike `IndexMap`'s own equality.
impl<V: PartialEq> PartialEq for Collection<V> {
    fn eq(&self, other: &Self) -> bool {
        self.items.iter().eq(other.items.iter())
    }
}

impl<V: Eq> Eq for Collection<V> {}

impl<V> Default for Collection<V> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
            next_index: 0,
        }
    }
}

impl<V> Collection<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: IndexMap::with_capacity(capacity),
            next_index: 0,
        }
    }

    /// Insert or overwrite. Returns the previous value for `key`, if any.
    pub fn put(&mut self, key: impl Into<CollectionKey>, value: V) -> Option<V> {
        let key = key.into();
        if let CollectionKey::Index(i) = key {
            self.next_index = self.next_index.max(i.saturating_add(1));
        }
        self.items.insert(key, value)
    }

    /// Append under the next free positional index.
    pub fn push(&mut self, value: V) -> CollectionKey {
        let key = CollectionKey::Index(self.next_index);
        self.put(key.clone(), value);
        key
    }

    pub fn get(&self, key: &CollectionKey) -> Option<&V> {
        self.items.get(key)
    }

    /// Entry at insertion position `position`.
    pub fn get_index(&self, position: usize) -> Option<(&CollectionKey, &V)> {
        self.items.get_index(position)
    }

    pub fn position(&self, key: &CollectionKey) -> Option<usize> {
        self.items.get_index_of(key)
    }

    pub fn contains_key(&self, key: &CollectionKey) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&CollectionKey, &V)> {
        self.items.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CollectionKey> {
        self.items.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.items.values()
    }
}

impl<V> FromIterator<V> for Collection<V> {
    /// Collects values under positional keys `0..n`.
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut collection = Collection::new();
        for value in iter {
            collection.push(value);
        }
        collection
    }
}

impl<V> IntoIterator for Collection<V> {
    type Item = (CollectionKey, V);
    type IntoIter = indexmap::map::IntoIter<CollectionKey, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, V> IntoIterator for &'a Collection<V> {
    type Item = (&'a CollectionKey, &'a V);
    type IntoIter = indexmap::map::Iter<'a, CollectionKey, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
