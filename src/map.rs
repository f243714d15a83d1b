//! Persistent (immutable) hash map with sequence-backed buckets.
//!
//! This module provides [`PersistentHashMap`], an immutable hash map built
//! as a two-level structure: an outer index from hash codes to collision
//! buckets, where each bucket is a [`PersistentSequence`] of key-value
//! entries.
//!
//! # Overview
//!
//! - O(log N + b) get, where b is the bucket length
//! - O(log N + b) add and delete
//! - O(1) len and `is_empty`
//!
//! All operations return new maps without modifying the original. Every
//! mutation touches exactly one bucket and the index path leading to it;
//! all other buckets and all other index structure are shared unchanged
//! between the old and new map values.
//!
//! # Examples
//!
//! ```rust
//! use keepsake::PersistentHashMap;
//!
//! let map = PersistentHashMap::empty()
//!     .add("one".to_string(), 1)
//!     .add("two".to_string(), 2);
//!
//! assert_eq!(map.get("one"), Some(&1));
//! assert_eq!(map.len(), 2);
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.add("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));       // Original unchanged
//! assert_eq!(updated.get("one"), Some(&100)); // New version
//! ```
//!
//! # Internal Structure
//!
//! The outer index is a persistent Red-Black Tree keyed by the `u64` hash
//! code (`index.rs`). Buckets are never stored empty: deleting the last
//! entry of a bucket removes its index slot entirely. Within a bucket each
//! key occurs at most once — adding a key removes any previous entry before
//! prepending the new one.

use std::borrow::Borrow;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

use crate::index::{HashIndex, HashIndexIterator};
use crate::sequence::{PersistentSequence, PersistentSequenceIterator};

// =============================================================================
// Hash computation
// =============================================================================

/// Computes the hash of a key using `DefaultHasher`.
fn compute_hash<K: Hash + ?Sized>(key: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

// =============================================================================
// Entry Definition
// =============================================================================

/// A key-value entry in a collision bucket.
#[derive(Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// Entries compare by key alone. Each bucket holds at most one entry per
/// key, so the first key match always identifies the intended entry.
impl<K: PartialEq, V> PartialEq for Entry<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

// =============================================================================
// PersistentHashMap Definition
// =============================================================================

/// A persistent (immutable) hash map with sequence-backed collision
/// buckets.
///
/// `PersistentHashMap` is an immutable data structure that uses structural
/// sharing to efficiently support functional programming patterns. Keys
/// must supply a deterministic hash consistent with their equality
/// relation; the map never depends on hash-code iteration order for
/// correctness, only for its (unspecified) enumeration order.
///
/// # Time Complexity
///
/// | Operation      | Complexity     |
/// |----------------|----------------|
/// | `empty`        | O(1)           |
/// | `get`          | O(log N + b)   |
/// | `add`          | O(log N + b)   |
/// | `delete`       | O(log N + b)   |
/// | `contains_key` | O(log N + b)   |
/// | `len`          | O(1)           |
/// | `is_empty`     | O(1)           |
///
/// where b is the length of the affected collision bucket.
///
/// # Examples
///
/// ```rust
/// use keepsake::PersistentHashMap;
///
/// let map = PersistentHashMap::singleton("key".to_string(), 42);
/// assert_eq!(map.get("key"), Some(&42));
/// ```
#[derive(Clone)]
pub struct PersistentHashMap<K, V> {
    /// Outer index from hash codes to collision buckets.
    index: HashIndex<PersistentSequence<Entry<K, V>>>,
    /// Total entry count across all buckets.
    length: usize,
}

impl<K, V> PersistentHashMap<K, V> {
    /// Returns the empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashMap;
    ///
    /// let map: PersistentHashMap<String, i32> = PersistentHashMap::empty();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            index: HashIndex::empty(),
            length: 0,
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns a lazy iterator over key-value entries.
    ///
    /// Entries are yielded bucket by bucket, each bucket exhausted before
    /// the next, in ascending hash-code order — deterministic for a given
    /// key set, but otherwise unspecified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::empty().add(1, "one").add(2, "two");
    /// assert_eq!(map.iter().count(), 2);
    /// ```
    #[must_use]
    pub fn iter(&self) -> PersistentHashMapIterator<'_, K, V> {
        PersistentHashMapIterator {
            slots: self.index.iter(),
            bucket: PersistentSequenceIterator::exhausted(),
        }
    }

    /// Returns a lazy iterator over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns a lazy iterator over the values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

impl<K: Clone + Hash + Eq, V: Clone> PersistentHashMap<K, V> {
    /// Creates a map containing a single key-value pair.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::singleton("key".to_string(), 42);
    /// assert_eq!(map.len(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        Self::empty().add(key, value)
    }

    /// Creates a map from any iterable of key-value pairs.
    ///
    /// Later duplicate keys win, following the input's iteration order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::of([("a", 1), ("b", 2), ("a", 3)]);
    /// assert_eq!(map.get("a"), Some(&3));
    /// assert_eq!(map.len(), 2);
    /// ```
    #[must_use]
    pub fn of<I: IntoIterator<Item = (K, V)>>(entries: I) -> Self {
        entries.into_iter().collect()
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but `Hash`
    /// and `Eq` on the borrowed form must match those for the key type.
    /// An absent hash slot behaves as an empty bucket.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::empty().add("hello".to_string(), 42);
    ///
    /// // Can use &str to look up String keys
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = compute_hash(key);
        let bucket = self.index.get(hash)?;
        bucket
            .iter()
            .find(|entry| entry.key.borrow() == key)
            .map(|entry| &entry.value)
    }

    /// Returns `true` if the map contains a value for the specified key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::empty().add("key".to_string(), 42);
    /// assert!(map.contains_key("key"));
    /// assert!(!map.contains_key("other"));
    /// ```
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Adds a key-value pair to the map.
    ///
    /// If the map already contains the key, its entry is removed from the
    /// bucket before the new entry is prepended, so the new value
    /// supersedes the old and no bucket ever holds a duplicate key. The
    /// entry count is updated by the bucket's length delta, which covers
    /// the new-key and overwrite cases uniformly.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashMap;
    ///
    /// let map1 = PersistentHashMap::empty().add("key".to_string(), 1);
    /// let map2 = map1.add("key".to_string(), 2);
    ///
    /// assert_eq!(map1.get("key"), Some(&1)); // Original unchanged
    /// assert_eq!(map2.get("key"), Some(&2)); // New version
    /// assert_eq!(map2.len(), 1);
    /// ```
    #[must_use]
    pub fn add(&self, key: K, value: V) -> Self {
        let hash = compute_hash(&key);
        let bucket = self.bucket(hash);
        let previous_length = bucket.len();
        let entry = Entry { key, value };
        let bucket = match bucket.delete(&entry) {
            Ok(without_key) => without_key,
            Err(_) => bucket,
        };
        let bucket = bucket.prepend(entry);
        Self {
            index: self.index.insert(hash, bucket.clone()),
            length: self.length - previous_length + bucket.len(),
        }
    }

    /// Adds every key-value pair of `entries` to the map.
    ///
    /// A left fold of [`add`] in the input's iteration order; later
    /// duplicate keys in the input win.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::singleton("a", 1).add_all([("b", 2), ("c", 3)]);
    /// assert_eq!(map.len(), 3);
    /// ```
    ///
    /// [`add`]: PersistentHashMap::add
    #[must_use]
    pub fn add_all<I: IntoIterator<Item = (K, V)>>(&self, entries: I) -> Self {
        entries
            .into_iter()
            .fold(self.clone(), |map, (key, value)| map.add(key, value))
    }

    /// Removes the entry for `key`, if present.
    ///
    /// An absent key returns the map unchanged (identity-shared, no
    /// allocation). If the bucket becomes empty its index slot is removed
    /// entirely; no empty buckets are retained.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::empty()
    ///     .add("a".to_string(), 1)
    ///     .add("b".to_string(), 2);
    /// let deleted = map.delete("a");
    ///
    /// assert_eq!(deleted.len(), 1);
    /// assert_eq!(deleted.get("a"), None);
    /// assert_eq!(map.get("a"), Some(&1)); // Original unchanged
    /// ```
    #[must_use]
    pub fn delete<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = compute_hash(key);
        let Some(bucket) = self.index.get(hash) else {
            return self.clone();
        };
        let Some(position) = bucket.iter().position(|entry| entry.key.borrow() == key) else {
            return self.clone();
        };
        let Ok(bucket) = bucket.delete_at(position) else {
            return self.clone();
        };
        let index = if bucket.is_empty() {
            self.index.remove(hash)
        } else {
            self.index.insert(hash, bucket)
        };
        Self {
            index,
            length: self.length - 1,
        }
    }

    /// Removes the entries for every key in `keys`.
    ///
    /// A left fold of [`delete`]; absent keys are skipped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::of([("a", 1), ("b", 2), ("c", 3)]);
    /// let deleted = map.delete_all(["a", "c", "missing"]);
    /// assert_eq!(deleted.len(), 1);
    /// ```
    ///
    /// [`delete`]: PersistentHashMap::delete
    #[must_use]
    pub fn delete_all<I: IntoIterator<Item = K>>(&self, keys: I) -> Self {
        keys.into_iter()
            .fold(self.clone(), |map, key| map.delete(&key))
    }

    /// Fetches the bucket for `hash`, treating an absent slot as empty.
    fn bucket(&self, hash: u64) -> PersistentSequence<Entry<K, V>> {
        self.index
            .get(hash)
            .cloned()
            .unwrap_or_else(PersistentSequence::empty)
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// A lazy iterator over the entries of a [`PersistentHashMap`].
///
/// Flattens the outer index bucket by bucket; each bucket is exhausted
/// before the walk advances to the next index slot.
pub struct PersistentHashMapIterator<'a, K, V> {
    slots: HashIndexIterator<'a, PersistentSequence<Entry<K, V>>>,
    bucket: PersistentSequenceIterator<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for PersistentHashMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.bucket.next() {
                return Some((&entry.key, &entry.value));
            }
            let (_, bucket) = self.slots.next()?;
            self.bucket = bucket.iter();
        }
    }
}

/// An owning iterator over the entries of a [`PersistentHashMap`].
pub struct PersistentHashMapIntoIterator<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for PersistentHashMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> ExactSizeIterator for PersistentHashMapIntoIterator<K, V> {
    fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for PersistentHashMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> FromIterator<(K, V)> for PersistentHashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |map, (key, value)| map.add(key, value))
    }
}

impl<K: Clone, V: Clone> IntoIterator for PersistentHashMap<K, V> {
    type Item = (K, V);
    type IntoIter = PersistentHashMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let entries: Vec<(K, V)> = self
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        PersistentHashMapIntoIterator {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a PersistentHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = PersistentHashMapIterator<'a, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> PartialEq for PersistentHashMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }
        self.iter()
            .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Eq> Eq for PersistentHashMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for PersistentHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for (key, value) in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Serde Implementations
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for PersistentHashMap<K, V>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentHashMapVisitor<K, V> {
    key_marker: std::marker::PhantomData<K>,
    value_marker: std::marker::PhantomData<V>,
}

#[cfg(feature = "serde")]
impl<K, V> PersistentHashMapVisitor<K, V> {
    const fn new() -> Self {
        Self {
            key_marker: std::marker::PhantomData,
            value_marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for PersistentHashMapVisitor<K, V>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone,
{
    type Value = PersistentHashMap<K, V>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = PersistentHashMap::empty();
        while let Some((key, value)) = access.next_entry()? {
            map = map.add(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for PersistentHashMap<K, V>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(PersistentHashMapVisitor::new())
    }
}

// =============================================================================
// Compile-time Assertions
// =============================================================================

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentHashMap<i32, i32>: Send, Sync);
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentHashMap<i32, i32>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================
