//! Persistent (immutable) hash set.
//!
//! This module provides [`PersistentHashSet`], an immutable set derived
//! from [`PersistentHashMap`]: elements are the map's keys and the value
//! payload is a unit marker that is always ignored. The set adds no
//! algorithm of its own — membership, insertion and deletion are pure
//! composition over the map.
//!
//! # Examples
//!
//! ```rust
//! use keepsake::PersistentHashSet;
//!
//! let set = PersistentHashSet::empty().insert(1).insert(2).insert(3);
//! assert!(set.contains(&1));
//! assert_eq!(set.len(), 3);
//!
//! // Structural sharing: the original set is preserved
//! let updated = set.insert(4);
//! assert_eq!(set.len(), 3);      // Original unchanged
//! assert_eq!(updated.len(), 4);  // New version
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::iter::FromIterator;

use crate::map::{PersistentHashMap, PersistentHashMapIterator};

// =============================================================================
// PersistentHashSet Definition
// =============================================================================

/// A persistent (immutable) hash set backed by [`PersistentHashMap`].
///
/// `PersistentHashSet` wraps a `PersistentHashMap<T, ()>`; an element is a
/// member exactly when it is present as a key. All sharing guarantees of
/// the map carry over unchanged.
///
/// # Time Complexity
///
/// | Operation  | Complexity   |
/// |------------|--------------|
/// | `empty`    | O(1)         |
/// | `contains` | O(log N + b) |
/// | `insert`   | O(log N + b) |
/// | `delete`   | O(log N + b) |
/// | `len`      | O(1)         |
///
/// where b is the length of the affected collision bucket.
///
/// # Examples
///
/// ```rust
/// use keepsake::PersistentHashSet;
///
/// let set = PersistentHashSet::singleton(42);
/// assert!(set.contains(&42));
/// assert!(!set.contains(&0));
/// ```
#[derive(Clone)]
pub struct PersistentHashSet<T> {
    inner: PersistentHashMap<T, ()>,
}

impl<T> PersistentHashSet<T> {
    /// Returns the empty set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashSet;
    ///
    /// let set: PersistentHashSet<i32> = PersistentHashSet::empty();
    /// assert!(set.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            inner: PersistentHashMap::empty(),
        }
    }

    /// Returns the number of elements in the set.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns a lazy iterator over the elements.
    ///
    /// Elements are yielded in the backing map's bucket order —
    /// deterministic for a given element set, but otherwise unspecified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashSet;
    ///
    /// let set = PersistentHashSet::of([1, 2, 3]);
    /// assert_eq!(set.iter().count(), 3);
    /// ```
    #[must_use]
    pub fn iter(&self) -> PersistentHashSetIterator<'_, T> {
        PersistentHashSetIterator {
            entries: self.inner.iter(),
        }
    }
}

impl<T: Clone + Hash + Eq> PersistentHashSet<T> {
    /// Creates a set containing a single element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashSet;
    ///
    /// let set = PersistentHashSet::singleton(42);
    /// assert_eq!(set.len(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self::empty().insert(element)
    }

    /// Creates a set from any iterable of elements.
    ///
    /// Duplicates collapse to a single membership.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashSet;
    ///
    /// let set = PersistentHashSet::of([1, 2, 2, 3]);
    /// assert_eq!(set.len(), 3);
    /// ```
    #[must_use]
    pub fn of<I: IntoIterator<Item = T>>(elements: I) -> Self {
        elements.into_iter().collect()
    }

    /// Creates a set from the keys of a map, dropping its values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::{PersistentHashMap, PersistentHashSet};
    ///
    /// let map = PersistentHashMap::of([("a", 1), ("b", 2)]);
    /// let set = PersistentHashSet::from_map(&map);
    /// assert!(set.contains("a"));
    /// assert_eq!(set.len(), 2);
    /// ```
    #[must_use]
    pub fn from_map<V>(map: &PersistentHashMap<T, V>) -> Self {
        map.keys()
            .fold(Self::empty(), |set, key| set.insert(key.clone()))
    }

    /// Returns `true` if the set contains the specified element.
    ///
    /// The element may be any borrowed form of the set's element type, but
    /// `Hash` and `Eq` on the borrowed form must match those for the
    /// element type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashSet;
    ///
    /// let set = PersistentHashSet::singleton("hello".to_string());
    /// assert!(set.contains("hello"));
    /// assert!(!set.contains("world"));
    /// ```
    #[must_use]
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(element)
    }

    /// Adds an element to the set.
    ///
    /// Inserting a member the set already holds yields an equal set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashSet;
    ///
    /// let set = PersistentHashSet::empty().insert(1);
    /// let grown = set.insert(2);
    ///
    /// assert_eq!(set.len(), 1);   // Original unchanged
    /// assert_eq!(grown.len(), 2); // New version
    /// ```
    #[must_use]
    pub fn insert(&self, element: T) -> Self {
        Self {
            inner: self.inner.add(element, ()),
        }
    }

    /// Adds every element of `elements` to the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashSet;
    ///
    /// let set = PersistentHashSet::singleton(1).insert_all([2, 3, 2]);
    /// assert_eq!(set.len(), 3);
    /// ```
    #[must_use]
    pub fn insert_all<I: IntoIterator<Item = T>>(&self, elements: I) -> Self {
        elements
            .into_iter()
            .fold(self.clone(), |set, element| set.insert(element))
    }

    /// Removes an element from the set.
    ///
    /// An absent element returns the set unchanged (identity-shared, no
    /// allocation).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashSet;
    ///
    /// let set = PersistentHashSet::of([1, 2]);
    /// let deleted = set.delete(&1);
    ///
    /// assert_eq!(set.len(), 2);     // Original unchanged
    /// assert_eq!(deleted.len(), 1); // New version
    /// assert!(!deleted.contains(&1));
    /// ```
    #[must_use]
    pub fn delete<Q>(&self, element: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Self {
            inner: self.inner.delete(element),
        }
    }

    /// Removes every element of `elements` from the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentHashSet;
    ///
    /// let set = PersistentHashSet::of([1, 2, 3]);
    /// let deleted = set.delete_all([1, 3, 9]);
    /// assert_eq!(deleted.len(), 1);
    /// ```
    #[must_use]
    pub fn delete_all<I: IntoIterator<Item = T>>(&self, elements: I) -> Self {
        Self {
            inner: self.inner.delete_all(elements),
        }
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// A lazy iterator over the elements of a [`PersistentHashSet`].
pub struct PersistentHashSetIterator<'a, T> {
    entries: PersistentHashMapIterator<'a, T, ()>,
}

impl<'a, T> Iterator for PersistentHashSetIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(|(element, _)| element)
    }
}

/// An owning iterator over the elements of a [`PersistentHashSet`].
pub struct PersistentHashSetIntoIterator<T> {
    entries: crate::map::PersistentHashMapIntoIterator<T, ()>,
}

impl<T> Iterator for PersistentHashSetIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(|(element, _)| element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for PersistentHashSet<T> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Clone + Hash + Eq> FromIterator<T> for PersistentHashSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |set, element| set.insert(element))
    }
}

impl<T: Clone> IntoIterator for PersistentHashSet<T> {
    type Item = T;
    type IntoIter = PersistentHashSetIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        PersistentHashSetIntoIterator {
            entries: self.inner.into_iter(),
        }
    }
}

impl<'a, T> IntoIterator for &'a PersistentHashSet<T> {
    type Item = &'a T;
    type IntoIter = PersistentHashSetIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone + Hash + Eq> PartialEq for PersistentHashSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|element| other.contains(element))
    }
}

impl<T: Clone + Hash + Eq> Eq for PersistentHashSet<T> {}

impl<T: fmt::Debug> fmt::Debug for PersistentHashSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for PersistentHashSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for element in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Serde Implementations
// =============================================================================

#[cfg(feature = "serde")]
impl<T> serde::Serialize for PersistentHashSet<T>
where
    T: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut sequence = serializer.serialize_seq(Some(self.len()))?;
        for element in self {
            sequence.serialize_element(element)?;
        }
        sequence.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentHashSetVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<T> PersistentHashSetVisitor<T> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for PersistentHashSetVisitor<T>
where
    T: serde::Deserialize<'de> + Clone + Hash + Eq,
{
    type Value = PersistentHashSet<T>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a sequence of set elements")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut set = PersistentHashSet::empty();
        while let Some(element) = access.next_element()? {
            set = set.insert(element);
        }
        Ok(set)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for PersistentHashSet<T>
where
    T: serde::Deserialize<'de> + Clone + Hash + Eq,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(PersistentHashSetVisitor::new())
    }
}

// =============================================================================
// Compile-time Assertions
// =============================================================================

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentHashSet<i32>: Send, Sync);
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentHashSet<i32>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // =========================================================================
    // Construction Tests
    // =========================================================================

    #[rstest]
    fn test_empty_creates_empty() {
        let set: PersistentHashSet<i32> = PersistentHashSet::empty();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[rstest]
    fn test_singleton() {
        let set = PersistentHashSet::singleton(42);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&42));
    }

    #[rstest]
    fn test_of_collapses_duplicates() {
        let set = PersistentHashSet::of([1, 2, 2, 3, 1]);
        assert_eq!(set.len(), 3);
    }

    #[rstest]
    fn test_from_map_keeps_keys_drops_values() {
        let map = PersistentHashMap::of([("a", 1), ("b", 2)]);
        let set = PersistentHashSet::from_map(&map);
        assert_eq!(set.len(), 2);
        assert!(set.contains("a"));
        assert!(set.contains("b"));
    }

    // =========================================================================
    // insert / delete Tests
    // =========================================================================

    #[rstest]
    fn test_insert_preserves_original() {
        let set = PersistentHashSet::singleton(1);
        let grown = set.insert(2);
        assert_eq!(set.len(), 1);
        assert_eq!(grown.len(), 2);
        assert!(!set.contains(&2));
    }

    #[rstest]
    fn test_insert_existing_member_keeps_size() {
        let set = PersistentHashSet::of([1, 2]);
        let same = set.insert(2);
        assert_eq!(same.len(), 2);
        assert_eq!(same, set);
    }

    #[rstest]
    fn test_insert_all() {
        let set = PersistentHashSet::singleton(1).insert_all([2, 3, 2]);
        assert_eq!(set.len(), 3);
    }

    #[rstest]
    fn test_delete_member() {
        let set = PersistentHashSet::of([1, 2]);
        let deleted = set.delete(&1);
        assert_eq!(deleted.len(), 1);
        assert!(!deleted.contains(&1));
        assert!(set.contains(&1));
    }

    #[rstest]
    fn test_delete_absent_is_noop() {
        let set = PersistentHashSet::of([1, 2]);
        let deleted = set.delete(&9);
        assert_eq!(deleted, set);
        assert_eq!(deleted.len(), 2);
    }

    #[rstest]
    fn test_delete_all() {
        let set = PersistentHashSet::of([1, 2, 3]);
        let deleted = set.delete_all([1, 3, 9]);
        assert_eq!(deleted.len(), 1);
        assert!(deleted.contains(&2));
    }

    // =========================================================================
    // contains / Iterator Tests
    // =========================================================================

    #[rstest]
    fn test_contains_with_borrowed_element() {
        let set = PersistentHashSet::singleton("hello".to_string());
        assert!(set.contains("hello"));
        assert!(!set.contains("world"));
    }

    #[rstest]
    fn test_iter_yields_distinct_elements() {
        let set = PersistentHashSet::of([3, 1, 2]);
        let mut elements: Vec<i32> = set.iter().copied().collect();
        elements.sort_unstable();
        assert_eq!(elements, vec![1, 2, 3]);
    }

    #[rstest]
    fn test_into_iter() {
        let set = PersistentHashSet::of([1, 2]);
        let mut elements: Vec<i32> = set.into_iter().collect();
        elements.sort_unstable();
        assert_eq!(elements, vec![1, 2]);
    }

    // =========================================================================
    // Trait Tests
    // =========================================================================

    #[rstest]
    fn test_eq_ignores_insertion_order() {
        let left = PersistentHashSet::of([1, 2, 3]);
        let right = PersistentHashSet::of([3, 2, 1]);
        assert_eq!(left, right);
    }

    #[rstest]
    fn test_default_is_empty() {
        let set: PersistentHashSet<i32> = PersistentHashSet::default();
        assert!(set.is_empty());
    }

    #[rstest]
    fn test_debug() {
        let set = PersistentHashSet::singleton(1);
        assert_eq!(format!("{set:?}"), "{1}");
    }

    #[rstest]
    fn test_display_empty() {
        let set: PersistentHashSet<i32> = PersistentHashSet::empty();
        assert_eq!(format!("{set}"), "{}");
    }
}
