//! Persistent (immutable) singly-linked sequence.
//!
//! This module provides [`PersistentSequence`], an immutable cons-list
//! that uses structural sharing for efficient operations. It is the
//! structural-sharing engine of the crate: [`PersistentHashMap`] stores its
//! collision buckets as sequences of entries.
//!
//! # Overview
//!
//! `PersistentSequence` provides:
//!
//! - O(1) prepend
//! - O(1) first/rest access
//! - O(1) length queries (cached at construction)
//! - O(i) positional insertion and prefix rebuilding
//! - O(n) value-based deletion and slicing
//!
//! All operations return new sequences without modifying the original, and
//! structural sharing ensures that untouched suffixes are reused rather
//! than copied.
//!
//! # Examples
//!
//! ```rust
//! use keepsake::PersistentSequence;
//!
//! let sequence = PersistentSequence::empty().prepend(3).prepend(2).prepend(1);
//! assert_eq!(sequence.first(), Ok(&1));
//! assert_eq!(sequence.len(), 3);
//!
//! // Structural sharing: the original sequence is preserved
//! let extended = sequence.prepend(0);
//! assert_eq!(sequence.len(), 3);  // Original unchanged
//! assert_eq!(extended.len(), 4);  // New sequence with prepended element
//! ```
//!
//! # Structural Sharing
//!
//! When you create a new sequence by prepending an element, the new
//! sequence shares all nodes with the original:
//!
//! ```text
//! s1: 1 -> 2 -> 3 -> empty
//! s2 = s1.prepend(0): 0 -> [1 -> 2 -> 3 -> empty]  // shares [1, 2, 3] with s1
//! ```
//!
//! Deletion and slicing share every node below the last rebuilt position;
//! deleting the head element allocates nothing at all.
//!
//! [`PersistentHashMap`]: crate::PersistentHashMap

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

use crate::ReferenceCounter;
use crate::error::CollectionError;

/// Internal node structure for the persistent sequence.
///
/// Each node owns an element and shares its remainder through a reference
/// count; `None` is the canonical empty remainder.
struct Node<T> {
    /// The element stored in this node.
    element: T,
    /// The remainder of the sequence after this node.
    rest: Option<ReferenceCounter<Self>>,
}

/// A persistent (immutable) singly-linked sequence.
///
/// `PersistentSequence` is an immutable data structure that uses structural
/// sharing to efficiently support functional programming patterns. Nodes
/// are never mutated after construction; a node is released only when the
/// last sequence value holding a path to it is dropped.
///
/// The canonical empty sequence is a compile-time constant (`None` head),
/// so it is shared by construction and can never be re-initialized.
///
/// # Time Complexity
///
/// | Operation      | Complexity |
/// |----------------|------------|
/// | `empty`        | O(1)       |
/// | `prepend`      | O(1)       |
/// | `first`        | O(1)       |
/// | `rest`         | O(1)       |
/// | `len`          | O(1)       |
/// | `get`          | O(n)       |
/// | `prepend_at`   | O(i)       |
/// | `delete`       | O(n)       |
/// | `sublist`      | O(to)      |
/// | `sublist_from` | O(from)    |
///
/// # Examples
///
/// ```rust
/// use keepsake::PersistentSequence;
///
/// let sequence = PersistentSequence::singleton(42);
/// assert_eq!(sequence.first(), Ok(&42));
/// ```
#[derive(Clone)]
pub struct PersistentSequence<T> {
    /// Reference to the head node (if any).
    head: Option<ReferenceCounter<Node<T>>>,
    /// Cached length for O(1) size queries.
    length: usize,
}

impl<T> PersistentSequence<T> {
    /// Returns the canonical empty sequence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = PersistentSequence::empty();
    /// assert!(sequence.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            head: None,
            length: 0,
        }
    }

    /// Creates a sequence containing a single element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::singleton(42);
    /// assert_eq!(sequence.first(), Ok(&42));
    /// assert_eq!(sequence.len(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self::empty().prepend(element)
    }

    /// Prepends an element to the front of the sequence.
    ///
    /// This operation creates a new sequence with the element at the front,
    /// sharing the entire structure of the original sequence.
    ///
    /// # Complexity
    ///
    /// O(1) time and space
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::empty().prepend(3).prepend(2).prepend(1);
    /// assert_eq!(sequence.first(), Ok(&1));
    /// assert_eq!(sequence.len(), 3);
    /// ```
    #[inline]
    #[must_use]
    pub fn prepend(&self, element: T) -> Self {
        Self {
            head: Some(ReferenceCounter::new(Node {
                element,
                rest: self.head.clone(),
            })),
            length: self.length + 1,
        }
    }

    /// Returns a reference to the first element of the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::EmptyCollection`] if the sequence is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::empty().prepend(2).prepend(1);
    /// assert_eq!(sequence.first(), Ok(&1));
    ///
    /// let empty: PersistentSequence<i32> = PersistentSequence::empty();
    /// assert!(empty.first().is_err());
    /// ```
    #[inline]
    pub fn first(&self) -> Result<&T, CollectionError> {
        self.head
            .as_ref()
            .map(|node| &node.element)
            .ok_or(CollectionError::EmptyCollection { operation: "first" })
    }

    /// Returns the sequence without its first element.
    ///
    /// The returned sequence shares its entire structure with the original;
    /// no node is copied.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::EmptyCollection`] if the sequence is empty.
    ///
    /// # Complexity
    ///
    /// O(1) time and space
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::empty().prepend(3).prepend(2).prepend(1);
    /// let rest = sequence.rest().unwrap();
    /// assert_eq!(rest.first(), Ok(&2));
    /// assert_eq!(rest.len(), 2);
    /// ```
    pub fn rest(&self) -> Result<Self, CollectionError> {
        self.head
            .as_ref()
            .map(|node| Self {
                head: node.rest.clone(),
                length: self.length - 1,
            })
            .ok_or(CollectionError::EmptyCollection { operation: "rest" })
    }

    /// Decomposes the sequence into its first element and remainder.
    ///
    /// Returns `None` if the sequence is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::empty().prepend(2).prepend(1);
    /// if let Some((first, rest)) = sequence.uncons() {
    ///     assert_eq!(*first, 1);
    ///     assert_eq!(rest.first(), Ok(&2));
    /// }
    /// ```
    #[must_use]
    pub fn uncons(&self) -> Option<(&T, Self)> {
        self.head.as_ref().map(|node| {
            let rest = Self {
                head: node.rest.clone(),
                length: self.length - 1,
            };
            (&node.element, rest)
        })
    }

    /// Returns a reference to the element at the given index.
    ///
    /// Returns `None` if the index is out of bounds.
    ///
    /// # Complexity
    ///
    /// O(index)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::of([1, 2, 3]);
    /// assert_eq!(sequence.get(0), Some(&1));
    /// assert_eq!(sequence.get(2), Some(&3));
    /// assert_eq!(sequence.get(10), None);
    /// ```
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        let mut current = &self.head;
        let mut remaining = index;

        while let Some(node) = current {
            if remaining == 0 {
                return Some(&node.element);
            }
            remaining -= 1;
            current = &node.rest;
        }
        None
    }

    /// Returns the number of elements in the sequence.
    ///
    /// # Complexity
    ///
    /// O(1) — the length is cached at construction
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the sequence contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns an iterator over references to the elements, front to back.
    ///
    /// The iterator itself is stateful; the underlying sequence is
    /// immutable and can be iterated again by creating a fresh iterator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::of([1, 2, 3]);
    /// let collected: Vec<&i32> = sequence.iter().collect();
    /// assert_eq!(collected, vec![&1, &2, &3]);
    /// ```
    #[inline]
    #[must_use]
    pub const fn iter(&self) -> PersistentSequenceIterator<'_, T> {
        PersistentSequenceIterator {
            current: self.head.as_ref(),
        }
    }

    /// Returns the shared suffix starting at `from`.
    ///
    /// Caller guarantees `from <= self.length`.
    fn suffix_at(&self, from: usize) -> Self {
        let mut node = self.head.as_ref();
        for _ in 0..from {
            node = node.and_then(|node_ref| node_ref.rest.as_ref());
        }
        Self {
            head: node.cloned(),
            length: self.length - from,
        }
    }
}

impl<T: Clone> PersistentSequence<T> {
    /// Builds a sequence from a Vec efficiently.
    ///
    /// Uses `Vec::pop()` to consume elements from the end, which is O(1),
    /// avoiding the need for reverse iteration.
    fn build_from_vec(mut elements: Vec<T>) -> Self {
        let length = elements.len();
        if length == 0 {
            return Self::empty();
        }

        // Build from end to start using Vec::pop()
        let mut head: Option<ReferenceCounter<Node<T>>> = None;
        while let Some(element) = elements.pop() {
            head = Some(ReferenceCounter::new(Node {
                element,
                rest: head,
            }));
        }

        Self { head, length }
    }

    /// Creates a sequence from any iterable, preserving its order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::of(vec![1, 2, 3]);
    /// assert_eq!(sequence.first(), Ok(&1));
    /// assert_eq!(sequence.len(), 3);
    /// ```
    #[must_use]
    pub fn of<I: IntoIterator<Item = T>>(elements: I) -> Self {
        elements.into_iter().collect()
    }

    /// Creates a sequence from a slice, preserving its order.
    ///
    /// # Complexity
    ///
    /// O(n) where n = `slice.len()`
    #[must_use]
    pub fn from_slice(slice: &[T]) -> Self {
        let length = slice.len();
        if length == 0 {
            return Self::empty();
        }

        let mut head: Option<ReferenceCounter<Node<T>>> = None;
        for element in slice.iter().rev() {
            head = Some(ReferenceCounter::new(Node {
                element: element.clone(),
                rest: head,
            }));
        }

        Self { head, length }
    }

    /// Prepends every element of `elements` to the front of the sequence.
    ///
    /// Each element is prepended in turn, so the input lands in reverse
    /// order at the front: `sequence.prepend_all([1, 2, 3])` is equivalent
    /// to `sequence.prepend(1).prepend(2).prepend(3)`.
    ///
    /// # Complexity
    ///
    /// O(m) where m is the number of prepended elements
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::of([4, 5]);
    /// let extended = sequence.prepend_all([3, 2, 1]);
    /// assert_eq!(extended.to_vec(), vec![1, 2, 3, 4, 5]);
    /// ```
    #[must_use]
    pub fn prepend_all<I: IntoIterator<Item = T>>(&self, elements: I) -> Self {
        elements
            .into_iter()
            .fold(self.clone(), |sequence, element| sequence.prepend(element))
    }

    /// Inserts an element so that it becomes position `index`.
    ///
    /// Rebuilds the prefix above `index` and shares the suffix below it
    /// with the original sequence.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::IndexOutOfBounds`] if `index > len`.
    /// `index == len` appends at the back.
    ///
    /// # Complexity
    ///
    /// O(index) time and space
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::of([1, 3]);
    /// let inserted = sequence.prepend_at(1, 2).unwrap();
    /// assert_eq!(inserted.to_vec(), vec![1, 2, 3]);
    ///
    /// assert!(sequence.prepend_at(5, 9).is_err());
    /// ```
    pub fn prepend_at(&self, index: usize, element: T) -> Result<Self, CollectionError> {
        if index > self.length {
            return Err(CollectionError::IndexOutOfBounds { index });
        }
        Ok(Self {
            head: Self::prepend_at_node(self.head.as_ref(), index, element),
            length: self.length + 1,
        })
    }

    /// Recursive helper for `prepend_at`: copies the prefix, shares the rest.
    fn prepend_at_node(
        node: Option<&ReferenceCounter<Node<T>>>,
        index: usize,
        element: T,
    ) -> Option<ReferenceCounter<Node<T>>> {
        if index == 0 {
            return Some(ReferenceCounter::new(Node {
                element,
                rest: node.cloned(),
            }));
        }
        node.map(|node_ref| {
            ReferenceCounter::new(Node {
                element: node_ref.element.clone(),
                rest: Self::prepend_at_node(node_ref.rest.as_ref(), index - 1, element),
            })
        })
    }

    /// Inserts every element of `elements` at position `index`.
    ///
    /// The inserted run follows [`prepend_all`]'s order: the input lands in
    /// reverse order at the insertion point. The empty sequence has no
    /// insertion interior; use [`prepend_all`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::EmptyCollection`] on the empty sequence
    /// and [`CollectionError::IndexOutOfBounds`] if `index > len`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::of([1, 4]);
    /// let inserted = sequence.prepend_all_at(1, [3, 2]).unwrap();
    /// assert_eq!(inserted.to_vec(), vec![1, 2, 3, 4]);
    /// ```
    ///
    /// [`prepend_all`]: PersistentSequence::prepend_all
    pub fn prepend_all_at<I: IntoIterator<Item = T>>(
        &self,
        index: usize,
        elements: I,
    ) -> Result<Self, CollectionError> {
        if self.is_empty() {
            return Err(CollectionError::EmptyCollection {
                operation: "prepend_all_at",
            });
        }
        if index > self.length {
            return Err(CollectionError::IndexOutOfBounds { index });
        }

        let inserted = self.suffix_at(index).prepend_all(elements);
        let mut prefix: Vec<T> = self.iter().take(index).cloned().collect();

        let mut head = inserted.head;
        let mut length = inserted.length;
        while let Some(element) = prefix.pop() {
            head = Some(ReferenceCounter::new(Node {
                element,
                rest: head,
            }));
            length += 1;
        }

        Ok(Self { head, length })
    }

    /// Returns the suffix of the sequence starting at `from`.
    ///
    /// The suffix is shared with the original sequence, not copied; in
    /// particular `sublist_from(0)` returns the sequence itself unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::EmptyCollection`] on the empty sequence
    /// and [`CollectionError::IndexOutOfBounds`] if `from > len`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::of([1, 2, 3, 4]);
    /// let suffix = sequence.sublist_from(2).unwrap();
    /// assert_eq!(suffix.to_vec(), vec![3, 4]);
    /// ```
    pub fn sublist_from(&self, from: usize) -> Result<Self, CollectionError> {
        if self.is_empty() {
            return Err(CollectionError::EmptyCollection {
                operation: "sublist_from",
            });
        }
        if from > self.length {
            return Err(CollectionError::IndexOutOfBounds { index: from });
        }
        Ok(self.suffix_at(from))
    }

    /// Returns the half-open range `[from, to)` of the sequence.
    ///
    /// When `to == len` the suffix below `from` is shared with the original
    /// sequence; otherwise the selected run is rebuilt. `from == to` yields
    /// the canonical empty sequence.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::IndexOutOfBounds`] if `to > len` or
    /// `from > to`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::of([1, 2, 3, 4]);
    /// assert_eq!(sequence.sublist(1, 3).unwrap().to_vec(), vec![2, 3]);
    /// assert_eq!(sequence.sublist(0, 4).unwrap(), sequence);
    /// assert!(sequence.sublist(3, 2).is_err());
    /// ```
    pub fn sublist(&self, from: usize, to: usize) -> Result<Self, CollectionError> {
        if to > self.length {
            return Err(CollectionError::IndexOutOfBounds { index: to });
        }
        if from > to {
            return Err(CollectionError::IndexOutOfBounds { index: from });
        }
        if from == to {
            return Ok(Self::empty());
        }
        if to == self.length {
            return self.sublist_from(from);
        }
        Ok(Self {
            head: Self::sublist_node(self.head.as_ref(), from, to),
            length: to - from,
        })
    }

    /// Recursive helper for `sublist`: discards the prefix before `from`,
    /// then copies `to - from` nodes.
    fn sublist_node(
        node: Option<&ReferenceCounter<Node<T>>>,
        from: usize,
        to: usize,
    ) -> Option<ReferenceCounter<Node<T>>> {
        let node_ref = node?;
        if from > 0 {
            return Self::sublist_node(node_ref.rest.as_ref(), from - 1, to - 1);
        }
        if to == 0 {
            return None;
        }
        Some(ReferenceCounter::new(Node {
            element: node_ref.element.clone(),
            rest: Self::sublist_node(node_ref.rest.as_ref(), 0, to - 1),
        }))
    }

    /// Collects the elements into a `Vec`, preserving order.
    ///
    /// This is the bridge to standard collections; `PersistentSequence::of(xs).to_vec()`
    /// yields `xs` back for any finite input.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// Returns a cursor positioned before the first element.
    ///
    /// See [`SequenceCursor`] for the cursor contract.
    #[must_use]
    pub fn cursor(&self) -> SequenceCursor<T> {
        SequenceCursor::new(self.clone(), 0)
    }

    /// Returns a cursor positioned before the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::IndexOutOfBounds`] if `index > len`.
    pub fn cursor_at(&self, index: usize) -> Result<SequenceCursor<T>, CollectionError> {
        if index > self.length {
            return Err(CollectionError::IndexOutOfBounds { index });
        }
        Ok(SequenceCursor::new(self.clone(), index))
    }
}

impl<T: Clone + PartialEq> PersistentSequence<T> {
    /// Removes the first occurrence of an element equal to `element`.
    ///
    /// Scans front to back. If the head matches, the shared remainder is
    /// returned directly with no allocation; an interior match rebuilds
    /// only the prefix up to the matched node. If no occurrence exists the
    /// sequence is returned unchanged (identity-shared).
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::EmptyCollection`] only when invoked on
    /// the empty sequence.
    ///
    /// # Complexity
    ///
    /// O(k) where k is the position of the first match
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::of([1, 2, 3, 2]);
    /// let deleted = sequence.delete(&2).unwrap();
    /// assert_eq!(deleted.to_vec(), vec![1, 3, 2]);
    ///
    /// // Absent values leave the sequence unchanged
    /// assert_eq!(sequence.delete(&9).unwrap(), sequence);
    /// ```
    pub fn delete(&self, element: &T) -> Result<Self, CollectionError> {
        let head = self
            .head
            .as_ref()
            .ok_or(CollectionError::EmptyCollection { operation: "delete" })?;
        match Self::delete_from_node(head, element) {
            Some(new_head) => Ok(Self {
                head: new_head,
                length: self.length - 1,
            }),
            None => Ok(self.clone()),
        }
    }

    /// Recursive helper for `delete`.
    ///
    /// Returns `None` when no occurrence was found (nothing changed), or
    /// `Some(chain)` with the matched node removed and the prefix rebuilt.
    fn delete_from_node(
        node: &ReferenceCounter<Node<T>>,
        element: &T,
    ) -> Option<Option<ReferenceCounter<Node<T>>>> {
        if node.element == *element {
            return Some(node.rest.clone());
        }
        let rest = node.rest.as_ref()?;
        let without_element = Self::delete_from_node(rest, element)?;
        Some(Some(ReferenceCounter::new(Node {
            element: node.element.clone(),
            rest: without_element,
        })))
    }

    /// Removes every occurrence of every value in `elements`.
    ///
    /// Each occurrence in the sequence is dropped if its value appears in
    /// the removal set, regardless of multiplicity on either side. Order is
    /// preserved and every suffix with no removals is shared untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::EmptyCollection`] only when invoked on
    /// the empty sequence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::of([1, 2, 1, 3, 2]);
    /// let deleted = sequence.delete_all([1, 2]).unwrap();
    /// assert_eq!(deleted.to_vec(), vec![3]);
    /// ```
    pub fn delete_all<I: IntoIterator<Item = T>>(
        &self,
        elements: I,
    ) -> Result<Self, CollectionError> {
        if self.is_empty() {
            return Err(CollectionError::EmptyCollection {
                operation: "delete_all",
            });
        }
        let removals: Vec<T> = elements.into_iter().collect();
        if removals.is_empty() {
            return Ok(self.clone());
        }
        let (head, removed) = Self::delete_all_from_node(self.head.as_ref(), &removals);
        if removed == 0 {
            return Ok(self.clone());
        }
        Ok(Self {
            head,
            length: self.length - removed,
        })
    }

    /// Recursive helper for `delete_all`: shares any suffix with no removals.
    fn delete_all_from_node(
        node: Option<&ReferenceCounter<Node<T>>>,
        removals: &[T],
    ) -> (Option<ReferenceCounter<Node<T>>>, usize) {
        match node {
            None => (None, 0),
            Some(node_ref) => {
                let (rest, removed) = Self::delete_all_from_node(node_ref.rest.as_ref(), removals);
                if removals.contains(&node_ref.element) {
                    (rest, removed + 1)
                } else if removed == 0 {
                    (Some(node_ref.clone()), 0)
                } else {
                    (
                        Some(ReferenceCounter::new(Node {
                            element: node_ref.element.clone(),
                            rest,
                        })),
                        removed,
                    )
                }
            }
        }
    }

    /// Removes the element at the given position.
    ///
    /// Resolves the value at `index` and deletes its first equal
    /// occurrence; when the sequence holds duplicates of that value the
    /// earliest one is removed.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::IndexOutOfBounds`] if `index >= len`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keepsake::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::of([1, 2, 3]);
    /// let deleted = sequence.delete_at(1).unwrap();
    /// assert_eq!(deleted.to_vec(), vec![1, 3]);
    /// ```
    pub fn delete_at(&self, index: usize) -> Result<Self, CollectionError> {
        let element = self
            .get(index)
            .ok_or(CollectionError::IndexOutOfBounds { index })?
            .clone();
        self.delete(&element)
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// A stateful, bidirectional cursor over a [`PersistentSequence`].
///
/// The cursor walks forward in O(1) per step by holding the remaining
/// suffix. Stepping backward re-derives the suffix from the captured
/// absolute position, which costs O(position) — the sequence is singly
/// linked, so there is no cheap backward pointer to follow.
///
/// Cursors never mutate: [`insert`], [`remove`] and [`set`] are rejected
/// with [`CollectionError::UnsupportedMutation`]. The underlying sequence
/// is unaffected by cursor movement and can be iterated again with a fresh
/// cursor.
///
/// # Examples
///
/// ```rust
/// use keepsake::PersistentSequence;
///
/// let sequence = PersistentSequence::of([1, 2, 3]);
/// let mut cursor = sequence.cursor();
///
/// assert_eq!(cursor.next(), Some(1));
/// assert_eq!(cursor.next(), Some(2));
/// assert_eq!(cursor.previous(), Some(2));
/// assert!(cursor.insert(9).is_err());
/// ```
///
/// [`insert`]: SequenceCursor::insert
/// [`remove`]: SequenceCursor::remove
/// [`set`]: SequenceCursor::set
pub struct SequenceCursor<T> {
    /// The full sequence, retained for backward re-derivation.
    sequence: PersistentSequence<T>,
    /// The suffix still ahead of the cursor.
    suffix: PersistentSequence<T>,
    /// Absolute position of the cursor within `sequence`.
    position: usize,
}

impl<T: Clone> SequenceCursor<T> {
    /// Creates a cursor positioned before the element at `position`.
    ///
    /// Caller guarantees `position <= sequence.len()`.
    fn new(sequence: PersistentSequence<T>, position: usize) -> Self {
        let suffix = sequence.suffix_at(position);
        Self {
            sequence,
            suffix,
            position,
        }
    }

    /// Returns `true` if an element lies ahead of the cursor.
    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.suffix.is_empty()
    }

    /// Returns `true` if an element lies behind the cursor.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.position > 0
    }

    /// Returns the position of the element a call to `next` would yield.
    #[must_use]
    pub const fn next_index(&self) -> usize {
        self.position
    }

    /// Returns the position of the element a call to `previous` would
    /// yield, or `None` at the front.
    #[must_use]
    pub const fn previous_index(&self) -> Option<usize> {
        self.position.checked_sub(1)
    }

    /// Yields the next element and advances the cursor.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<T> {
        let (element, rest) = {
            let (element, rest) = self.suffix.uncons()?;
            (element.clone(), rest)
        };
        self.suffix = rest;
        self.position += 1;
        Some(element)
    }

    /// Yields the previous element and moves the cursor back.
    ///
    /// # Complexity
    ///
    /// O(position) — the suffix is re-derived from the front
    pub fn previous(&mut self) -> Option<T> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        self.suffix = self.sequence.suffix_at(self.position);
        self.suffix.first().ok().cloned()
    }

    /// Rejected: cursors cannot insert into a persistent sequence.
    ///
    /// # Errors
    ///
    /// Always returns [`CollectionError::UnsupportedMutation`].
    pub fn insert(&mut self, _element: T) -> Result<(), CollectionError> {
        Err(CollectionError::UnsupportedMutation {
            operation: "insert",
        })
    }

    /// Rejected: cursors cannot remove from a persistent sequence.
    ///
    /// # Errors
    ///
    /// Always returns [`CollectionError::UnsupportedMutation`].
    pub fn remove(&mut self) -> Result<(), CollectionError> {
        Err(CollectionError::UnsupportedMutation {
            operation: "remove",
        })
    }

    /// Rejected: cursors cannot overwrite elements of a persistent
    /// sequence.
    ///
    /// # Errors
    ///
    /// Always returns [`CollectionError::UnsupportedMutation`].
    pub fn set(&mut self, _element: T) -> Result<(), CollectionError> {
        Err(CollectionError::UnsupportedMutation { operation: "set" })
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over references to elements of a [`PersistentSequence`].
pub struct PersistentSequenceIterator<'a, T> {
    current: Option<&'a ReferenceCounter<Node<T>>>,
}

impl<T> PersistentSequenceIterator<'_, T> {
    /// An exhausted iterator, used to seed flattening iterators.
    pub(crate) const fn exhausted() -> Self {
        Self { current: None }
    }
}

impl<'a, T> Iterator for PersistentSequenceIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.current.map(|node| {
            self.current = node.rest.as_ref();
            &node.element
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // The remaining length is not tracked; only the trivial bounds hold.
        (0, None)
    }
}

/// An owning iterator over elements of a [`PersistentSequence`].
pub struct PersistentSequenceIntoIterator<T> {
    sequence: PersistentSequence<T>,
}

impl<T: Clone> Iterator for PersistentSequenceIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((first, rest)) = self.sequence.uncons() {
            let element = first.clone();
            self.sequence = rest;
            Some(element)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.sequence.length, Some(self.sequence.length))
    }
}

impl<T: Clone> ExactSizeIterator for PersistentSequenceIntoIterator<T> {
    fn len(&self) -> usize {
        self.sequence.length
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for PersistentSequence<T> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Clone> FromIterator<T> for PersistentSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let elements: Vec<T> = iter.into_iter().collect();
        Self::build_from_vec(elements)
    }
}

impl<T: Clone> IntoIterator for PersistentSequence<T> {
    type Item = T;
    type IntoIter = PersistentSequenceIntoIterator<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        PersistentSequenceIntoIterator { sequence: self }
    }
}

impl<'a, T> IntoIterator for &'a PersistentSequence<T> {
    type Item = &'a T;
    type IntoIter = PersistentSequenceIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for PersistentSequence<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for PersistentSequence<T> {}

impl<T: Hash> Hash for PersistentSequence<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the length first to distinguish sequences of different lengths
        self.length.hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentSequence<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for PersistentSequence<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        let mut first = true;
        for element in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

// =============================================================================
// Serde Implementations
// =============================================================================

#[cfg(feature = "serde")]
impl<T> serde::Serialize for PersistentSequence<T>
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
struct PersistentSequenceVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<T> PersistentSequenceVisitor<T> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for PersistentSequenceVisitor<T>
where
    T: serde::Deserialize<'de> + Clone,
{
    type Value = PersistentSequence<T>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut elements = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(element) = access.next_element()? {
            elements.push(element);
        }
        Ok(PersistentSequence::of(elements))
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for PersistentSequence<T>
where
    T: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(PersistentSequenceVisitor::new())
    }
}

// =============================================================================
// Compile-time Assertions
// =============================================================================

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentSequence<i32>: Send, Sync);
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentSequence<i32>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cached_length_matches_walked_length(elements in proptest::collection::vec(any::<i32>(), 0..64)) {
            let sequence = PersistentSequence::of(elements);
            let mut current = sequence.clone();
            let mut walked = 0;
            while !current.is_empty() {
                walked += 1;
                current = current.rest().unwrap();
            }
            prop_assert_eq!(walked, sequence.len());
        }

        #[test]
        fn round_trip_preserves_elements(elements in proptest::collection::vec(any::<i32>(), 0..64)) {
            let sequence = PersistentSequence::of(elements.clone());
            prop_assert_eq!(sequence.to_vec(), elements);
        }

        #[test]
        fn prepend_never_alters_original(elements in proptest::collection::vec(any::<i32>(), 0..32), extra in any::<i32>()) {
            let sequence = PersistentSequence::of(elements.clone());
            let _ = sequence.prepend(extra);
            prop_assert_eq!(sequence.to_vec(), elements);
        }

        #[test]
        fn delete_removes_exactly_first_occurrence(
            elements in proptest::collection::vec(0i32..8, 1..32),
            target in 0i32..8,
        ) {
            let sequence = PersistentSequence::of(elements.clone());
            let deleted = sequence.delete(&target).unwrap();
            let mut expected = elements;
            if let Some(position) = expected.iter().position(|element| *element == target) {
                expected.remove(position);
            }
            prop_assert_eq!(deleted.to_vec(), expected);
        }

        #[test]
        fn sublist_matches_slice_semantics(
            elements in proptest::collection::vec(any::<i32>(), 0..32),
            from in 0usize..40,
            to in 0usize..40,
        ) {
            let sequence = PersistentSequence::of(elements.clone());
            let result = sequence.sublist(from, to);
            if to <= elements.len() && from <= to {
                prop_assert_eq!(result.unwrap().to_vec(), elements[from..to].to_vec());
            } else {
                prop_assert!(result.is_err());
            }
        }
    }
}
