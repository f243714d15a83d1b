//! # keepsake
//!
//! Persistent (immutable, structurally shared) collections for Rust: a
//! singly-linked sequence, a hash-bucketed map, and a set derived from the
//! map.
//!
//! ## Overview
//!
//! Every "mutating" operation returns a *new* collection value; the
//! original is untouched and remains valid, and unrelated structure is
//! shared — not copied — between the old and new versions:
//!
//! - [`PersistentSequence`]: an immutable cons-list with O(1) prepend and
//!   cached length; also the storage for the map's collision buckets.
//! - [`PersistentHashMap`]: a two-level hash table — an outer index from
//!   hash codes to buckets of entries — where every mutation touches
//!   exactly one bucket and one index path.
//! - [`PersistentHashSet`]: a thin wrapper over the map with a unit value
//!   payload.
//!
//! ## Feature Flags
//!
//! - `arc`: share nodes with `Arc` instead of `Rc`, making the collections
//!   `Send`/`Sync` for thread-safe sharing.
//! - `serde`: `Serialize`/`Deserialize` implementations for all three
//!   collections.
//!
//! ## Example
//!
//! ```rust
//! use keepsake::{PersistentHashMap, PersistentSequence};
//!
//! let sequence = PersistentSequence::empty().prepend(3).prepend(5);
//! assert_eq!(sequence.first(), Ok(&5));
//! assert_eq!(sequence.rest().unwrap().first(), Ok(&3));
//!
//! let map = PersistentHashMap::empty().add("a", 1).add("b", 2);
//! let smaller = map.delete("a");
//! assert_eq!(map.get("a"), Some(&1));     // Original unchanged
//! assert_eq!(smaller.get("a"), None);     // New version
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

/// Prelude module for convenient imports.
///
/// Re-exports the collection types and the error type.
///
/// # Usage
///
/// ```rust
/// use keepsake::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::CollectionError;
    pub use crate::map::PersistentHashMap;
    pub use crate::sequence::{PersistentSequence, SequenceCursor};
    pub use crate::set::PersistentHashSet;
}

pub mod error;
mod index;
pub mod map;
pub mod sequence;
pub mod set;

pub use error::CollectionError;
pub use map::PersistentHashMap;
pub use map::PersistentHashMapIntoIterator;
pub use map::PersistentHashMapIterator;
pub use sequence::PersistentSequence;
pub use sequence::PersistentSequenceIntoIterator;
pub use sequence::PersistentSequenceIterator;
pub use sequence::SequenceCursor;
pub use set::PersistentHashSet;
pub use set::PersistentHashSetIntoIterator;
pub use set::PersistentHashSetIterator;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod reference_counter_tests {
    use super::ReferenceCounter;
    use rstest::rstest;

    #[rstest]
    fn test_reference_counter_clone() {
        let reference_counter: ReferenceCounter<i32> = ReferenceCounter::new(42);
        let reference_counter_clone = reference_counter.clone();
        assert_eq!(*reference_counter, *reference_counter_clone);
    }

    #[rstest]
    fn test_reference_counter_strong_count() {
        let reference_counter: ReferenceCounter<i32> = ReferenceCounter::new(42);
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 1);
        let reference_counter_clone = reference_counter.clone();
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 2);
        drop(reference_counter_clone);
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 1);
    }
}
