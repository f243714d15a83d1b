//! Integration tests for `PersistentHashSet`.
//!
//! The set is a composition over the map, so these tests focus on the
//! membership semantics and the persistence of set versions.

use keepsake::{PersistentHashMap, PersistentHashSet};
use rstest::rstest;

// =============================================================================
// Persistence Scenarios
// =============================================================================

#[rstest]
fn test_insert_delete_scenario() {
    let set = PersistentHashSet::empty().insert(1).insert(2).insert(3);
    let shrunk = set.delete(&2);

    assert_eq!(set.len(), 3);
    assert_eq!(shrunk.len(), 2);
    assert!(set.contains(&2));
    assert!(!shrunk.contains(&2));
}

#[rstest]
fn test_duplicate_inserts_collapse() {
    let set = PersistentHashSet::of([1, 1, 2, 2, 2, 3]);
    assert_eq!(set.len(), 3);
}

#[rstest]
fn test_delete_absent_element_is_identity() {
    let set = PersistentHashSet::of([1, 2]);
    let unchanged = set.delete(&9);
    assert_eq!(unchanged, set);
}

// =============================================================================
// Bulk Operations
// =============================================================================

#[rstest]
fn test_insert_all_and_delete_all() {
    let set = PersistentHashSet::empty().insert_all(0..10);
    assert_eq!(set.len(), 10);

    let shrunk = set.delete_all((0..10).filter(|element| element % 2 == 0));
    assert_eq!(shrunk.len(), 5);
    for element in 0..10 {
        assert_eq!(shrunk.contains(&element), element % 2 == 1);
    }
}

// =============================================================================
// Map Composition
// =============================================================================

#[rstest]
fn test_from_map_ignores_values() {
    let map = PersistentHashMap::of([(1, "one"), (2, "two")]);
    let set = PersistentHashSet::from_map(&map);

    assert_eq!(set.len(), 2);
    assert!(set.contains(&1));
    assert!(set.contains(&2));
    assert!(!set.contains(&3));
}

#[rstest]
fn test_distinct_elements_round_trip() {
    let elements = [5, 3, 5, 1, 3];
    let set = PersistentHashSet::of(elements);

    let mut distinct: Vec<i32> = set.iter().copied().collect();
    distinct.sort_unstable();
    assert_eq!(distinct, vec![1, 3, 5]);
}

// =============================================================================
// Equality
// =============================================================================

#[rstest]
fn test_equality_is_membership_based() {
    let built_forward = PersistentHashSet::of([1, 2, 3]);
    let built_backward = PersistentHashSet::of([3, 2, 1]);
    let different = PersistentHashSet::of([1, 2, 4]);

    assert_eq!(built_forward, built_backward);
    assert_ne!(built_forward, different);
}
