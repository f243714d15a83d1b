//! Property-based tests for `PersistentHashMap`.
//!
//! These tests verify the map's bucket-consistency laws against a model
//! `std::collections::HashMap`, plus the persistence and overwrite laws.

use keepsake::PersistentHashMap;
use proptest::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Strategies
// =============================================================================

/// Generates entry lists over a small key space, so overwrites and
/// deletions of present keys happen often.
fn entries_strategy() -> impl Strategy<Value = Vec<(u8, i32)>> {
    prop::collection::vec((0u8..24, any::<i32>()), 0..48)
}

proptest! {
    // =========================================================================
    // Model Conformance
    // =========================================================================

    #[test]
    fn prop_matches_std_hashmap(entries in entries_strategy()) {
        let map = PersistentHashMap::of(entries.clone());
        let model: HashMap<u8, i32> = entries.into_iter().collect();

        prop_assert_eq!(map.len(), model.len());
        for (key, value) in &model {
            prop_assert_eq!(map.get(key), Some(value));
        }
        for key in 0u8..24 {
            prop_assert_eq!(map.contains_key(&key), model.contains_key(&key));
        }
    }

    #[test]
    fn prop_iteration_covers_exactly_the_entries(entries in entries_strategy()) {
        let map = PersistentHashMap::of(entries.clone());
        let model: HashMap<u8, i32> = entries.into_iter().collect();

        let mut walked: Vec<(u8, i32)> = map.iter().map(|(key, value)| (*key, *value)).collect();
        walked.sort_unstable();
        let mut expected: Vec<(u8, i32)> = model.into_iter().collect();
        expected.sort_unstable();
        prop_assert_eq!(walked, expected);
    }

    // =========================================================================
    // Bucket Consistency Laws
    // =========================================================================

    #[test]
    fn prop_delete_removes_key_and_one_entry(entries in entries_strategy(), target in 0u8..24) {
        let map = PersistentHashMap::of(entries);
        let deleted = map.delete(&target);

        prop_assert!(!deleted.contains_key(&target));
        if map.contains_key(&target) {
            prop_assert_eq!(deleted.len(), map.len() - 1);
        } else {
            prop_assert_eq!(&deleted, &map);
            prop_assert_eq!(deleted.len(), map.len());
        }
    }

    #[test]
    fn prop_delete_never_alters_original(entries in entries_strategy(), target in 0u8..24) {
        let map = PersistentHashMap::of(entries);
        let before = map.len();
        let had_target = map.contains_key(&target);
        let _ = map.delete(&target);
        prop_assert_eq!(map.len(), before);
        prop_assert_eq!(map.contains_key(&target), had_target);
    }

    // =========================================================================
    // Overwrite Laws
    // =========================================================================

    #[test]
    fn prop_overwrite_keeps_size_and_takes_last_value(
        entries in entries_strategy(),
        key in 0u8..24,
        first_value: i32,
        second_value: i32,
    ) {
        let base = PersistentHashMap::of(entries).add(key, first_value);
        let overwritten = base.add(key, second_value);

        prop_assert_eq!(overwritten.get(&key), Some(&second_value));
        prop_assert_eq!(overwritten.len(), base.len());
        prop_assert_eq!(base.get(&key), Some(&first_value));
    }

    #[test]
    fn prop_add_then_delete_restores_absence(entries in entries_strategy(), key in 100u8..120, value: i32) {
        // Keys above the strategy's space are guaranteed fresh
        let map = PersistentHashMap::of(entries);
        let round_trip = map.add(key, value).delete(&key);
        prop_assert_eq!(&round_trip, &map);
    }
}
