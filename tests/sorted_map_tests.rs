//! Unit tests for SortedMap.
//!
//! Covers construction, lookups, updates, positional queries, bounded
//! iteration and combination of maps.

use immutable_sorted_map::comparator::{FnComparator, NaturalOrder, ReverseOrder};
use immutable_sorted_map::persistent::SortedMap;
use immutable_sorted_map::SortedMapError;
use rstest::rstest;

// =============================================================================
// Helpers
// =============================================================================

/// Keys `0..count`.
fn sequence(count: i32) -> Vec<i32> {
    (0..count).collect()
}

/// Pairs every key with a value equal to the key.
fn pairs(keys: &[i32]) -> Vec<(i32, i32)> {
    keys.iter().map(|key| (*key, *key)).collect()
}

/// Builds a map by inserting `keys` one at a time, in the given order.
fn to_map(keys: &[i32]) -> SortedMap<i32, i32> {
    keys.iter()
        .fold(SortedMap::new(), |map, key| map.insert(*key, *key))
}

/// Deterministically shuffles keys without an RNG dependency.
fn shuffled(keys: &[i32]) -> Vec<i32> {
    let mut shuffled = keys.to_vec();
    let length = shuffled.len();
    for index in (1..length).rev() {
        shuffled.swap(index, (index * 7919 + 13) % (index + 1));
    }
    shuffled
}

fn entries(map: &SortedMap<i32, i32>) -> Vec<(i32, i32)> {
    map.iter().map(|(key, value)| (*key, *value)).collect()
}

fn keys_of<C>(map: &SortedMap<i32, i32, C>) -> Vec<i32> {
    map.keys().copied().collect()
}

// =============================================================================
// Construction
// =============================================================================

#[rstest]
fn test_new_is_empty() {
    let map: SortedMap<i32, i32> = SortedMap::new();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.min(), None);
    assert_eq!(map.max(), None);
    assert_eq!(map.iter().next(), None);
}

#[rstest]
fn test_default_is_empty() {
    let map: SortedMap<i32, i32, ReverseOrder> = SortedMap::default();
    assert!(map.is_empty());
}

#[rstest]
fn test_singleton() {
    let map = SortedMap::singleton("key", 1);
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&"key"), Some(&1));
}

#[rstest]
fn test_from_sorted_entries_hundred() {
    let map = SortedMap::from_sorted_entries(pairs(&sequence(100))).unwrap();
    assert_eq!(map.get(&50), Some(&50));
    assert_eq!(map.len(), 100);
    assert!(map.height() <= 13);
    assert_eq!(entries(&map), pairs(&sequence(100)));
}

#[rstest]
fn test_from_sorted_empty() {
    let map = SortedMap::<i32, i32>::from_sorted_entries(Vec::new()).unwrap();
    assert!(map.is_empty());
}

#[rstest]
#[case(vec![(1, 1), (0, 0)], SortedMapError::UnsortedInput { index: 1 })]
#[case(vec![(0, 0), (1, 1), (1, 2)], SortedMapError::DuplicateKey { index: 2 })]
#[case(vec![(0, 0), (5, 5), (3, 3), (9, 9)], SortedMapError::UnsortedInput { index: 2 })]
fn test_from_sorted_rejects_invalid_input(
    #[case] input: Vec<(i32, i32)>,
    #[case] expected: SortedMapError,
) {
    assert_eq!(SortedMap::from_sorted_entries(input), Err(expected));
}

#[rstest]
fn test_from_sorted_with_reverse_order() {
    let descending: Vec<(i32, i32)> = pairs(&sequence(10)).into_iter().rev().collect();
    let map = SortedMap::from_sorted(descending, ReverseOrder).unwrap();
    assert_eq!(keys_of(&map), vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);
}

#[rstest]
fn test_collect_from_unsorted_input() {
    let map: SortedMap<i32, i32> = pairs(&shuffled(&sequence(50))).into_iter().collect();
    assert_eq!(entries(&map), pairs(&sequence(50)));
}

// =============================================================================
// Insert
// =============================================================================

#[rstest]
fn test_insert_scenario_iterates_in_order() {
    let map = to_map(&[5, 3, 8, 1, 4]);
    assert_eq!(entries(&map), vec![(1, 1), (3, 3), (4, 4), (5, 5), (8, 8)]);
}

#[rstest]
fn test_insert_grows_size_only_for_new_keys() {
    let map = to_map(&[1, 2, 3]);
    assert_eq!(map.insert(4, 4).len(), 4);
    assert_eq!(map.insert(2, 20).len(), 3);
}

#[rstest]
fn test_insert_replaces_value() {
    let map = to_map(&[1, 2, 3]).insert(2, 20);
    assert_eq!(map.get(&2), Some(&20));
    assert_eq!(entries(&map), vec![(1, 1), (2, 20), (3, 3)]);
}

#[rstest]
fn test_insert_preserves_original() {
    let original = to_map(&[1, 2, 3]);
    let _updated = original.insert(4, 4).insert(1, 100);
    assert_eq!(entries(&original), vec![(1, 1), (2, 2), (3, 3)]);
}

#[rstest]
fn test_insert_same_value_is_structurally_equal() {
    let map = to_map(&sequence(20));
    assert_eq!(map.insert(7, 7), map);
}

#[rstest]
fn test_insert_ascending_and_descending_stay_balanced() {
    let ascending = to_map(&sequence(1023));
    let descending_keys: Vec<i32> = sequence(1023).into_iter().rev().collect();
    let descending = to_map(&descending_keys);
    assert!(ascending.height() <= 20);
    assert!(descending.height() <= 20);
    assert_eq!(ascending, descending);
}

#[rstest]
fn test_insertion_order_does_not_matter() {
    let keys = sequence(200);
    assert_eq!(to_map(&keys), to_map(&shuffled(&keys)));
}

// =============================================================================
// Remove
// =============================================================================

#[rstest]
fn test_remove_from_empty_is_noop() {
    let map: SortedMap<i32, i32> = SortedMap::new();
    assert_eq!(map.remove(&7), map);
}

#[rstest]
fn test_remove_absent_key_is_noop() {
    let map = to_map(&[1, 3, 5]);
    assert_eq!(map.remove(&4), map);
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(5)]
fn test_remove_present_key(#[case] key: i32) {
    let map = to_map(&[1, 3, 5]);
    let removed = map.remove(&key);
    assert_eq!(removed.len(), 2);
    assert_eq!(removed.get(&key), None);
    assert_eq!(map.get(&key), Some(&key));
}

#[rstest]
fn test_remove_everything_in_shuffled_order() {
    let keys = sequence(300);
    let mut map = to_map(&keys);
    for (removed, key) in shuffled(&keys).into_iter().enumerate() {
        map = map.remove(&key);
        assert_eq!(map.len(), 299 - removed);
        assert_eq!(map.get(&key), None);
        let remaining = keys_of(&map);
        assert!(remaining.windows(2).all(|pair| pair[0] < pair[1]));
    }
    assert!(map.is_empty());
}

#[rstest]
fn test_remove_after_insert_round_trip() {
    let map = to_map(&[10, 20, 30]);
    assert_eq!(map.insert(25, 25).remove(&25), map);
}

// =============================================================================
// Lookups
// =============================================================================

#[rstest]
fn test_get_found_and_not_found() {
    let map = to_map(&sequence(100));
    for key in sequence(100) {
        assert_eq!(map.get(&key), Some(&key));
        assert!(map.contains_key(&key));
    }
    assert_eq!(map.get(&-1), None);
    assert_eq!(map.get(&100), None);
    assert!(!map.contains_key(&1000));
}

#[rstest]
fn test_get_with_borrowed_key() {
    let map = SortedMap::new()
        .insert("apple".to_string(), 1)
        .insert("banana".to_string(), 2);
    assert_eq!(map.get("banana"), Some(&2));
    assert_eq!(map.get_key_value("apple"), Some((&"apple".to_string(), &1)));
    assert!(!map.contains_key("cherry"));
}

#[rstest]
fn test_min_and_max() {
    let map = to_map(&[5, 3, 8, 1, 4]);
    assert_eq!(map.min(), Some((&1, &1)));
    assert_eq!(map.max(), Some((&8, &8)));
}

#[rstest]
fn test_find_index_and_get_index_agree() {
    let map = to_map(&shuffled(&sequence(64)));
    for index in 0..64 {
        let (key, _) = map.get_index(index).unwrap();
        assert_eq!(map.find_index(key), Some(index));
    }
    assert_eq!(map.get_index(64), None);
    assert_eq!(map.find_index(&64), None);
}

// =============================================================================
// Iteration
// =============================================================================

#[rstest]
fn test_iter_is_exact_size() {
    let map = to_map(&sequence(10));
    let mut iterator = map.iter();
    assert_eq!(iterator.len(), 10);
    iterator.next();
    assert_eq!(iterator.len(), 9);
}

#[rstest]
fn test_iter_rev_is_forward_reversed() {
    let map = to_map(&shuffled(&sequence(40)));
    let mut forward = entries(&map);
    forward.reverse();
    let backward: Vec<(i32, i32)> = map.iter_rev().map(|(key, value)| (*key, *value)).collect();
    assert_eq!(backward, forward);
}

#[rstest]
#[case(0, vec![0, 10, 20, 30, 40])]
#[case(15, vec![20, 30, 40])]
#[case(20, vec![20, 30, 40])]
#[case(40, vec![40])]
#[case(41, vec![])]
fn test_iter_from(#[case] bound: i32, #[case] expected: Vec<i32>) {
    let map = to_map(&[0, 10, 20, 30, 40]);
    let keys: Vec<i32> = map.iter_from(&bound).map(|(key, _)| *key).collect();
    assert_eq!(keys, expected);
}

#[rstest]
#[case(-1, vec![])]
#[case(0, vec![0])]
#[case(25, vec![20, 10, 0])]
#[case(100, vec![40, 30, 20, 10, 0])]
fn test_iter_rev_from(#[case] bound: i32, #[case] expected: Vec<i32>) {
    let map = to_map(&[0, 10, 20, 30, 40]);
    let keys: Vec<i32> = map.iter_rev_from(&bound).map(|(key, _)| *key).collect();
    assert_eq!(keys, expected);
}

#[rstest]
fn test_range_variants() {
    let map = to_map(&sequence(10));
    assert_eq!(map.range(2..5).map(|(key, _)| *key).collect::<Vec<_>>(), vec![2, 3, 4]);
    assert_eq!(map.range(2..=5).count(), 4);
    assert_eq!(map.range(..3).count(), 3);
    assert_eq!(map.range(7..).count(), 3);
    assert_eq!(map.range::<_, i32>(..).count(), 10);
    assert_eq!(map.range(20..30).count(), 0);
    assert_eq!(map.range(5..2).count(), 0);
}

#[rstest]
fn test_range_is_exact_size() {
    let map = to_map(&sequence(100));
    let range = map.range(10..60);
    assert_eq!(range.len(), 50);
    assert_eq!(range.last(), Some((&59, &59)));
}

#[rstest]
fn test_iterators_are_independent() {
    let map = to_map(&sequence(5));
    let mut first = map.iter();
    first.next();
    first.next();
    let second: Vec<i32> = map.keys().copied().collect();
    assert_eq!(second, sequence(5));
    assert_eq!(first.next(), Some((&2, &2)));
}

#[rstest]
fn test_iterator_outlives_newer_versions() {
    let map = to_map(&sequence(5));
    let iterator = map.iter();
    let _newer = map.insert(100, 100).remove(&0);
    assert_eq!(iterator.map(|(key, _)| *key).collect::<Vec<_>>(), sequence(5));
}

#[rstest]
fn test_into_iter_owned() {
    let map = to_map(&[3, 1, 2]);
    let owned: Vec<(i32, i32)> = map.into_iter().collect();
    assert_eq!(owned, vec![(1, 1), (2, 2), (3, 3)]);
}

#[rstest]
fn test_for_loop_over_reference() {
    let map = to_map(&[3, 1, 2]);
    let mut sum = 0;
    for (key, value) in &map {
        sum += key + value;
    }
    assert_eq!(sum, 12);
}

// =============================================================================
// Comparators
// =============================================================================

#[rstest]
fn test_reverse_order_map() {
    let map = [5, 3, 8]
        .into_iter()
        .fold(SortedMap::with_comparator(ReverseOrder), |map, key| map.insert(key, ()));
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![8, 5, 3]);
    assert_eq!(map.min(), Some((&8, &())));
}

#[rstest]
fn test_fn_comparator_by_length() {
    let by_length = FnComparator::new(|left: &&str, right: &&str| left.len().cmp(&right.len()));
    let map = SortedMap::with_comparator(by_length)
        .insert("ccc", 3)
        .insert("a", 1)
        .insert("bb", 2)
        .insert("zz", 20);
    assert_eq!(map.len(), 3);
    let entries: Vec<(&str, i32)> = map.iter().map(|(key, value)| (*key, *value)).collect();
    assert_eq!(entries, vec![("a", 1), ("bb", 20), ("ccc", 3)]);
}

#[rstest]
fn test_derived_maps_keep_comparator() {
    let map = SortedMap::with_comparator(ReverseOrder).insert(1, 1).insert(2, 2);
    let derived = map.remove(&1).insert(3, 3);
    assert_eq!(derived.comparator(), &ReverseOrder);
    assert_eq!(derived.keys().copied().collect::<Vec<_>>(), vec![3, 2]);
}

// =============================================================================
// Transformations and combination
// =============================================================================

#[rstest]
fn test_map_values() {
    let map = to_map(&sequence(5)).map_values(|value| value * 10);
    assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![0, 10, 20, 30, 40]);
}

#[rstest]
fn test_keep_if_and_delete_if_partition() {
    let map = to_map(&sequence(20));
    let evens = map.keep_if(|key, _| key % 2 == 0);
    let odds = map.delete_if(|key, _| key % 2 == 0);
    assert_eq!(evens.len() + odds.len(), map.len());
    assert!(evens.keys().all(|key| key % 2 == 0));
    assert!(odds.keys().all(|key| key % 2 == 1));
}

#[rstest]
fn test_merge_prefers_other() {
    let left = to_map(&[1, 2, 3]);
    let right = SortedMap::new().insert(3, 30).insert(4, 40);
    let merged = left.merge(&right).unwrap();
    assert_eq!(entries(&merged), vec![(1, 1), (2, 2), (3, 30), (4, 40)]);
}

#[rstest]
fn test_merge_with_resolver() {
    let left = to_map(&[1, 2, 3]);
    let right = to_map(&[2, 3, 4]);
    let merged = left.merge_with(&right, |_, mine, theirs| mine + theirs).unwrap();
    assert_eq!(entries(&merged), vec![(1, 1), (2, 4), (3, 6), (4, 4)]);
}

#[rstest]
fn test_merge_incompatible_comparators() {
    let first = FnComparator::new(|left: &i32, right: &i32| left.cmp(right));
    let second = FnComparator::new(|left: &i32, right: &i32| right.cmp(left));
    let left = SortedMap::with_comparator(first).insert(1, 1);
    let right = SortedMap::with_comparator(second).insert(2, 2);
    assert_eq!(left.merge(&right).err(), Some(SortedMapError::IncompatibleComparators));
}

#[rstest]
fn test_merge_shared_fn_comparator() {
    let comparator = FnComparator::new(|left: &i32, right: &i32| left.cmp(right));
    let left = SortedMap::with_comparator(comparator.clone()).insert(1, 1);
    let right = SortedMap::with_comparator(comparator).insert(2, 2);
    assert_eq!(left.merge(&right).map(|map| map.len()), Ok(2));
}

// =============================================================================
// Equality, hashing and formatting
// =============================================================================

#[rstest]
fn test_equality_is_structural() {
    let built = SortedMap::from_sorted(pairs(&sequence(30)), NaturalOrder).unwrap();
    let inserted = to_map(&shuffled(&sequence(30)));
    assert_eq!(built, inserted);
    assert_ne!(built, inserted.insert(0, 99));
    assert_ne!(built, inserted.remove(&0));
}

#[rstest]
fn test_equal_maps_hash_equally() {
    use std::hash::{DefaultHasher, Hash, Hasher};

    fn hash_of(map: &SortedMap<i32, i32>) -> u64 {
        let mut hasher = DefaultHasher::new();
        map.hash(&mut hasher);
        hasher.finish()
    }

    let built = SortedMap::from_sorted_entries(pairs(&sequence(30))).unwrap();
    let inserted = to_map(&shuffled(&sequence(30)));
    assert_eq!(hash_of(&built), hash_of(&inserted));
}

#[rstest]
fn test_maps_equal_under_comparator_hash_equally() {
    use std::hash::{DefaultHasher, Hash, Hasher};

    fn hash_of<C>(map: &SortedMap<String, i32, C>) -> u64 {
        let mut hasher = DefaultHasher::new();
        map.hash(&mut hasher);
        hasher.finish()
    }

    let case_insensitive = FnComparator::new(|left: &String, right: &String| {
        left.to_lowercase().cmp(&right.to_lowercase())
    });
    let lower = SortedMap::with_comparator(case_insensitive.clone())
        .insert("Key".to_string(), 1)
        .insert("other".to_string(), 2);
    let upper = SortedMap::with_comparator(case_insensitive)
        .insert("KEY".to_string(), 1)
        .insert("OTHER".to_string(), 2);

    assert_eq!(lower, upper);
    assert_eq!(hash_of(&lower), hash_of(&upper));
}

#[rstest]
fn test_display_and_debug() {
    let map = to_map(&[2, 1]);
    assert_eq!(format!("{map}"), "{1: 1, 2: 2}");
    assert_eq!(format!("{map:?}"), "{1: 1, 2: 2}");
}
