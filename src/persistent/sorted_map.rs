//! Persistent (immutable) sorted map based on a left-leaning Red-Black Tree.
//!
//! This module provides [`SortedMap`], an immutable ordered map whose key
//! order is defined by a [`Comparator`] value bound to the map at creation.
//!
//! # Overview
//!
//! - O(log N) get, insert, remove, min/max
//! - O(log N) positional lookups (`find_index`, `get_index`)
//! - O(log N + k) range and bounded iteration where k is the number of results
//! - O(1) len and `is_empty`
//! - O(N) bulk construction from sorted input
//!
//! All operations return new maps without modifying the original, and
//! structural sharing ensures that only O(log N) nodes are allocated per
//! update.
//!
//! # Examples
//!
//! ```rust
//! use immutable_sorted_map::persistent::SortedMap;
//!
//! let map = SortedMap::new()
//!     .insert(5, "five")
//!     .insert(3, "three")
//!     .insert(8, "eight");
//!
//! let keys: Vec<&i32> = map.keys().collect();
//! assert_eq!(keys, vec![&3, &5, &8]);
//!
//! let smaller = map.remove(&5);
//! assert_eq!(map.len(), 3);     // Original unchanged
//! assert_eq!(smaller.len(), 2); // New version
//! ```

use super::ReferenceCounter;
use super::builder;
use super::engine;
use super::iterator::{
    SortedMapIntoIterator, SortedMapIterator, SortedMapRangeIterator, SortedMapReverseIterator,
};
use super::node::{self, Link};
use crate::comparator::{Comparator, NaturalOrder};
use crate::error::SortedMapError;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Bound, RangeBounds};

// =============================================================================
// SortedMap Definition
// =============================================================================

/// A persistent (immutable) ordered map.
///
/// Keys are ordered by the comparator `C`, which defaults to
/// [`NaturalOrder`] (the key type's [`Ord`]). The comparator is fixed for
/// the lifetime of the map and inherited by every map derived from it.
///
/// Cloning a map is O(1): both copies share the same tree.
///
/// # Time Complexity
///
/// | Operation        | Complexity        |
/// |------------------|-------------------|
/// | `new`            | O(1)              |
/// | `get`            | O(log N)          |
/// | `insert`         | O(log N)          |
/// | `remove`         | O(log N)          |
/// | `contains_key`   | O(log N)          |
/// | `min`/`max`      | O(log N)          |
/// | `find_index`     | O(log N)          |
/// | `get_index`      | O(log N)          |
/// | `range`          | O(log N + k)      |
/// | `from_sorted`    | O(N)              |
/// | `merge`          | O(N + M)          |
/// | `len`            | O(1)              |
/// | `is_empty`       | O(1)              |
///
/// # Examples
///
/// ```rust
/// use immutable_sorted_map::comparator::ReverseOrder;
/// use immutable_sorted_map::persistent::SortedMap;
///
/// let map = SortedMap::with_comparator(ReverseOrder)
///     .insert(1, "one")
///     .insert(3, "three")
///     .insert(2, "two");
///
/// let keys: Vec<&i32> = map.keys().collect();
/// assert_eq!(keys, vec![&3, &2, &1]);
/// ```
pub struct SortedMap<K, V, C = NaturalOrder> {
    /// Root node of the tree
    root: Link<K, V>,
    /// Ordering shared by every version derived from this map
    comparator: C,
}

impl<K, V> SortedMap<K, V> {
    /// Creates a new empty map ordered by the keys' [`Ord`] implementation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map: SortedMap<i32, String> = SortedMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }

    /// Bulk builds a naturally ordered map from strictly ascending entries.
    ///
    /// See [`from_sorted`](Self::from_sorted).
    ///
    /// # Errors
    ///
    /// Returns [`SortedMapError::UnsortedInput`] or
    /// [`SortedMapError::DuplicateKey`] when the entries are not strictly
    /// ascending.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::from_sorted_entries((0..100).map(|key| (key, key))).unwrap();
    /// assert_eq!(map.len(), 100);
    /// assert_eq!(map.get(&50), Some(&50));
    /// ```
    pub fn from_sorted_entries<I>(entries: I) -> Result<Self, SortedMapError>
    where
        K: Ord,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_sorted(entries, NaturalOrder)
    }
}

impl<K: Clone + Ord, V: Clone> SortedMap<K, V> {
    /// Creates a naturally ordered map containing a single entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::singleton(42, "answer");
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(map.get(&42), Some(&"answer"));
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        Self::new().insert(key, value)
    }
}

impl<K, V, C> SortedMap<K, V, C> {
    /// Creates a new empty map ordered by `comparator`.
    #[inline]
    #[must_use]
    pub const fn with_comparator(comparator: C) -> Self {
        Self {
            root: None,
            comparator,
        }
    }

    /// Returns the comparator that orders this map.
    #[inline]
    pub const fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        node::size(&self.root)
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of nodes on the longest path from the root.
    ///
    /// For a map of `n` entries this never exceeds `2 * log2(n + 1)`.
    ///
    /// # Complexity
    ///
    /// O(N)
    #[must_use]
    pub fn height(&self) -> usize {
        node::height(&self.root)
    }

    /// Returns the entry with the minimum key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::new()
    ///     .insert(3, "three")
    ///     .insert(1, "one")
    ///     .insert(2, "two");
    ///
    /// assert_eq!(map.min(), Some((&1, &"one")));
    /// ```
    #[must_use]
    pub fn min(&self) -> Option<(&K, &V)> {
        engine::min(self.root.as_ref()).map(|node| (&node.key, &node.value))
    }

    /// Returns the entry with the maximum key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::new()
    ///     .insert(3, "three")
    ///     .insert(1, "one")
    ///     .insert(2, "two");
    ///
    /// assert_eq!(map.max(), Some((&3, &"three")));
    /// ```
    #[must_use]
    pub fn max(&self) -> Option<(&K, &V)> {
        engine::max(self.root.as_ref()).map(|node| (&node.key, &node.value))
    }

    /// Returns the entry at the given position in key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::new().insert(10, 'a').insert(30, 'c').insert(20, 'b');
    /// assert_eq!(map.get_index(1), Some((&20, &'b')));
    /// assert_eq!(map.get_index(3), None);
    /// ```
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        engine::select(self.root.as_ref(), index).map(|node| (&node.key, &node.value))
    }

    /// Returns an iterator over entries in ascending key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::new()
    ///     .insert(3, "three")
    ///     .insert(1, "one")
    ///     .insert(2, "two");
    ///
    /// for (key, value) in map.iter() {
    ///     println!("{}: {}", key, value);
    /// }
    /// ```
    #[must_use]
    pub fn iter(&self) -> SortedMapIterator<'_, K, V> {
        SortedMapIterator::new(self.root.as_ref())
    }

    /// Returns an iterator over entries in descending key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::new().insert(1, ()).insert(2, ()).insert(3, ());
    /// let keys: Vec<&i32> = map.iter_rev().map(|(key, _)| key).collect();
    /// assert_eq!(keys, vec![&3, &2, &1]);
    /// ```
    #[must_use]
    pub fn iter_rev(&self) -> SortedMapReverseIterator<'_, K, V> {
        SortedMapReverseIterator::new(self.root.as_ref())
    }

    /// Returns an iterator over keys in ascending order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over values in ascending key order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, as long as the
    /// comparator orders the borrowed form the same way.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::new().insert("hello".to_string(), 42);
    ///
    /// // Can use &str to look up String keys
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        engine::find(self.root.as_ref(), key, &self.comparator).map(|node| &node.value)
    }

    /// Returns the stored key and its value.
    ///
    /// Useful when the comparator treats distinct keys as equal, to recover
    /// the key that is actually stored.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        engine::find(self.root.as_ref(), key, &self.comparator).map(|node| (&node.key, &node.value))
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.get(key).is_some()
    }

    /// Returns the position of `key` in ascending key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::new().insert(10, 'a').insert(30, 'c').insert(20, 'b');
    /// assert_eq!(map.find_index(&30), Some(2));
    /// assert_eq!(map.find_index(&25), None);
    /// ```
    #[must_use]
    pub fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        engine::find_index(self.root.as_ref(), key, &self.comparator)
    }

    /// Returns an ascending iterator starting at the first key not less than
    /// `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map: SortedMap<i32, i32> = (0..10).map(|key| (key * 10, key)).collect();
    /// let keys: Vec<&i32> = map.iter_from(&25).map(|(key, _)| key).collect();
    /// assert_eq!(keys, vec![&30, &40, &50, &60, &70, &80, &90]);
    /// ```
    #[must_use]
    pub fn iter_from<Q>(&self, key: &Q) -> SortedMapIterator<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        SortedMapIterator::from_lower_bound(self.root.as_ref(), key, true, &self.comparator)
    }

    /// Returns a descending iterator starting at the last key not greater
    /// than `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map: SortedMap<i32, i32> = (0..10).map(|key| (key * 10, key)).collect();
    /// let keys: Vec<&i32> = map.iter_rev_from(&25).map(|(key, _)| key).collect();
    /// assert_eq!(keys, vec![&20, &10, &0]);
    /// ```
    #[must_use]
    pub fn iter_rev_from<Q>(&self, key: &Q) -> SortedMapReverseIterator<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        SortedMapReverseIterator::from_upper_bound(self.root.as_ref(), key, &self.comparator)
    }

    /// Returns an iterator over entries within the specified range.
    ///
    /// The range is specified using Rust's range syntax (`a..b`, `a..=b`,
    /// `a..`, `..b`, `..=b`, `..`), interpreted through the map's comparator.
    /// A range whose start sorts after its end is empty.
    ///
    /// # Complexity
    ///
    /// O(log N + k) where k is the number of entries in the range
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::new()
    ///     .insert(1, "one")
    ///     .insert(2, "two")
    ///     .insert(3, "three")
    ///     .insert(4, "four")
    ///     .insert(5, "five");
    ///
    /// let range: Vec<(&i32, &&str)> = map.range(2..=4).collect();
    /// assert_eq!(range.len(), 3); // 2, 3, 4
    /// ```
    pub fn range<R, Q>(&self, range: R) -> SortedMapRangeIterator<'_, K, V>
    where
        R: RangeBounds<Q>,
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let root = self.root.as_ref();
        let (start, skipped) = match range.start_bound() {
            Bound::Included(bound) => (
                SortedMapIterator::from_lower_bound(root, bound, true, &self.comparator),
                engine::rank(root, bound, false, &self.comparator),
            ),
            Bound::Excluded(bound) => (
                SortedMapIterator::from_lower_bound(root, bound, false, &self.comparator),
                engine::rank(root, bound, true, &self.comparator),
            ),
            Bound::Unbounded => (SortedMapIterator::new(root), 0),
        };
        let before_end = match range.end_bound() {
            Bound::Included(bound) => engine::rank(root, bound, true, &self.comparator),
            Bound::Excluded(bound) => engine::rank(root, bound, false, &self.comparator),
            Bound::Unbounded => self.len(),
        };
        SortedMapRangeIterator::new(start.limit(before_end.saturating_sub(skipped)))
    }
}

impl<K, V, C> SortedMap<K, V, C>
where
    C: Comparator<K>,
{
    /// Bulk builds a map from strictly ascending entries in O(N).
    ///
    /// Much cheaper than inserting the entries one at a time. The input is
    /// checked against `comparator` before anything is built.
    ///
    /// # Errors
    ///
    /// Returns [`SortedMapError::UnsortedInput`] if an entry sorts before its
    /// predecessor and [`SortedMapError::DuplicateKey`] if it equals it. The
    /// error carries the index of the offending entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::comparator::ReverseOrder;
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::from_sorted(vec![(3, 'c'), (2, 'b'), (1, 'a')], ReverseOrder).unwrap();
    /// assert_eq!(map.min(), Some((&3, &'c')));
    /// ```
    pub fn from_sorted<I>(entries: I, comparator: C) -> Result<Self, SortedMapError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let entries: Vec<(K, V)> = entries.into_iter().collect();
        let root = builder::build(entries, &comparator)?;
        Ok(Self { root, comparator })
    }
}

impl<K: Clone, V: Clone, C: Comparator<K> + Clone> SortedMap<K, V, C> {
    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contains an equal key, its value is replaced and
    /// the stored key is kept.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map1 = SortedMap::new().insert(1, "one");
    /// let map2 = map1.insert(1, "ONE");
    ///
    /// assert_eq!(map1.get(&1), Some(&"one")); // Original unchanged
    /// assert_eq!(map2.get(&1), Some(&"ONE")); // New version
    /// ```
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        let root = engine::insert(self.root.as_ref(), key, value, &self.comparator);
        Self {
            root: Some(root),
            comparator: self.comparator.clone(),
        }
    }

    /// Removes a key from the map.
    ///
    /// If the key is absent the returned map shares its whole tree with
    /// `self`.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::new()
    ///     .insert(1, "one")
    ///     .insert(2, "two");
    /// let removed = map.remove(&1);
    ///
    /// assert_eq!(map.len(), 2);     // Original unchanged
    /// assert_eq!(removed.len(), 1); // New version
    /// assert_eq!(removed.get(&1), None);
    /// ```
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        match &self.root {
            Some(root) if self.contains_key(key) => Self {
                root: engine::remove(root, key, &self.comparator),
                comparator: self.comparator.clone(),
            },
            _ => self.clone(),
        }
    }

    /// Applies a function to all values, keeping keys unchanged.
    ///
    /// The result has exactly the shape of `self`; `transform` is called in
    /// ascending key order.
    ///
    /// # Complexity
    ///
    /// O(N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::new().insert(1, 10).insert(2, 20);
    /// let doubled = map.map_values(|value| value * 2);
    /// assert_eq!(doubled.get(&1), Some(&20));
    /// assert_eq!(doubled.get(&2), Some(&40));
    /// ```
    #[must_use]
    pub fn map_values<W, F>(&self, mut transform: F) -> SortedMap<K, W, C>
    where
        F: FnMut(&V) -> W,
    {
        SortedMap {
            root: engine::map_values(self.root.as_ref(), &mut transform),
            comparator: self.comparator.clone(),
        }
    }

    /// Keeps only entries for which the predicate returns true.
    ///
    /// # Complexity
    ///
    /// O(N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::new().insert(1, 10).insert(2, 20).insert(3, 30);
    /// let even_keys = map.keep_if(|key, _| key % 2 == 0);
    /// assert_eq!(even_keys.len(), 1);
    /// assert_eq!(even_keys.get(&2), Some(&20));
    /// ```
    #[must_use]
    pub fn keep_if<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&K, &V) -> bool,
    {
        let entries = self
            .iter()
            .filter(|(key, value)| predicate(key, value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self {
            root: builder::build_unchecked(entries),
            comparator: self.comparator.clone(),
        }
    }

    /// Removes entries for which the predicate returns true.
    ///
    /// # Complexity
    ///
    /// O(N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map = SortedMap::new().insert(1, 10).insert(2, 20).insert(3, 30);
    /// let small_values = map.delete_if(|_, value| *value >= 20);
    /// assert_eq!(small_values.len(), 1);
    /// assert_eq!(small_values.get(&1), Some(&10));
    /// ```
    #[must_use]
    pub fn delete_if<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.keep_if(|key, value| !predicate(key, value))
    }
}

impl<K: Clone, V: Clone, C: Comparator<K> + Clone + PartialEq> SortedMap<K, V, C> {
    /// Merges two maps, with values from `other` taking precedence on key
    /// conflicts.
    ///
    /// # Errors
    ///
    /// Returns [`SortedMapError::IncompatibleComparators`] if the two maps
    /// are ordered by comparators that are not equal.
    ///
    /// # Complexity
    ///
    /// O(N + M)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map1 = SortedMap::new().insert(1, "one").insert(2, "two");
    /// let map2 = SortedMap::new().insert(2, "TWO").insert(3, "three");
    /// let merged = map1.merge(&map2).unwrap();
    /// assert_eq!(merged.get(&1), Some(&"one"));
    /// assert_eq!(merged.get(&2), Some(&"TWO")); // From map2
    /// assert_eq!(merged.get(&3), Some(&"three"));
    /// ```
    pub fn merge(&self, other: &Self) -> Result<Self, SortedMapError> {
        self.merge_with(other, |_, _, other_value| other_value.clone())
    }

    /// Merges two maps with a custom conflict resolver.
    ///
    /// When a key exists in both maps, `resolver` receives the key, the value
    /// from `self` and the value from `other`, and returns the merged value.
    ///
    /// # Errors
    ///
    /// Returns [`SortedMapError::IncompatibleComparators`] if the two maps
    /// are ordered by comparators that are not equal.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted_map::persistent::SortedMap;
    ///
    /// let map1 = SortedMap::new().insert(1, 100).insert(2, 200);
    /// let map2 = SortedMap::new().insert(2, 50).insert(3, 300);
    /// let merged = map1.merge_with(&map2, |_, left, right| left + right).unwrap();
    /// assert_eq!(merged.get(&2), Some(&250));
    /// ```
    pub fn merge_with<F>(&self, other: &Self, mut resolver: F) -> Result<Self, SortedMapError>
    where
        F: FnMut(&K, &V, &V) -> V,
    {
        if self.comparator != other.comparator {
            tracing::debug!("rejected merge of maps ordered by different comparators");
            return Err(SortedMapError::IncompatibleComparators);
        }
        if other.is_empty() {
            return Ok(self.clone());
        }
        if self.is_empty() {
            return Ok(other.clone());
        }
        tracing::trace!(left = self.len(), right = other.len(), "merging sorted maps");

        let mut entries = Vec::with_capacity(self.len() + other.len());
        let mut left = self.iter().peekable();
        let mut right = other.iter().peekable();
        loop {
            let next = match (left.peek(), right.peek()) {
                (Some((left_key, _)), Some((right_key, _))) => {
                    match self.comparator.compare(left_key, right_key) {
                        Ordering::Less => left.next().map(|(key, value)| (key.clone(), value.clone())),
                        Ordering::Greater => {
                            right.next().map(|(key, value)| (key.clone(), value.clone()))
                        }
                        Ordering::Equal => left.next().zip(right.next()).map(
                            |((key, left_value), (_, right_value))| {
                                (key.clone(), resolver(key, left_value, right_value))
                            },
                        ),
                    }
                }
                (Some(_), None) => left.next().map(|(key, value)| (key.clone(), value.clone())),
                (None, Some(_)) => right.next().map(|(key, value)| (key.clone(), value.clone())),
                (None, None) => None,
            };
            match next {
                Some(entry) => entries.push(entry),
                None => break,
            }
        }

        Ok(Self {
            root: builder::build_unchecked(entries),
            comparator: self.comparator.clone(),
        })
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, C: Clone> Clone for SortedMap<K, V, C> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            comparator: self.comparator.clone(),
        }
    }
}

impl<K, V, C: Default> Default for SortedMap<K, V, C> {
    #[inline]
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

/// Collects entries into a map. When a key appears more than once the last
/// value wins.
///
/// The entries are sorted and bulk built, so collecting is O(N log N)
/// regardless of input order.
impl<K, V, C> FromIterator<(K, V)> for SortedMap<K, V, C>
where
    C: Comparator<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let comparator = C::default();
        let mut entries: Vec<(K, V)> = iter.into_iter().collect();
        // Stable, so equal keys keep their input order and the last one wins.
        entries.sort_by(|left, right| comparator.compare(&left.0, &right.0));

        let mut deduplicated: Vec<(K, V)> = Vec::with_capacity(entries.len());
        for entry in entries {
            match deduplicated.last_mut() {
                Some(last) if comparator.compare(&last.0, &entry.0) == Ordering::Equal => {
                    *last = entry;
                }
                _ => deduplicated.push(entry),
            }
        }

        Self {
            root: builder::build_unchecked(deduplicated),
            comparator,
        }
    }
}

impl<K: Clone, V: Clone, C> IntoIterator for SortedMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = SortedMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        SortedMapIntoIterator::new(self.root)
    }
}

impl<'a, K, V, C> IntoIterator for &'a SortedMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = SortedMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Structural equality: same entries in the same order, with keys compared
/// by the map's comparator and values by `==`.
impl<K, V: PartialEq, C: Comparator<K>> PartialEq for SortedMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        if let (Some(left), Some(right)) = (&self.root, &other.root)
            && ReferenceCounter::ptr_eq(left, right)
        {
            return true;
        }
        self.iter()
            .zip(other.iter())
            .all(|((left_key, left_value), (right_key, right_value))| {
                self.comparator.compare(left_key, right_key) == Ordering::Equal
                    && left_value == right_value
            })
    }
}

impl<K, V: Eq, C: Comparator<K>> Eq for SortedMap<K, V, C> {}

/// Hashes the length, then each value in key order.
///
/// Keys are left out: equality compares them through the comparator, which
/// may treat keys with different `Hash` output as equal.
impl<K, V: Hash, C> Hash for SortedMap<K, V, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for value in self.values() {
            value.hash(state);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for SortedMap<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display, C> fmt::Display for SortedMap<K, V, C> {
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
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V, C> serde::Serialize for SortedMap<K, V, C>
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
struct SortedMapVisitor<K, V, C> {
    marker: std::marker::PhantomData<fn() -> SortedMap<K, V, C>>,
}

#[cfg(feature = "serde")]
impl<K, V, C> SortedMapVisitor<K, V, C> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::de::Visitor<'de> for SortedMapVisitor<K, V, C>
where
    K: serde::Deserialize<'de> + Clone,
    V: serde::Deserialize<'de> + Clone,
    C: Comparator<K> + Clone + Default,
{
    type Value = SortedMap<K, V, C>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        // Sequential insert keeps memory growth gradual for large inputs.
        let mut map = SortedMap::default();
        while let Some((key, value)) = access.next_entry()? {
            map = map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::Deserialize<'de> for SortedMap<K, V, C>
where
    K: serde::Deserialize<'de> + Clone,
    V: serde::Deserialize<'de> + Clone,
    C: Comparator<K> + Clone + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(SortedMapVisitor::new())
    }
}

// =============================================================================
// Thread Safety
// =============================================================================

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(SortedMap<i32, String>: Send, Sync);
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(SortedMapIterator<'static, i32, String>: Send, Sync);

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(SortedMap<i32, String>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================
