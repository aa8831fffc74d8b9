//! Persistent (immutable) sorted map.
//!
//! This module provides [`SortedMap`], an ordered map backed by a
//! left-leaning red-black tree whose nodes are never mutated once shared:
//!
//! - [`SortedMap`]: the map itself
//! - [`SortedMapIterator`]: ascending traversal, optionally from a lower bound
//! - [`SortedMapReverseIterator`]: descending traversal, optionally from an
//!   upper bound
//! - [`SortedMapRangeIterator`]: ascending traversal of a key range
//! - [`SortedMapIntoIterator`]: owning ascending traversal
//!
//! # Structural Sharing
//!
//! Every update copies only the path from the root to the changed node; all
//! other subtrees are shared with the previous version. Versions can be kept
//! and read concurrently for as long as they are needed.
//!
//! # Examples
//!
//! ```rust
//! use immutable_sorted_map::persistent::SortedMap;
//!
//! let map = SortedMap::new()
//!     .insert(3, "three")
//!     .insert(1, "one")
//!     .insert(2, "two");
//!
//! // Entries are always in sorted order
//! let keys: Vec<&i32> = map.keys().collect();
//! assert_eq!(keys, vec![&1, &2, &3]);
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.insert(1, "ONE");
//! assert_eq!(map.get(&1), Some(&"one"));  // Original unchanged
//! assert_eq!(updated.get(&1), Some(&"ONE")); // New version
//!
//! // Range queries
//! let range: Vec<(&i32, &&str)> = map.range(1..=2).collect();
//! assert_eq!(range.len(), 2); // 1 and 2
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled (default), this is `std::sync::Arc`,
/// so maps can be shared and read across threads.
///
/// When the `arc` feature is disabled, this is `std::rc::Rc`,
/// which is faster but confines a map to one thread.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod builder;
mod engine;
mod iterator;
mod node;
mod sorted_map;

pub use iterator::SortedMapIntoIterator;
pub use iterator::SortedMapIterator;
pub use iterator::SortedMapRangeIterator;
pub use iterator::SortedMapReverseIterator;
pub use sorted_map::SortedMap;

// =============================================================================
// Tests
// =============================================================================
