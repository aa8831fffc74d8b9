//! # immutable-sorted-map
//!
//! A persistent (immutable) sorted associative container for Rust.
//!
//! ## Overview
//!
//! [`SortedMap`] maps keys to values in the order defined by a
//! [`Comparator`](comparator::Comparator) chosen when the map is created.
//! Every update returns a new map and leaves the original untouched; the two
//! versions share all nodes except the O(log N) path that changed.
//!
//! - **Lookups**: `get`, `contains_key`, `min`, `max`, `find_index`, `get_index`
//! - **Updates**: `insert`, `remove`, `map_values`, `keep_if`, `merge`
//! - **Traversal**: ascending, descending, bounded and range iterators
//! - **Bulk construction**: linear-time building from sorted input
//!
//! ## Feature Flags
//!
//! - `arc` (default): share nodes with `Arc` so maps are `Send + Sync`
//! - `serde`: `Serialize`/`Deserialize` for [`SortedMap`]
//!
//! ## Example
//!
//! ```rust
//! use immutable_sorted_map::prelude::*;
//!
//! let map = SortedMap::new()
//!     .insert("b", 2)
//!     .insert("a", 1)
//!     .insert("c", 3);
//!
//! let newer = map.remove(&"b");
//! assert_eq!(map.len(), 3);
//! assert_eq!(newer.iter().collect::<Vec<_>>(), vec![(&"a", &1), (&"c", &3)]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports the map, its comparators and its error type.
///
/// # Usage
///
/// ```rust
/// use immutable_sorted_map::prelude::*;
/// ```
pub mod prelude {
    pub use crate::comparator::*;
    pub use crate::error::SortedMapError;
    pub use crate::persistent::*;
}

pub mod comparator;
pub mod error;
pub mod persistent;

pub use error::SortedMapError;
pub use persistent::SortedMap;
