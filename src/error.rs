//! Error types for sorted map construction and combination.
//!
//! Looking up or removing a missing key is never an error; those operations
//! return `Option` or an unchanged map. Errors are reserved for broken
//! caller contracts that would otherwise corrupt the ordering invariant.

use thiserror::Error;

/// Errors reported by [`SortedMap`](crate::persistent::SortedMap) operations.
///
/// # Examples
///
/// ```rust
/// use immutable_sorted_map::SortedMapError;
/// use immutable_sorted_map::persistent::SortedMap;
///
/// let result = SortedMap::<i32, i32>::from_sorted_entries(vec![(2, 2), (1, 1)]);
/// assert_eq!(result.unwrap_err(), SortedMapError::UnsortedInput { index: 1 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SortedMapError {
    /// Two maps ordered by different comparators were combined.
    #[error("cannot combine maps ordered by different comparators")]
    IncompatibleComparators,

    /// The bulk builder received a key ordered before its predecessor.
    #[error("bulk build input is not ascending: entry {index} sorts before its predecessor")]
    UnsortedInput {
        /// Position of the offending entry in the input sequence.
        index: usize,
    },

    /// The bulk builder received a key equal to its predecessor.
    #[error("bulk build input contains a duplicate key at entry {index}")]
    DuplicateKey {
        /// Position of the offending entry in the input sequence.
        index: usize,
    },
}
