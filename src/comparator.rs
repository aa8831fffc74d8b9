//! Key orderings bound to a sorted map.
//!
//! A [`Comparator`] is a value, not just a type: every
//! [`SortedMap`](crate::persistent::SortedMap) carries the comparator it was
//! created with, and every map derived from it through `insert`/`remove`
//! inherits that same instance. Operations that combine two maps require the
//! comparators to compare equal.
//!
//! # Examples
//!
//! ```rust
//! use immutable_sorted_map::comparator::{Comparator, NaturalOrder, ReverseOrder};
//! use std::cmp::Ordering;
//!
//! assert_eq!(NaturalOrder.compare(&1, &2), Ordering::Less);
//! assert_eq!(ReverseOrder.compare(&1, &2), Ordering::Greater);
//! ```

use crate::persistent::ReferenceCounter;
use std::cmp::Ordering;
use std::fmt;

/// A total strict ordering over keys of type `K`.
///
/// Implementations must behave as a strict weak ordering: `compare(a, a)` is
/// `Equal`, `compare(a, b)` is the reverse of `compare(b, a)`, and the
/// relation is transitive. A comparator that breaks these rules produces
/// maps whose lookups silently miss entries.
pub trait Comparator<K: ?Sized> {
    /// Compares two keys.
    fn compare(&self, left: &K, right: &K) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        left.cmp(right)
    }
}

/// Orders keys by the reverse of their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ReverseOrder;

impl<K: Ord + ?Sized> Comparator<K> for ReverseOrder {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        right.cmp(left)
    }
}

/// The shared closure type wrapped by [`FnComparator`].
type CompareFunction<K> = dyn Fn(&K, &K) -> Ordering + Send + Sync;

/// A comparator backed by a caller-supplied closure.
///
/// Cloning shares the closure. Two `FnComparator`s are equal only when they
/// share the same closure allocation, so maps built from independently
/// created comparators are never treated as compatible, even if the closures
/// happen to agree.
///
/// # Examples
///
/// ```rust
/// use immutable_sorted_map::comparator::FnComparator;
/// use immutable_sorted_map::persistent::SortedMap;
///
/// let by_length = FnComparator::new(|left: &String, right: &String| {
///     left.len().cmp(&right.len()).then_with(|| left.cmp(right))
/// });
/// let map = SortedMap::with_comparator(by_length)
///     .insert("ccc".to_string(), 3)
///     .insert("a".to_string(), 1)
///     .insert("bb".to_string(), 2);
///
/// let keys: Vec<&String> = map.keys().collect();
/// assert_eq!(keys, vec!["a", "bb", "ccc"]);
/// ```
pub struct FnComparator<K: ?Sized> {
    function: ReferenceCounter<CompareFunction<K>>,
}

impl<K: ?Sized> FnComparator<K> {
    /// Wraps a comparison closure.
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&K, &K) -> Ordering + Send + Sync + 'static,
    {
        Self {
            function: ReferenceCounter::new(function),
        }
    }
}

impl<K: ?Sized> Comparator<K> for FnComparator<K> {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        (self.function)(left, right)
    }
}

impl<K: ?Sized> Clone for FnComparator<K> {
    fn clone(&self) -> Self {
        Self {
            function: ReferenceCounter::clone(&self.function),
        }
    }
}

impl<K: ?Sized> PartialEq for FnComparator<K> {
    fn eq(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.function, &other.function)
    }
}

impl<K: ?Sized> Eq for FnComparator<K> {}

impl<K: ?Sized> fmt::Debug for FnComparator<K> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FnComparator")
            .field("function", &ReferenceCounter::as_ptr(&self.function))
            .finish()
    }
}

impl<K: ?Sized, C: Comparator<K> + ?Sized> Comparator<K> for &C {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        (**self).compare(left, right)
    }
}
