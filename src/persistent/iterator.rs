//! Stack-based in-order traversal.
//!
//! Iterators keep an explicit stack of the nodes still to be visited instead
//! of recursing, so traversal depth never touches the call stack. The stack
//! lives inline for trees up to a few hundred thousand entries and spills to
//! the heap beyond that.
//!
//! The number of entries left is known up front from the cached subtree
//! sizes, which is what makes every borrowing iterator an
//! [`ExactSizeIterator`] and lets a range iterator stop without comparing
//! keys against its end bound.

use super::ReferenceCounter;
use super::node::{Link, Node, size};
use crate::comparator::Comparator;
use smallvec::SmallVec;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::iter::FusedIterator;

/// Inline stack depth. A left-leaning red-black tree of height 36 holds at
/// least `2^18 - 1` entries.
const STACK_CAPACITY: usize = 36;

type Stack<'a, K, V> = SmallVec<[&'a Node<K, V>; STACK_CAPACITY]>;

// =============================================================================
// Ascending Iterator
// =============================================================================

/// An iterator over entries of a [`SortedMap`](super::SortedMap) in
/// ascending key order.
pub struct SortedMapIterator<'a, K, V> {
    stack: Stack<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> SortedMapIterator<'a, K, V> {
    /// Starts at the smallest key.
    pub(crate) fn new(root: Option<&'a ReferenceCounter<Node<K, V>>>) -> Self {
        let mut iterator = Self {
            stack: SmallVec::new(),
            remaining: root.map_or(0, |node| node.size),
        };
        iterator.push_left_spine(root);
        iterator
    }

    /// Starts at the first key not less than `bound`, or the first key greater
    /// than `bound` when `inclusive` is unset.
    pub(crate) fn from_lower_bound<Q, C>(
        root: Option<&'a ReferenceCounter<Node<K, V>>>,
        bound: &Q,
        inclusive: bool,
        comparator: &C,
    ) -> Self
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q> + ?Sized,
    {
        let mut stack = Stack::new();
        let mut skipped = 0;
        let mut link = root;
        while let Some(node) = link {
            let ordering = comparator.compare(node.key.borrow(), bound);
            if ordering == Ordering::Less || (!inclusive && ordering == Ordering::Equal) {
                skipped += size(&node.left) + 1;
                link = node.right.as_ref();
            } else {
                stack.push(&**node);
                link = node.left.as_ref();
            }
        }

        Self {
            stack,
            remaining: root.map_or(0, |node| node.size) - skipped,
        }
    }

    /// Caps the number of entries still to be yielded.
    pub(crate) fn limit(mut self, count: usize) -> Self {
        self.remaining = self.remaining.min(count);
        self
    }

    fn push_left_spine(&mut self, mut link: Option<&'a ReferenceCounter<Node<K, V>>>) {
        while let Some(node) = link {
            self.stack.push(node);
            link = node.left.as_ref();
        }
    }
}

impl<'a, K, V> Iterator for SortedMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.stack.pop()?;
        self.remaining -= 1;
        self.push_left_spine(node.right.as_ref());
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for SortedMapIterator<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for SortedMapIterator<'_, K, V> {}

impl<K, V> Clone for SortedMapIterator<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

// =============================================================================
// Descending Iterator
// =============================================================================

/// An iterator over entries of a [`SortedMap`](super::SortedMap) in
/// descending key order.
pub struct SortedMapReverseIterator<'a, K, V> {
    stack: Stack<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> SortedMapReverseIterator<'a, K, V> {
    /// Starts at the largest key.
    pub(crate) fn new(root: Option<&'a ReferenceCounter<Node<K, V>>>) -> Self {
        let mut iterator = Self {
            stack: SmallVec::new(),
            remaining: root.map_or(0, |node| node.size),
        };
        iterator.push_right_spine(root);
        iterator
    }

    /// Starts at the last key not greater than `bound`.
    pub(crate) fn from_upper_bound<Q, C>(
        root: Option<&'a ReferenceCounter<Node<K, V>>>,
        bound: &Q,
        comparator: &C,
    ) -> Self
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q> + ?Sized,
    {
        let mut stack = Stack::new();
        let mut remaining = 0;
        let mut link = root;
        while let Some(node) = link {
            if comparator.compare(node.key.borrow(), bound) == Ordering::Greater {
                link = node.left.as_ref();
            } else {
                remaining += size(&node.left) + 1;
                stack.push(&**node);
                link = node.right.as_ref();
            }
        }

        Self { stack, remaining }
    }

    fn push_right_spine(&mut self, mut link: Option<&'a ReferenceCounter<Node<K, V>>>) {
        while let Some(node) = link {
            self.stack.push(node);
            link = node.right.as_ref();
        }
    }
}

impl<'a, K, V> Iterator for SortedMapReverseIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.stack.pop()?;
        self.remaining -= 1;
        self.push_right_spine(node.left.as_ref());
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for SortedMapReverseIterator<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for SortedMapReverseIterator<'_, K, V> {}

// =============================================================================
// Range Iterator
// =============================================================================

/// An iterator over the entries of a [`SortedMap`](super::SortedMap) whose
/// keys fall inside a range, in ascending key order.
pub struct SortedMapRangeIterator<'a, K, V> {
    inner: SortedMapIterator<'a, K, V>,
}

impl<'a, K, V> SortedMapRangeIterator<'a, K, V> {
    pub(crate) const fn new(inner: SortedMapIterator<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for SortedMapRangeIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for SortedMapRangeIterator<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for SortedMapRangeIterator<'_, K, V> {}

// =============================================================================
// Owning Iterator
// =============================================================================

/// An owning iterator over entries of a [`SortedMap`](super::SortedMap) in
/// ascending key order.
///
/// Nodes owned solely by this iterator are taken apart and their entries
/// moved out. Nodes still shared with other maps are left in place and their
/// entries cloned.
pub struct SortedMapIntoIterator<K, V> {
    stack: SmallVec<[Pending<K, V>; STACK_CAPACITY]>,
    remaining: usize,
}

/// An entry waiting on the owning iterator's stack.
enum Pending<K, V> {
    /// Detached from a uniquely owned node, along with its right subtree.
    Owned { key: K, value: V, right: Link<K, V> },
    /// Still reachable from another map.
    Shared(ReferenceCounter<Node<K, V>>),
}

impl<K, V> SortedMapIntoIterator<K, V> {
    pub(crate) fn new(root: Link<K, V>) -> Self {
        let mut iterator = Self {
            stack: SmallVec::new(),
            remaining: root.as_ref().map_or(0, |node| node.size),
        };
        iterator.push_left_spine(root);
        iterator
    }

    fn push_left_spine(&mut self, mut link: Link<K, V>) {
        while let Some(node) = link {
            match ReferenceCounter::try_unwrap(node) {
                Ok(Node {
                    key,
                    value,
                    left,
                    right,
                    ..
                }) => {
                    link = left;
                    self.stack.push(Pending::Owned { key, value, right });
                }
                Err(shared) => {
                    link = shared.left.clone();
                    self.stack.push(Pending::Shared(shared));
                }
            }
        }
    }
}

impl<K: Clone, V: Clone> Iterator for SortedMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let pending = self.stack.pop()?;
        self.remaining -= 1;
        match pending {
            Pending::Owned { key, value, right } => {
                self.push_left_spine(right);
                Some((key, value))
            }
            Pending::Shared(node) => {
                self.push_left_spine(node.right.clone());
                Some((node.key.clone(), node.value.clone()))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Clone, V: Clone> ExactSizeIterator for SortedMapIntoIterator<K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K: Clone, V: Clone> FusedIterator for SortedMapIntoIterator<K, V> {}
