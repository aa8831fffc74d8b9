//! Linear-time construction from sorted input.
//!
//! Inserting n sorted entries one at a time costs O(n log n) and allocates a
//! fresh path per entry. The builder instead lays the entries out directly as
//! a valid left-leaning red-black tree:
//!
//! - The left spine is a chain of *pennants*. A pennant is one node whose
//!   right child is a perfectly balanced, all-black tree of `2^level - 1`
//!   entries, built by splitting the run at its midpoint.
//! - Pennant sizes follow the binary digits of `n + 1`: every level below the
//!   top contributes one black pennant, and a set digit adds a red pennant
//!   hanging left of it.
//!
//! Every path then crosses the same number of black links and red links only
//! lean left, so no rebalancing is needed afterwards.

use super::node::{Color, Link, Node};
use crate::comparator::Comparator;
use crate::error::SortedMapError;
use std::cmp::Ordering;

/// Builds a tree from entries that must be strictly ascending.
///
/// The input is validated before any node is allocated.
pub(crate) fn build<K, V, C>(entries: Vec<(K, V)>, comparator: &C) -> Result<Link<K, V>, SortedMapError>
where
    C: Comparator<K> + ?Sized,
{
    validate(&entries, comparator)?;
    tracing::trace!(entries = entries.len(), "bulk building sorted map");
    Ok(build_unchecked(entries))
}

/// Builds a tree from entries the caller already knows to be strictly
/// ascending, such as the output of an in-order walk.
pub(crate) fn build_unchecked<K, V>(entries: Vec<(K, V)>) -> Link<K, V> {
    let length = entries.len();
    let mut source = entries.into_iter();
    let mut spine: Link<K, V> = None;

    // Pennants are listed from the largest keys down; the spine is grown from
    // the smallest keys up so that the input is consumed in order.
    for (color, chunk) in pennants(length).into_iter().rev() {
        let Some((key, value)) = source.next() else {
            break;
        };
        let right = build_perfect(&mut source, chunk - 1);
        spine = Some(Node::new(key, value, color, spine, right).share());
    }

    spine
}

fn validate<K, V, C>(entries: &[(K, V)], comparator: &C) -> Result<(), SortedMapError>
where
    C: Comparator<K> + ?Sized,
{
    for (offset, pair) in entries.windows(2).enumerate() {
        let index = offset + 1;
        match comparator.compare(&pair[0].0, &pair[1].0) {
            Ordering::Less => {}
            Ordering::Equal => {
                tracing::debug!(index, "rejected bulk build input with a duplicate key");
                return Err(SortedMapError::DuplicateKey { index });
            }
            Ordering::Greater => {
                tracing::debug!(index, "rejected bulk build input that is not ascending");
                return Err(SortedMapError::UnsortedInput { index });
            }
        }
    }
    Ok(())
}

/// Lists `(color, chunk size)` pennants covering `length` entries, top of the
/// spine first.
fn pennants(length: usize) -> Vec<(Color, usize)> {
    let digits = length + 1;
    let levels = digits.ilog2();
    let mut pennants = Vec::with_capacity(2 * levels as usize);

    for level in (0..levels).rev() {
        let chunk = 1_usize << level;
        pennants.push((Color::Black, chunk));
        if digits & chunk != 0 {
            pennants.push((Color::Red, chunk));
        }
    }

    pennants
}

/// Builds an all-black tree from the next `size` entries by splitting at the
/// midpoint. Perfectly balanced when `size` is one less than a power of two.
fn build_perfect<K, V, I>(source: &mut I, size: usize) -> Link<K, V>
where
    I: Iterator<Item = (K, V)>,
{
    if size == 0 {
        return None;
    }
    let left_size = size / 2;
    let left = build_perfect(source, left_size);
    let (key, value) = source.next()?;
    let right = build_perfect(source, size - left_size - 1);
    Some(Node::new(key, value, Color::Black, left, right).share())
}
