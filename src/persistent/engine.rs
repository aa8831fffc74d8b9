//! Pure functions over shared subtrees.
//!
//! Every function here takes links to existing (immutable) nodes and returns
//! a new root. Only the nodes on the search path are copied; every subtree the
//! operation does not descend into is reused by reference.
//!
//! The balancing discipline is the left-leaning red-black tree (2-3 variant):
//!
//! 1. Red links lean left: no node has a red right child.
//! 2. No node has two red links in a row.
//! 3. Every path from the root to an empty link crosses the same number of
//!    black links.
//! 4. The root is black.
//!
//! Together these bound the height by `2 * log2(n + 1)`.

use super::ReferenceCounter;
use super::node::{Color, Link, Node, is_red, size};
use crate::comparator::Comparator;
use std::borrow::Borrow;
use std::cmp::Ordering;

// =============================================================================
// Lookups
// =============================================================================

/// Finds the node holding `key`.
pub(crate) fn find<'a, K, V, Q, C>(
    root: Option<&'a ReferenceCounter<Node<K, V>>>,
    key: &Q,
    comparator: &C,
) -> Option<&'a Node<K, V>>
where
    K: Borrow<Q>,
    Q: ?Sized,
    C: Comparator<Q> + ?Sized,
{
    let mut link = root;
    while let Some(node) = link {
        match comparator.compare(key, node.key.borrow()) {
            Ordering::Less => link = node.left.as_ref(),
            Ordering::Greater => link = node.right.as_ref(),
            Ordering::Equal => return Some(node),
        }
    }
    None
}

/// Returns the node with the smallest key.
pub(crate) fn min<K, V>(root: Option<&ReferenceCounter<Node<K, V>>>) -> Option<&Node<K, V>> {
    let mut node = root?;
    while let Some(left) = node.left.as_ref() {
        node = left;
    }
    Some(node)
}

/// Returns the node with the largest key.
pub(crate) fn max<K, V>(root: Option<&ReferenceCounter<Node<K, V>>>) -> Option<&Node<K, V>> {
    let mut node = root?;
    while let Some(right) = node.right.as_ref() {
        node = right;
    }
    Some(node)
}

/// Counts the keys ordered before `bound`, or before-or-equal when
/// `inclusive` is set.
pub(crate) fn rank<K, V, Q, C>(
    root: Option<&ReferenceCounter<Node<K, V>>>,
    bound: &Q,
    inclusive: bool,
    comparator: &C,
) -> usize
where
    K: Borrow<Q>,
    Q: ?Sized,
    C: Comparator<Q> + ?Sized,
{
    let mut count = 0;
    let mut link = root;
    while let Some(node) = link {
        let ordering = comparator.compare(node.key.borrow(), bound);
        if ordering == Ordering::Less || (inclusive && ordering == Ordering::Equal) {
            count += size(&node.left) + 1;
            link = node.right.as_ref();
        } else {
            link = node.left.as_ref();
        }
    }
    count
}

/// Returns the in-order position of `key`, if present.
pub(crate) fn find_index<K, V, Q, C>(
    root: Option<&ReferenceCounter<Node<K, V>>>,
    key: &Q,
    comparator: &C,
) -> Option<usize>
where
    K: Borrow<Q>,
    Q: ?Sized,
    C: Comparator<Q> + ?Sized,
{
    let mut preceding = 0;
    let mut link = root;
    while let Some(node) = link {
        match comparator.compare(key, node.key.borrow()) {
            Ordering::Less => link = node.left.as_ref(),
            Ordering::Greater => {
                preceding += size(&node.left) + 1;
                link = node.right.as_ref();
            }
            Ordering::Equal => return Some(preceding + size(&node.left)),
        }
    }
    None
}

/// Returns the node at the given in-order position.
pub(crate) fn select<K, V>(
    root: Option<&ReferenceCounter<Node<K, V>>>,
    index: usize,
) -> Option<&Node<K, V>> {
    let mut remaining = index;
    let mut link = root;
    while let Some(node) = link {
        let left_size = size(&node.left);
        match remaining.cmp(&left_size) {
            Ordering::Less => link = node.left.as_ref(),
            Ordering::Equal => return Some(node),
            Ordering::Greater => {
                remaining -= left_size + 1;
                link = node.right.as_ref();
            }
        }
    }
    None
}

// =============================================================================
// Insertion
// =============================================================================

/// Inserts or replaces an entry, returning the new root.
///
/// When `key` is already present the stored key is kept and only the value
/// changes.
pub(crate) fn insert<K, V, C>(
    root: Option<&ReferenceCounter<Node<K, V>>>,
    key: K,
    value: V,
    comparator: &C,
) -> ReferenceCounter<Node<K, V>>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + ?Sized,
{
    insert_into(root, key, value, comparator)
        .with_color(Color::Black)
        .share()
}

fn insert_into<K, V, C>(
    link: Option<&ReferenceCounter<Node<K, V>>>,
    key: K,
    value: V,
    comparator: &C,
) -> Node<K, V>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + ?Sized,
{
    let Some(node) = link else {
        return Node::leaf(key, value);
    };

    match comparator.compare(&key, &node.key) {
        Ordering::Less => {
            let left = insert_into(node.left.as_ref(), key, value, comparator);
            fix_up(node.copy_with_left(Some(left.share())))
        }
        Ordering::Greater => {
            let right = insert_into(node.right.as_ref(), key, value, comparator);
            fix_up(node.copy_with_right(Some(right.share())))
        }
        Ordering::Equal => node.copy_with_value(value),
    }
}

// =============================================================================
// Removal
// =============================================================================

/// Removes `key`, returning the new root (`None` when the tree empties).
///
/// The caller must ensure `key` is present; an absent key is handled by
/// returning the original map without calling into the engine.
pub(crate) fn remove<K, V, Q, C>(
    root: &ReferenceCounter<Node<K, V>>,
    key: &Q,
    comparator: &C,
) -> Link<K, V>
where
    K: Clone + Borrow<Q>,
    V: Clone,
    Q: ?Sized,
    C: Comparator<Q> + ?Sized,
{
    remove_from(Node::clone(root), key, comparator)
        .map(|node| node.with_color(Color::Black).share())
}

fn remove_from<K, V, Q, C>(node: Node<K, V>, key: &Q, comparator: &C) -> Option<Node<K, V>>
where
    K: Clone + Borrow<Q>,
    V: Clone,
    Q: ?Sized,
    C: Comparator<Q> + ?Sized,
{
    let mut node = node;

    if comparator.compare(key, node.key.borrow()) == Ordering::Less {
        let left_is_two_node = node
            .left
            .as_ref()
            .is_some_and(|left| !left.is_red() && !is_red(&left.left));
        if left_is_two_node {
            node = move_red_left(node);
        }
        node.left = node
            .left
            .take()
            .and_then(|left| remove_from(ReferenceCounter::unwrap_or_clone(left), key, comparator))
            .map(Node::share);
    } else {
        if is_red(&node.left) {
            node = rotate_right(node);
        }

        if comparator.compare(key, node.key.borrow()) == Ordering::Equal && node.right.is_none() {
            return None;
        }

        let right_is_two_node = node
            .right
            .as_ref()
            .is_some_and(|right| !right.is_red() && !is_red(&right.left));
        if right_is_two_node {
            node = move_red_right(node);
        }

        let right = node.right.take();
        if comparator.compare(key, node.key.borrow()) == Ordering::Equal {
            if let Some(right) = right {
                let (successor_key, successor_value, remaining) =
                    remove_min(ReferenceCounter::unwrap_or_clone(right));
                node.key = successor_key;
                node.value = successor_value;
                node.right = remaining.map(Node::share);
            }
        } else {
            node.right = right
                .and_then(|right| {
                    remove_from(ReferenceCounter::unwrap_or_clone(right), key, comparator)
                })
                .map(Node::share);
        }
    }

    Some(fix_up(node.resized()))
}

/// Detaches the smallest entry of a subtree.
///
/// Returns the removed key and value together with the remaining subtree.
fn remove_min<K: Clone, V: Clone>(node: Node<K, V>) -> (K, V, Option<Node<K, V>>) {
    if node.left.is_none() {
        debug_assert!(node.right.is_none(), "red links must lean left");
        return (node.key, node.value, None);
    }

    let mut node = node;
    let left_is_two_node = node
        .left
        .as_ref()
        .is_some_and(|left| !left.is_red() && !is_red(&left.left));
    if left_is_two_node {
        node = move_red_left(node);
    }

    let Some(left) = node.left.take() else {
        // move_red_left keeps a left child in place
        return (node.key, node.value, None);
    };
    let (key, value, remaining) = remove_min(ReferenceCounter::unwrap_or_clone(left));
    node.left = remaining.map(Node::share);
    (key, value, Some(fix_up(node.resized())))
}

// =============================================================================
// Rebalancing
// =============================================================================

/// Restores the left-leaning invariants at a node whose children are valid.
fn fix_up<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
    let mut node = node;
    if is_red(&node.right) && !is_red(&node.left) {
        node = rotate_left(node);
    }
    if node
        .left
        .as_ref()
        .is_some_and(|left| left.is_red() && is_red(&left.left))
    {
        node = rotate_right(node);
    }
    if is_red(&node.left) && is_red(&node.right) {
        node = flip_colors(node);
    }
    node
}

/// Turns a right-leaning link into a left-leaning one.
fn rotate_left<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
    let mut node = node;
    let Some(right) = node.right.take() else {
        return node;
    };
    let color = node.color;
    let lowered = node
        .with_right(right.left.clone())
        .with_color(Color::Red);
    right
        .copy_with_left(Some(lowered.share()))
        .with_color(color)
}

/// Turns a left-leaning link into a right-leaning one.
fn rotate_right<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
    let mut node = node;
    let Some(left) = node.left.take() else {
        return node;
    };
    let color = node.color;
    let lowered = node
        .with_left(left.right.clone())
        .with_color(Color::Red);
    left.copy_with_right(Some(lowered.share()))
        .with_color(color)
}

/// Inverts the colors of a node and both of its children.
fn flip_colors<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
    let mut node = node;
    node.left = node.left.take().map(|left| left.copy_flipped().share());
    node.right = node.right.take().map(|right| right.copy_flipped().share());
    let color = node.color.flip();
    node.with_color(color)
}

/// Makes the left child or one of its children red before descending left.
fn move_red_left<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
    let mut node = flip_colors(node);
    let right_left_is_red = node.right.as_ref().is_some_and(|right| is_red(&right.left));
    if right_left_is_red {
        node.right = node
            .right
            .take()
            .map(|right| rotate_right(ReferenceCounter::unwrap_or_clone(right)).share());
        node = flip_colors(rotate_left(node));
    }
    node
}

/// Makes the right child or one of its children red before descending right.
fn move_red_right<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
    let mut node = flip_colors(node);
    let left_left_is_red = node.left.as_ref().is_some_and(|left| is_red(&left.left));
    if left_left_is_red {
        node = flip_colors(rotate_right(node));
    }
    node
}

// =============================================================================
// Whole-tree transformations
// =============================================================================

/// Rebuilds the tree with transformed values, keeping its exact shape.
///
/// `transform` is called once per entry in ascending key order.
pub(crate) fn map_values<K, V, W, F>(
    link: Option<&ReferenceCounter<Node<K, V>>>,
    transform: &mut F,
) -> Link<K, W>
where
    K: Clone,
    F: FnMut(&V) -> W,
{
    let node = link?;
    let left = map_values(node.left.as_ref(), transform);
    let value = transform(&node.value);
    let right = map_values(node.right.as_ref(), transform);
    Some(Node::new(node.key.clone(), value, node.color, left, right).share())
}

// =============================================================================
// Invariant checking (tests only)
// =============================================================================

/// Verifies ordering, size caches and left-leaning red-black shape.
///
/// Returns the black height of the tree.
#[cfg(test)]
pub(crate) fn check_invariants<K, V, C>(
    root: Option<&ReferenceCounter<Node<K, V>>>,
    comparator: &C,
) -> Result<usize, String>
where
    K: std::fmt::Debug,
    C: Comparator<K> + ?Sized,
{
    fn check<'a, K, V, C>(
        link: Option<&'a ReferenceCounter<Node<K, V>>>,
        lower: Option<&'a K>,
        upper: Option<&'a K>,
        comparator: &C,
    ) -> Result<usize, String>
    where
        K: std::fmt::Debug,
        C: Comparator<K> + ?Sized,
    {
        let Some(node) = link else {
            return Ok(0);
        };
        if let Some(lower) = lower
            && comparator.compare(lower, &node.key) != Ordering::Less
        {
            return Err(format!("{:?} is not greater than {lower:?}", node.key));
        }
        if let Some(upper) = upper
            && comparator.compare(&node.key, upper) != Ordering::Less
        {
            return Err(format!("{:?} is not less than {upper:?}", node.key));
        }
        if is_red(&node.right) {
            return Err(format!("red right link below {:?}", node.key));
        }
        if node.is_red() && is_red(&node.left) {
            return Err(format!("two red links in a row at {:?}", node.key));
        }
        if node.size != 1 + size(&node.left) + size(&node.right) {
            return Err(format!("stale size cache at {:?}", node.key));
        }
        let left_black = check(node.left.as_ref(), lower, Some(&node.key), comparator)?;
        let right_black = check(node.right.as_ref(), Some(&node.key), upper, comparator)?;
        if left_black != right_black {
            return Err(format!(
                "black height mismatch at {:?}: {left_black} vs {right_black}",
                node.key
            ));
        }
        Ok(left_black + usize::from(!node.is_red()))
    }

    if root.is_some_and(|node| node.is_red()) {
        return Err("red root".to_string());
    }
    check(root, None, None, comparator)
}

// =============================================================================
// Tests
// =============================================================================
