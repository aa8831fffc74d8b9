//! Immutable tree nodes.
//!
//! A node is never modified once it is shared through a
//! [`ReferenceCounter`]. The engine builds new nodes as owned values, edits
//! them while they are still private, and only then calls [`Node::share`].

use super::ReferenceCounter;

// =============================================================================
// Color Definition
// =============================================================================

/// The color of the link from a node's parent to the node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Color {
    Red,
    Black,
}

impl Color {
    pub(crate) const fn flip(self) -> Self {
        match self {
            Self::Red => Self::Black,
            Self::Black => Self::Red,
        }
    }
}

// =============================================================================
// Node Definition
// =============================================================================

/// A possibly empty, shared subtree.
pub(crate) type Link<K, V> = Option<ReferenceCounter<Node<K, V>>>;

/// Internal node of the left-leaning red-black tree.
///
/// `size` caches the number of entries in the subtree rooted here, which makes
/// `len`, rank and positional lookups logarithmic or constant.
#[derive(Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) color: Color,
    pub(crate) size: usize,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    /// Creates a red node with no children.
    pub(crate) const fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            value,
            color: Color::Red,
            size: 1,
            left: None,
            right: None,
        }
    }

    /// Creates a node over existing subtrees.
    pub(crate) fn new(key: K, value: V, color: Color, left: Link<K, V>, right: Link<K, V>) -> Self {
        Self {
            key,
            value,
            color,
            size: 1 + size(&left) + size(&right),
            left,
            right,
        }
    }

    pub(crate) fn is_red(&self) -> bool {
        self.color == Color::Red
    }

    /// Freezes this node so it can be shared between versions.
    pub(crate) fn share(self) -> ReferenceCounter<Self> {
        ReferenceCounter::new(self)
    }

    pub(crate) fn with_left(mut self, left: Link<K, V>) -> Self {
        self.left = left;
        self.resized()
    }

    pub(crate) fn with_right(mut self, right: Link<K, V>) -> Self {
        self.right = right;
        self.resized()
    }

    pub(crate) const fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Recomputes the cached size from the children.
    pub(crate) fn resized(mut self) -> Self {
        self.size = 1 + size(&self.left) + size(&self.right);
        self
    }
}

impl<K: Clone, V: Clone> Node<K, V> {
    /// Copies this node with a different left subtree.
    pub(crate) fn copy_with_left(&self, left: Link<K, V>) -> Self {
        Self::new(
            self.key.clone(),
            self.value.clone(),
            self.color,
            left,
            self.right.clone(),
        )
    }

    /// Copies this node with a different right subtree.
    pub(crate) fn copy_with_right(&self, right: Link<K, V>) -> Self {
        Self::new(
            self.key.clone(),
            self.value.clone(),
            self.color,
            self.left.clone(),
            right,
        )
    }

    /// Copies this node with a replaced value, keeping the stored key.
    pub(crate) fn copy_with_value(&self, value: V) -> Self {
        Self {
            key: self.key.clone(),
            value,
            color: self.color,
            size: self.size,
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }

    /// Copies this node with its color inverted.
    pub(crate) fn copy_flipped(&self) -> Self {
        self.clone().with_color(self.color.flip())
    }
}

/// Number of entries in a subtree.
#[inline]
pub(crate) fn size<K, V>(link: &Link<K, V>) -> usize {
    link.as_ref().map_or(0, |node| node.size)
}

/// Checks if an optional node is red. Empty links are black.
#[inline]
pub(crate) fn is_red<K, V>(link: &Link<K, V>) -> bool {
    link.as_ref().is_some_and(|node| node.is_red())
}

/// Number of nodes on the longest root-to-leaf path.
pub(crate) fn height<K, V>(link: &Link<K, V>) -> usize {
    link.as_ref()
        .map_or(0, |node| 1 + height(&node.left).max(height(&node.right)))
}
