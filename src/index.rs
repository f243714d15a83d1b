//! Internal hash index backing the persistent map.
//!
//! The map's outer index — from a `u64` hash code to that hash's collision
//! bucket — is a persistent Red-Black Tree. Path copying on insertion and
//! removal means a mutation replaces only the nodes along one root-to-leaf
//! path; every other subtree is shared between the old and new index, which
//! is what keeps map mutations down to "one bucket and one index path".
//!
//! The tree maintains the usual invariants (red nodes have black children,
//! equal black height on every path), rebalancing on insertion through the
//! four red-red rotation cases. Removal rebuilds the affected path without
//! rebalancing; the tree stays correct and close enough to balanced for an
//! index keyed by hash codes.
//!
//! This module is crate-private: the tree is a backing detail of
//! [`PersistentHashMap`](crate::PersistentHashMap), not a public collection.

use crate::ReferenceCounter;

/// The color of a Red-Black Tree node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Color {
    Red,
    Black,
}

/// Internal node structure for the index tree.
#[derive(Clone)]
struct IndexNode<V> {
    hash: u64,
    bucket: V,
    color: Color,
    left: Option<ReferenceCounter<Self>>,
    right: Option<ReferenceCounter<Self>>,
}

impl<V> IndexNode<V> {
    /// Creates a new red node with no children.
    const fn new_red(hash: u64, bucket: V) -> Self {
        Self {
            hash,
            bucket,
            color: Color::Red,
            left: None,
            right: None,
        }
    }

    /// Checks if this node is red.
    fn is_red(&self) -> bool {
        self.color == Color::Red
    }
}

impl<V: Clone> IndexNode<V> {
    /// Creates a copy of this node with a new color.
    fn with_color(&self, color: Color) -> Self {
        Self {
            hash: self.hash,
            bucket: self.bucket.clone(),
            color,
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }

    /// Creates a copy of this node with new children.
    fn with_children(
        &self,
        left: Option<ReferenceCounter<Self>>,
        right: Option<ReferenceCounter<Self>>,
    ) -> Self {
        Self {
            hash: self.hash,
            bucket: self.bucket.clone(),
            color: self.color,
            left,
            right,
        }
    }
}

/// Helper function to check if an optional node is red.
fn is_red<V>(node: Option<&ReferenceCounter<IndexNode<V>>>) -> bool {
    node.is_some_and(|node_ref| node_ref.is_red())
}

/// A persistent Red-Black Tree from hash codes to collision buckets.
#[derive(Clone)]
pub(crate) struct HashIndex<V> {
    /// Root node of the tree.
    root: Option<ReferenceCounter<IndexNode<V>>>,
}

impl<V> HashIndex<V> {
    /// Creates a new empty index.
    #[inline]
    pub(crate) const fn empty() -> Self {
        Self { root: None }
    }

    /// Returns a reference to the bucket stored under `hash`.
    pub(crate) fn get(&self, hash: u64) -> Option<&V> {
        Self::get_from_node(self.root.as_ref(), hash)
    }

    /// Recursive helper for `get`.
    fn get_from_node(node: Option<&ReferenceCounter<IndexNode<V>>>, hash: u64) -> Option<&V> {
        node.and_then(|node_ref| {
            if hash < node_ref.hash {
                Self::get_from_node(node_ref.left.as_ref(), hash)
            } else if hash > node_ref.hash {
                Self::get_from_node(node_ref.right.as_ref(), hash)
            } else {
                Some(&node_ref.bucket)
            }
        })
    }

    /// Returns an in-order iterator over `(hash, bucket)` slots.
    pub(crate) fn iter(&self) -> HashIndexIterator<'_, V> {
        let mut iterator = HashIndexIterator { stack: Vec::new() };
        iterator.push_left_spine(self.root.as_ref());
        iterator
    }
}

impl<V: Clone> HashIndex<V> {
    /// Stores `bucket` under `hash`, replacing any previous bucket there.
    ///
    /// Only the path from the root to the affected slot is copied; all
    /// other subtrees are shared with the original index.
    pub(crate) fn insert(&self, hash: u64, bucket: V) -> Self {
        let new_root = Self::insert_into_node(self.root.as_ref(), hash, bucket);

        // Make root black
        let black_root = new_root.map(|node_ref| {
            if node_ref.is_red() {
                ReferenceCounter::new(node_ref.with_color(Color::Black))
            } else {
                node_ref
            }
        });

        Self { root: black_root }
    }

    /// Recursive helper for `insert`.
    fn insert_into_node(
        node: Option<&ReferenceCounter<IndexNode<V>>>,
        hash: u64,
        bucket: V,
    ) -> Option<ReferenceCounter<IndexNode<V>>> {
        match node {
            None => Some(ReferenceCounter::new(IndexNode::new_red(hash, bucket))),
            Some(node_ref) => {
                if hash < node_ref.hash {
                    let new_left = Self::insert_into_node(node_ref.left.as_ref(), hash, bucket);
                    let new_node = node_ref.with_children(new_left, node_ref.right.clone());
                    Some(ReferenceCounter::new(Self::balance(new_node)))
                } else if hash > node_ref.hash {
                    let new_right = Self::insert_into_node(node_ref.right.as_ref(), hash, bucket);
                    let new_node = node_ref.with_children(node_ref.left.clone(), new_right);
                    Some(ReferenceCounter::new(Self::balance(new_node)))
                } else {
                    // Slot exists, replace the bucket
                    Some(ReferenceCounter::new(IndexNode {
                        hash,
                        bucket,
                        color: node_ref.color,
                        left: node_ref.left.clone(),
                        right: node_ref.right.clone(),
                    }))
                }
            }
        }
    }

    /// Balances the tree after insertion.
    /// Handles the four cases of red-red violation.
    fn balance(node: IndexNode<V>) -> IndexNode<V> {
        // Case 1: Left-Left (left child is red, left-left grandchild is red)
        if is_red(node.left.as_ref())
            && let Some(left) = &node.left
            && is_red(left.left.as_ref())
        {
            return Self::rotate_right_and_recolor(node);
        }

        // Case 2: Left-Right (left child is red, left-right grandchild is red)
        if is_red(node.left.as_ref())
            && let Some(left) = &node.left
            && is_red(left.right.as_ref())
        {
            // First rotate left on the left child, then rotate right on node
            let new_left = Self::rotate_left((**left).clone());
            let new_node =
                node.with_children(Some(ReferenceCounter::new(new_left)), node.right.clone());
            return Self::rotate_right_and_recolor(new_node);
        }

        // Case 3: Right-Right (right child is red, right-right grandchild is red)
        if is_red(node.right.as_ref())
            && let Some(right) = &node.right
            && is_red(right.right.as_ref())
        {
            return Self::rotate_left_and_recolor(node);
        }

        // Case 4: Right-Left (right child is red, right-left grandchild is red)
        if is_red(node.right.as_ref())
            && let Some(right) = &node.right
            && is_red(right.left.as_ref())
        {
            // First rotate right on the right child, then rotate left on node
            let new_right = Self::rotate_right((**right).clone());
            let new_node =
                node.with_children(node.left.clone(), Some(ReferenceCounter::new(new_right)));
            return Self::rotate_left_and_recolor(new_node);
        }

        node
    }

    /// Rotates the tree to the right around the given node.
    fn rotate_right(node: IndexNode<V>) -> IndexNode<V> {
        if let Some(left) = node.left {
            let new_node = IndexNode {
                hash: node.hash,
                bucket: node.bucket,
                color: node.color,
                left: left.right.clone(),
                right: node.right,
            };
            IndexNode {
                hash: left.hash,
                bucket: left.bucket.clone(),
                color: left.color,
                left: left.left.clone(),
                right: Some(ReferenceCounter::new(new_node)),
            }
        } else {
            node
        }
    }

    /// Rotates the tree to the left around the given node.
    fn rotate_left(node: IndexNode<V>) -> IndexNode<V> {
        if let Some(right) = node.right {
            let new_node = IndexNode {
                hash: node.hash,
                bucket: node.bucket,
                color: node.color,
                left: node.left,
                right: right.left.clone(),
            };
            IndexNode {
                hash: right.hash,
                bucket: right.bucket.clone(),
                color: right.color,
                left: Some(ReferenceCounter::new(new_node)),
                right: right.right.clone(),
            }
        } else {
            node
        }
    }

    /// Rotates right and recolors for balancing.
    fn rotate_right_and_recolor(node: IndexNode<V>) -> IndexNode<V> {
        if let Some(left) = &node.left {
            // New root (the old left child)
            let new_right = IndexNode {
                hash: node.hash,
                bucket: node.bucket.clone(),
                color: Color::Red,
                left: left.right.clone(),
                right: node.right.clone(),
            };

            // If left has a left child, make it black
            let new_left = left
                .left
                .as_ref()
                .map(|left_left| ReferenceCounter::new(left_left.with_color(Color::Black)));

            IndexNode {
                hash: left.hash,
                bucket: left.bucket.clone(),
                color: Color::Black,
                left: new_left,
                right: Some(ReferenceCounter::new(new_right)),
            }
        } else {
            node
        }
    }

    /// Rotates left and recolors for balancing.
    fn rotate_left_and_recolor(node: IndexNode<V>) -> IndexNode<V> {
        if let Some(right) = &node.right {
            // New root (the old right child)
            let new_left = IndexNode {
                hash: node.hash,
                bucket: node.bucket.clone(),
                color: Color::Red,
                left: node.left.clone(),
                right: right.left.clone(),
            };

            // If right has a right child, make it black
            let new_right = right
                .right
                .as_ref()
                .map(|right_right| ReferenceCounter::new(right_right.with_color(Color::Black)));

            IndexNode {
                hash: right.hash,
                bucket: right.bucket.clone(),
                color: Color::Black,
                left: Some(ReferenceCounter::new(new_left)),
                right: new_right,
            }
        } else {
            node
        }
    }

    /// Removes the slot stored under `hash`.
    ///
    /// Returns an identity-shared clone when the hash is absent.
    pub(crate) fn remove(&self, hash: u64) -> Self {
        if self.get(hash).is_none() {
            return self.clone();
        }

        let new_root = Self::remove_from_node(self.root.as_ref(), hash);

        // Make root black if it exists
        let black_root = new_root.map(|node_ref| {
            if node_ref.is_red() {
                ReferenceCounter::new(node_ref.with_color(Color::Black))
            } else {
                node_ref
            }
        });

        Self { root: black_root }
    }

    /// Recursive helper for `remove`.
    fn remove_from_node(
        node: Option<&ReferenceCounter<IndexNode<V>>>,
        hash: u64,
    ) -> Option<ReferenceCounter<IndexNode<V>>> {
        node.and_then(|node_ref| {
            if hash < node_ref.hash {
                let new_left = Self::remove_from_node(node_ref.left.as_ref(), hash);
                Some(ReferenceCounter::new(
                    node_ref.with_children(new_left, node_ref.right.clone()),
                ))
            } else if hash > node_ref.hash {
                let new_right = Self::remove_from_node(node_ref.right.as_ref(), hash);
                Some(ReferenceCounter::new(
                    node_ref.with_children(node_ref.left.clone(), new_right),
                ))
            } else {
                // Found the node to remove
                match (&node_ref.left, &node_ref.right) {
                    (None, None) => None,
                    (Some(left), None) => Some(left.clone()),
                    (None, Some(right)) => Some(right.clone()),
                    (Some(_), Some(right)) => {
                        // Replace with the minimum of the right subtree
                        let (successor_hash, successor_bucket) = Self::find_min_slot(right);
                        let new_right =
                            Self::remove_from_node(node_ref.right.as_ref(), successor_hash);
                        Some(ReferenceCounter::new(IndexNode {
                            hash: successor_hash,
                            bucket: successor_bucket,
                            color: node_ref.color,
                            left: node_ref.left.clone(),
                            right: new_right,
                        }))
                    }
                }
            }
        })
    }

    /// Finds the slot with the minimum hash in a subtree.
    fn find_min_slot(node: &ReferenceCounter<IndexNode<V>>) -> (u64, V) {
        node.left.as_ref().map_or_else(
            || (node.hash, node.bucket.clone()),
            |left| Self::find_min_slot(left),
        )
    }
}

/// A lazy in-order iterator over the slots of a [`HashIndex`].
///
/// Holds the spine of not-yet-visited ancestors; each step descends one
/// right subtree at most once, so a full walk is O(n).
pub(crate) struct HashIndexIterator<'a, V> {
    stack: Vec<&'a ReferenceCounter<IndexNode<V>>>,
}

impl<'a, V> HashIndexIterator<'a, V> {
    /// Pushes `node` and all of its left descendants onto the stack.
    fn push_left_spine(&mut self, node: Option<&'a ReferenceCounter<IndexNode<V>>>) {
        let mut current = node;
        while let Some(node_ref) = current {
            self.stack.push(node_ref);
            current = node_ref.left.as_ref();
        }
    }
}

impl<'a, V> Iterator for HashIndexIterator<'a, V> {
    type Item = (u64, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node_ref = self.stack.pop()?;
        self.push_left_spine(node_ref.right.as_ref());
        Some((node_ref.hash, &node_ref.bucket))
    }
}
