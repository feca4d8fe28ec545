//! Handles and iterators over a table's nodes.
//!
//! - `Handle`: a stable, copyable position naming one element. `None`
//!   stands for "one past the end".
//! - `Iter`: walks the global list (insertion order, unaffected by rehash).
//! - `LocalIter`: walks one bucket's chain.
//! - `IntoIter`: owning walk of the global list.
//!
//! Borrowed iterators hold `&` to the table, so the borrow checker rules
//! out the invalidation cases (erase, rehash) while they are alive. Handles
//! are not borrows: they outlive rehashes and detect their own erasure.

use crate::node_store::{NodeKey, NodeStore};
use core::fmt;
use core::iter::FusedIterator;

/// Position of one element in a table.
///
/// A handle stays valid across insertions and rehashes and resolves to
/// `None` once its element is erased (keys are generational, so a slot
/// reused by a later insertion does not alias). Two handles are equal iff
/// they name the same element.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(NodeKey);

impl Handle {
    pub(crate) fn new(k: NodeKey) -> Self {
        Handle(k)
    }

    pub(crate) fn raw_handle(&self) -> NodeKey {
        self.0
    }

    /// Resolve this handle against `set`.
    pub fn value<'a, K, S, E>(&self, set: &'a crate::UnorderedSet<K, S, E>) -> Option<&'a K> {
        set.resolve(*self)
    }
}

/// Iterator over a table's values in global (insertion) order.
pub struct Iter<'a, V> {
    nodes: &'a NodeStore<V>,
    front: Option<NodeKey>,
    back: Option<NodeKey>,
    remaining: usize,
}

impl<'a, V> Iter<'a, V> {
    pub(crate) fn new(nodes: &'a NodeStore<V>) -> Self {
        Self {
            nodes,
            front: nodes.head(),
            back: nodes.tail(),
            remaining: nodes.len(),
        }
    }

    /// Range covering exactly `key`, or nothing.
    pub(crate) fn single(nodes: &'a NodeStore<V>, key: Option<NodeKey>) -> Self {
        Self {
            nodes,
            front: key,
            back: key,
            remaining: key.is_some() as usize,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.nodes[self.front?];
        self.front = node.global_next;
        self.remaining -= 1;
        Some(&node.value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, V> DoubleEndedIterator for Iter<'a, V> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a V> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.nodes[self.back?];
        self.back = node.global_prev;
        self.remaining -= 1;
        Some(&node.value)
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
impl<V> FusedIterator for Iter<'_, V> {}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Iter<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Iterator over the chain of a single bucket.
pub struct LocalIter<'a, V> {
    nodes: &'a NodeStore<V>,
    next: Option<NodeKey>,
    remaining: usize,
}

impl<'a, V> LocalIter<'a, V> {
    pub(crate) fn new(nodes: &'a NodeStore<V>, first: Option<NodeKey>, len: usize) -> Self {
        Self {
            nodes,
            next: first,
            remaining: len,
        }
    }
}

impl<'a, V> Iterator for LocalIter<'a, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        let node = &self.nodes[self.next?];
        self.next = node.bucket_next;
        self.remaining -= 1;
        Some(&node.value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for LocalIter<'_, V> {}
impl<V> FusedIterator for LocalIter<'_, V> {}

impl<V> Clone for LocalIter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

/// Owning iterator in global order.
pub struct IntoIter<V> {
    nodes: NodeStore<V>,
}

impl<V> IntoIter<V> {
    pub(crate) fn new(nodes: NodeStore<V>) -> Self {
        Self { nodes }
    }
}

impl<V> Iterator for IntoIter<V> {
    type Item = V;

    #[inline]
    fn next(&mut self) -> Option<V> {
        self.nodes.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.nodes.len();
        (n, Some(n))
    }
}

impl<V> DoubleEndedIterator for IntoIter<V> {
    #[inline]
    fn next_back(&mut self) -> Option<V> {
        self.nodes.pop_back()
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}
impl<V> FusedIterator for IntoIter<V> {}
