//! Node store: owns every element node and threads them on the global list.
//!
//! Nodes live in a `SlotMap`, so a node keeps its key (and its value keeps
//! its address in the slot) for as long as it is live, regardless of how
//! often the bucket array is rebuilt. Links between nodes are `NodeKey`s,
//! never pointers. The global list is doubly linked and defines iteration
//! order; the per-bucket chain link (`bucket_next`) is stored here as well
//! but is only ever written by `buckets::BucketArray`.

use crate::error::{Fallibility, TryReserveError};
use core::alloc::Layout;
use core::ops::{Index, IndexMut};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Generational key naming one node in a `NodeStore`.
    pub(crate) struct NodeKey;
}

/// Largest number of nodes a `SlotMap` can hold.
pub(crate) const MAX_NODES: usize = (u32::MAX - 1) as usize;

#[derive(Debug, Clone)]
pub(crate) struct Node<V> {
    pub(crate) value: V,
    /// Hash of the value's key, computed once at insertion.
    pub(crate) hash: u64,
    pub(crate) global_prev: Option<NodeKey>,
    pub(crate) global_next: Option<NodeKey>,
    pub(crate) bucket_next: Option<NodeKey>,
}

#[derive(Debug)]
pub(crate) struct NodeStore<V> {
    slots: SlotMap<NodeKey, Node<V>>,
    head: Option<NodeKey>,
    tail: Option<NodeKey>,
}

impl<V> NodeStore<V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Make room for `additional` more nodes, so that the next `additional`
    /// calls to `push_back` do not allocate. Nothing is touched on failure.
    pub(crate) fn try_reserve(
        &mut self,
        additional: usize,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        // `SlotMap::try_reserve` adds `len + additional` unchecked.
        let total = self
            .slots
            .len()
            .checked_add(additional)
            .ok_or_else(|| fallibility.capacity_overflow())?;
        if self.slots.try_reserve(additional).is_err() {
            return Err(match Layout::array::<Node<V>>(total) {
                Ok(layout) => fallibility.alloc_err(layout),
                Err(_) => fallibility.capacity_overflow(),
            });
        }
        Ok(())
    }

    pub(crate) fn head(&self) -> Option<NodeKey> {
        self.head
    }

    pub(crate) fn tail(&self) -> Option<NodeKey> {
        self.tail
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: NodeKey) -> bool {
        self.slots.contains_key(key)
    }

    pub(crate) fn get(&self, key: NodeKey) -> Option<&Node<V>> {
        self.slots.get(key)
    }

    /// Allocate a node for `value` and link it at the tail of the global
    /// list. The node is not yet on any bucket chain.
    pub(crate) fn push_back(&mut self, value: V, hash: u64) -> NodeKey {
        let prev = self.tail;
        let key = self.slots.insert(Node {
            value,
            hash,
            global_prev: prev,
            global_next: None,
            bucket_next: None,
        });
        match prev {
            Some(p) => self.slots[p].global_next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        key
    }

    /// Unlink `key` from the global list and free it. The caller must have
    /// already removed it from its bucket chain.
    pub(crate) fn remove(&mut self, key: NodeKey) -> Option<Node<V>> {
        let node = self.slots.remove(key)?;
        match node.global_prev {
            Some(p) => self.slots[p].global_next = node.global_next,
            None => self.head = node.global_next,
        }
        match node.global_next {
            Some(n) => self.slots[n].global_prev = node.global_prev,
            None => self.tail = node.global_prev,
        }
        Some(node)
    }

    /// Remove and return the first node's value. Bucket chains are ignored;
    /// only valid once the bucket array has been discarded.
    pub(crate) fn pop_front(&mut self) -> Option<V> {
        let key = self.head?;
        self.remove(key).map(|n| n.value)
    }

    /// Counterpart of `pop_front`.
    pub(crate) fn pop_back(&mut self) -> Option<V> {
        let key = self.tail?;
        self.remove(key).map(|n| n.value)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }
}

impl<V> Index<NodeKey> for NodeStore<V> {
    type Output = Node<V>;

    #[inline]
    fn index(&self, key: NodeKey) -> &Node<V> {
        &self.slots[key]
    }
}

impl<V> IndexMut<NodeKey> for NodeStore<V> {
    #[inline]
    fn index_mut(&mut self, key: NodeKey) -> &mut Node<V> {
        &mut self.slots[key]
    }
}
