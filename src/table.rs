//! HashTable: the separately chained hash table engine.
//!
//! The engine owns a `NodeStore` (values plus the global list) and a
//! `BucketArray` (chain descriptors), and keeps them consistent:
//!
//! - every live node is on exactly one chain, the one for
//!   `hash % bucket_count`, and at exactly one position of the global list;
//! - `len <= bucket_count * max_load_factor` holds after every public
//!   operation returns.
//!
//! Hashing goes through `S: BuildHasher` and equality through
//! `E: KeyEqual`, both held by value. The hash of each element is computed
//! once, at insertion, and reused by every rehash; user hash code never
//! runs while the structure is being re-chained.
//!
//! Fallible and infallible variants of growing operations share one code
//! path parameterized by `Fallibility`. All allocation happens before any
//! link is touched, so a failed operation leaves the table unchanged.

use crate::buckets::{
    buckets_for_elements, canonical_bucket_count, elements_for_buckets, fits, BucketArray,
};
use crate::contract::contract_assert;
use crate::error::{infallible, Fallibility, TryReserveError};
use crate::events::{debug_event, trace_event};
use crate::iter::{Handle, IntoIter, Iter, LocalIter};
use crate::node_store::{Node, NodeKey, NodeStore, MAX_NODES};
use crate::policy::{KeyEqual, KeyPolicy};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use slotmap::SecondaryMap;

/// Max load factor of a freshly constructed table.
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;

pub struct HashTable<P: KeyPolicy, S, E> {
    nodes: NodeStore<P::Value>,
    buckets: BucketArray,
    max_load_factor: f32,
    hasher: S,
    key_eq: E,
    _policy: PhantomData<fn() -> P>,
}

// Accessors that never hash or compare.
impl<P: KeyPolicy, S, E> HashTable<P, S, E> {
    /// Create a table with at least `initial_buckets` buckets (rounded up to
    /// the canonical size sequence, minimum 1).
    ///
    /// # Panics
    /// If `max_load_factor` is not positive and finite (checked builds), or
    /// if the bucket count overflows.
    pub fn new(hasher: S, key_eq: E, initial_buckets: usize, max_load_factor: f32) -> Self {
        contract_assert!(
            max_load_factor > 0.0 && max_load_factor.is_finite(),
            "max load factor must be positive and finite, got {}",
            max_load_factor
        );
        let count = infallible(
            canonical_bucket_count(initial_buckets)
                .ok_or_else(|| Fallibility::Infallible.capacity_overflow()),
        );
        Self {
            nodes: NodeStore::new(),
            buckets: infallible(BucketArray::try_with_len(count, Fallibility::Infallible)),
            max_load_factor,
            hasher,
            key_eq,
            _policy: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    pub fn max_size(&self) -> usize {
        MAX_NODES
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of elements the table holds before the next growth.
    pub fn capacity(&self) -> usize {
        elements_for_buckets(self.buckets.len(), self.max_load_factor).min(MAX_NODES)
    }

    pub fn load_factor(&self) -> f32 {
        self.nodes.len() as f32 / self.buckets.len() as f32
    }

    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn key_eq(&self) -> &E {
        &self.key_eq
    }

    /// Number of elements on bucket `index`'s chain.
    pub fn bucket_len(&self, index: usize) -> usize {
        contract_assert!(
            index < self.buckets.len(),
            "bucket index {} out of range for {} buckets",
            index,
            self.buckets.len()
        );
        self.buckets.get(index).map_or(0, |b| b.len)
    }

    /// Chain of bucket `index`, most recently inserted first (until the
    /// next rehash, which lays chains out in global order).
    pub fn bucket_iter(&self, index: usize) -> LocalIter<'_, P::Value> {
        contract_assert!(
            index < self.buckets.len(),
            "bucket index {} out of range for {} buckets",
            index,
            self.buckets.len()
        );
        match self.buckets.get(index) {
            Some(b) => LocalIter::new(&self.nodes, b.first, b.len),
            None => LocalIter::new(&self.nodes, None, 0),
        }
    }

    pub fn iter(&self) -> Iter<'_, P::Value> {
        Iter::new(&self.nodes)
    }

    pub fn first(&self) -> Option<Handle> {
        self.nodes.head().map(Handle::new)
    }

    pub fn last(&self) -> Option<Handle> {
        self.nodes.tail().map(Handle::new)
    }

    /// Value at `handle`, or `None` if it has been erased.
    pub fn get(&self, handle: Handle) -> Option<&P::Value> {
        self.nodes.get(handle.raw_handle()).map(|n| &n.value)
    }

    /// Successor of `handle` in global order (`None` is the end position).
    pub fn next_handle(&self, handle: Handle) -> Option<Handle> {
        let node = self.live_node(handle)?;
        node.global_next.map(Handle::new)
    }

    /// Predecessor of `handle` in global order.
    pub fn prev_handle(&self, handle: Handle) -> Option<Handle> {
        let node = self.live_node(handle)?;
        node.global_prev.map(Handle::new)
    }

    fn live_node(&self, handle: Handle) -> Option<&Node<P::Value>> {
        let node = self.nodes.get(handle.raw_handle());
        contract_assert!(node.is_some(), "handle does not name a live element");
        node
    }

    /// Remove the element at `handle`. Returns its value and the handle of
    /// its global successor.
    pub fn remove(&mut self, handle: Handle) -> Option<(P::Value, Option<Handle>)> {
        let key = handle.raw_handle();
        let hash = self.live_node(handle)?.hash;
        let index = self.buckets.index_for(hash);
        let pred = self.buckets.predecessor(index, key, &self.nodes)?;
        self.buckets.unlink(index, pred, key, &mut self.nodes);
        let node = self.nodes.remove(key)?;
        Some((node.value, node.global_next.map(Handle::new)))
    }

    /// Keep only the values for which `f` returns `true`, visiting in
    /// global order.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&P::Value) -> bool,
    {
        let mut cur = self.nodes.head();
        while let Some(key) = cur {
            cur = self.nodes[key].global_next;
            if !f(&self.nodes[key].value) {
                // Live by construction; the removed value is dropped here.
                self.remove(Handle::new(key));
            }
        }
    }

    /// Destroy every element. The bucket count is kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.buckets.reset();
    }

    /// Exchange the entire contents, functors included, with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    pub fn into_values(self) -> IntoIter<P::Value> {
        IntoIter::new(self.nodes)
    }

    /// Set the max load factor, growing at once if the table is now
    /// overfull.
    ///
    /// # Panics
    /// If `factor` is not positive and finite (checked builds).
    pub fn set_max_load_factor(&mut self, factor: f32) {
        contract_assert!(
            factor > 0.0 && factor.is_finite(),
            "max load factor must be positive and finite, got {}",
            factor
        );
        trace_event!(from = self.max_load_factor, to = factor, "max load factor changed");
        self.max_load_factor = factor;
        if !fits(self.nodes.len(), self.buckets.len(), factor) {
            infallible(self.grow_for(self.nodes.len(), Fallibility::Infallible));
        }
    }

    /// Rehash so that `len` elements fit, if they do not already.
    fn grow_for(&mut self, len: usize, fallibility: Fallibility) -> Result<(), TryReserveError> {
        if fits(len, self.buckets.len(), self.max_load_factor) {
            return Ok(());
        }
        let count = buckets_for_elements(len, self.max_load_factor)
            .and_then(canonical_bucket_count)
            .ok_or_else(|| fallibility.capacity_overflow())?;
        self.rehash_to(count, fallibility)
    }

    /// Re-chain every node into a fresh array of exactly `count` buckets,
    /// walking the global list once. Global order is untouched; each new
    /// chain lists its nodes in global order.
    fn rehash_to(&mut self, count: usize, fallibility: Fallibility) -> Result<(), TryReserveError> {
        let mut fresh = BucketArray::try_with_len(count, fallibility)?;
        let mut cur = self.nodes.head();
        while let Some(key) = cur {
            let index = fresh.index_for(self.nodes[key].hash);
            fresh.push_back(index, key, &mut self.nodes);
            cur = self.nodes[key].global_next;
        }
        debug_event!(
            from = self.buckets.len(),
            to = count,
            len = self.nodes.len(),
            "rehashed bucket array"
        );
        self.buckets = fresh;
        Ok(())
    }

    fn rehash_for_num_buckets_inner(
        &mut self,
        num_buckets: usize,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        let num_buckets = num_buckets.max(1);
        if !fits(self.nodes.len(), num_buckets, self.max_load_factor) {
            return Ok(());
        }
        let count = canonical_bucket_count(num_buckets)
            .ok_or_else(|| fallibility.capacity_overflow())?;
        if count == self.buckets.len() {
            return Ok(());
        }
        self.rehash_to(count, fallibility)
    }

    /// Rebuild the bucket array with `num_buckets` buckets (rounded up to
    /// the canonical size sequence). No-op if that many buckets would break
    /// the max load factor for the current length.
    pub fn rehash_for_num_buckets(&mut self, num_buckets: usize) {
        infallible(self.rehash_for_num_buckets_inner(num_buckets, Fallibility::Infallible))
    }

    pub fn try_rehash_for_num_buckets(&mut self, num_buckets: usize) -> Result<(), TryReserveError> {
        self.rehash_for_num_buckets_inner(num_buckets, Fallibility::Fallible)
    }

    fn reserve_for_num_elements_inner(
        &mut self,
        num_elements: usize,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        let len = self.nodes.len();
        if num_elements <= len {
            return Ok(());
        }
        if num_elements > MAX_NODES {
            return Err(fallibility.capacity_overflow());
        }
        trace_event!(len, num_elements, "reserving");
        // Node slots first: if the bucket array then fails to grow, the
        // spare slots are invisible and the table is otherwise unchanged.
        self.nodes.try_reserve(num_elements - len, fallibility)?;
        self.grow_for(num_elements, fallibility)
    }

    /// Make room for `num_elements` elements in total, so that inserting up
    /// to that many triggers no further rehash.
    pub fn reserve_for_num_elements(&mut self, num_elements: usize) {
        infallible(self.reserve_for_num_elements_inner(num_elements, Fallibility::Infallible))
    }

    pub fn try_reserve_for_num_elements(
        &mut self,
        num_elements: usize,
    ) -> Result<(), TryReserveError> {
        self.reserve_for_num_elements_inner(num_elements, Fallibility::Fallible)
    }
}

// Operations that hash or compare keys.
impl<P, S, E> HashTable<P, S, E>
where
    P: KeyPolicy,
    P::Key: Hash,
    S: BuildHasher,
    E: KeyEqual<P::Key>,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Chain position of the first node equal to `q`: `(predecessor, node)`.
    fn locate<Q>(&self, hash: u64, q: &Q) -> Option<(Option<NodeKey>, NodeKey)>
    where
        P::Key: Borrow<Q>,
        Q: ?Sized,
        E: KeyEqual<Q>,
    {
        let mut pred = None;
        let mut cur = self.buckets.first(self.buckets.index_for(hash));
        while let Some(key) = cur {
            let node = &self.nodes[key];
            if node.hash == hash
                && self
                    .key_eq
                    .equal(<P::Key as Borrow<Q>>::borrow(P::key(&node.value)), q)
            {
                return Some((pred, key));
            }
            pred = cur;
            cur = node.bucket_next;
        }
        None
    }

    /// Number of nodes on `hash`'s chain equal to `q`.
    fn count_equal(&self, hash: u64, q: &P::Key) -> usize {
        let mut n = 0;
        let mut cur = self.buckets.first(self.buckets.index_for(hash));
        while let Some(key) = cur {
            let node = &self.nodes[key];
            if node.hash == hash && self.key_eq.equal(P::key(&node.value), q) {
                n += 1;
            }
            cur = node.bucket_next;
        }
        n
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEqual<Q>,
    {
        let hash = self.make_hash(q);
        self.locate(hash, q).map(|(_, key)| Handle::new(key))
    }

    /// Range of the elements equal to `q`; at most one for unique keys.
    pub fn equal_range<Q>(&self, q: &Q) -> Iter<'_, P::Value>
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEqual<Q>,
    {
        let hash = self.make_hash(q);
        Iter::single(&self.nodes, self.locate(hash, q).map(|(_, key)| key))
    }

    /// Index of the bucket `q` hashes to.
    pub fn bucket_index_for_key<Q>(&self, q: &Q) -> usize
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        self.buckets.index_for(self.make_hash(q))
    }

    fn insert_if_missing_inner(
        &mut self,
        value: P::Value,
        fallibility: Fallibility,
    ) -> Result<(Handle, bool), TryReserveError> {
        let hash = self.make_hash(P::key(&value));
        if let Some((_, key)) = self.locate(hash, P::key(&value)) {
            return Ok((Handle::new(key), false));
        }
        let len = self.nodes.len();
        if len >= MAX_NODES {
            return Err(fallibility.capacity_overflow());
        }
        self.nodes.try_reserve(1, fallibility)?;
        self.grow_for(len + 1, fallibility)?;
        let index = self.buckets.index_for(hash);
        // Cannot allocate: a slot was reserved above.
        let key = self.nodes.push_back(value, hash);
        self.buckets.push_front(index, key, &mut self.nodes);
        Ok((Handle::new(key), true))
    }

    /// Insert `value` unless an element with an equal key is present.
    ///
    /// Returns the handle of the element with that key and whether
    /// `value` was inserted. A new element goes to the head of its bucket
    /// chain and the tail of the global list; if the insertion would push
    /// the load factor over the max, the bucket array grows first. A
    /// duplicate leaves the table untouched and drops `value`.
    pub fn insert_if_missing(&mut self, value: P::Value) -> (Handle, bool) {
        infallible(self.insert_if_missing_inner(value, Fallibility::Infallible))
    }

    /// As `insert_if_missing`, reporting allocation failure instead of
    /// aborting. On error the table is unchanged.
    pub fn try_insert_if_missing(
        &mut self,
        value: P::Value,
    ) -> Result<(Handle, bool), TryReserveError> {
        self.insert_if_missing_inner(value, Fallibility::Fallible)
    }

    /// Remove the element equal to `q`, returning its value.
    pub fn remove_key<Q>(&mut self, q: &Q) -> Option<P::Value>
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEqual<Q>,
    {
        let hash = self.make_hash(q);
        let (pred, key) = self.locate(hash, q)?;
        let index = self.buckets.index_for(hash);
        self.buckets.unlink(index, pred, key, &mut self.nodes);
        self.nodes.remove(key).map(|n| n.value)
    }

    /// Element-wise equality, independent of order and bucket layout.
    ///
    /// Each key of `self` must occur as often in `other` as in `self`; with
    /// equal lengths that makes the two multisets equal. Both tables are
    /// assumed to use equivalent hashers and equality functors.
    pub fn eq_table(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut cur = self.nodes.head();
        while let Some(key) = cur {
            let node = &self.nodes[key];
            let k = P::key(&node.value);
            if self.count_equal(node.hash, k) != other.count_equal(other.make_hash(k), k) {
                return false;
            }
            cur = node.global_next;
        }
        true
    }
}

impl<P, S, E> Clone for HashTable<P, S, E>
where
    P: KeyPolicy,
    P::Value: Clone,
    S: Clone,
    E: Clone,
{
    /// Copy with the same functors, max load factor, bucket count, global
    /// order and chain order.
    fn clone(&self) -> Self {
        let mut nodes = NodeStore::with_capacity(self.nodes.len());
        let mut moved: SecondaryMap<NodeKey, NodeKey> = SecondaryMap::new();
        let mut cur = self.nodes.head();
        while let Some(key) = cur {
            let node = &self.nodes[key];
            moved.insert(key, nodes.push_back(node.value.clone(), node.hash));
            cur = node.global_next;
        }

        let mut buckets = infallible(BucketArray::try_with_len(
            self.buckets.len(),
            Fallibility::Infallible,
        ));
        for index in 0..self.buckets.len() {
            let mut cur = self.buckets.first(index);
            while let Some(key) = cur {
                buckets.push_back(index, moved[key], &mut nodes);
                cur = self.nodes[key].bucket_next;
            }
        }

        Self {
            nodes,
            buckets,
            max_load_factor: self.max_load_factor,
            hasher: self.hasher.clone(),
            key_eq: self.key_eq.clone(),
            _policy: PhantomData,
        }
    }
}

impl<P, S, E> fmt::Debug for HashTable<P, S, E>
where
    P: KeyPolicy,
    P::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
impl<P: KeyPolicy, S, E> HashTable<P, S, E> {
    /// Walk every structure and assert the engine invariants.
    pub(crate) fn check_invariants(&self) {
        let mut on_chain: SecondaryMap<NodeKey, usize> = SecondaryMap::new();
        let mut total = 0;
        for index in 0..self.buckets.len() {
            let bucket = self.buckets.get(index).expect("index in range");
            let mut cur = bucket.first;
            let mut last = None;
            let mut n = 0;
            while let Some(key) = cur {
                let node = &self.nodes[key];
                assert_eq!(self.buckets.index_for(node.hash), index, "node on wrong chain");
                assert!(on_chain.insert(key, index).is_none(), "node on two chains");
                last = cur;
                cur = node.bucket_next;
                n += 1;
            }
            assert_eq!(bucket.len, n, "bucket len out of sync");
            assert_eq!(bucket.last, last, "bucket tail out of sync");
            total += n;
        }
        assert_eq!(total, self.nodes.len());

        let mut prev = None;
        let mut cur = self.nodes.head();
        let mut walked = 0;
        while let Some(key) = cur {
            let node = &self.nodes[key];
            assert_eq!(node.global_prev, prev, "global back link broken");
            assert!(on_chain.contains_key(key), "listed node missing from chains");
            prev = cur;
            cur = node.global_next;
            walked += 1;
        }
        assert_eq!(self.nodes.tail(), prev);
        assert_eq!(walked, self.nodes.len());
        assert!(fits(self.len(), self.bucket_count(), self.max_load_factor));
    }
}
