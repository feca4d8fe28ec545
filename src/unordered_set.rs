//! UnorderedSet: unique-key set adapter over the chained hash table engine.

use crate::contract::contract_assert;
use crate::error::TryReserveError;
use crate::iter::{Handle, IntoIter, Iter, LocalIter};
use crate::policy::{DefaultKeyEqual, KeyEqual, SetKeyPolicy};
use crate::table::{HashTable, DEFAULT_MAX_LOAD_FACTOR};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// A set of unique keys stored in a separately chained hash table.
///
/// Iteration follows insertion order, and rehashing does not change it.
/// Elements are addressed by [`Handle`]s, which stay valid across
/// insertions and rehashes until the element is erased.
///
/// `S` hashes keys and `E` compares them. The two must agree: keys that
/// `E` considers equal must hash equally under `S`.
pub struct UnorderedSet<K, S = RandomState, E = DefaultKeyEqual> {
    table: HashTable<SetKeyPolicy<K>, S, E>,
}

impl<K> UnorderedSet<K>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_buckets_and_hasher(0, RandomState::new())
    }

    /// Create a set with at least `initial_buckets` buckets.
    pub fn with_buckets(initial_buckets: usize) -> Self {
        Self::with_buckets_and_hasher(initial_buckets, RandomState::new())
    }
}

impl<K> Default for UnorderedSet<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> UnorderedSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_buckets_and_hasher(0, hasher)
    }

    pub fn with_buckets_and_hasher(initial_buckets: usize, hasher: S) -> Self {
        Self::with_buckets_hasher_and_key_eq(initial_buckets, hasher, DefaultKeyEqual)
    }
}

// Accessors and position-based operations: no hashing or comparison.
impl<K, S, E> UnorderedSet<K, S, E> {
    pub fn with_buckets_hasher_and_key_eq(initial_buckets: usize, hasher: S, key_eq: E) -> Self {
        Self {
            table: HashTable::new(hasher, key_eq, initial_buckets, DEFAULT_MAX_LOAD_FACTOR),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Upper bound on the number of elements.
    pub fn max_size(&self) -> usize {
        self.table.max_size()
    }

    /// Number of elements insertable before the bucket array grows.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn hasher(&self) -> &S {
        self.table.hasher()
    }

    pub fn key_eq(&self) -> &E {
        self.table.key_eq()
    }

    pub fn iter(&self) -> Iter<'_, K> {
        self.table.iter()
    }

    /// Handle of the first element in iteration order.
    pub fn first(&self) -> Option<Handle> {
        self.table.first()
    }

    pub fn last(&self) -> Option<Handle> {
        self.table.last()
    }

    /// Handle following `handle` in iteration order; `None` past the end.
    pub fn next_handle(&self, handle: Handle) -> Option<Handle> {
        self.table.next_handle(handle)
    }

    pub fn prev_handle(&self, handle: Handle) -> Option<Handle> {
        self.table.prev_handle(handle)
    }

    /// The element at `handle`, or `None` once it has been erased.
    pub fn resolve(&self, handle: Handle) -> Option<&K> {
        self.table.get(handle)
    }

    /// Erase the element at `handle` and return the handle after it.
    ///
    /// `handle` must name a live element of this set; erasing through a
    /// stale handle is a precondition violation.
    pub fn erase_at(&mut self, handle: Handle) -> Option<Handle> {
        self.table.remove(handle).and_then(|(_, next)| next)
    }

    /// Erase every element from `first` up to, not including, `last`
    /// (`None` meaning the end), in iteration order. Returns `last`.
    ///
    /// `last` must be reachable from `first`.
    pub fn erase_range(&mut self, first: Option<Handle>, last: Option<Handle>) -> Option<Handle> {
        let mut cur = first;
        while cur != last {
            match cur {
                Some(h) => cur = self.erase_at(h),
                None => {
                    contract_assert!(false, "erase range end is not reachable from its start");
                    break;
                }
            }
        }
        last
    }

    /// Keep only the elements for which `f` returns `true`.
    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.table.retain(f)
    }

    /// Remove every element. The bucket count is kept.
    pub fn clear(&mut self) {
        self.table.clear()
    }

    /// Exchange contents, hasher, equality functor and max load factor.
    pub fn swap(&mut self, other: &mut Self) {
        self.table.swap(&mut other.table)
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Number of elements in bucket `index`. `index` must be less than
    /// `bucket_count()`.
    pub fn bucket_size(&self, index: usize) -> usize {
        self.table.bucket_len(index)
    }

    /// Elements of bucket `index`. `index` must be less than
    /// `bucket_count()`.
    pub fn bucket_iter(&self, index: usize) -> LocalIter<'_, K> {
        self.table.bucket_iter(index)
    }

    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }

    /// Set the max load factor, which must be positive and finite. If the
    /// set is now over it, the bucket array grows before this returns.
    pub fn set_max_load_factor(&mut self, factor: f32) {
        self.table.set_max_load_factor(factor)
    }

    /// Rebuild with at least `num_buckets` buckets, unless that few
    /// buckets would exceed the max load factor, in which case nothing
    /// happens. Iteration order is unchanged.
    pub fn rehash(&mut self, num_buckets: usize) {
        self.table.rehash_for_num_buckets(num_buckets)
    }

    pub fn try_rehash(&mut self, num_buckets: usize) -> Result<(), TryReserveError> {
        self.table.try_rehash_for_num_buckets(num_buckets)
    }

    /// Size the set so that it holds `num_elements` in total without
    /// rehashing.
    pub fn reserve(&mut self, num_elements: usize) {
        self.table.reserve_for_num_elements(num_elements)
    }

    pub fn try_reserve(&mut self, num_elements: usize) -> Result<(), TryReserveError> {
        self.table.try_reserve_for_num_elements(num_elements)
    }
}

impl<K, S, E> UnorderedSet<K, S, E>
where
    K: Hash,
    S: BuildHasher,
    E: KeyEqual<K>,
{
    /// Insert `value` if no equal key is present.
    ///
    /// Returns the handle of the element with that key and whether the
    /// insertion happened. On a duplicate the set is unchanged and `value`
    /// is dropped.
    pub fn insert(&mut self, value: K) -> (Handle, bool) {
        self.table.insert_if_missing(value)
    }

    /// As `insert`, reporting allocation failure instead of aborting. On
    /// error the set is unchanged.
    pub fn try_insert(&mut self, value: K) -> Result<(Handle, bool), TryReserveError> {
        self.table.try_insert_if_missing(value)
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEqual<Q>,
    {
        self.table.find(q)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEqual<Q>,
    {
        self.table.find(q).and_then(|h| self.table.get(h))
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEqual<Q>,
    {
        self.table.find(q).is_some()
    }

    /// 1 if `q` is present, else 0.
    pub fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEqual<Q>,
    {
        self.contains(q) as usize
    }

    /// The elements equal to `q`: zero or one.
    pub fn equal_range<Q>(&self, q: &Q) -> Iter<'_, K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEqual<Q>,
    {
        self.table.equal_range(q)
    }

    /// Erase the element equal to `q`. Returns the number erased (0 or 1).
    pub fn erase<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEqual<Q>,
    {
        self.table.remove_key(q).is_some() as usize
    }

    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEqual<Q>,
    {
        self.table.remove_key(q).is_some()
    }

    /// Remove and return the element equal to `q`.
    pub fn take<Q>(&mut self, q: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEqual<Q>,
    {
        self.table.remove_key(q)
    }

    /// Index of the bucket `q` hashes to.
    pub fn bucket<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        self.table.bucket_index_for_key(q)
    }
}

impl<K, S, E> Clone for UnorderedSet<K, S, E>
where
    K: Clone,
    S: Clone,
    E: Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<K, S, E> PartialEq for UnorderedSet<K, S, E>
where
    K: Hash,
    S: BuildHasher,
    E: KeyEqual<K>,
{
    /// Same elements, regardless of order or bucket layout.
    fn eq(&self, other: &Self) -> bool {
        self.table.eq_table(&other.table)
    }
}

impl<K, S, E> Eq for UnorderedSet<K, S, E>
where
    K: Hash,
    S: BuildHasher,
    E: KeyEqual<K>,
{
}

impl<K: fmt::Debug, S, E> fmt::Debug for UnorderedSet<K, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.table, f)
    }
}

impl<K, S, E> Extend<K> for UnorderedSet<K, S, E>
where
    K: Hash,
    S: BuildHasher,
    E: KeyEqual<K>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(self.len().saturating_add(lower).min(self.max_size()));
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, K, S, E> Extend<&'a K> for UnorderedSet<K, S, E>
where
    K: Hash + Clone + 'a,
    S: BuildHasher,
    E: KeyEqual<K>,
{
    fn extend<I: IntoIterator<Item = &'a K>>(&mut self, iter: I) {
        self.extend(iter.into_iter().cloned())
    }
}

impl<K, S, E> FromIterator<K> for UnorderedSet<K, S, E>
where
    K: Hash,
    S: BuildHasher + Default,
    E: KeyEqual<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::with_buckets_hasher_and_key_eq(0, S::default(), E::default());
        set.extend(iter);
        set
    }
}

impl<K, S, E> IntoIterator for UnorderedSet<K, S, E> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> IntoIter<K> {
        self.table.into_values()
    }
}

impl<'a, K, S, E> IntoIterator for &'a UnorderedSet<K, S, E> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}
