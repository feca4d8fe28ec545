//! Bucket array: chain descriptors plus the bucket sizing policy.
//!
//! Bucket counts always come from `BUCKET_COUNTS`, a fixed sequence of
//! primes roughly doubling from 1 up to the first prime above 2^63, so
//! `bucket_count()` is deterministic for a given history of operations.
//! A hash maps to bucket `hash % bucket_count`.

use crate::error::{Fallibility, TryReserveError};
use crate::node_store::{NodeKey, NodeStore};
use core::alloc::Layout;

/// Canonical bucket counts: 1, 2, then the smallest prime above `2^k` for
/// `k` in `2..=63`.
const BUCKET_COUNTS: [u64; 64] = [
    1,
    2,
    5,
    11,
    17,
    37,
    67,
    131,
    257,
    521,
    1031,
    2053,
    4099,
    8209,
    16411,
    32771,
    65537,
    131101,
    262147,
    524309,
    1048583,
    2097169,
    4194319,
    8388617,
    16777259,
    33554467,
    67108879,
    134217757,
    268435459,
    536870923,
    1073741827,
    2147483659,
    4294967311,
    8589934609,
    17179869209,
    34359738421,
    68719476767,
    137438953481,
    274877906951,
    549755813911,
    1099511627791,
    2199023255579,
    4398046511119,
    8796093022237,
    17592186044423,
    35184372088891,
    70368744177679,
    140737488355333,
    281474976710677,
    562949953421381,
    1125899906842679,
    2251799813685269,
    4503599627370517,
    9007199254740997,
    18014398509482143,
    36028797018963971,
    72057594037928017,
    144115188075855881,
    288230376151711813,
    576460752303423619,
    1152921504606847009,
    2305843009213693967,
    4611686018427388039,
    9223372036854775837,
];

/// Smallest canonical bucket count that is `>= max(min, 1)`, or `None` if
/// it would not fit in `usize`.
pub(crate) fn canonical_bucket_count(min: usize) -> Option<usize> {
    let min = min.max(1) as u64;
    let idx = BUCKET_COUNTS.partition_point(|&c| c < min);
    BUCKET_COUNTS
        .get(idx)
        .and_then(|&c| usize::try_from(c).ok())
}

/// Whether `len` elements respect `max_load_factor` over `bucket_count`.
#[inline]
pub(crate) fn fits(len: usize, bucket_count: usize, max_load_factor: f32) -> bool {
    len as f64 <= bucket_count as f64 * max_load_factor as f64
}

/// Fewest buckets that hold `len` elements within `max_load_factor`.
pub(crate) fn buckets_for_elements(len: usize, max_load_factor: f32) -> Option<usize> {
    let want = (len as f64 / max_load_factor as f64).ceil();
    if !(want < usize::MAX as f64) {
        return None;
    }
    let mut count = (want as usize).max(1);
    // Division rounding can land one short of the bound.
    while !fits(len, count, max_load_factor) {
        count = count.checked_add(1)?;
    }
    Some(count)
}

/// Number of elements `bucket_count` buckets hold within `max_load_factor`.
pub(crate) fn elements_for_buckets(bucket_count: usize, max_load_factor: f32) -> usize {
    let n = (bucket_count as f64 * max_load_factor as f64).floor();
    if n >= usize::MAX as f64 {
        usize::MAX
    } else {
        n as usize
    }
}

/// Descriptor of one bucket's chain.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Bucket {
    pub(crate) first: Option<NodeKey>,
    pub(crate) last: Option<NodeKey>,
    pub(crate) len: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct BucketArray {
    buckets: Vec<Bucket>,
}

impl BucketArray {
    /// Allocate `count` empty buckets. Nothing is touched on failure.
    pub(crate) fn try_with_len(
        count: usize,
        fallibility: Fallibility,
    ) -> Result<Self, TryReserveError> {
        debug_assert!(count >= 1);
        let mut buckets = Vec::new();
        if buckets.try_reserve_exact(count).is_err() {
            return Err(match Layout::array::<Bucket>(count) {
                Ok(layout) => fallibility.alloc_err(layout),
                Err(_) => fallibility.capacity_overflow(),
            });
        }
        buckets.resize(count, Bucket::default());
        Ok(Self { buckets })
    }

    pub(crate) fn len(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn index_for(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Bucket> {
        self.buckets.get(index)
    }

    #[inline]
    pub(crate) fn first(&self, index: usize) -> Option<NodeKey> {
        self.buckets[index].first
    }

    /// Empty every chain, keeping the bucket count.
    pub(crate) fn reset(&mut self) {
        self.buckets.fill(Bucket::default());
    }

    /// Link `key` at the head of bucket `index`.
    pub(crate) fn push_front<V>(&mut self, index: usize, key: NodeKey, nodes: &mut NodeStore<V>) {
        let bucket = &mut self.buckets[index];
        nodes[key].bucket_next = bucket.first;
        if bucket.last.is_none() {
            bucket.last = Some(key);
        }
        bucket.first = Some(key);
        bucket.len += 1;
    }

    /// Link `key` at the tail of bucket `index`.
    pub(crate) fn push_back<V>(&mut self, index: usize, key: NodeKey, nodes: &mut NodeStore<V>) {
        nodes[key].bucket_next = None;
        let bucket = &mut self.buckets[index];
        match bucket.last {
            Some(last) => nodes[last].bucket_next = Some(key),
            None => bucket.first = Some(key),
        }
        bucket.last = Some(key);
        bucket.len += 1;
    }

    /// Chain predecessor of `key` in bucket `index`: `Some(None)` when `key`
    /// heads the chain, `None` when it is not on the chain at all.
    pub(crate) fn predecessor<V>(
        &self,
        index: usize,
        key: NodeKey,
        nodes: &NodeStore<V>,
    ) -> Option<Option<NodeKey>> {
        let mut pred = None;
        let mut cur = self.buckets[index].first;
        while let Some(k) = cur {
            if k == key {
                return Some(pred);
            }
            pred = cur;
            cur = nodes[k].bucket_next;
        }
        None
    }

    /// Unlink `key`, whose chain predecessor is `pred`, from bucket `index`.
    pub(crate) fn unlink<V>(
        &mut self,
        index: usize,
        pred: Option<NodeKey>,
        key: NodeKey,
        nodes: &mut NodeStore<V>,
    ) {
        let next = nodes[key].bucket_next.take();
        let bucket = &mut self.buckets[index];
        match pred {
            Some(p) => nodes[p].bucket_next = next,
            None => bucket.first = next,
        }
        if bucket.last == Some(key) {
            bucket.last = pred;
        }
        bucket.len -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::infallible;

    fn chain<V: Clone>(b: &BucketArray, index: usize, nodes: &NodeStore<V>) -> Vec<V> {
        let mut out = Vec::new();
        let mut cur = b.first(index);
        while let Some(k) = cur {
            out.push(nodes[k].value.clone());
            cur = nodes[k].bucket_next;
        }
        out
    }

    #[test]
    fn bucket_counts_are_sorted_and_start_at_one() {
        assert_eq!(BUCKET_COUNTS[0], 1);
        assert!(BUCKET_COUNTS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn canonical_count_rounds_up() {
        assert_eq!(canonical_bucket_count(0), Some(1));
        assert_eq!(canonical_bucket_count(1), Some(1));
        assert_eq!(canonical_bucket_count(2), Some(2));
        assert_eq!(canonical_bucket_count(3), Some(5));
        assert_eq!(canonical_bucket_count(4), Some(5));
        assert_eq!(canonical_bucket_count(6), Some(11));
        assert_eq!(canonical_bucket_count(1000), Some(1031));
        assert_eq!(canonical_bucket_count(usize::MAX), None);
    }

    #[test]
    fn buckets_for_elements_respects_load_factor() {
        assert_eq!(buckets_for_elements(0, 1.0), Some(1));
        assert_eq!(buckets_for_elements(5, 1.0), Some(5));
        assert_eq!(buckets_for_elements(5, 2.0), Some(3));
        assert_eq!(buckets_for_elements(5, 0.5), Some(10));
        for len in 0..200 {
            for &mlf in &[0.1f32, 0.3, 0.75, 1.0, 1.7, 3.0] {
                let n = buckets_for_elements(len, mlf).unwrap();
                assert!(fits(len, n, mlf), "len={} mlf={} n={}", len, mlf, n);
                assert!(n == 1 || !fits(len, n - 1, mlf));
            }
        }
        assert_eq!(buckets_for_elements(usize::MAX, 1e-30), None);
    }

    #[test]
    fn elements_for_buckets_is_floor() {
        assert_eq!(elements_for_buckets(5, 1.0), 5);
        assert_eq!(elements_for_buckets(5, 0.5), 2);
        assert_eq!(elements_for_buckets(3, 1.5), 4);
    }

    #[test]
    fn oversized_allocation_is_reported() {
        let res = BucketArray::try_with_len(usize::MAX / 2, Fallibility::Fallible);
        assert!(res.is_err());
    }

    /// Invariant: head/tail insertion and unlinking keep `first`, `last`
    /// and `len` consistent with the chain.
    #[test]
    fn chain_link_and_unlink() {
        let mut nodes = NodeStore::new();
        let mut b = infallible(BucketArray::try_with_len(3, Fallibility::Infallible));
        let a = nodes.push_back('a', 0);
        let c = nodes.push_back('c', 0);
        let d = nodes.push_back('d', 0);
        b.push_front(1, a, &mut nodes);
        b.push_front(1, c, &mut nodes);
        b.push_back(1, d, &mut nodes);
        assert_eq!(chain(&b, 1, &nodes), vec!['c', 'a', 'd']);
        assert_eq!(b.get(1).map(|x| x.len), Some(3));
        assert_eq!(b.get(1).and_then(|x| x.last), Some(d));

        assert_eq!(b.predecessor(1, c, &nodes), Some(None));
        assert_eq!(b.predecessor(1, d, &nodes), Some(Some(a)));
        assert_eq!(b.predecessor(0, d, &nodes), None);

        b.unlink(1, Some(a), d, &mut nodes);
        assert_eq!(chain(&b, 1, &nodes), vec!['c', 'a']);
        assert_eq!(b.get(1).and_then(|x| x.last), Some(a));

        b.unlink(1, None, c, &mut nodes);
        b.unlink(1, None, a, &mut nodes);
        assert_eq!(b.get(1), Some(&Bucket::default()));
    }

    #[test]
    fn reset_empties_all_chains() {
        let mut nodes = NodeStore::new();
        let mut b = infallible(BucketArray::try_with_len(2, Fallibility::Infallible));
        let k = nodes.push_back(1, 3);
        b.push_front(b.index_for(3), k, &mut nodes);
        b.reset();
        assert_eq!(b.len(), 2);
        assert!(b.get(0).unwrap().first.is_none());
        assert!(b.get(1).unwrap().first.is_none());
    }
}
