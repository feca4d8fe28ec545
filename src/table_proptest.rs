#![cfg(test)]

// Property tests for the HashTable engine kept inside the crate so they can
// call the internal invariant checker.

use crate::iter::Handle;
use crate::policy::{DefaultKeyEqual, SetKeyPolicy};
use crate::table::HashTable;
use proptest::prelude::*;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hasher};

type Table<S> = HashTable<SetKeyPolicy<String>, S, DefaultKeyEqual>;

// Few distinct hashes, so chains get long and removal walks real chains.
#[derive(Clone, Default)]
struct CoarseBuildHasher;
struct CoarseHasher(u64);
impl BuildHasher for CoarseBuildHasher {
    type Hasher = CoarseHasher;
    fn build_hasher(&self) -> Self::Hasher {
        CoarseHasher(0)
    }
}
impl Hasher for CoarseHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_add(b as u64);
        }
    }
    fn finish(&self) -> u64 {
        self.0 % 3
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize),
    TryInsert(usize),
    RemoveKey(usize),
    RemoveHandle(usize),
    Find(usize),
    Rehash(usize),
    Reserve(usize),
    SetMaxLoadFactor(f32),
    Retain(u8),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            6 => idx.clone().prop_map(OpI::Insert),
            2 => idx.clone().prop_map(OpI::TryInsert),
            2 => idx.clone().prop_map(OpI::RemoveKey),
            2 => idx.clone().prop_map(OpI::RemoveHandle),
            3 => idx.clone().prop_map(OpI::Find),
            1 => (0usize..64).prop_map(OpI::Rehash),
            1 => (0usize..64).prop_map(OpI::Reserve),
            1 => prop_oneof![Just(0.25f32), Just(0.5), Just(1.0), Just(2.5), Just(8.0)]
                .prop_map(OpI::SetMaxLoadFactor),
            1 => (1u8..4).prop_map(OpI::Retain),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against an insertion-ordered model.
// Invariants exercised across random operation sequences:
// - Duplicate keys are never stored; re-insert returns the existing handle.
// - Iteration order equals first-insertion order of the live keys, through
//   any number of rehashes, reserves and max-load-factor changes.
// - Removed handles never resolve again.
// - Chains, global list and load factor stay consistent after every op.
fn run_scenario<S: BuildHasher + Clone>(
    hasher: S,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut sut: Table<S> = HashTable::new(hasher, DefaultKeyEqual, 0, 1.0);
    let mut order: Vec<String> = Vec::new();
    let mut live: HashMap<String, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();

    for op in ops {
        match op {
            OpI::Insert(i) | OpI::TryInsert(i) => {
                let k = pool[i].clone();
                let (h, inserted) = match op {
                    OpI::Insert(_) => sut.insert_if_missing(k.clone()),
                    _ => sut.try_insert_if_missing(k.clone()).expect("small insert succeeds"),
                };
                match live.get(&k) {
                    Some(&existing) => {
                        prop_assert!(!inserted);
                        prop_assert_eq!(h, existing);
                    }
                    None => {
                        prop_assert!(inserted);
                        live.insert(k.clone(), h);
                        order.push(k);
                    }
                }
            }
            OpI::RemoveKey(i) => {
                let k = &pool[i];
                let removed = sut.remove_key(k.as_str());
                prop_assert_eq!(removed.is_some(), live.contains_key(k));
                if let Some(h) = live.remove(k) {
                    order.retain(|x| x != k);
                    stale.push(h);
                }
            }
            OpI::RemoveHandle(i) => {
                let k = &pool[i];
                if let Some(h) = live.remove(k) {
                    let pos = order.iter().position(|x| x == k).expect("tracked");
                    let (v, next) = sut.remove(h).expect("live handle");
                    prop_assert_eq!(&v, k);
                    order.remove(pos);
                    let expected_next = order.get(pos).map(|x| live[x]);
                    prop_assert_eq!(next, expected_next);
                    stale.push(h);
                }
            }
            OpI::Find(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.find(k.as_str()), live.get(k).copied());
            }
            OpI::Rehash(n) => {
                let before = sut.bucket_count();
                sut.rehash_for_num_buckets(n);
                if (sut.len() as f64) > n.max(1) as f64 * sut.max_load_factor() as f64 {
                    prop_assert_eq!(sut.bucket_count(), before);
                } else {
                    prop_assert!(sut.bucket_count() >= n.max(1));
                }
            }
            OpI::Reserve(n) => {
                sut.reserve_for_num_elements(n);
                prop_assert!(sut.capacity() >= n);
            }
            OpI::SetMaxLoadFactor(f) => {
                sut.set_max_load_factor(f);
                prop_assert_eq!(sut.max_load_factor(), f);
            }
            OpI::Retain(m) => {
                let keep = |s: &String| s.len() % (m as usize + 1) != 0;
                sut.retain(|s| keep(s));
                for k in order.iter().filter(|k| !keep(k)) {
                    if let Some(h) = live.remove(k) {
                        stale.push(h);
                    }
                }
                order.retain(|k| keep(k));
            }
            OpI::Clear => {
                stale.extend(live.drain().map(|(_, h)| h));
                order.clear();
                sut.clear();
            }
        }

        sut.check_invariants();
        prop_assert_eq!(sut.len(), order.len());
        let walked: Vec<&String> = sut.iter().collect();
        let expected: Vec<&String> = order.iter().collect();
        prop_assert_eq!(walked, expected);
        for h in &stale {
            prop_assert!(sut.get(*h).is_none(), "stale handle must not resolve");
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_random_hasher((pool, ops) in arb_scenario()) {
        run_scenario(RandomState::new(), pool, ops)?;
    }

    #[test]
    fn prop_state_machine_colliding_hasher((pool, ops) in arb_scenario()) {
        run_scenario(CoarseBuildHasher, pool, ops)?;
    }

    // Property: clone is indistinguishable from the source by value, order
    // and bucket layout, and equal under `eq_table`.
    #[test]
    fn prop_clone_matches_source(keys in proptest::collection::vec("[a-z]{0,3}", 0..40), mlf in 1u8..4) {
        let mut t: Table<RandomState> = HashTable::new(RandomState::new(), DefaultKeyEqual, 0, mlf as f32);
        for k in keys {
            t.insert_if_missing(k);
        }
        let c = t.clone();
        c.check_invariants();
        prop_assert!(c.eq_table(&t));
        prop_assert_eq!(c.iter().collect::<Vec<_>>(), t.iter().collect::<Vec<_>>());
        prop_assert_eq!(c.bucket_count(), t.bucket_count());
        for i in 0..t.bucket_count() {
            prop_assert_eq!(c.bucket_iter(i).collect::<Vec<_>>(), t.bucket_iter(i).collect::<Vec<_>>());
        }
    }
}
