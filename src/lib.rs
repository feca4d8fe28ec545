//! chained-hashset: a hash set built on a separately chained hash table
//! with stable node handles and insertion-ordered iteration.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a bucketed hash table whose elements live in individually
//!   addressable nodes, so positions (handles) survive rehashing and
//!   iteration order is independent of bucket layout.
//! - Layers:
//!   - NodeStore<V>: slotmap-backed arena owning every node; threads all
//!     nodes on one doubly linked global list (the iteration order).
//!   - BucketArray: one `(first, last, len)` descriptor per bucket; each
//!     bucket's nodes form a singly linked chain through the node store.
//!     Also owns the bucket sizing policy (a fixed sequence of primes).
//!   - HashTable<P, S, E>: the engine. Lookup, unique insertion, removal,
//!     rehash and load-factor upkeep over the two structures above,
//!     generic over a key-extraction policy `P`, a hasher `S` and an
//!     equality functor `E`.
//!   - UnorderedSet<K, S, E>: the public set, the engine with the identity
//!     key policy.
//!
//! Constraints
//! - Unique keys: inserting an equal key reports "not inserted" and leaves
//!   the set untouched.
//! - `len <= bucket_count * max_load_factor` after every operation; the
//!   default max load factor is 1.0.
//! - Links are generational slotmap keys, never pointers; the crate has no
//!   `unsafe`.
//! - Single writer. Shared references may be used from several threads at
//!   once (`UnorderedSet` is `Sync` when its parts are), mutation needs
//!   `&mut`.
//!
//! Ordering
//! - A new element is appended to the global list and pushed onto the head
//!   of its bucket chain.
//! - Rehash walks the global list once and appends each node to its new
//!   chain, so global order never changes and each chain ends up in global
//!   order.
//!
//! Hasher and rehashing invariants
//! - Each node stores the `u64` hash computed at insertion. Rehash,
//!   removal by handle and clone use the stored hash; `K: Hash` is not
//!   invoked after insertion.
//!
//! Failure model
//! - `try_insert`, `try_reserve` and `try_rehash` report allocation failure
//!   as `TryReserveError` and leave the set unchanged. Their infallible
//!   counterparts panic on capacity overflow and abort on allocation
//!   failure, like the std collections.
//! - Precondition violations (stale handles, out-of-range bucket indices,
//!   invalid max load factors) panic in debug builds or with the
//!   `checked-contracts` feature, and are otherwise ignored.
//!
//! Notes and non-goals
//! - No ordered iteration by key, no persistence, no concurrent mutation.
//! - No custom allocator parameter; memory comes from the global allocator.
//! - Hint-taking insertion is not provided: a hint cannot shorten the chain
//!   scan that uniqueness requires.

mod buckets;
pub mod contract;
pub mod error;
mod events;
pub mod iter;
mod node_store;
pub mod policy;
pub mod table;
#[cfg(test)]
mod table_proptest;
mod unordered_set;

// Public surface
pub use error::TryReserveError;
pub use iter::{Handle, IntoIter, Iter, LocalIter};
pub use policy::{DefaultKeyEqual, KeyEqual};
pub use unordered_set::UnorderedSet;
