//! Key extraction and key equality seams of the hash table engine.

use core::marker::PhantomData;

/// Describes how the engine obtains a lookup key from a stored value.
///
/// The engine hashes and compares `Key`s only; it never inspects the rest
/// of a `Value`.
pub trait KeyPolicy {
    type Value;
    type Key: ?Sized;

    fn key(value: &Self::Value) -> &Self::Key;
}

/// Identity policy: the stored value is its own key. Used by `UnorderedSet`.
pub struct SetKeyPolicy<K>(PhantomData<fn() -> K>);

impl<K> KeyPolicy for SetKeyPolicy<K> {
    type Value = K;
    type Key = K;

    #[inline]
    fn key(value: &K) -> &K {
        value
    }
}

/// Key equality functor.
///
/// Implementations must be an equivalence relation and agree with the
/// table's hasher: keys that compare equal must hash equally.
pub trait KeyEqual<Q: ?Sized> {
    fn equal(&self, a: &Q, b: &Q) -> bool;
}

/// Equality through `Eq`. Works for every borrowed form of the key, so
/// `String` keys can be looked up with `&str`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct DefaultKeyEqual;

impl<Q: ?Sized + Eq> KeyEqual<Q> for DefaultKeyEqual {
    #[inline]
    fn equal(&self, a: &Q, b: &Q) -> bool {
        a == b
    }
}
