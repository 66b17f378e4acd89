use std::borrow::Borrow;
use std::collections::hash_map::{Iter, Keys, Values};
use std::hash::Hash;

use lock_api::{RawRwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::Table;

/// An active read transaction over a `ValueMap`. The data in this map is
/// guaranteed to not change and will remain consistent for the life of this
/// transaction.
///
/// Unlike the single-shot methods on `ValueMap`, this hands out references
/// rather than clones.
pub struct ValueMapReadTxn<'a, K, V, R: RawRwLock> {
    inner: RwLockReadGuard<'a, R, Table<K, V>>,
}

/// An active write transaction over a `ValueMap`, exclusive to all other
/// readers and writers.
///
/// Changes apply in place and become visible to others when this is dropped.
/// There is no rollback.
pub struct ValueMapWriteTxn<'a, K, V, R: RawRwLock> {
    inner: RwLockWriteGuard<'a, R, Table<K, V>>,
}

impl<'a, K, V, R> ValueMapReadTxn<'a, K, V, R>
where
    K: Hash + Eq,
    R: RawRwLock,
{
    pub(crate) fn new(inner: RwLockReadGuard<'a, R, Table<K, V>>) -> Self {
        ValueMapReadTxn { inner }
    }

    /// Retrieve a value from the map. If the value exists, a reference is returned
    /// as `Some(&V)`, otherwise if not present `None` is returned.
    pub fn get<Q>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(k)
    }

    /// Assert if a key exists in the map.
    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(k)
    }

    /// returns the current number of k:v pairs in the map
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Determine if the map is currently empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterator over `(&K, &V)` of the map
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.inner.iter()
    }

    /// Iterator over &K
    pub fn keys(&self) -> Keys<'_, K, V> {
        self.inner.keys()
    }

    /// Iterator over &V
    pub fn values(&self) -> Values<'_, K, V> {
        self.inner.values()
    }
}

impl<'a, K, V, R> ValueMapWriteTxn<'a, K, V, R>
where
    K: Hash + Eq,
    R: RawRwLock,
{
    pub(crate) fn new(inner: RwLockWriteGuard<'a, R, Table<K, V>>) -> Self {
        ValueMapWriteTxn { inner }
    }

    /// Retrieve a value from the map. If the value exists, a reference is returned
    /// as `Some(&V)`, otherwise if not present `None` is returned.
    pub fn get<Q>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(k)
    }

    /// Assert if a key exists in the map.
    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(k)
    }

    /// returns the current number of k:v pairs in the map
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Determine if the map is currently empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterator over `(&K, &V)` of the map
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.inner.iter()
    }

    /// Iterator over &K
    pub fn keys(&self) -> Keys<'_, K, V> {
        self.inner.keys()
    }

    /// Iterator over &V
    pub fn values(&self) -> Values<'_, K, V> {
        self.inner.values()
    }

    /// Insert or update a value by key. If the value previously existed it is returned
    /// as `Some(V)`. If the value did not previously exist this returns `None`.
    pub fn set(&mut self, k: K, v: V) -> Option<V> {
        self.inner.insert(k, v)
    }

    /// Remove a key if it exists in the map. If the value exists, we return it as `Some(V)`,
    /// and if it did not exist, we return `None`
    pub fn delete<Q>(&mut self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(k)
    }

    /// Get a mutable reference to a value in the map.
    pub fn get_mut<Q>(&mut self, k: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get_mut(k)
    }

    /// Reset this map to an empty state.
    pub fn clear(&mut self) {
        self.inner.clear()
    }
}

impl<'a, K, V, R> Extend<(K, V)> for ValueMapWriteTxn<'a, K, V, R>
where
    K: Hash + Eq,
    R: RawRwLock,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.inner.extend(iter)
    }
}
