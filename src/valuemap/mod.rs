//! ValueMap - A synchronised HashMap
//!
//! A `ValueMap` owns a table and the reader/writer lock that guards it. Every
//! operation acquires the lock for exactly the duration of the call, so callers
//! never need to coordinate locking themselves.
//!
//! Operations that involve two maps (`merge`, `==` and `eq_by`) hold both locks
//! at once. Each map is stamped with a process-unique id when it is built, and
//! the lock of the map with the lower id is always taken first. Two threads
//! running `a.merge(&b)` and `b.merge(&a)` therefore contend on the same lock
//! first, rather than each holding one and waiting forever on the other.
//!
//! For a sequence of operations that must observe or produce one consistent
//! state, open a transaction with `read()` or `write()`.

mod txn;

pub use self::txn::{ValueMapReadTxn, ValueMapWriteTxn};

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::ptr;

use lock_api::{RawRwLock, RwLock, RwLockReadGuard};
use tracing::trace;

use crate::utils::{
    copy_table, empty_table, merge_into, next_instance_id, tables_equal, DefaultRawRwLock,
};
use crate::Table;

/// A key-value map that may be shared and mutated between threads.
///
/// This is the structure you would otherwise build as `RwLock<HashMap<K, V>>`,
/// with the composite operations (clone, merge, equality) made atomic and
/// deadlock free.
///
/// Values are handed out as clones, since a reference could outlive the lock
/// protecting it. To borrow values in place, use a [`ValueMapReadTxn`].
///
/// A `ValueMap` is never `Copy`. Cloning it produces a new table behind a new
/// lock, it never duplicates the lock of a map in use.
///
/// # Examples
/// ```
/// use valuemap::ValueMap;
///
/// let m: ValueMap<String, u32> = ValueMap::new();
/// m.set("a".to_string(), 1);
/// assert_eq!(m.get("a"), Some(1));
/// assert_eq!(m.get("b"), None);
///
/// m.delete("a");
/// assert!(m.is_empty());
/// ```
pub struct ValueMap<K, V, R: RawRwLock = DefaultRawRwLock> {
    id: u64,
    table: RwLock<R, Table<K, V>>,
}

/// These constructors use the default raw lock, in the same way that
/// `HashMap::new` is only provided for the default hasher. With a custom raw
/// lock `R`, build the map through `from_table`, `Default` or `FromIterator`.
impl<K, V> ValueMap<K, V>
where
    K: Hash + Eq,
{
    /// Construct a new, empty map.
    pub fn new() -> Self {
        Self::from_table(empty_table(0))
    }

    /// Construct a new, empty map with space for at least `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_table(empty_table(capacity))
    }

    /// Construct a map holding a copy of every pair in `source`.
    ///
    /// The copy is element-wise: each key and value is cloned once, but nothing
    /// is shared with `source` afterwards. Mutating either one never affects
    /// the other. Values that are themselves handles (such as an `Arc`) still
    /// point at the same data, as `Clone` on them implies.
    pub fn from_map<S>(source: &HashMap<K, V, S>) -> Self
    where
        K: Clone,
        V: Clone,
    {
        Self::from_table(copy_table(source.iter(), source.len()))
    }
}

impl<K, V, R> ValueMap<K, V, R>
where
    K: Hash + Eq,
    R: RawRwLock,
{
    /// Construct a map that takes ownership of an existing table.
    pub fn from_table(table: Table<K, V>) -> Self {
        ValueMap {
            id: next_instance_id(),
            table: RwLock::new(table),
        }
    }

    /// Begin a read transaction. The content is guaranteed not to change until
    /// the transaction is dropped. Writers are blocked while it is held, so
    /// keep it short.
    ///
    /// # Deadlocks
    ///
    /// The lock is not reentrant. Calling any method of this map other than
    /// through the transaction, from the thread holding it, blocks forever
    /// if it writes, and may block if a writer is queued.
    pub fn read(&self) -> ValueMapReadTxn<'_, K, V, R> {
        ValueMapReadTxn::new(self.table.read())
    }

    /// Begin a write transaction, exclusive to all other readers and writers.
    /// Changes are visible to others as soon as the transaction is dropped.
    ///
    /// # Deadlocks
    ///
    /// The lock is not reentrant. Calling any method of this map other than
    /// through the transaction, from the thread holding it, blocks forever.
    pub fn write(&self) -> ValueMapWriteTxn<'_, K, V, R> {
        ValueMapWriteTxn::new(self.table.write())
    }

    /// Attempt to begin a write transaction. Returns `None` if any reader or
    /// writer currently holds the map.
    ///
    /// # Deadlocks
    ///
    /// The lock is not reentrant. Calling any method of this map other than
    /// through the transaction, from the thread holding it, blocks forever.
    pub fn try_write(&self) -> Option<ValueMapWriteTxn<'_, K, V, R>> {
        self.table.try_write().map(ValueMapWriteTxn::new)
    }

    /// Insert or update a value by key. If the key previously existed the old
    /// value is returned as `Some(V)`.
    pub fn set(&self, k: K, v: V) -> Option<V> {
        self.table.write().insert(k, v)
    }

    /// Retrieve a clone of the value for `k`, or `None` if it is absent.
    pub fn get<Q>(&self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.table.read().get(k).cloned()
    }

    /// Assert if a key exists in the map.
    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.read().contains_key(k)
    }

    /// Remove a key if it exists, returning the value it held. Removing an
    /// absent key is not an error, and returns `None`.
    pub fn delete<Q>(&self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.write().remove(k)
    }

    /// Upsert every pair of `other` into this map, overwriting on conflict.
    /// Keys only present in this map are left alone.
    ///
    /// The whole merge happens while holding `other`'s read lock and this map's
    /// write lock, so it applies one consistent state of `other` and no reader
    /// of this map can see it half done. Merging a map into itself is a no-op.
    pub fn merge(&self, other: &Self)
    where
        K: Clone,
        V: Clone,
    {
        if ptr::eq(self, other) {
            return;
        }
        let (mut dst, src) = if self.id < other.id {
            let dst = self.table.write();
            (dst, other.table.read())
        } else {
            let src = other.table.read();
            (self.table.write(), src)
        };
        trace!(dst = self.id, src = other.id, entries = src.len(), "merge");
        merge_into(&mut dst, &src);
    }

    /// Upsert every pair yielded by `iter` under a single write acquisition.
    pub fn extend_from<I>(&self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.table.write().extend(iter)
    }

    /// Compare with `other` using `eq` in place of `PartialEq` for values. Both
    /// maps must hold the same key set, and `eq` must accept each value pair.
    ///
    /// Both read locks are held for the whole comparison, taken in the same
    /// order as `merge`.
    pub fn eq_by<F>(&self, other: &Self, eq: F) -> bool
    where
        F: FnMut(&V, &V) -> bool,
    {
        if ptr::eq(self, other) {
            let guard = self.table.read();
            return tables_equal(&guard, &guard, eq);
        }
        let (a, b) = self.read_pair(other);
        tables_equal(&a, &b, eq)
    }

    /// A snapshot of every key at the time of the call, in no particular order.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.table.read().keys().cloned().collect()
    }

    /// A snapshot of every value at the time of the call, in no particular order.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.table.read().values().cloned().collect()
    }

    /// returns the current number of k:v pairs in the map
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Determine if the map is currently empty
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Remove every entry. Capacity is kept for future writes.
    pub fn clear(&self) {
        let mut guard = self.table.write();
        trace!(id = self.id, entries = guard.len(), "clear");
        guard.clear();
    }

    /// An owned copy of the current table. The caller may do as it likes with
    /// it, changes are never reflected back into this map.
    pub fn raw(&self) -> Table<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let guard = self.table.read();
        copy_table(guard.iter(), guard.len())
    }

    /// Consume the map, returning the table it held.
    pub fn into_inner(self) -> Table<K, V> {
        self.table.into_inner()
    }

    // Acquire both read locks in ascending id order, returned as (self, other).
    fn read_pair<'a>(
        &'a self,
        other: &'a Self,
    ) -> (
        RwLockReadGuard<'a, R, Table<K, V>>,
        RwLockReadGuard<'a, R, Table<K, V>>,
    ) {
        if self.id < other.id {
            let a = self.table.read();
            (a, other.table.read())
        } else {
            let b = other.table.read();
            (self.table.read(), b)
        }
    }
}

impl<K, V, R> Default for ValueMap<K, V, R>
where
    K: Hash + Eq,
    R: RawRwLock,
{
    fn default() -> Self {
        Self::from_table(empty_table(0))
    }
}

impl<K, V, R> Clone for ValueMap<K, V, R>
where
    K: Hash + Eq + Clone,
    V: Clone,
    R: RawRwLock,
{
    /// Copy the table under a single read acquisition. The result reflects one
    /// point in time, and has its own lock and identity.
    fn clone(&self) -> Self {
        let table = {
            let guard = self.table.read();
            copy_table(guard.iter(), guard.len())
        };
        trace!(src = self.id, entries = table.len(), "clone");
        Self::from_table(table)
    }
}

impl<K, V, R> PartialEq for ValueMap<K, V, R>
where
    K: Hash + Eq,
    V: PartialEq,
    R: RawRwLock,
{
    fn eq(&self, other: &Self) -> bool {
        self.eq_by(other, |a, b| a == b)
    }
}

impl<K, V, R> Eq for ValueMap<K, V, R>
where
    K: Hash + Eq,
    V: Eq,
    R: RawRwLock,
{
}

impl<K, V, R> FromIterator<(K, V)> for ValueMap<K, V, R>
where
    K: Hash + Eq,
    R: RawRwLock,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = empty_table(0);
        table.extend(iter);
        Self::from_table(table)
    }
}

impl<K: Debug, V: Debug, R: RawRwLock> Debug for ValueMap<K, V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("ValueMap");
        f.field("id", &self.id);
        match self.table.try_read() {
            Some(guard) => {
                f.field("table", &&*guard);
            }
            None => {
                struct LockedPlaceholder;
                impl Debug for LockedPlaceholder {
                    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        f.write_str("<locked>")
                    }
                }

                f.field("table", &LockedPlaceholder);
            }
        }
        f.finish()
    }
}
