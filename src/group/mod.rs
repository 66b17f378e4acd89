//! MapGroup - Several maps under one lock
//!
//! Sometimes a set of maps must change together: a merge from one into another
//! that no reader of either can observe half done, or a comparison across
//! several maps at once. Rather than asking every call site to pass the same
//! lock by convention, a `MapGroup` owns the tables of all its member maps
//! behind a single reader/writer lock.
//!
//! Members are addressed with a [`GroupMapId`] issued by the group. Each id
//! carries the identity of its group, so using it with any other group is
//! detected rather than silently touching the wrong data.
//!
//! ```
//! use valuemap::group::MapGroupReadOps;
//! use valuemap::MapGroup;
//!
//! let group: MapGroup<&str, u32> = MapGroup::new();
//! let a = group.insert_map();
//! let b = group.insert_map();
//!
//! {
//!     let mut txn = group.write();
//!     txn.set(a, "x", 1);
//!     txn.set(b, "x", 2);
//!     txn.set(b, "y", 3);
//!     txn.merge(a, b);
//! }
//!
//! let txn = group.read();
//! assert_eq!(txn.get(a, "x"), Some(&2));
//! assert!(txn.equal(a, b));
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;

use lock_api::{RawRwLock, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

use crate::utils::{
    copy_table, empty_table, merge_into, next_instance_id, tables_equal, DefaultRawRwLock,
};
use crate::Table;

/// A handle to one member map of a [`MapGroup`].
///
/// Handles are cheap to copy. They remain valid for the life of the group that
/// issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupMapId {
    group: u64,
    slot: usize,
}

/// A set of maps guarded by one reader/writer lock.
///
/// Every operation on any member holds the group lock, so operations spanning
/// several members (`merge`, `equal`) are atomic and cannot deadlock against
/// each other.
pub struct MapGroup<K, V, R: RawRwLock = DefaultRawRwLock> {
    id: u64,
    tables: RwLock<R, Vec<Table<K, V>>>,
}

/// An active read transaction over a `MapGroup`. No member changes for the life
/// of this transaction.
pub struct MapGroupReadTxn<'a, K, V, R: RawRwLock> {
    group: u64,
    inner: RwLockReadGuard<'a, R, Vec<Table<K, V>>>,
}

/// An active write transaction over a `MapGroup`, exclusive to all other
/// readers and writers of every member.
pub struct MapGroupWriteTxn<'a, K, V, R: RawRwLock> {
    group: u64,
    inner: RwLockWriteGuard<'a, R, Vec<Table<K, V>>>,
}

mod private {
    pub trait Sealed {}
}

/// Read operations shared by both transaction types of a `MapGroup`.
///
/// # Panics
///
/// Every method taking a [`GroupMapId`] panics if the id was issued by a
/// different group.
///
/// Only the transactions of this crate implement it.
///
/// ```compile_fail
/// use valuemap::group::MapGroupReadOps;
/// use valuemap::Table;
///
/// struct Forged(Vec<Table<u32, u32>>);
///
/// impl MapGroupReadOps<u32, u32> for Forged {
///     fn group_id(&self) -> u64 {
///         0
///     }
///
///     fn tables(&self) -> &[Table<u32, u32>] {
///         &self.0
///     }
/// }
/// ```
pub trait MapGroupReadOps<K: Hash + Eq, V>: private::Sealed {
    #[doc(hidden)]
    fn group_id(&self) -> u64;

    #[doc(hidden)]
    fn tables(&self) -> &[Table<K, V>];

    /// The table of a member map.
    fn table(&self, map: GroupMapId) -> &Table<K, V> {
        assert_eq!(
            map.group,
            self.group_id(),
            "GroupMapId used with a MapGroup that did not issue it"
        );
        &self.tables()[map.slot]
    }

    /// The number of member maps in the group.
    fn maps(&self) -> usize {
        self.tables().len()
    }

    /// Retrieve a value from a member map.
    fn get<'a, Q>(&'a self, map: GroupMapId, k: &Q) -> Option<&'a V>
    where
        K: Borrow<Q> + 'a,
        Q: Hash + Eq + ?Sized,
    {
        self.table(map).get(k)
    }

    /// Assert if a key exists in a member map.
    fn contains_key<Q>(&self, map: GroupMapId, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table(map).contains_key(k)
    }

    /// returns the current number of k:v pairs in a member map
    fn len(&self, map: GroupMapId) -> usize {
        self.table(map).len()
    }

    /// Determine if a member map is currently empty
    fn is_empty(&self, map: GroupMapId) -> bool {
        self.table(map).is_empty()
    }

    /// Every key of a member map, in no particular order.
    fn keys(&self, map: GroupMapId) -> Vec<K>
    where
        K: Clone,
    {
        self.table(map).keys().cloned().collect()
    }

    /// Every value of a member map, in no particular order.
    fn values(&self, map: GroupMapId) -> Vec<V>
    where
        V: Clone,
    {
        self.table(map).values().cloned().collect()
    }

    /// An owned copy of a member's table.
    fn raw(&self, map: GroupMapId) -> Table<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let t = self.table(map);
        copy_table(t.iter(), t.len())
    }

    /// True if both members hold the same keys with equal values.
    fn equal(&self, a: GroupMapId, b: GroupMapId) -> bool
    where
        V: PartialEq,
    {
        self.eq_by(a, b, |x, y| x == y)
    }

    /// As `equal`, with `eq` deciding value equality.
    fn eq_by<F>(&self, a: GroupMapId, b: GroupMapId, eq: F) -> bool
    where
        F: FnMut(&V, &V) -> bool,
    {
        tables_equal(self.table(a), self.table(b), eq)
    }
}

impl<K, V> MapGroup<K, V>
where
    K: Hash + Eq,
{
    /// Construct a new group with no members.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V, R> Default for MapGroup<K, V, R>
where
    K: Hash + Eq,
    R: RawRwLock,
{
    fn default() -> Self {
        MapGroup {
            id: next_instance_id(),
            tables: RwLock::new(Vec::new()),
        }
    }
}

impl<K, V, R> MapGroup<K, V, R>
where
    K: Hash + Eq,
    R: RawRwLock,
{
    /// Begin a read transaction across every member.
    pub fn read(&self) -> MapGroupReadTxn<'_, K, V, R> {
        MapGroupReadTxn {
            group: self.id,
            inner: self.tables.read(),
        }
    }

    /// Begin a write transaction across every member.
    pub fn write(&self) -> MapGroupWriteTxn<'_, K, V, R> {
        MapGroupWriteTxn {
            group: self.id,
            inner: self.tables.write(),
        }
    }

    /// Add a new, empty member map.
    pub fn insert_map(&self) -> GroupMapId {
        self.write().insert_map()
    }

    /// Add a member map holding a copy of every pair in `source`.
    pub fn insert_from<S>(&self, source: &HashMap<K, V, S>) -> GroupMapId
    where
        K: Clone,
        V: Clone,
    {
        self.write().push_table(copy_table(source.iter(), source.len()))
    }

    /// Insert or update a value in a member map.
    pub fn set(&self, map: GroupMapId, k: K, v: V) -> Option<V> {
        self.write().set(map, k, v)
    }

    /// Retrieve a clone of a value from a member map.
    pub fn get<Q>(&self, map: GroupMapId, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.read().get(map, k).cloned()
    }

    /// Remove a key from a member map if it exists.
    pub fn delete<Q>(&self, map: GroupMapId, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.write().delete(map, k)
    }

    /// Upsert every pair of member `src` into member `dst`.
    pub fn merge(&self, dst: GroupMapId, src: GroupMapId)
    where
        K: Clone,
        V: Clone,
    {
        self.write().merge(dst, src)
    }

    /// True if both members hold the same keys with equal values.
    pub fn equal(&self, a: GroupMapId, b: GroupMapId) -> bool
    where
        V: PartialEq,
    {
        self.read().equal(a, b)
    }

    /// returns the current number of k:v pairs in a member map
    pub fn len(&self, map: GroupMapId) -> usize {
        self.read().len(map)
    }
}

impl<K, V, R: RawRwLock> private::Sealed for MapGroupReadTxn<'_, K, V, R> {}

impl<K, V, R: RawRwLock> private::Sealed for MapGroupWriteTxn<'_, K, V, R> {}

impl<K, V, R> MapGroupReadOps<K, V> for MapGroupReadTxn<'_, K, V, R>
where
    K: Hash + Eq,
    R: RawRwLock,
{
    fn group_id(&self) -> u64 {
        self.group
    }

    fn tables(&self) -> &[Table<K, V>] {
        &self.inner
    }
}

impl<K, V, R> MapGroupReadOps<K, V> for MapGroupWriteTxn<'_, K, V, R>
where
    K: Hash + Eq,
    R: RawRwLock,
{
    fn group_id(&self) -> u64 {
        self.group
    }

    fn tables(&self) -> &[Table<K, V>] {
        &self.inner
    }
}

impl<K, V, R> MapGroupWriteTxn<'_, K, V, R>
where
    K: Hash + Eq,
    R: RawRwLock,
{
    fn slot(&self, map: GroupMapId) -> usize {
        assert_eq!(
            map.group, self.group,
            "GroupMapId used with a MapGroup that did not issue it"
        );
        map.slot
    }

    fn table_mut(&mut self, map: GroupMapId) -> &mut Table<K, V> {
        let slot = self.slot(map);
        &mut self.inner[slot]
    }

    fn push_table(&mut self, table: Table<K, V>) -> GroupMapId {
        let slot = self.inner.len();
        self.inner.push(table);
        trace!(group = self.group, slot, "insert_map");
        GroupMapId {
            group: self.group,
            slot,
        }
    }

    /// Add a new, empty member map.
    pub fn insert_map(&mut self) -> GroupMapId {
        self.push_table(empty_table(0))
    }

    /// Add a member map holding a copy of member `src`.
    pub fn clone_map(&mut self, src: GroupMapId) -> GroupMapId
    where
        K: Clone,
        V: Clone,
    {
        let table = self.raw(src);
        self.push_table(table)
    }

    /// Insert or update a value by key in a member map. The previous value is
    /// returned if there was one.
    pub fn set(&mut self, map: GroupMapId, k: K, v: V) -> Option<V> {
        self.table_mut(map).insert(k, v)
    }

    /// Remove a key from a member map if it exists.
    pub fn delete<Q>(&mut self, map: GroupMapId, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table_mut(map).remove(k)
    }

    /// Get a mutable reference to a value in a member map.
    pub fn get_mut<Q>(&mut self, map: GroupMapId, k: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table_mut(map).get_mut(k)
    }

    /// Remove every entry of a member map.
    pub fn clear(&mut self, map: GroupMapId) {
        let table = self.table_mut(map);
        trace!(slot = map.slot, entries = table.len(), "clear");
        table.clear();
    }

    /// Upsert every pair of member `src` into member `dst`, overwriting on
    /// conflict. Merging a member into itself is a no-op.
    pub fn merge(&mut self, dst: GroupMapId, src: GroupMapId)
    where
        K: Clone,
        V: Clone,
    {
        let (d, s) = (self.slot(dst), self.slot(src));
        if d == s {
            return;
        }
        let (dst_t, src_t) = if d < s {
            let (lo, hi) = self.inner.split_at_mut(s);
            (&mut lo[d], &hi[0])
        } else {
            let (lo, hi) = self.inner.split_at_mut(d);
            (&mut hi[0], &lo[s])
        };
        trace!(dst = d, src = s, entries = src_t.len(), "merge");
        merge_into(dst_t, src_t);
    }
}

impl<K: Debug, V: Debug, R: RawRwLock> Debug for MapGroup<K, V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("MapGroup");
        f.field("id", &self.id);
        match self.tables.try_read() {
            Some(guard) => {
                f.field("tables", &&*guard);
            }
            None => {
                struct LockedPlaceholder;
                impl Debug for LockedPlaceholder {
                    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        f.write_str("<locked>")
                    }
                }

                f.field("tables", &LockedPlaceholder);
            }
        }
        f.finish()
    }
}
