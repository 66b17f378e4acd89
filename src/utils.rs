use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::Table;

#[cfg(feature = "ahash")]
pub use ahash::RandomState;

#[cfg(all(feature = "foldhash", not(feature = "ahash")))]
pub use foldhash::fast::RandomState;

#[cfg(all(not(feature = "ahash"), not(feature = "foldhash")))]
pub use std::collections::hash_map::RandomState;

/// The raw reader/writer lock used when none is specified.
pub type DefaultRawRwLock = parking_lot::RawRwLock;

// Zero is never handed out.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique identity. Whenever two locks are held at once
/// they are acquired in ascending order of this value.
pub(crate) fn next_instance_id() -> u64 {
    NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) fn empty_table<K, V>(capacity: usize) -> Table<K, V> {
    Table::with_capacity_and_hasher(capacity, RandomState::default())
}

/// Element-wise copy of a set of pairs into a fresh table. Values are cloned
/// at the top level only.
pub(crate) fn copy_table<'a, K, V, I>(iter: I, capacity: usize) -> Table<K, V>
where
    I: Iterator<Item = (&'a K, &'a V)>,
    K: Hash + Eq + Clone + 'a,
    V: Clone + 'a,
{
    let mut table = empty_table(capacity);
    table.extend(iter.map(|(k, v)| (k.clone(), v.clone())));
    table
}

/// Upsert every pair of `src` into `dst`, overwriting on conflict.
pub(crate) fn merge_into<K, V>(dst: &mut Table<K, V>, src: &Table<K, V>)
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    dst.reserve(src.len());
    for (k, v) in src.iter() {
        dst.insert(k.clone(), v.clone());
    }
}

pub(crate) fn tables_equal<K, V, F>(a: &Table<K, V>, b: &Table<K, V>, mut eq: F) -> bool
where
    K: Hash + Eq,
    F: FnMut(&V, &V) -> bool,
{
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|(k, v)| b.get(k).is_some_and(|other| eq(v, other)))
}
