//! ValueMap - Synchronised Key-Value Maps
//!
//! This crate provides a `HashMap` that can be shared between threads without
//! hand-rolling the synchronisation around it each time. Every operation takes
//! the map's internal reader/writer lock for the duration of the call, so each
//! call is atomic with respect to every other call on the same map.
//!
//! The interesting operations are the ones that touch two maps at once. `merge`
//! and equality hold both maps' locks together, and always acquire them in a
//! fixed process-wide order. This means `a.merge(&b)` racing with `b.merge(&a)`
//! can never deadlock, and `a == b` never observes a half-applied write.
//!
//! ```
//! use valuemap::ValueMap;
//!
//! let m = ValueMap::new();
//! m.set("a", 1);
//! m.set("b", 2);
//!
//! let c = m.clone();
//! c.set("a", 99);
//!
//! assert_eq!(m.get("a"), Some(1));
//! assert_eq!(c.get("a"), Some(99));
//! assert!(m != c);
//!
//! m.merge(&c);
//! assert_eq!(m.get("a"), Some(99));
//! ```
//!
//! If several maps must change together under a single lock, use a
//! [`group::MapGroup`] rather than sharing a lock by convention.
//!
//! # Features
//!
//! * `foldhash` - hash tables with the foldhash crate (default)
//! * `ahash` - hash tables with the cpu accelerated ahash crate
//!
//! With neither enabled the std `RandomState` is used.

#![deny(warnings)]
#![warn(unused_extern_crates)]
#![warn(missing_docs)]

pub mod group;
pub mod valuemap;

mod utils;

pub use crate::group::{GroupMapId, MapGroup};
pub use crate::utils::{DefaultRawRwLock, RandomState};
pub use crate::valuemap::ValueMap;

/// The table type stored by the maps in this crate, and handed back by
/// snapshot operations such as [`ValueMap::raw`].
pub type Table<K, V> = std::collections::HashMap<K, V, RandomState>;
