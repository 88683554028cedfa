//! sparecache: a bounded second-chance (CLOCK) cache with deferred
//! re-queueing and eviction callbacks.
//!
//! Reads only mark a key as *spared*; the scan queue is reordered lazily when
//! a full cache needs room, giving each touched key exactly one reprieve.
//!
//! ```
//! use sparecache::prelude::*;
//!
//! let mut cache = SecondChanceCache::new(2);
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.get(&"a");
//! cache.set("c", 3);
//!
//! assert!(cache.contains(&"a"));
//! assert!(!cache.contains(&"b"));
//! ```
//!
//! ## Features
//!
//! - `metrics`: hit/miss/scan counters and a Prometheus text exporter.
//! - `concurrency`: `shared::SharedSecondChanceCache`, a single-lock
//!   wrapper built on `parking_lot`.

pub mod builder;
pub mod error;
pub mod listener;
pub mod policy;
pub mod traits;

#[cfg(feature = "metrics")]
pub mod metrics;

#[cfg(feature = "concurrency")]
pub mod shared;

pub mod prelude;
