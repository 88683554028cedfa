//! Eviction listener: the callback invoked whenever the eviction scan
//! removes an entry.
//!
//! The listener receives the evicted key and value by value; ownership of
//! both moves out of the cache into the callback. It is never called for
//! overwrites, for keys that survive a scan pass, or for entries still
//! resident when the cache is dropped.
//!
//! # Example
//! ```
//! use sparecache::policy::second_chance::SecondChanceCache;
//! use std::sync::mpsc;
//!
//! let (tx, rx) = mpsc::channel();
//! let mut cache = SecondChanceCache::try_with_listener(2, move |key: u64, value: u64| {
//!     let _ = tx.send((key, value));
//! })
//! .unwrap();
//!
//! cache.set(1, 10);
//! cache.set(2, 20);
//! cache.set(3, 30); // capacity eviction
//!
//! assert_eq!(rx.try_recv(), Ok((1, 10)));
//! ```

// ---------------------------------------------------------------------------
// EvictionListener trait
// ---------------------------------------------------------------------------

/// A callback invoked each time an entry is evicted for capacity.
///
/// Any `FnMut(K, V)` closure implements this trait. Listeners stored in a
/// cache must also be `Send` so the cache can be moved behind a lock.
///
/// The callback runs synchronously inside
/// [`SecondChanceCache::set`](crate::policy::second_chance::SecondChanceCache::set),
/// after the cache has already reached a consistent state. A panic raised by
/// the listener unwinds out of `set` and leaves the cache usable.
pub trait EvictionListener<K, V> {
    fn on_evict(&mut self, key: K, value: V);
}

impl<K, V, F> EvictionListener<K, V> for F
where
    F: FnMut(K, V),
{
    #[inline]
    fn on_evict(&mut self, key: K, value: V) {
        self(key, value)
    }
}

/// Boxed listener as stored inside a cache.
pub type BoxedListener<K, V> = Box<dyn EvictionListener<K, V> + Send>;
