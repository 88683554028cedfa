//! # Cache Trait Seam
//!
//! Small trait pair that lets generic code drive a cache without naming the
//! concrete policy type.
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────────────────┐
//!   │          ReadOnlyCache<K, V>            │
//!   │                                         │
//!   │  contains(&, &K) → bool                 │
//!   │  len(&) → usize                         │
//!   │  is_empty(&) → bool                     │
//!   │  capacity(&) → usize                    │
//!   └──────────────────┬──────────────────────┘
//!                      │
//!                      ▼
//!   ┌─────────────────────────────────────────┐
//!   │            CoreCache<K, V>              │
//!   │                                         │
//!   │  insert(&mut, K, V) → Option<V>         │
//!   │  get(&mut, &K) → Option<&V>             │
//!   └─────────────────────────────────────────┘
//! ```
//!
//! There is no removal trait: entries leave a second-chance cache only
//! through its eviction scan.
//!
//! ## Thread Safety
//!
//! - Implementations are **not** thread-safe by themselves.
//! - Wrap in a single exclusive lock for shared access (see
//!   `shared::SharedSecondChanceCache` behind the `concurrency` feature).

/// Read-only cache queries that never affect eviction order.
///
/// # Example
///
/// ```
/// use sparecache::policy::second_chance::SecondChanceCache;
/// use sparecache::traits::{CoreCache, ReadOnlyCache};
///
/// fn occupancy<C: ReadOnlyCache<u64, String>>(cache: &C) -> f64 {
///     cache.len() as f64 / cache.capacity() as f64
/// }
///
/// let mut cache = SecondChanceCache::new(4);
/// cache.insert(1, "one".to_string());
/// assert_eq!(occupancy(&cache), 0.25);
/// ```
pub trait ReadOnlyCache<K, V> {
    /// Checks if a key exists without updating access state.
    fn contains(&self, key: &K) -> bool;

    /// Returns the current number of entries in the cache.
    fn len(&self) -> usize;

    /// Returns `true` if the cache contains no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the maximum capacity of the cache.
    fn capacity(&self) -> usize;
}

/// Core cache operations: insert and access.
///
/// # Example
///
/// ```
/// use sparecache::policy::second_chance::SecondChanceCache;
/// use sparecache::traits::{CoreCache, ReadOnlyCache};
///
/// fn warm_cache<C: CoreCache<u64, String>>(cache: &mut C, data: &[(u64, String)]) {
///     for (key, value) in data {
///         cache.insert(*key, value.clone());
///     }
/// }
///
/// let mut cache = SecondChanceCache::new(100);
/// warm_cache(&mut cache, &[(1, "one".to_string()), (2, "two".to_string())]);
/// assert_eq!(cache.len(), 2);
/// ```
pub trait CoreCache<K, V>: ReadOnlyCache<K, V> {
    /// Inserts a key-value pair, returning the previous value if it existed.
    ///
    /// If the cache is at capacity, an entry may be evicted according to the
    /// cache's eviction policy before the new entry is inserted.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Gets a reference to a value by key.
    ///
    /// May update internal state depending on the eviction policy. Use
    /// [`contains`](ReadOnlyCache::contains) to check existence without
    /// affecting eviction order.
    fn get(&mut self, key: &K) -> Option<&V>;
}
