//! Second-chance cache replacement policy with deferred re-queueing.
//!
//! Implements the second-chance (CLOCK) algorithm on top of three independent
//! containers instead of a fused ring: a scan queue that defines eviction
//! order, a set of "spared" keys that each earn one reprieve, and a hash map
//! holding the values. Accesses only mark keys; all reordering is deferred to
//! eviction time.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                     SecondChanceCache<K, V> Layout                          │
//! │                                                                             │
//! │   ┌─────────────────────────────────────────────────────────────────────┐   │
//! │   │  entries: FxHashMap<K, V>          (authoritative values)           │   │
//! │   └─────────────────────────────────────────────────────────────────────┘   │
//! │                                                                             │
//! │   ┌─────────────────────────────────────────────────────────────────────┐   │
//! │   │  scan_queue: VecDeque<K>           (the clock)                      │   │
//! │   │                                                                     │   │
//! │   │   front (head)                                        back (tail)   │   │
//! │   │   ┌───┐   ┌───┐   ┌───┐   ┌───┐   ┌───┐                             │   │
//! │   │   │ E │ ─ │ D │ ─ │ C │ ─ │ B │ ─ │ A │  ──► next eviction candidate│   │
//! │   │   └───┘   └───┘   └───┘   └───┘   └───┘                             │   │
//! │   │     ▲                                                               │   │
//! │   │     └── new keys and spared survivors are pushed here               │   │
//! │   └─────────────────────────────────────────────────────────────────────┘   │
//! │                                                                             │
//! │   ┌─────────────────────────────────────────────────────────────────────┐   │
//! │   │  spared: FxHashSet<K> = { B, D }   (touched since last scanned)     │   │
//! │   └─────────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm
//!
//! ```text
//! GET(key) / HAS(key, bump_up = true):
//!   1. Look up key in entries
//!   2. If present: spared.insert(key)     (idempotent, no queue movement)
//!
//! SET(key, value):
//!   1. If key exists: overwrite value, spared.insert(key), keep position
//!   2. If at capacity: EVICT()
//!   3. entries.insert(key, value); scan_queue.push_front(key)
//!   4. Hand the evicted pair (if any) to the listener
//!
//! EVICT():
//!   repeat up to capacity + 1 times:
//!     candidate = scan_queue.pop_back()
//!     if spared.remove(candidate):
//!       scan_queue.push_front(candidate)   // second chance consumed
//!     else:
//!       return entries.remove(candidate)
//! ```
//!
//! A spared key loses its flag the first time the scan reaches it, so after
//! at most `len` re-queues the scan meets an unspared key. With a full cache
//! that takes at most `capacity + 1` pops, including `capacity == 1`.
//!
//! ## Invariants
//!
//! Before and after every public operation:
//!
//! 1. `entries.keys() == scan_queue.as_set()`
//! 2. `spared ⊆ entries.keys()`
//! 3. `entries.len() <= capacity`
//! 4. No key appears twice in `scan_queue`
//!
//! [`SecondChanceCache::check_invariants`] verifies all four.
//!
//! ## Performance Characteristics
//!
//! | Operation | Time    | Notes                                     |
//! |-----------|---------|-------------------------------------------|
//! | `get`     | O(1)    | Hash lookup + set insert                  |
//! | `has`     | O(1)    | Hash lookup (+ set insert with `bump_up`) |
//! | `set`     | O(1)*   | *Eviction scan is O(capacity) worst case  |
//! | `peek`    | O(1)    | Hash lookup, no sparing                   |
//!
//! ## Trade-offs
//!
//! | Aspect        | Second-chance             | True LRU                |
//! |---------------|---------------------------|-------------------------|
//! | Access cost   | O(1) set insert           | O(1) list splice        |
//! | Eviction      | Approximate LRU           | Exact LRU               |
//! | Layout        | Three plain containers    | Intrusive linked nodes  |
//!
//! ## Example Usage
//!
//! ```
//! use sparecache::policy::second_chance::SecondChanceCache;
//!
//! let mut cache = SecondChanceCache::new(3);
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.set("c", 3);
//!
//! // Touching "a" spares it from the next eviction scan
//! assert_eq!(cache.get(&"a"), Some(&1));
//!
//! cache.set("d", 4);
//! assert!(cache.contains(&"a"));
//! assert!(!cache.contains(&"b"));
//! ```
//!
//! ## Thread Safety
//!
//! - [`SecondChanceCache`] is single-threaded; every operation, including
//!   `get`, mutates the spared set.
//! - It is `Send` when `K` and `V` are, so it can be placed behind one
//!   exclusive lock held for each whole operation. Locking the three
//!   containers separately is unsound: an eviction scan mutates all of them
//!   as one transaction.

use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::error::{ConfigError, InvariantError};
use crate::listener::{BoxedListener, EvictionListener};
use crate::traits::{CoreCache, ReadOnlyCache};

#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::SecondChanceMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::SecondChanceMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    CoreMetricsRecorder, MetricsReset, MetricsSnapshotProvider, SecondChanceMetricsReadRecorder,
    SecondChanceMetricsRecorder,
};

/// Upper bound on up-front allocation; larger caches grow on demand.
const MAX_PREALLOC: usize = 4096;

/// Capacity-bounded cache with second-chance eviction.
///
/// # Type Parameters
///
/// - `K`: Key type, must be `Clone + Eq + Hash`
/// - `V`: Value type
///
/// # Example
///
/// ```
/// use sparecache::policy::second_chance::SecondChanceCache;
///
/// let mut cache = SecondChanceCache::new(100);
///
/// cache.set("key1", "value1");
/// cache.set("key2", "value2");
///
/// assert_eq!(cache.get(&"key1"), Some(&"value1"));
/// assert!(cache.has(&"key2", false));
/// assert_eq!(cache.len(), 2);
/// ```
///
/// # Eviction Behavior
///
/// When a new key arrives at capacity, the scan pops candidates from the
/// tail of the scan queue. Spared candidates lose their flag and return to
/// the head; the first unspared candidate is evicted and handed to the
/// eviction listener, if one is attached. Exactly one entry is evicted per
/// call.
///
/// Dropping the cache drops resident entries without notifying the listener.
pub struct SecondChanceCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Authoritative value storage
    entries: FxHashMap<K, V>,
    /// Eviction order: front is the head, back is the next candidate
    scan_queue: VecDeque<K>,
    /// Keys touched since they were last scanned
    spared: FxHashSet<K>,
    /// Maximum number of resident keys, at least 1
    capacity: usize,
    listener: Option<BoxedListener<K, V>>,
    #[cfg(feature = "metrics")]
    metrics: SecondChanceMetrics,
}

impl<K, V> SecondChanceCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a cache with the given capacity and no eviction listener.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Use [`try_new`](Self::try_new) for
    /// user-supplied capacities.
    ///
    /// # Example
    ///
    /// ```
    /// use sparecache::policy::second_chance::SecondChanceCache;
    ///
    /// let cache: SecondChanceCache<String, i32> = SecondChanceCache::new(100);
    /// assert_eq!(cache.capacity(), 100);
    /// assert!(cache.is_empty());
    /// ```
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(cache) => cache,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates a cache with the given capacity and no eviction listener.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if `capacity` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use sparecache::policy::second_chance::SecondChanceCache;
    ///
    /// assert!(SecondChanceCache::<u64, u64>::try_new(1).is_ok());
    /// assert!(SecondChanceCache::<u64, u64>::try_new(0).is_err());
    /// ```
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        Self::from_parts(capacity, None)
    }

    /// Creates a cache that reports every capacity eviction to `listener`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if `capacity` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use sparecache::policy::second_chance::SecondChanceCache;
    /// use std::sync::mpsc;
    ///
    /// let (tx, rx) = mpsc::channel();
    /// let mut cache = SecondChanceCache::try_with_listener(1, move |k: &'static str, v: i32| {
    ///     let _ = tx.send((k, v));
    /// })
    /// .unwrap();
    ///
    /// cache.set("a", 1);
    /// cache.set("b", 2);
    /// assert_eq!(rx.try_recv(), Ok(("a", 1)));
    /// ```
    pub fn try_with_listener<L>(capacity: usize, listener: L) -> Result<Self, ConfigError>
    where
        L: EvictionListener<K, V> + Send + 'static,
    {
        Self::from_parts(capacity, Some(Box::new(listener)))
    }

    /// Panicking form of [`try_with_listener`](Self::try_with_listener).
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_listener<L>(capacity: usize, listener: L) -> Self
    where
        L: EvictionListener<K, V> + Send + 'static,
    {
        match Self::try_with_listener(capacity, listener) {
            Ok(cache) => cache,
            Err(err) => panic!("{err}"),
        }
    }

    pub(crate) fn from_parts(
        capacity: usize,
        listener: Option<BoxedListener<K, V>>,
    ) -> Result<Self, ConfigError> {
        if capacity < 1 {
            debug!(capacity, "rejected second-chance cache configuration");
            return Err(ConfigError::InvalidCapacity { capacity });
        }

        let prealloc = capacity.min(MAX_PREALLOC);
        debug!(
            capacity,
            has_listener = listener.is_some(),
            "created second-chance cache"
        );
        Ok(Self {
            entries: FxHashMap::with_capacity_and_hasher(prealloc, Default::default()),
            scan_queue: VecDeque::with_capacity(prealloc),
            spared: FxHashSet::default(),
            capacity,
            listener,
            #[cfg(feature = "metrics")]
            metrics: SecondChanceMetrics::default(),
        })
    }

    /// Returns the value for `key`, sparing the key from the next scan.
    ///
    /// A miss returns `None` and changes nothing. A hit marks the key as
    /// spared but leaves its scan position untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use sparecache::policy::second_chance::SecondChanceCache;
    ///
    /// let mut cache = SecondChanceCache::new(10);
    /// cache.set("key", 42);
    ///
    /// assert_eq!(cache.get(&"key"), Some(&42));
    /// assert!(cache.is_spared(&"key"));
    /// assert_eq!(cache.get(&"missing"), None);
    /// ```
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if !self.entries.contains_key(key) {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_miss();
            return None;
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_get_hit();
        self.spare(key);
        self.entries.get(key)
    }

    /// Like [`get`](Self::get), but falls back to `default` on a miss.
    ///
    /// # Example
    ///
    /// ```
    /// use sparecache::policy::second_chance::SecondChanceCache;
    ///
    /// let mut cache = SecondChanceCache::new(10);
    /// cache.set(1, "one");
    ///
    /// assert_eq!(*cache.get_or(&1, &"none"), "one");
    /// assert_eq!(*cache.get_or(&2, &"none"), "none");
    /// ```
    pub fn get_or<'a>(&'a mut self, key: &K, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }

    /// Returns `true` if `key` is resident.
    ///
    /// With `bump_up` set, a resident key is also spared, exactly as
    /// [`get`](Self::get) would, without reading the value.
    ///
    /// # Example
    ///
    /// ```
    /// use sparecache::policy::second_chance::SecondChanceCache;
    ///
    /// let mut cache = SecondChanceCache::new(10);
    /// cache.set("a", 1);
    ///
    /// assert!(cache.has(&"a", false));
    /// assert!(!cache.is_spared(&"a"));
    ///
    /// assert!(cache.has(&"a", true));
    /// assert!(cache.is_spared(&"a"));
    ///
    /// assert!(!cache.has(&"b", true));
    /// ```
    pub fn has(&mut self, key: &K, bump_up: bool) -> bool {
        let present = self.entries.contains_key(key);
        if present && bump_up {
            self.spare(key);
        }
        present
    }

    /// Inserts or overwrites `key`.
    ///
    /// - Existing key: the value is replaced and returned, the key is
    ///   spared, and its scan position is kept.
    /// - New key below capacity: inserted at the head of the scan queue.
    /// - New key at capacity: the eviction scan frees exactly one slot first,
    ///   then the key is inserted at the head.
    ///
    /// The evicted pair is handed to the listener only after the cache is
    /// consistent again, with the new key already resident. If the listener
    /// panics, the panic propagates out of `set` and the cache stays valid.
    ///
    /// # Example
    ///
    /// ```
    /// use sparecache::policy::second_chance::SecondChanceCache;
    ///
    /// let mut cache = SecondChanceCache::new(2);
    /// assert_eq!(cache.set("a", 1), None);
    /// assert_eq!(cache.set("b", 2), None);
    ///
    /// // Overwrite returns the old value and counts as a touch
    /// assert_eq!(cache.set("a", 10), Some(1));
    /// assert!(cache.is_spared(&"a"));
    ///
    /// // "b" is the unspared key nearest the tail
    /// cache.set("c", 3);
    /// assert!(!cache.contains(&"b"));
    /// assert_eq!(cache.len(), 2);
    /// ```
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        #[cfg(feature = "metrics")]
        self.metrics.record_insert_call();

        if let Some(slot) = self.entries.get_mut(&key) {
            let old = std::mem::replace(slot, value);
            #[cfg(feature = "metrics")]
            self.metrics.record_insert_update();
            self.spare(&key);
            return Some(old);
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_insert_new();

        let evicted = if self.entries.len() >= self.capacity {
            #[cfg(feature = "metrics")]
            self.metrics.record_evict_call();
            self.evict_one()
        } else {
            None
        };
        debug_assert!(self.entries.len() < self.capacity);

        self.scan_queue.push_front(key.clone());
        self.entries.insert(key, value);

        if let Some((evicted_key, evicted_value)) = evicted {
            self.notify(evicted_key, evicted_value);
        }
        None
    }

    /// Returns the value for `key` without sparing it.
    ///
    /// # Example
    ///
    /// ```
    /// use sparecache::policy::second_chance::SecondChanceCache;
    ///
    /// let mut cache = SecondChanceCache::new(2);
    /// cache.set("a", 1);
    /// cache.set("b", 2);
    ///
    /// assert_eq!(cache.peek(&"a"), Some(&1));
    ///
    /// // peek left "a" unspared, so it is still the first victim
    /// cache.set("c", 3);
    /// assert!(!cache.contains(&"a"));
    /// ```
    pub fn peek(&self, key: &K) -> Option<&V> {
        #[cfg(feature = "metrics")]
        (&self.metrics).record_peek_call();
        let value = self.entries.get(key);
        #[cfg(feature = "metrics")]
        {
            if value.is_some() {
                (&self.metrics).record_peek_found();
            }
        }
        value
    }

    /// Returns `true` if `key` is resident, without sparing it.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns `true` if `key` is resident and currently spared.
    #[inline]
    pub fn is_spared(&self, key: &K) -> bool {
        self.spared.contains(key)
    }

    /// Number of resident keys currently holding a second chance.
    #[inline]
    pub fn spared_len(&self) -> usize {
        self.spared.len()
    }

    /// Number of resident entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of resident entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if an eviction listener is attached.
    #[inline]
    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    /// Iterates resident keys in scan order, head first, tail last.
    ///
    /// # Example
    ///
    /// ```
    /// use sparecache::policy::second_chance::SecondChanceCache;
    ///
    /// let mut cache = SecondChanceCache::new(3);
    /// cache.set("a", 1);
    /// cache.set("b", 2);
    /// cache.set("c", 3);
    ///
    /// let order: Vec<_> = cache.scan_order().copied().collect();
    /// assert_eq!(order, vec!["c", "b", "a"]);
    /// ```
    pub fn scan_order(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.scan_queue.iter()
    }

    /// Returns the key the next eviction scan would remove, without
    /// running it.
    ///
    /// This is the unspared key nearest the tail, or the tail itself when
    /// every resident key is spared.
    ///
    /// # Example
    ///
    /// ```
    /// use sparecache::policy::second_chance::SecondChanceCache;
    ///
    /// let mut cache = SecondChanceCache::new(3);
    /// cache.set("a", 1);
    /// cache.set("b", 2);
    /// assert_eq!(cache.peek_victim(), Some(&"a"));
    ///
    /// cache.get(&"a");
    /// assert_eq!(cache.peek_victim(), Some(&"b"));
    /// ```
    pub fn peek_victim(&self) -> Option<&K> {
        self.scan_queue
            .iter()
            .rev()
            .find(|key| !self.spared.contains(*key))
            .or_else(|| self.scan_queue.back())
    }

    /// Verifies the four structural invariants.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantError`] naming the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), InvariantError>
    where
        K: Debug,
    {
        if self.entries.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "entries len {} exceeds capacity {}",
                self.entries.len(),
                self.capacity
            )));
        }

        if self.scan_queue.len() != self.entries.len() {
            return Err(InvariantError::new(format!(
                "scan queue len {} != entries len {}",
                self.scan_queue.len(),
                self.entries.len()
            )));
        }

        let mut seen = FxHashSet::default();
        for key in &self.scan_queue {
            if !self.entries.contains_key(key) {
                return Err(InvariantError::new(format!(
                    "scan queue key {:?} has no entry",
                    key
                )));
            }
            if !seen.insert(key) {
                return Err(InvariantError::new(format!(
                    "key {:?} appears twice in scan queue",
                    key
                )));
            }
        }

        if let Some(orphan) = self.spared.iter().find(|k| !self.entries.contains_key(*k)) {
            return Err(InvariantError::new(format!(
                "spared key {:?} is not resident",
                orphan
            )));
        }

        Ok(())
    }

    /// Marks a resident key as spared. Caller guarantees residency.
    #[inline]
    fn spare(&mut self, key: &K) {
        debug_assert!(self.entries.contains_key(key));
        if !self.spared.contains(key) {
            self.spared.insert(key.clone());
            #[cfg(feature = "metrics")]
            self.metrics.record_spare_granted();
        }
    }

    /// Runs one eviction scan and returns the evicted pair.
    ///
    /// The pair is fully detached from `entries`, `scan_queue` and `spared`
    /// before it is returned.
    fn evict_one(&mut self) -> Option<(K, V)> {
        let max_steps = self.capacity.saturating_add(1);
        for step in 1..=max_steps {
            let candidate = self.scan_queue.pop_back()?;
            #[cfg(feature = "metrics")]
            self.metrics.record_scan_step();

            if self.spared.remove(&candidate) {
                self.scan_queue.push_front(candidate);
                #[cfg(feature = "metrics")]
                self.metrics.record_spare_consumed();
                trace!(step, "re-queued spared key");
                continue;
            }

            let value = self.entries.remove(&candidate)?;
            #[cfg(feature = "metrics")]
            self.metrics.record_evicted_entry();
            trace!(
                scan_steps = step,
                len = self.entries.len(),
                capacity = self.capacity,
                "evicted entry"
            );
            return Some((candidate, value));
        }
        None
    }

    fn notify(&mut self, key: K, value: V) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_evict(key, value);
        }
    }
}

impl<K, V> ReadOnlyCache<K, V> for SecondChanceCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Does not spare the key.
    #[inline]
    fn contains(&self, key: &K) -> bool {
        Self::contains(self, key)
    }

    #[inline]
    fn len(&self) -> usize {
        Self::len(self)
    }

    #[inline]
    fn capacity(&self) -> usize {
        Self::capacity(self)
    }
}

impl<K, V> CoreCache<K, V> for SecondChanceCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Same as [`SecondChanceCache::set`].
    #[inline]
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.set(key, value)
    }

    /// Same as [`SecondChanceCache::get`]; spares the key on a hit.
    #[inline]
    fn get(&mut self, key: &K) -> Option<&V> {
        Self::get(self, key)
    }
}

#[cfg(feature = "metrics")]
impl<K, V> SecondChanceCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Returns a snapshot of cache metrics.
    pub fn metrics_snapshot(&self) -> SecondChanceMetricsSnapshot {
        SecondChanceMetricsSnapshot {
            get_calls: self.metrics.get_calls,
            get_hits: self.metrics.get_hits,
            get_misses: self.metrics.get_misses,
            insert_calls: self.metrics.insert_calls,
            insert_updates: self.metrics.insert_updates,
            insert_new: self.metrics.insert_new,
            evict_calls: self.metrics.evict_calls,
            evicted_entries: self.metrics.evicted_entries,
            scan_steps: self.metrics.scan_steps,
            spares_granted: self.metrics.spares_granted,
            spares_consumed: self.metrics.spares_consumed,
            peek_calls: self.metrics.peek_calls.get(),
            peek_found: self.metrics.peek_found.get(),
            cache_len: self.entries.len(),
            spared_len: self.spared.len(),
            capacity: self.capacity,
        }
    }
}

#[cfg(feature = "metrics")]
impl<K, V> MetricsSnapshotProvider<SecondChanceMetricsSnapshot> for SecondChanceCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn snapshot(&self) -> SecondChanceMetricsSnapshot {
        self.metrics_snapshot()
    }
}

#[cfg(feature = "metrics")]
impl<K, V> MetricsReset for SecondChanceCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn reset_metrics(&mut self) {
        self.metrics.reset();
    }
}

impl<K, V> Debug for SecondChanceCache<K, V>
where
    K: Clone + Eq + Hash + Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondChanceCache")
            .field("capacity", &self.capacity)
            .field("len", &self.entries.len())
            .field("spared", &self.spared.len())
            .field("scan_queue", &self.scan_queue)
            .field("has_listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{self, Receiver};

    /// Cache whose listener forwards every eviction into a channel.
    fn recording_cache<K, V>(capacity: usize) -> (SecondChanceCache<K, V>, Receiver<(K, V)>)
    where
        K: Clone + Eq + Hash + Send + 'static,
        V: Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let cache = SecondChanceCache::try_with_listener(capacity, move |k: K, v: V| {
            let _ = tx.send((k, v));
        })
        .unwrap();
        (cache, rx)
    }

    fn drain<T>(rx: &Receiver<T>) -> Vec<T> {
        rx.try_iter().collect()
    }

    mod construction {
        use super::*;

        #[test]
        fn test_new_cache() {
            let cache: SecondChanceCache<i32, i32> = SecondChanceCache::new(10);
            assert_eq!(cache.capacity(), 10);
            assert_eq!(cache.len(), 0);
            assert!(cache.is_empty());
            assert!(!cache.has_listener());
        }

        #[test]
        fn test_zero_capacity_rejected() {
            let err = SecondChanceCache::<i32, i32>::try_new(0).unwrap_err();
            assert_eq!(err, ConfigError::InvalidCapacity { capacity: 0 });
        }

        #[test]
        fn test_zero_capacity_rejected_with_listener() {
            let result = SecondChanceCache::try_with_listener(0, |_k: i32, _v: i32| {});
            assert!(matches!(
                result,
                Err(ConfigError::InvalidCapacity { capacity: 0 })
            ));
        }

        #[test]
        #[should_panic(expected = "capacity must be at least 1")]
        fn test_new_panics_on_zero() {
            let _cache: SecondChanceCache<i32, i32> = SecondChanceCache::new(0);
        }

        #[test]
        fn test_huge_capacity_does_not_preallocate() {
            let mut cache = SecondChanceCache::new(usize::MAX);
            cache.set(1u8, 1u8);
            assert_eq!(cache.capacity(), usize::MAX);
            assert_eq!(cache.len(), 1);
        }
    }

    mod basic_operations {
        use super::*;

        #[test]
        fn test_set_and_get() {
            let mut cache = SecondChanceCache::new(10);
            cache.set("a", 1);
            cache.set("b", 2);

            assert_eq!(cache.get(&"a"), Some(&1));
            assert_eq!(cache.get(&"b"), Some(&2));
            assert_eq!(cache.get(&"c"), None);
        }

        #[test]
        fn test_get_miss_changes_nothing() {
            let mut cache = SecondChanceCache::new(2);
            cache.set("a", 1);
            assert_eq!(cache.get(&"zzz"), None);
            assert_eq!(cache.spared_len(), 0);
            assert_eq!(cache.scan_order().count(), 1);
        }

        #[test]
        fn test_get_or_default() {
            let mut cache = SecondChanceCache::new(4);
            cache.set(1, 100);
            let fallback = -1;
            assert_eq!(*cache.get_or(&1, &fallback), 100);
            assert_eq!(*cache.get_or(&2, &fallback), -1);
            assert!(cache.is_spared(&1));
            assert!(!cache.contains(&2));
        }

        #[test]
        fn test_overwrite_returns_old_value() {
            let mut cache = SecondChanceCache::new(10);
            assert_eq!(cache.set("a", 1), None);
            assert_eq!(cache.set("a", 2), Some(1));
            assert_eq!(cache.get(&"a"), Some(&2));
            assert_eq!(cache.len(), 1);
        }

        #[test]
        fn test_has_without_bump() {
            let mut cache = SecondChanceCache::new(10);
            cache.set("a", 1);
            assert!(cache.has(&"a", false));
            assert!(!cache.has(&"b", false));
            assert!(!cache.is_spared(&"a"));
        }

        #[test]
        fn test_has_with_bump_on_missing_key() {
            let mut cache: SecondChanceCache<&str, i32> = SecondChanceCache::new(10);
            assert!(!cache.has(&"ghost", true));
            assert_eq!(cache.spared_len(), 0);
        }

        #[test]
        fn test_string_keys() {
            let mut cache = SecondChanceCache::new(10);
            cache.set("hello".to_string(), 1);
            cache.set("world".to_string(), 2);

            assert_eq!(cache.get(&"hello".to_string()), Some(&1));
        }

        #[test]
        fn test_trait_access() {
            fn fill<C: CoreCache<u32, u32>>(cache: &mut C) {
                for i in 0..5 {
                    cache.insert(i, i * 10);
                }
            }

            let mut cache = SecondChanceCache::new(3);
            fill(&mut cache);
            assert_eq!(ReadOnlyCache::len(&cache), 3);
            assert_eq!(CoreCache::get(&mut cache, &4), Some(&40));
            assert!(ReadOnlyCache::contains(&cache, &4));
        }
    }

    mod sparing {
        use super::*;

        #[test]
        fn test_get_does_not_reorder() {
            let mut cache = SecondChanceCache::new(3);
            cache.set("a", 1);
            cache.set("b", 2);
            cache.set("c", 3);
            let before: Vec<_> = cache.scan_order().copied().collect();

            cache.get(&"a");
            cache.has(&"b", true);

            let after: Vec<_> = cache.scan_order().copied().collect();
            assert_eq!(before, after);
        }

        #[test]
        fn test_sparing_is_idempotent() {
            let mut cache = SecondChanceCache::new(3);
            cache.set("a", 1);
            for _ in 0..5 {
                cache.get(&"a");
                cache.has(&"a", true);
            }
            assert_eq!(cache.spared_len(), 1);

            // A single reprieve regardless of touch count
            cache.set("b", 2);
            cache.set("c", 3);
            cache.set("d", 4); // pops a (spared), then evicts b
            assert!(cache.contains(&"a"));
            assert!(!cache.is_spared(&"a"));
            assert!(!cache.contains(&"b"));

            cache.set("e", 5); // a is unspared now but c is nearer the tail
            assert!(!cache.contains(&"c"));
            cache.set("f", 6);
            assert!(!cache.contains(&"a"));
        }

        #[test]
        fn test_overwrite_spares_but_keeps_position() {
            let mut cache = SecondChanceCache::new(3);
            cache.set("a", 1);
            cache.set("b", 2);
            cache.set("a", 10);

            let order: Vec<_> = cache.scan_order().copied().collect();
            assert_eq!(order, vec!["b", "a"]);
            assert!(cache.is_spared(&"a"));
        }

        #[test]
        fn test_contains_and_peek_do_not_spare() {
            let mut cache = SecondChanceCache::new(2);
            cache.set("a", 1);
            cache.set("b", 2);

            assert!(cache.contains(&"a"));
            assert_eq!(cache.peek(&"a"), Some(&1));
            assert!(!cache.is_spared(&"a"));

            cache.set("c", 3);
            assert!(!cache.contains(&"a"));
        }
    }

    mod eviction {
        use super::*;

        #[test]
        fn test_eviction_at_capacity() {
            let (mut cache, rx) = recording_cache(3);
            cache.set("a", 1);
            cache.set("b", 2);
            cache.set("c", 3);
            assert!(drain(&rx).is_empty());

            cache.set("d", 4);
            assert_eq!(cache.len(), 3);
            assert_eq!(drain(&rx), vec![("a", 1)]);
        }

        #[test]
        fn test_second_chance() {
            let (mut cache, rx) = recording_cache(3);
            cache.set("a", 1);
            cache.set("b", 2);
            cache.set("c", 3);

            cache.get(&"a");
            cache.set("d", 4);

            assert_eq!(drain(&rx), vec![("b", 2)]);
            assert!(cache.contains(&"a"));
            assert!(!cache.is_spared(&"a"));
            let order: Vec<_> = cache.scan_order().copied().collect();
            assert_eq!(order, vec!["d", "a", "c"]);
        }

        #[test]
        fn test_all_spared_evicts_exactly_one() {
            let (mut cache, rx) = recording_cache(3);
            cache.set("a", 1);
            cache.set("b", 2);
            cache.set("c", 3);
            cache.get(&"a");
            cache.get(&"b");
            cache.get(&"c");

            cache.set("d", 4);

            // Every key re-queued once, then the original tail goes
            assert_eq!(drain(&rx), vec![("a", 1)]);
            assert_eq!(cache.len(), 3);
            assert_eq!(cache.spared_len(), 0);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_spared_key_not_reached_keeps_flag() {
            let mut cache = SecondChanceCache::new(3);
            cache.set("a", 1);
            cache.set("b", 2);
            cache.set("c", 3);
            cache.get(&"c"); // at the head, never popped by the next scan

            cache.set("d", 4);
            assert!(!cache.contains(&"a"));
            assert!(cache.is_spared(&"c"));
        }

        #[test]
        fn test_repeated_eviction() {
            let (mut cache, rx) = recording_cache(2);
            for i in 0..100 {
                cache.set(i, i * 10);
            }
            assert_eq!(cache.len(), 2);
            let evicted = drain(&rx);
            assert_eq!(evicted.len(), 98);
            assert_eq!(evicted[0], (0, 0));
            assert_eq!(evicted[97], (97, 970));
        }

        #[test]
        fn test_overwrite_never_evicts() {
            let (mut cache, rx) = recording_cache(2);
            cache.set("a", 1);
            cache.set("b", 2);
            for i in 0..10 {
                cache.set("a", i);
                cache.set("b", i);
            }
            assert!(drain(&rx).is_empty());
        }

        #[test]
        fn test_eviction_without_listener_drops_value() {
            use std::sync::Arc;

            let value = Arc::new(());
            let mut cache = SecondChanceCache::new(1);
            cache.set(1, Arc::clone(&value));
            assert_eq!(Arc::strong_count(&value), 2);
            cache.set(2, Arc::new(()));
            assert_eq!(Arc::strong_count(&value), 1);
        }
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_capacity_one_untouched() {
            let (mut cache, rx) = recording_cache(1);
            cache.set("a", 1);
            cache.set("b", 2);
            assert_eq!(drain(&rx), vec![("a", 1)]);
            assert!(cache.contains(&"b"));
        }

        #[test]
        fn test_capacity_one_touched_still_evicts() {
            let (mut cache, rx) = recording_cache(1);
            cache.set("a", 1);
            assert_eq!(cache.get(&"a"), Some(&1));

            cache.set("b", 2);
            assert_eq!(drain(&rx), vec![("a", 1)]);
            assert!(!cache.contains(&"a"));
            assert!(cache.contains(&"b"));
            assert_eq!(cache.spared_len(), 0);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_drop_does_not_notify() {
            let (mut cache, rx) = recording_cache(4);
            cache.set(1, 1);
            cache.set(2, 2);
            drop(cache);
            assert!(drain(&rx).is_empty());
        }

        #[test]
        fn test_panicking_listener_leaves_cache_consistent() {
            use std::panic::{AssertUnwindSafe, catch_unwind};

            let mut cache = SecondChanceCache::try_with_listener(2, |k: u32, _v: u32| {
                assert!(k != 1, "listener rejected key {k}");
            })
            .unwrap();
            cache.set(1, 10);
            cache.set(2, 20);

            let result = catch_unwind(AssertUnwindSafe(|| {
                cache.set(3, 30);
            }));
            assert!(result.is_err());

            cache.check_invariants().unwrap();
            assert_eq!(cache.len(), 2);
            assert!(!cache.contains(&1));
            assert_eq!(cache.get(&3), Some(&30));

            // The cache keeps working afterwards
            cache.set(4, 40);
            assert_eq!(cache.len(), 2);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_large_capacity() {
            let mut cache = SecondChanceCache::new(10000);
            for i in 0..5000 {
                cache.set(i, i * 2);
            }
            assert_eq!(cache.len(), 5000);

            for i in 0..5000 {
                assert_eq!(cache.get(&i), Some(&(i * 2)));
            }
            assert_eq!(cache.spared_len(), 5000);
        }
    }

    mod inspection {
        use super::*;

        #[test]
        fn test_scan_order_head_to_tail() {
            let mut cache = SecondChanceCache::new(4);
            for k in ["a", "b", "c"] {
                cache.set(k, ());
            }
            let order: Vec<_> = cache.scan_order().copied().collect();
            assert_eq!(order, vec!["c", "b", "a"]);
            assert_eq!(cache.scan_order().len(), 3);
            assert_eq!(cache.scan_order().next_back(), Some(&"a"));
        }

        #[test]
        fn test_peek_victim_matches_next_eviction() {
            let (mut cache, rx) = recording_cache(3);
            cache.set("a", 1);
            cache.set("b", 2);
            cache.set("c", 3);
            cache.get(&"a");
            cache.get(&"b");

            let predicted = *cache.peek_victim().unwrap();
            cache.set("d", 4);
            assert_eq!(drain(&rx)[0].0, predicted);
        }

        #[test]
        fn test_peek_victim_when_all_spared() {
            let mut cache = SecondChanceCache::new(2);
            cache.set("a", 1);
            cache.set("b", 2);
            cache.get(&"a");
            cache.get(&"b");
            assert_eq!(cache.peek_victim(), Some(&"a"));
        }

        #[test]
        fn test_peek_victim_empty() {
            let cache: SecondChanceCache<u8, u8> = SecondChanceCache::new(2);
            assert_eq!(cache.peek_victim(), None);
        }

        #[test]
        fn test_debug_output() {
            let mut cache = SecondChanceCache::new(4);
            cache.set("a", 1);
            let dbg = format!("{:?}", cache);
            assert!(dbg.contains("SecondChanceCache"));
            assert!(dbg.contains("capacity: 4"));
            assert!(dbg.contains("has_listener: false"));
        }
    }

    mod invariants {
        use super::*;

        #[test]
        fn test_detects_orphaned_spare() {
            let mut cache = SecondChanceCache::new(2);
            cache.set("a", 1);
            cache.spared.insert("ghost");
            let err = cache.check_invariants().unwrap_err();
            assert!(err.message().contains("ghost"));
        }

        #[test]
        fn test_detects_duplicate_queue_entry() {
            let mut cache = SecondChanceCache::new(3);
            cache.set("a", 1);
            cache.set("b", 2);
            cache.scan_queue.pop_back();
            cache.scan_queue.push_back("b");
            let err = cache.check_invariants().unwrap_err();
            assert!(err.message().contains("twice"));
        }

        #[test]
        fn test_detects_length_mismatch() {
            let mut cache = SecondChanceCache::new(3);
            cache.set("a", 1);
            cache.scan_queue.clear();
            assert!(cache.check_invariants().is_err());
        }

        /// The five-step walkthrough with capacity 3.
        #[test]
        fn test_reference_scenario() {
            let (mut cache, rx) = recording_cache(3);

            cache.set("a", 1);
            cache.set("b", 2);
            cache.set("c", 3);
            assert_eq!(cache.len(), 3);
            assert!(drain(&rx).is_empty());

            assert_eq!(cache.get(&"a"), Some(&1));
            assert!(cache.is_spared(&"a"));
            assert_eq!(cache.spared_len(), 1);

            cache.set("d", 4);
            let evicted = drain(&rx);
            assert_eq!(evicted, vec![("b", 2)]);
            assert!(!cache.contains(&"b"));
            assert!(cache.contains(&"a"));

            assert!(cache.has(&"c", true));
            assert!(cache.is_spared(&"c"));

            for _ in 0..5 {
                cache.set("a", 99);
            }
            assert_eq!(cache.peek(&"a"), Some(&99));
            assert!(drain(&rx).is_empty());
            assert_eq!(cache.scan_order().filter(|k| **k == "a").count(), 1);
            cache.check_invariants().unwrap();
        }
    }

    mod logging {
        use super::*;

        #[test]
        fn test_eviction_emits_trace_events() {
            let _ = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::TRACE)
                .with_test_writer()
                .try_init();

            let mut cache = SecondChanceCache::new(1);
            cache.set(1, 1);
            cache.get(&1);
            cache.set(2, 2);
            assert!(cache.contains(&2));
        }
    }

    #[cfg(feature = "metrics")]
    mod metrics {
        use super::*;

        #[test]
        fn test_counters_follow_operations() {
            let mut cache = SecondChanceCache::new(2);
            cache.set("a", 1);
            cache.set("b", 2);
            cache.get(&"a");
            cache.get(&"a");
            cache.get(&"zzz");
            cache.set("b", 3);
            cache.set("c", 4);
            let _ = cache.peek(&"c");
            let _ = cache.peek(&"zzz");

            let snap = cache.metrics_snapshot();
            assert_eq!(snap.get_calls, 3);
            assert_eq!(snap.get_hits, 2);
            assert_eq!(snap.get_misses, 1);
            assert_eq!(snap.insert_calls, 4);
            assert_eq!(snap.insert_new, 3);
            assert_eq!(snap.insert_updates, 1);
            assert_eq!(snap.spares_granted, 2);
            assert_eq!(snap.evict_calls, 1);
            // Queue was [b, a]; a popped and re-queued, then b popped and re-queued, a evicted
            assert_eq!(snap.spares_consumed, 2);
            assert_eq!(snap.scan_steps, 3);
            assert_eq!(snap.evicted_entries, 1);
            assert_eq!(snap.peek_calls, 2);
            assert_eq!(snap.peek_found, 1);
            assert_eq!(snap.cache_len, 2);
            assert_eq!(snap.capacity, 2);
            assert_eq!(snap.spared_len, 0);
        }

        #[test]
        fn test_reset_metrics() {
            let mut cache = SecondChanceCache::new(2);
            cache.set(1, 1);
            cache.get(&1);
            cache.reset_metrics();
            let snap = cache.snapshot();
            assert_eq!(snap.get_calls, 0);
            assert_eq!(snap.insert_calls, 0);
            assert_eq!(snap.cache_len, 1);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Set(u32, u32),
            Get(u32),
            Has(u32, bool),
            Peek(u32),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                3 => (0u32..40, any::<u32>()).prop_map(|(k, v)| Op::Set(k, v)),
                2 => (0u32..40).prop_map(Op::Get),
                1 => (0u32..40, any::<bool>()).prop_map(|(k, b)| Op::Has(k, b)),
                1 => (0u32..40).prop_map(Op::Peek),
            ]
        }

        proptest! {
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_invariants_always_hold(
                capacity in 1usize..20,
                ops in prop::collection::vec(op_strategy(), 0..200)
            ) {
                let mut cache: SecondChanceCache<u32, u32> = SecondChanceCache::new(capacity);
                for op in ops {
                    match op {
                        Op::Set(k, v) => { cache.set(k, v); },
                        Op::Get(k) => { cache.get(&k); },
                        Op::Has(k, bump) => { cache.has(&k, bump); },
                        Op::Peek(k) => { cache.peek(&k); },
                    }
                    prop_assert!(cache.check_invariants().is_ok());
                    prop_assert!(cache.len() <= capacity);
                }
            }

            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_set_then_get_round_trips(
                capacity in 1usize..20,
                ops in prop::collection::vec(op_strategy(), 0..100),
                key in 100u32..200,
                value in any::<u32>()
            ) {
                let mut cache: SecondChanceCache<u32, u32> = SecondChanceCache::new(capacity);
                for op in ops {
                    if let Op::Set(k, v) = op {
                        cache.set(k, v);
                    }
                }
                cache.set(key, value);
                prop_assert_eq!(cache.get(&key), Some(&value));
            }

            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_one_eviction_per_new_key_when_full(
                capacity in 1usize..20,
                ops in prop::collection::vec(op_strategy(), 0..200)
            ) {
                let (mut cache, rx) = recording_cache::<u32, u32>(capacity);
                for op in ops {
                    let was_full = cache.len() == capacity;
                    let is_new = matches!(op, Op::Set(k, _) if !cache.contains(&k));
                    match op {
                        Op::Set(k, v) => { cache.set(k, v); },
                        Op::Get(k) => { cache.get(&k); },
                        Op::Has(k, bump) => { cache.has(&k, bump); },
                        Op::Peek(k) => { cache.peek(&k); },
                    }
                    let evicted = drain(&rx);
                    let expected = usize::from(was_full && is_new);
                    prop_assert_eq!(evicted.len(), expected);
                    for (k, _) in evicted {
                        prop_assert!(!cache.contains(&k));
                    }
                }
            }
        }
    }
}
