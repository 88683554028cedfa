//! Thread-shareable handle around a [`SecondChanceCache`] (feature
//! `concurrency`).
//!
//! The whole cache sits behind one [`parking_lot::Mutex`]. Every method holds
//! that lock for the complete operation, so an eviction scan is never
//! observed half-applied. A `RwLock` would not help here: `get` and
//! `has(.., true)` both write the spared set.
//!
//! Do not call back into the same handle from an eviction listener; the
//! listener runs while the lock is held and `parking_lot` mutexes are not
//! reentrant.

use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::policy::second_chance::SecondChanceCache;

/// Clonable, thread-safe accessor for a shared second-chance cache.
///
/// # Example
///
/// ```
/// use sparecache::policy::second_chance::SecondChanceCache;
/// use sparecache::shared::SharedSecondChanceCache;
/// use std::thread;
///
/// let cache = SharedSecondChanceCache::with_cache(SecondChanceCache::new(16));
/// cache.set(1, "one".to_string());
///
/// let thread_cache = cache.clone();
/// let seen = thread::spawn(move || thread_cache.get(&1)).join().unwrap();
/// assert_eq!(seen, Some("one".to_string()));
/// ```
pub struct SharedSecondChanceCache<K, V>
where
    K: Clone + Eq + Hash,
{
    inner: Arc<Mutex<SecondChanceCache<K, V>>>,
}

impl<K, V> SharedSecondChanceCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Takes ownership of `cache` and wraps it in a shared handle.
    pub fn with_cache(cache: SecondChanceCache<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// See [`SecondChanceCache::set`].
    pub fn set(&self, key: K, value: V) -> Option<V> {
        self.inner.lock().set(key, value)
    }

    /// See [`SecondChanceCache::get`]. Clones the value so the lock is
    /// released before returning.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// See [`SecondChanceCache::has`].
    pub fn has(&self, key: &K, bump_up: bool) -> bool {
        self.inner.lock().has(key, bump_up)
    }

    /// See [`SecondChanceCache::contains`].
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Runs `f` with exclusive access to the cache, for multi-step
    /// operations that must not interleave with other threads.
    ///
    /// # Example
    ///
    /// ```
    /// use sparecache::policy::second_chance::SecondChanceCache;
    /// use sparecache::shared::SharedSecondChanceCache;
    ///
    /// let cache = SharedSecondChanceCache::with_cache(SecondChanceCache::new(4));
    /// let inserted = cache.with_lock(|c| {
    ///     if c.has(&"counter", true) {
    ///         false
    ///     } else {
    ///         c.set("counter", 0);
    ///         true
    ///     }
    /// });
    /// assert!(inserted);
    /// ```
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut SecondChanceCache<K, V>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}

impl<K, V> Clone for SharedSecondChanceCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Debug for SharedSecondChanceCache<K, V>
where
    K: Clone + Eq + Hash + Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_lock() {
            Some(cache) => f
                .debug_struct("SharedSecondChanceCache")
                .field("cache", &*cache)
                .finish(),
            None => f
                .debug_struct("SharedSecondChanceCache")
                .field("cache", &"<locked>")
                .finish(),
        }
    }
}
