//! Configuration builder for second-chance caches.
//!
//! Collects every construction parameter in one place and validates them
//! together, so user-supplied settings surface as a [`ConfigError`] rather
//! than a panic.
//!
//! ## Example
//!
//! ```rust
//! use sparecache::builder::SecondChanceBuilder;
//! use std::sync::mpsc;
//!
//! let (tx, rx) = mpsc::channel();
//! let mut cache = SecondChanceBuilder::new(2)
//!     .on_evict(move |key: u64, value: String| {
//!         let _ = tx.send((key, value));
//!     })
//!     .try_build()
//!     .unwrap();
//!
//! cache.set(1, "one".to_string());
//! cache.set(2, "two".to_string());
//! cache.set(3, "three".to_string());
//! assert_eq!(rx.try_recv(), Ok((1, "one".to_string())));
//! ```

use std::fmt::{Debug, Formatter};
use std::hash::Hash;

use crate::error::ConfigError;
use crate::listener::{BoxedListener, EvictionListener};
use crate::policy::second_chance::SecondChanceCache;

/// Builder for [`SecondChanceCache`].
pub struct SecondChanceBuilder<K, V> {
    capacity: usize,
    listener: Option<BoxedListener<K, V>>,
}

impl<K, V> SecondChanceBuilder<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Starts a builder for a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            listener: None,
        }
    }

    /// Overrides the capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Attaches an eviction listener, replacing any previous one.
    pub fn on_evict<L>(mut self, listener: L) -> Self
    where
        L: EvictionListener<K, V> + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Validates the configuration and builds the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if the capacity is zero.
    pub fn try_build(self) -> Result<SecondChanceCache<K, V>, ConfigError> {
        SecondChanceCache::from_parts(self.capacity, self.listener)
    }

    /// Builds the cache.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn build(self) -> SecondChanceCache<K, V> {
        match self.try_build() {
            Ok(cache) => cache,
            Err(err) => panic!("invalid second-chance cache configuration: {err}"),
        }
    }
}

impl<K, V> Debug for SecondChanceBuilder<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondChanceBuilder")
            .field("capacity", &self.capacity)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}
