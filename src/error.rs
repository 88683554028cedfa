//! Error types for the sparecache library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (currently only a capacity below one).
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants` self-checks).
//!
//! ## Example Usage
//!
//! ```
//! use sparecache::error::ConfigError;
//! use sparecache::policy::second_chance::SecondChanceCache;
//!
//! // Fallible constructor for user-configurable parameters
//! let cache: Result<SecondChanceCache<String, i32>, ConfigError> =
//!     SecondChanceCache::try_new(100);
//! assert!(cache.is_ok());
//!
//! // Zero capacity is rejected, never clamped
//! let bad = SecondChanceCache::<String, i32>::try_new(0);
//! assert_eq!(bad.unwrap_err(), ConfigError::InvalidCapacity { capacity: 0 });
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by fallible constructors such as
/// [`SecondChanceCache::try_new`](crate::policy::second_chance::SecondChanceCache::try_new)
/// and [`SecondChanceBuilder::try_build`](crate::builder::SecondChanceBuilder::try_build).
///
/// # Example
///
/// ```
/// use sparecache::error::ConfigError;
/// use sparecache::policy::second_chance::SecondChanceCache;
///
/// let err = SecondChanceCache::<u64, u64>::try_new(0).unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The requested capacity cannot hold a single entry.
    #[error("capacity must be at least 1, got {capacity}")]
    InvalidCapacity { capacity: usize },
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by
/// [`SecondChanceCache::check_invariants`](crate::policy::second_chance::SecondChanceCache::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
