use std::cell::Cell;

/// A metrics-only counter cell.
///
/// Lets `&self` methods such as `peek` record counters. `Cell<u64>` is
/// `Send` but not `Sync`, so a cache holding these can move behind a lock
/// but cannot be shared by reference across threads without one.
#[repr(transparent)]
#[derive(Debug, Default)]
pub struct MetricsCell(Cell<u64>);

impl MetricsCell {
    #[inline]
    pub fn new() -> Self {
        Self(Cell::new(0))
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.get()
    }

    #[inline]
    pub fn incr(&self) {
        self.0.set(self.0.get() + 1);
    }

    #[inline]
    pub fn reset(&self) {
        self.0.set(0);
    }
}
