/// Point-in-time copy of a second-chance cache's counters and gauges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SecondChanceMetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,

    pub insert_calls: u64,
    pub insert_updates: u64,
    pub insert_new: u64,

    pub evict_calls: u64,
    pub evicted_entries: u64,

    pub scan_steps: u64,      // candidates popped from the scan tail
    pub spares_granted: u64,  // unspared -> spared transitions
    pub spares_consumed: u64, // spared keys re-queued by a scan

    pub peek_calls: u64,
    pub peek_found: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub spared_len: usize,
    pub capacity: usize,
}

impl SecondChanceMetricsSnapshot {
    /// Fraction of `get` calls that hit, or `0.0` before the first call.
    pub fn hit_ratio(&self) -> f64 {
        if self.get_calls == 0 {
            0.0
        } else {
            self.get_hits as f64 / self.get_calls as f64
        }
    }

    /// Average scan steps spent per eviction, or `0.0` before the first one.
    pub fn scan_steps_per_eviction(&self) -> f64 {
        if self.evicted_entries == 0 {
            0.0
        } else {
            self.scan_steps as f64 / self.evicted_entries as f64
        }
    }
}
