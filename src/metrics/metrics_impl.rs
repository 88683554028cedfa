use crate::metrics::cell::MetricsCell;
use crate::metrics::traits::{
    CoreMetricsRecorder, SecondChanceMetricsReadRecorder, SecondChanceMetricsRecorder,
};

// ---------------------------------------------------------------------------
// SecondChanceMetrics
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SecondChanceMetrics {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    pub insert_calls: u64,
    pub insert_updates: u64,
    pub insert_new: u64,
    pub evict_calls: u64,
    pub evicted_entries: u64,
    pub scan_steps: u64,
    pub spares_granted: u64,
    pub spares_consumed: u64,
    pub peek_calls: MetricsCell,
    pub peek_found: MetricsCell,
}

impl SecondChanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl CoreMetricsRecorder for SecondChanceMetrics {
    fn record_get_hit(&mut self) {
        self.get_calls += 1;
        self.get_hits += 1;
    }
    fn record_get_miss(&mut self) {
        self.get_calls += 1;
        self.get_misses += 1;
    }
    fn record_insert_call(&mut self) {
        self.insert_calls += 1;
    }
    fn record_insert_new(&mut self) {
        self.insert_new += 1;
    }
    fn record_insert_update(&mut self) {
        self.insert_updates += 1;
    }
    fn record_evict_call(&mut self) {
        self.evict_calls += 1;
    }
    fn record_evicted_entry(&mut self) {
        self.evicted_entries += 1;
    }
}

impl SecondChanceMetricsRecorder for SecondChanceMetrics {
    fn record_scan_step(&mut self) {
        self.scan_steps += 1;
    }
    fn record_spare_granted(&mut self) {
        self.spares_granted += 1;
    }
    fn record_spare_consumed(&mut self) {
        self.spares_consumed += 1;
    }
}

impl SecondChanceMetricsReadRecorder for &SecondChanceMetrics {
    fn record_peek_call(&self) {
        self.peek_calls.incr();
    }
    fn record_peek_found(&self) {
        self.peek_found.incr();
    }
}
