//! # Metrics Trait Hierarchy
//!
//! Separates *recording*, *snapshotting*, and *export* responsibilities into
//! small traits so monitoring never couples to eviction logic.
//!
//! ## Architecture
//!
//! ```text
//!              ┌─────────────────────────────┐
//!              │     CoreMetricsRecorder     │
//!              │  get_hit/get_miss/insert    │
//!              │  evict                      │
//!              └──────────────┬──────────────┘
//!                             │
//!                             ▼
//!              ┌─────────────────────────────┐
//!              │ SecondChanceMetricsRecorder │
//!              │  scan_step/spare_granted/   │
//!              │  spare_consumed             │
//!              └─────────────────────────────┘
//!
//!   Consumption (decoupled from recording):
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (bench/test)                 │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```

/// Common counters for any cache policy.
pub trait CoreMetricsRecorder {
    fn record_get_hit(&mut self);
    fn record_get_miss(&mut self);
    fn record_insert_call(&mut self);
    fn record_insert_new(&mut self);
    fn record_insert_update(&mut self);
    fn record_evict_call(&mut self);
    fn record_evicted_entry(&mut self);
}

/// Metrics for second-chance behavior (scan queue + spared set).
pub trait SecondChanceMetricsRecorder: CoreMetricsRecorder {
    /// One candidate popped from the tail of the scan queue.
    fn record_scan_step(&mut self);
    /// A resident key moved from unspared to spared.
    fn record_spare_granted(&mut self);
    /// A spared key lost its flag and was re-queued at the head.
    fn record_spare_consumed(&mut self);
}

/// Read-only second-chance metrics for `&self` methods (interior mutability).
pub trait SecondChanceMetricsReadRecorder {
    fn record_peek_call(&self);
    fn record_peek_found(&self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Reset metrics between tests or benchmark iterations.
pub trait MetricsReset {
    fn reset_metrics(&mut self);
}

/// Export/publish metrics to production monitoring backends.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
