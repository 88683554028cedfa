//! Cache metrics (feature `metrics`).
//!
//! Recording, snapshotting and export are split into separate traits so the
//! cache only ever writes counters:
//!
//! - [`traits`]: recorder, snapshot-provider and exporter traits.
//! - [`metrics_impl`]: the counter struct embedded in the cache.
//! - [`snapshot`]: plain-data snapshots handed to tests and exporters.
//! - [`exporter`]: Prometheus text exposition.

pub mod cell;
pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
