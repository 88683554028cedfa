use std::io::Write;
use std::sync::Mutex;

use crate::metrics::snapshot::SecondChanceMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for cache metrics snapshots.
///
/// Writes the Prometheus text exposition format so it can be scraped by
/// Prometheus or forwarded to an OpenTelemetry collector.
///
/// # Example
///
/// ```
/// use sparecache::metrics::exporter::PrometheusTextExporter;
/// use sparecache::metrics::traits::MetricsExporter;
/// use sparecache::policy::second_chance::SecondChanceCache;
///
/// let mut cache = SecondChanceCache::new(2);
/// cache.set(1u32, "a");
/// let _ = cache.get(&1);
///
/// let exporter = PrometheusTextExporter::new("sessions", Vec::new());
/// exporter.export(&cache.metrics_snapshot());
/// let text = String::from_utf8(exporter.into_inner()).unwrap();
/// assert!(text.contains("sessions_get_hits_total 1"));
/// ```
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the exporter and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_metric(&self, kind: &str, name: &str, value: u64) {
        // A writer poisoned by a panicking exporter is still usable for text output.
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, suffix: &str, value: u64) {
        self.write_metric("counter", &self.metric_name(suffix), value);
    }

    fn write_gauge(&self, suffix: &str, value: usize) {
        self.write_metric("gauge", &self.metric_name(suffix), value as u64);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send> MetricsExporter<SecondChanceMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &SecondChanceMetricsSnapshot) {
        self.write_counter("get_calls_total", snapshot.get_calls);
        self.write_counter("get_hits_total", snapshot.get_hits);
        self.write_counter("get_misses_total", snapshot.get_misses);
        self.write_counter("insert_calls_total", snapshot.insert_calls);
        self.write_counter("insert_updates_total", snapshot.insert_updates);
        self.write_counter("insert_new_total", snapshot.insert_new);
        self.write_counter("evict_calls_total", snapshot.evict_calls);
        self.write_counter("evicted_entries_total", snapshot.evicted_entries);
        self.write_counter("scan_steps_total", snapshot.scan_steps);
        self.write_counter("spares_granted_total", snapshot.spares_granted);
        self.write_counter("spares_consumed_total", snapshot.spares_consumed);
        self.write_counter("peek_calls_total", snapshot.peek_calls);
        self.write_counter("peek_found_total", snapshot.peek_found);
        self.write_gauge("cache_len", snapshot.cache_len);
        self.write_gauge("spared_len", snapshot.spared_len);
        self.write_gauge("capacity", snapshot.capacity);
    }
}
