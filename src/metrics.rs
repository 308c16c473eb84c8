//! Metrics instrumentation for treewatch.
//!
//! Uses the `metrics` crate for backend-agnostic collection; the embedding
//! daemon chooses the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `treewatch_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `operation`: get, put, put_bulk, delete, watch
//! - `action`: Update, Delete

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

use crate::event::Action;

/// Record a store operation.
pub fn record_operation(operation: &'static str) {
    counter!(
        "treewatch_operations_total",
        "operation" => operation
    )
    .increment(1);
}

/// Record a synthesized change event.
pub fn record_event(action: Action) {
    counter!(
        "treewatch_events_total",
        "action" => action.to_string()
    )
    .increment(1);
}

/// Record an event lost to a full watch buffer (drop-oldest).
pub fn record_event_dropped() {
    counter!("treewatch_events_dropped_total").increment(1);
}

/// Record nodes detached by pruning.
pub fn record_pruned(count: usize) {
    counter!("treewatch_pruned_nodes_total").increment(count as u64);
}

/// Set the current live node count (root included).
pub fn set_node_count(count: usize) {
    gauge!("treewatch_nodes").set(count as f64);
}

/// Set the current live watcher count.
pub fn set_watcher_count(count: u64) {
    gauge!("treewatch_watchers").set(count as f64);
}

/// Record operation latency.
pub fn record_latency(operation: &'static str, duration: Duration) {
    histogram!(
        "treewatch_operation_seconds",
        "operation" => operation
    )
    .record(duration.as_secs_f64());
}

/// A timing guard that records latency on drop.
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer.
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.operation, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests verify the API compiles and doesn't panic.
    // In production, you'd use metrics-util's Recorder for assertions.

    #[test]
    fn test_record_operations() {
        record_operation("get");
        record_operation("put");
        record_operation("delete");
    }

    #[test]
    fn test_record_events() {
        record_event(Action::Update);
        record_event(Action::Delete);
        record_event_dropped();
    }

    #[test]
    fn test_gauges() {
        set_node_count(42);
        set_watcher_count(3);
        record_pruned(5);
    }

    #[test]
    fn test_latency_timer() {
        {
            let _timer = LatencyTimer::new("get");
            std::thread::sleep(Duration::from_micros(10));
        }
        // Timer recorded on drop
    }
}
