//! Metrics and observability utilities
//!
//! Describes the analytics metrics once at startup and offers small recording
//! helpers so call sites stay one-liners.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

/// Metrics prefix for all Citegraph metrics
pub const METRICS_PREFIX: &str = "citegraph";

/// Buckets for batch and graph build durations (in seconds)
pub const JOB_BUCKETS: &[f64] = &[
    0.010,  // 10ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.500,  // 500ms
    1.000,  // 1s
    5.000,  // 5s
    30.00,  // 30s
    120.0,  // 2m
    600.0,  // 10m
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Citation index
    describe_counter!(
        format!("{}_h_index_computed_total", METRICS_PREFIX),
        Unit::Count,
        "Total h-index computations"
    );

    describe_counter!(
        format!("{}_h_index_fill_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Authors skipped by the h-index fill job because of an error"
    );

    describe_histogram!(
        format!("{}_h_index_flush_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Latency of one bulk h-index write"
    );

    // Co-authorship graph
    describe_histogram!(
        format!("{}_graph_build_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Co-authorship graph build latency in seconds"
    );

    describe_gauge!(
        format!("{}_graph_nodes", METRICS_PREFIX),
        Unit::Count,
        "Node count of the last built graph"
    );

    describe_gauge!(
        format!("{}_graph_edges", METRICS_PREFIX),
        Unit::Count,
        "Edge count of the last built graph"
    );

    // Ledger
    describe_counter!(
        format!("{}_ledger_events_total", METRICS_PREFIX),
        Unit::Count,
        "History events appended"
    );

    // Cache metrics
    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );

    tracing::info!("Metrics registered");
}

/// Record h-index computations
pub fn record_h_index(computed: u64) {
    counter!(format!("{}_h_index_computed_total", METRICS_PREFIX)).increment(computed);
}

/// Record one bulk flush of the fill job
pub fn record_h_index_flush(duration_secs: f64, failures: u64) {
    histogram!(format!("{}_h_index_flush_duration_seconds", METRICS_PREFIX)).record(duration_secs);
    if failures > 0 {
        counter!(format!("{}_h_index_fill_failures_total", METRICS_PREFIX)).increment(failures);
    }
}

/// Record a finished graph build
pub fn record_graph_build(duration_secs: f64, kind: &str, nodes: usize, edges: usize) {
    histogram!(
        format!("{}_graph_build_duration_seconds", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_graph_nodes", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .set(nodes as f64);

    gauge!(
        format!("{}_graph_edges", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .set(edges as f64);
}

/// Record an appended history event
pub fn record_ledger_event(kind: &str) {
    counter!(
        format!("{}_ledger_events_total", METRICS_PREFIX),
        "event" => kind.to_string()
    )
    .increment(1);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in JOB_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: calls are no-ops
        record_h_index(3);
        record_h_index_flush(0.02, 1);
        record_graph_build(0.5, "corpus", 10, 12);
        record_cache(true, "ego_graph");
    }
}
