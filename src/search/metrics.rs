//! Prometheus metrics for the search surfaces

use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

/// Search metrics collection
pub struct SearchMetrics {
    /// Lookups received, per surface
    pub requests_total: IntCounterVec,

    /// Lookups answered empty without contacting the engine
    pub short_circuited_total: IntCounterVec,

    /// Lookups whose engine call failed and were answered empty
    pub failures_total: IntCounterVec,

    /// Engine round-trip latency in seconds
    pub latency: HistogramVec,
}

impl SearchMetrics {
    fn new() -> Self {
        Self {
            requests_total: register_int_counter_vec!(
                "user_search_requests_total",
                "Total number of user lookups",
                &["surface"]
            )
            .unwrap(),

            short_circuited_total: register_int_counter_vec!(
                "user_search_short_circuited_total",
                "Lookups rejected for being shorter than the minimum length",
                &["surface"]
            )
            .unwrap(),

            failures_total: register_int_counter_vec!(
                "user_search_failures_total",
                "Lookups whose engine call failed",
                &["surface"]
            )
            .unwrap(),

            latency: register_histogram_vec!(
                "user_search_latency_seconds",
                "Search engine round-trip latency in seconds",
                &["surface"],
                vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
            )
            .unwrap(),
        }
    }

    /// Record a completed engine call
    pub fn record_search(&self, surface: &str, success: bool, duration_secs: f64) {
        self.latency.with_label_values(&[surface]).observe(duration_secs);
        if !success {
            self.failures_total.with_label_values(&[surface]).inc();
        }
    }
}

lazy_static! {
    /// Global search metrics instance
    pub static ref SEARCH_METRICS: SearchMetrics = SearchMetrics::new();
}
