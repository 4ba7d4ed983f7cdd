//! Prometheus metrics for the reindex pipeline

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Indexing metrics collection
pub struct IndexingMetrics {
    /// Batches handed to the worker pool
    pub batches_submitted: IntCounter,

    /// Batches acknowledged by the engine
    pub batches_succeeded: IntCounter,

    /// Failed batches by reason
    pub batches_failed: IntCounterVec,

    /// Records written
    pub records_indexed: IntCounter,

    /// Bulk calls currently in flight
    pub inflight_tasks: IntGauge,

    /// Bulk call duration in seconds
    pub batch_duration: Histogram,

    /// Completed runs by outcome
    pub runs_total: IntCounterVec,
}

impl IndexingMetrics {
    fn new() -> Self {
        Self {
            batches_submitted: register_int_counter!(
                "reindex_batches_submitted_total",
                "Total number of batches submitted to the worker pool"
            )
            .unwrap(),

            batches_succeeded: register_int_counter!(
                "reindex_batches_succeeded_total",
                "Total number of batches acknowledged by the search engine"
            )
            .unwrap(),

            batches_failed: register_int_counter_vec!(
                "reindex_batches_failed_total",
                "Total number of failed batches",
                &["reason"]
            )
            .unwrap(),

            records_indexed: register_int_counter!(
                "reindex_records_indexed_total",
                "Total number of records written to the search index"
            )
            .unwrap(),

            inflight_tasks: register_int_gauge!(
                "reindex_inflight_tasks",
                "Number of bulk calls currently in flight"
            )
            .unwrap(),

            batch_duration: register_histogram!(
                "reindex_batch_duration_seconds",
                "Bulk call duration in seconds",
                vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0]
            )
            .unwrap(),

            runs_total: register_int_counter_vec!(
                "reindex_runs_total",
                "Total number of reindex runs",
                &["outcome"]
            )
            .unwrap(),
        }
    }

    /// Record a settled batch
    pub fn record_batch(&self, records: usize, duration_secs: f64, failure: Option<&str>) {
        self.batch_duration.observe(duration_secs);
        match failure {
            None => {
                self.batches_succeeded.inc();
                self.records_indexed.inc_by(records as u64);
            }
            Some(reason) => self.batches_failed.with_label_values(&[reason]).inc(),
        }
    }
}

lazy_static! {
    /// Global indexing metrics instance
    pub static ref INDEXING_METRICS: IndexingMetrics = IndexingMetrics::new();
}
