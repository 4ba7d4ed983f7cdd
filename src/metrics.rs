//! Prometheus exposition for the indexing and search metrics
//!
//! Metrics live in the default registry and are registered lazily the first
//! time a pipeline or search surface touches them.

use prometheus::Encoder;

/// Force registration of every metric family so they appear before first use
pub fn init_metrics() {
    lazy_static::initialize(&crate::indexing::INDEXING_METRICS);
    lazy_static::initialize(&crate::search::SEARCH_METRICS);
}

/// Render all registered metrics in the Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
