//! Search-index synchronization and user search
//!
//! Two independent paths share one Elasticsearch index:
//!
//! - [`indexing`]: an operator-triggered full reindex that pages through every
//!   user, splits pages into bulk batches and writes them with bounded
//!   concurrency, per-batch timeouts and fail-fast cancellation.
//! - [`search`]: the boosted multi-clause fuzzy query used by the typeahead and
//!   results-page lookups, and the formatting of the hits it returns.

pub mod config;
pub mod error;
pub mod indexing;
pub mod metrics;
pub mod models;
pub mod search;
pub mod telemetry;

pub use error::{AppError, Result};
