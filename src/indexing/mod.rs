//! Full reindex of the user population into the search index
//!
//! # Flow
//!
//! ```text
//! RecordSource ──page──▶ Batcher ──batch──▶ WorkerPool (≤ concurrency) ──▶ BulkIndexClient
//!                                                 │
//!                               settled tasks ◀───┘  (first failure cancels the run)
//! ```
//!
//! Re-running is the retry mechanism: every document is written under its user
//! id, so a second run overwrites whatever a failed run left behind.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use user_search::config::ElasticsearchConfig;
//! use user_search::indexing::{IndexPipeline, JsonLinesRecordSource, PipelineConfig};
//! use user_search::search::ElasticsearchClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let es = ElasticsearchConfig::default();
//!     let client = Arc::new(ElasticsearchClient::new(&es)?);
//!     let pipeline = IndexPipeline::new(client, PipelineConfig::default())?;
//!
//!     let source = JsonLinesRecordSource::open("users.jsonl").await?;
//!     let indexed = pipeline.run(&source, &es.index_user).await?;
//!     println!("Indexed {} users", indexed);
//!
//!     Ok(())
//! }
//! ```

mod batcher;
mod config;
mod error;
mod metrics;
mod pipeline;
mod pool;
mod source;

pub use batcher::{Batch, Batcher};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{PipelineError, PipelineResult};
pub use metrics::INDEXING_METRICS;
pub use pipeline::IndexPipeline;
pub use pool::IndexTask;
pub use source::{
    InMemoryRecordSource, JsonLinesRecordSource, RecordPage, RecordSource, SourceError,
};
