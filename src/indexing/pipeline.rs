//! Reindex pipeline: record source → batcher → bounded worker pool → bulk index

use crate::indexing::batcher::{Batch, Batcher};
use crate::indexing::config::PipelineConfig;
use crate::indexing::error::{PipelineError, PipelineResult};
use crate::indexing::metrics::INDEXING_METRICS;
use crate::indexing::pool::{IndexTask, TaskReport, WorkerPool};
use crate::indexing::source::RecordSource;
use crate::search::BulkIndexClient;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;
use validator::Validate;

/// Pushes the full record population into the search index.
///
/// Pages are read in source order and split into batches, which run on a
/// worker pool bounded by `concurrency`. The first failed batch (rejected or
/// timed out) or source error cancels the run: nothing new is submitted, the
/// batches already in flight are awaited, then the first error is returned.
/// Batches written before the failure stay in the index.
pub struct IndexPipeline {
    client: Arc<dyn BulkIndexClient>,
    config: PipelineConfig,
}

impl IndexPipeline {
    /// Create a new pipeline, rejecting invalid tunables
    pub fn new(client: Arc<dyn BulkIndexClient>, config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Index every record `source` yields into `target_index`.
    ///
    /// Returns the number of records the engine acknowledged.
    pub async fn run(&self, source: &dyn RecordSource, target_index: &str) -> PipelineResult<usize> {
        let run_id = Uuid::new_v4();
        let span = info_span!("reindex", %run_id, index = %target_index);

        async move {
            let start = Instant::now();
            info!(
                concurrency = self.config.concurrency,
                batch_size = self.config.batch_size,
                page_size = self.config.page_size,
                timeout_ms = self.config.task_timeout_ms,
                "Starting reindex"
            );

            let mut run = PipelineRun::new(self, target_index);
            run.consume(source).await;
            run.drain().await;

            let elapsed_ms = start.elapsed().as_millis() as u64;
            match run.first_error {
                None => {
                    INDEXING_METRICS.runs_total.with_label_values(&["success"]).inc();
                    info!(
                        indexed = run.indexed,
                        batches = run.submitted,
                        elapsed_ms,
                        "Reindex completed"
                    );
                    Ok(run.indexed)
                }
                Some(e) => {
                    INDEXING_METRICS.runs_total.with_label_values(&["failure"]).inc();
                    error!(
                        indexed = run.indexed,
                        batches_submitted = run.submitted,
                        batches_succeeded = run.succeeded,
                        elapsed_ms,
                        error = %e,
                        "Reindex aborted"
                    );
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// State of one `run` call. Owns the pool and the cancellation flag; workers
/// only report back through their settled tasks.
struct PipelineRun<'a> {
    index: &'a str,
    batcher: Batcher,
    page_size: usize,
    timeout_ms: u64,
    pool: WorkerPool,
    cancelled: bool,
    first_error: Option<PipelineError>,
    submitted: usize,
    succeeded: usize,
    indexed: usize,
}

impl<'a> PipelineRun<'a> {
    fn new(pipeline: &IndexPipeline, index: &'a str) -> Self {
        let config = &pipeline.config;
        Self {
            index,
            batcher: Batcher::new(config.batch_size),
            page_size: config.page_size,
            timeout_ms: config.task_timeout_ms,
            pool: WorkerPool::new(
                Arc::clone(&pipeline.client),
                config.concurrency,
                config.task_timeout(),
            ),
            cancelled: false,
            first_error: None,
            submitted: 0,
            succeeded: 0,
            indexed: 0,
        }
    }

    /// Page through `source` and submit batches until exhausted or cancelled
    async fn consume(&mut self, source: &dyn RecordSource) {
        let mut offset = 0;

        while !self.cancelled {
            let page = match source.page(offset, self.page_size).await {
                Ok(page) => page,
                Err(e) => {
                    self.fail(PipelineError::Source {
                        offset,
                        message: e.to_string(),
                    });
                    return;
                }
            };

            if page.records.is_empty() {
                debug!(offset, "Record source exhausted");
                return;
            }

            let fetched = page.records.len();
            debug!(offset, records = fetched, "Fetched page");

            for batch in self.batcher.split(page.records) {
                if !self.submit(batch).await {
                    return;
                }
            }

            if !page.has_more {
                return;
            }
            offset += fetched;
        }
    }

    /// Wait for a free slot, then submit. Returns `false` once cancelled.
    async fn submit(&mut self, batch: Batch) -> bool {
        while let Some(report) = self.pool.try_next_settled() {
            self.settle(report);
        }

        while !self.cancelled && !self.pool.has_capacity() {
            match self.pool.next_settled().await {
                Some(report) => self.settle(report),
                None => break,
            }
        }

        if self.cancelled {
            return false;
        }

        let task = IndexTask::new(self.submitted, &batch, self.index);
        debug!(
            batch = task.batch,
            records = batch.len(),
            first_id = task.first_id,
            last_id = task.last_id,
            "Submitting batch"
        );
        self.pool.submit(task);
        self.submitted += 1;
        true
    }

    /// Await every task still in flight
    async fn drain(&mut self) {
        if !self.pool.is_empty() {
            debug!(inflight = self.pool.len(), "Draining in-flight batches");
        }
        while let Some(report) = self.pool.next_settled().await {
            self.settle(report);
        }
    }

    fn settle(&mut self, report: TaskReport) {
        let batch = report.batch;
        let records = report.records;
        let elapsed = report.elapsed;

        match report.into_outcome(self.timeout_ms) {
            Ok(indexed) => {
                INDEXING_METRICS.record_batch(indexed, elapsed.as_secs_f64(), None);
                self.succeeded += 1;
                self.indexed += indexed;
                debug!(batch, indexed, elapsed_ms = elapsed.as_millis() as u64, "Batch indexed");
            }
            Err(e) => {
                INDEXING_METRICS.record_batch(records, elapsed.as_secs_f64(), Some(e.reason_label()));
                warn!(batch, error = %e, "Batch failed");
                self.fail(e);
            }
        }
    }

    fn fail(&mut self, error: PipelineError) {
        if !self.cancelled {
            warn!(
                inflight = self.pool.len(),
                "Cancelling reindex: no further batches will be submitted"
            );
        }
        self.cancelled = true;
        if self.first_error.is_none() {
            self.first_error = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::source::InMemoryRecordSource;
    use crate::indexing::PipelineConfigBuilder;
    use crate::models::IndexableRecord;
    use crate::search::{BulkAck, BulkRequest, SearchResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        calls: Mutex<Vec<(String, Vec<i64>)>>,
    }

    #[async_trait]
    impl BulkIndexClient for RecordingClient {
        async fn bulk_index(&self, request: &BulkRequest) -> SearchResult<BulkAck> {
            let ids = request.documents().iter().map(|d| d.id).collect();
            self.calls.lock().unwrap().push((request.index().to_string(), ids));
            Ok(BulkAck {
                indexed: request.len(),
                took_ms: 1,
            })
        }
    }

    fn users(n: i64) -> Vec<IndexableRecord> {
        (1..=n)
            .map(|i| IndexableRecord::new(i, format!("user {}", i), format!("u{}@example.com", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_every_record_is_indexed_once() {
        let client = Arc::new(RecordingClient::default());
        let config = PipelineConfigBuilder::new().page_size(10).batch_size(4).build();
        let pipeline = IndexPipeline::new(client.clone(), config).unwrap();

        let indexed = pipeline
            .run(&InMemoryRecordSource::new(users(25)), "users")
            .await
            .unwrap();

        assert_eq!(indexed, 25);

        let calls = client.calls.lock().unwrap();
        // pages of 10, 10, 5 split into batches of 4 → 3 + 3 + 2
        assert_eq!(calls.len(), 8);
        assert!(calls.iter().all(|(index, ids)| index == "users" && ids.len() <= 4));

        let mut ids: Vec<i64> = calls.iter().flat_map(|(_, ids)| ids.clone()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=25).collect::<Vec<_>>());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let client = Arc::new(RecordingClient::default());
        let config = PipelineConfigBuilder::new().concurrency(0).build();

        let err = IndexPipeline::new(client, config).err().unwrap();
        assert!(matches!(err, PipelineError::InvalidConfiguration(_)));
    }
}
