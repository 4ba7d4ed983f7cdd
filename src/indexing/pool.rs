//! Bounded worker pool for bulk-index tasks

use crate::indexing::batcher::Batch;
use crate::indexing::error::PipelineError;
use crate::indexing::metrics::INDEXING_METRICS;
use crate::search::{BulkAck, BulkIndexClient, BulkRequest, SearchError};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// One batch ready to be written: the mapped bulk payload plus diagnostics
#[derive(Debug, Clone)]
pub struct IndexTask {
    /// Sequence number within the run, starting at 0
    pub batch: usize,
    pub first_id: i64,
    pub last_id: i64,
    pub request: BulkRequest,
}

impl IndexTask {
    /// Map every record in `batch` into a bulk payload for `index`
    pub fn new(batch_no: usize, batch: &Batch, index: &str) -> Self {
        Self {
            batch: batch_no,
            first_id: batch.first_id(),
            last_id: batch.last_id(),
            request: BulkRequest::from_records(index, batch.records()),
        }
    }
}

enum TaskResult {
    Indexed(BulkAck),
    Rejected(SearchError),
    TimedOut,
    Aborted(String),
}

/// Terminal state of a task, read by the pipeline
pub(crate) struct TaskReport {
    pub batch: usize,
    pub records: usize,
    pub elapsed: Duration,
    first_id: i64,
    last_id: i64,
    result: TaskResult,
}

impl TaskReport {
    /// Number of indexed records, or the error that fails the run
    pub fn into_outcome(self, timeout_ms: u64) -> Result<usize, PipelineError> {
        match self.result {
            TaskResult::Indexed(ack) => Ok(ack.indexed),
            TaskResult::Rejected(e) => Err(PipelineError::BulkIndex {
                batch: self.batch,
                first_id: self.first_id,
                last_id: self.last_id,
                message: e.to_string(),
            }),
            TaskResult::TimedOut => Err(PipelineError::Timeout {
                batch: self.batch,
                first_id: self.first_id,
                last_id: self.last_id,
                timeout_ms,
            }),
            TaskResult::Aborted(message) => Err(PipelineError::Worker {
                batch: self.batch,
                message,
            }),
        }
    }
}

/// Spawned bulk call owned by the pool. Dropping it aborts the task, so a run
/// that is itself dropped leaves nothing running behind it.
struct InflightTask {
    handle: JoinHandle<(TaskResult, Duration)>,
}

impl Drop for InflightTask {
    fn drop(&mut self) {
        self.handle.abort();
        INDEXING_METRICS.inflight_tasks.dec();
    }
}

/// Runs at most `ceiling` bulk calls at a time.
///
/// Each submitted task is spawned onto the runtime and its join handle kept
/// here until the owner collects its report; a task counts against the
/// ceiling until then. Only the owner submits and collects.
pub(crate) struct WorkerPool {
    client: Arc<dyn BulkIndexClient>,
    ceiling: usize,
    task_timeout: Duration,
    inflight: FuturesUnordered<BoxFuture<'static, TaskReport>>,
}

impl WorkerPool {
    pub fn new(client: Arc<dyn BulkIndexClient>, ceiling: usize, task_timeout: Duration) -> Self {
        Self {
            client,
            ceiling: ceiling.max(1),
            task_timeout,
            inflight: FuturesUnordered::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }

    pub fn has_capacity(&self) -> bool {
        self.inflight.len() < self.ceiling
    }

    /// Spawn `task`. Callers must check [`has_capacity`](Self::has_capacity) first.
    pub fn submit(&mut self, task: IndexTask) {
        debug_assert!(self.has_capacity(), "worker pool over capacity");

        let client = Arc::clone(&self.client);
        let task_timeout = self.task_timeout;
        let IndexTask {
            batch,
            first_id,
            last_id,
            request,
        } = task;
        let records = request.len();

        INDEXING_METRICS.batches_submitted.inc();
        INDEXING_METRICS.inflight_tasks.inc();

        let handle = tokio::spawn(async move {
            let start = Instant::now();
            let result = match timeout(task_timeout, client.bulk_index(&request)).await {
                Ok(Ok(ack)) => TaskResult::Indexed(ack),
                Ok(Err(e)) => TaskResult::Rejected(e),
                Err(_) => TaskResult::TimedOut,
            };
            (result, start.elapsed())
        });

        let mut task = InflightTask { handle };

        self.inflight.push(
            async move {
                let (result, elapsed) = match (&mut task.handle).await {
                    Ok(settled) => settled,
                    Err(e) => (TaskResult::Aborted(e.to_string()), Duration::ZERO),
                };
                drop(task);

                TaskReport {
                    batch,
                    records,
                    elapsed,
                    first_id,
                    last_id,
                    result,
                }
            }
            .boxed(),
        );
    }

    /// Wait for the next task to settle; `None` once the pool is empty
    pub async fn next_settled(&mut self) -> Option<TaskReport> {
        self.inflight.next().await
    }

    /// Collect a report that is already available without waiting
    pub fn try_next_settled(&mut self) -> Option<TaskReport> {
        self.inflight.next().now_or_never().flatten()
    }
}
