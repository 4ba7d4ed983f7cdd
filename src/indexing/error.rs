//! Error types for the reindex pipeline

/// Result type for pipeline operations
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Reasons a reindex run aborts. The first one observed is reported.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Reading a page from the record source failed
    #[error("Record source failed at offset {offset}: {message}")]
    Source { offset: usize, message: String },

    /// The engine rejected a batch, wholly or partially
    #[error("Bulk index failed for batch {batch} (records {first_id}..={last_id}): {message}")]
    BulkIndex {
        batch: usize,
        first_id: i64,
        last_id: i64,
        message: String,
    },

    /// A batch missed its deadline
    #[error("Batch {batch} (records {first_id}..={last_id}) timed out after {timeout_ms}ms")]
    Timeout {
        batch: usize,
        first_id: i64,
        last_id: i64,
        timeout_ms: u64,
    },

    /// The worker running a batch panicked or was cancelled
    #[error("Worker for batch {batch} did not complete: {message}")]
    Worker { batch: usize, message: String },

    /// Invalid pipeline configuration
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfiguration(String),
}

impl PipelineError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PipelineError::Timeout { .. })
    }

    /// Sequence number of the failing batch, when a batch is to blame
    pub fn batch(&self) -> Option<usize> {
        match self {
            PipelineError::BulkIndex { batch, .. }
            | PipelineError::Timeout { batch, .. }
            | PipelineError::Worker { batch, .. } => Some(*batch),
            _ => None,
        }
    }

    /// Label used for the failed-batch metric
    pub(crate) fn reason_label(&self) -> &'static str {
        match self {
            PipelineError::BulkIndex { .. } => "bulk_error",
            PipelineError::Timeout { .. } => "timeout",
            PipelineError::Worker { .. } => "worker",
            PipelineError::Source { .. } => "source",
            PipelineError::InvalidConfiguration(_) => "configuration",
        }
    }
}

impl From<validator::ValidationErrors> for PipelineError {
    fn from(err: validator::ValidationErrors) -> Self {
        PipelineError::InvalidConfiguration(err.to_string())
    }
}
