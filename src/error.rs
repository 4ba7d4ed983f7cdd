use crate::indexing::PipelineError;
use crate::search::SearchError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reindex run aborted
    #[error("Reindex failed: {0}")]
    Pipeline(#[from] PipelineError),

    /// Search engine errors
    #[error("Search engine error: {0}")]
    Search(#[from] SearchError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Pipeline(PipelineError::Timeout { .. }) => "REINDEX_TIMEOUT",
            AppError::Pipeline(PipelineError::Source { .. }) => "RECORD_SOURCE_ERROR",
            AppError::Pipeline(_) => "REINDEX_ERROR",
            AppError::Search(SearchError::IndexNotFound(_)) => "INDEX_NOT_FOUND",
            AppError::Search(_) => "SEARCH_ENGINE_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Configuration("test".to_string()).error_code(),
            "CONFIGURATION_ERROR"
        );
        assert_eq!(
            AppError::from(PipelineError::Timeout {
                batch: 3,
                first_id: 301,
                last_id: 400,
                timeout_ms: 2000,
            })
            .error_code(),
            "REINDEX_TIMEOUT"
        );
        assert_eq!(
            AppError::from(SearchError::IndexNotFound("users".to_string())).error_code(),
            "INDEX_NOT_FOUND"
        );
    }

    #[test]
    fn test_pipeline_error_message_names_batch() {
        let err = AppError::from(PipelineError::BulkIndex {
            batch: 7,
            first_id: 701,
            last_id: 800,
            message: "mapper_parsing_exception".to_string(),
        });

        let message = err.to_string();
        assert!(message.contains("batch 7"));
        assert!(message.contains("mapper_parsing_exception"));
    }
}
