//! Error types for search engine operations

/// Result type for search engine operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur while talking to the search engine
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Request never produced a response (connect failure, timeout, reset)
    #[error("Search engine request failed: {0}")]
    Transport(String),

    /// Engine answered with a non-success status
    #[error("Search engine returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Bulk request was accepted but some documents were rejected
    #[error("Bulk request rejected {failed} document(s): {first_reason}")]
    BulkRejected { failed: usize, first_reason: String },

    /// Response body could not be decoded
    #[error("Failed to decode search engine response: {0}")]
    Decode(String),

    /// Index not found
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::Decode(err.to_string())
        } else {
            SearchError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Decode(err.to_string())
    }
}
