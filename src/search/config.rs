//! Search configuration

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Shortest query, in characters, that may reach the engine
pub const MIN_QUERY_CHARS: usize = 2;

/// Search surface configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchConfig {
    /// Result cap for the typeahead/dropdown lookup
    #[serde(default = "default_typeahead_limit")]
    pub typeahead_limit: usize,

    /// Page size for the full results page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Queries shorter than this (in characters) never reach the engine.
    /// Never lower than [`MIN_QUERY_CHARS`].
    #[validate(range(min = 2))]
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            typeahead_limit: default_typeahead_limit(),
            page_size: default_page_size(),
            min_query_chars: default_min_query_chars(),
        }
    }
}

fn default_typeahead_limit() -> usize {
    5
}

fn default_page_size() -> usize {
    20
}

fn default_min_query_chars() -> usize {
    MIN_QUERY_CHARS
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn typeahead_limit(mut self, limit: usize) -> Self {
        self.config.typeahead_limit = limit;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn min_query_chars(mut self, chars: usize) -> Self {
        self.config.min_query_chars = chars;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
