//! Reindex pipeline configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Tunables for one reindex run
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    /// Maximum number of bulk calls in flight at once
    #[validate(range(min = 1))]
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Deadline for a single bulk call, in milliseconds
    #[serde(default = "default_task_timeout_ms")]
    pub task_timeout_ms: u64,

    /// Records pulled from the source per page
    #[validate(range(min = 1))]
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Records per bulk call
    #[validate(range(min = 1))]
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl PipelineConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            task_timeout_ms: default_task_timeout_ms(),
            page_size: default_page_size(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_concurrency() -> usize {
    2
}

fn default_task_timeout_ms() -> u64 {
    2000
}

fn default_page_size() -> usize {
    1000
}

fn default_batch_size() -> usize {
    100
}

/// Builder for PipelineConfig
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.config.task_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
