use crate::error::Result;
use crate::indexing::PipelineConfig;
use crate::search::SearchConfig;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Elasticsearch connection and target index
    pub elasticsearch: ElasticsearchConfig,

    /// Reindex pipeline tunables
    #[serde(default)]
    pub indexing: PipelineConfig,

    /// Search surface tunables
    #[serde(default)]
    pub search: SearchConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional file and the environment.
    ///
    /// The indexing and search sections are validated before returning.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path
            .map(str::to_string)
            .or_else(|| std::env::var("USER_SEARCH_CONFIG").ok())
            .unwrap_or_else(|| "config/user-search.toml".to_string());

        let config: Config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: USER_SEARCH_)
            .add_source(
                config::Environment::with_prefix("USER_SEARCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.indexing.validate()?;
        config.search.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Cluster base URL, scheme and port included
    #[serde(default = "default_es_url")]
    pub url: String,

    /// Name of the user index shared by the reindex and search paths
    #[serde(default = "default_index_user")]
    pub index_user: String,

    /// Per-request HTTP timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Basic auth username
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: default_es_url(),
            index_user: default_index_user(),
            request_timeout_secs: default_request_timeout(),
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: true,
        }
    }
}

// Default value functions
fn default_es_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_index_user() -> String {
    "users".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
