//! Search engine boundary
//!
//! The core only ever talks to the engine through the three traits here, which
//! keeps the reindex pipeline and the search surfaces testable with in-process
//! stubs. [`ElasticsearchClient`] is the HTTP implementation of all three.

use crate::config::ElasticsearchConfig;
use crate::search::document::{user_index_mapping, BulkRequest};
use crate::search::error::{SearchError, SearchResult};
use crate::search::query::StructuredQuery;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Acknowledgement of a fully accepted bulk request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAck {
    /// Documents written
    pub indexed: usize,

    /// Server-side processing time in milliseconds
    pub took_ms: u64,
}

/// A scored hit exactly as the engine returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    /// Document `_id`
    pub id: String,

    /// Relevance score, absent when the engine did not compute one
    pub score: Option<f64>,

    /// Stored document fields
    pub source: serde_json::Value,
}

/// Writes batches of documents in a single call
#[async_trait]
pub trait BulkIndexClient: Send + Sync {
    /// Index every document in `request`. Any per-document rejection fails the whole call.
    async fn bulk_index(&self, request: &BulkRequest) -> SearchResult<BulkAck>;
}

/// Executes read queries
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Run `query` against `index`, returning hits in engine relevance order
    async fn search(&self, index: &str, query: &StructuredQuery) -> SearchResult<Vec<RawHit>>;
}

/// Index lifecycle operations
#[async_trait]
pub trait IndexAdmin: Send + Sync {
    async fn index_exists(&self, index: &str) -> SearchResult<bool>;

    async fn create_index(&self, index: &str, mappings: serde_json::Value) -> SearchResult<()>;
}

/// Create `index` with the user mapping unless it already exists.
///
/// Returns `true` when the index was created by this call.
pub async fn ensure_user_index(admin: &dyn IndexAdmin, index: &str) -> SearchResult<bool> {
    if admin.index_exists(index).await? {
        debug!(index = %index, "Index already exists");
        return Ok(false);
    }

    admin.create_index(index, user_index_mapping()).await?;
    info!(index = %index, "Created user index");
    Ok(true)
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    took: u64,
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<HitBody>,
}

#[derive(Debug, Deserialize)]
struct HitBody {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: serde_json::Value,
}

/// Elasticsearch HTTP client
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Client,
    base_url: String,
    credentials: Option<(String, Option<String>)>,
}

impl ElasticsearchClient {
    /// Create a new client from configuration
    pub fn new(config: &ElasticsearchConfig) -> SearchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                SearchError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            credentials: config
                .username
                .clone()
                .map(|user| (user, config.password.clone())),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(path))
            .header("User-Agent", concat!("user-search/", env!("CARGO_PKG_VERSION")));

        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, password.as_ref()),
            None => builder,
        }
    }

    /// Turn a non-success response into a [`SearchError::Status`]
    async fn check_status(response: reqwest::Response) -> SearchResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(SearchError::Status {
            status: status.as_u16(),
            body: if body.is_empty() {
                "No response body".to_string()
            } else {
                body
            },
        })
    }
}

#[async_trait]
impl BulkIndexClient for ElasticsearchClient {
    async fn bulk_index(&self, request: &BulkRequest) -> SearchResult<BulkAck> {
        if request.is_empty() {
            return Ok(BulkAck {
                indexed: 0,
                took_ms: 0,
            });
        }

        let body = request.to_ndjson()?;
        let response = self
            .request(reqwest::Method::POST, "/_bulk")
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let parsed: BulkResponse = response.json().await?;

        if parsed.errors {
            let failures: Vec<&serde_json::Value> = parsed
                .items
                .iter()
                .filter_map(|item| item.as_object()?.values().next())
                .filter_map(|result| result.get("error"))
                .collect();

            let first_reason = failures
                .first()
                .map(|error| {
                    error
                        .get("reason")
                        .or_else(|| error.get("type"))
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| error.to_string())
                })
                .unwrap_or_else(|| "unknown bulk error".to_string());

            warn!(
                index = %request.index(),
                failed = failures.len(),
                reason = %first_reason,
                "Bulk request returned item errors"
            );

            return Err(SearchError::BulkRejected {
                failed: failures.len().max(1),
                first_reason,
            });
        }

        Ok(BulkAck {
            indexed: request.len(),
            took_ms: parsed.took,
        })
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchClient {
    async fn search(&self, index: &str, query: &StructuredQuery) -> SearchResult<Vec<RawHit>> {
        let response = self
            .request(reqwest::Method::POST, &format!("/{}/_search", index))
            .json(&query.to_body())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SearchError::IndexNotFound(index.to_string()));
        }

        let response = Self::check_status(response).await?;
        let parsed: SearchResponseBody = response.json().await?;

        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| RawHit {
                id: hit.id,
                score: hit.score,
                source: hit.source,
            })
            .collect())
    }
}

#[async_trait]
impl IndexAdmin for ElasticsearchClient {
    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        let response = self
            .request(reqwest::Method::HEAD, &format!("/{}", index))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            _ => Self::check_status(response).await.map(|_| true),
        }
    }

    async fn create_index(&self, index: &str, mappings: serde_json::Value) -> SearchResult<()> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/{}", index))
            .json(&serde_json::json!({ "mappings": mappings }))
            .send()
            .await?;

        match Self::check_status(response).await {
            Ok(_) => Ok(()),
            // Lost a creation race with another bootstrapper
            Err(SearchError::Status { status: 400, body })
                if body.contains("resource_already_exists_exception") =>
            {
                debug!(index = %index, "Index was created concurrently");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
