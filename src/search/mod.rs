//! User search: query building, result formatting and the engine boundary
//!
//! This module covers the read path and everything that talks to the search
//! engine:
//!
//! - **Query Builder**: turns free text into an eight-clause boosted query
//!   (exact phrase, fuzzy, prefix, wildcard over name and email)
//! - **Result Formatter**: maps scored hits to `{id, name, email, avatar}`
//!   without re-sorting
//! - **Search Surfaces**: a typeahead lookup and a paginated lookup, both
//!   best-effort (engine failures become empty results)
//! - **Engine Boundary**: bulk-index, search and index-admin traits with an
//!   Elasticsearch HTTP implementation
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use user_search::config::ElasticsearchConfig;
//! use user_search::search::{ElasticsearchClient, SearchConfig, UserSearchService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let es = ElasticsearchConfig::default();
//!     let client = Arc::new(ElasticsearchClient::new(&es)?);
//!     let search = UserSearchService::new(client, &es.index_user, SearchConfig::default());
//!
//!     for hit in search.search_users("ann", None).await {
//!         println!("{} <{}>", hit.name, hit.email);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod document;
mod error;
mod metrics;
mod query;
mod service;

pub use client::{
    ensure_user_index, BulkAck, BulkIndexClient, ElasticsearchClient, IndexAdmin, RawHit,
    SearchIndex,
};
pub use config::{SearchConfig, SearchConfigBuilder, MIN_QUERY_CHARS};
pub use document::{user_index_mapping, BulkRequest, UserDocument, EXACT_SUBFIELD};
pub use error::{SearchError, SearchResult};
pub use metrics::SEARCH_METRICS;
pub use query::{
    ClauseKind, QueryBuilder, QueryClause, SearchField, SearchQuery, StructuredQuery, CLAUSE_TABLE,
};
pub use service::{format_hits, SearchHit, SearchSurface, UserSearchService};
