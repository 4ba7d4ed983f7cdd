//! User search surfaces and result formatting

use crate::search::client::{RawHit, SearchIndex};
use crate::search::config::{SearchConfig, MIN_QUERY_CHARS};
use crate::search::metrics::SEARCH_METRICS;
use crate::search::query::{QueryBuilder, SearchQuery};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// A single formatted search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// User ID
    pub id: i64,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Avatar reference, `null` when the user has none
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HitSource {
    id: i64,
    name: String,
    email: String,
    #[serde(default)]
    avatar: Option<String>,
}

/// Which read surface issued a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SearchSurface {
    /// Short, capped dropdown lookup
    Typeahead,
    /// Full results page
    Paginated,
}

/// Map raw engine hits to result rows, keeping the engine's order.
///
/// Hits whose stored source cannot be decoded are dropped.
pub fn format_hits(hits: Vec<RawHit>) -> Vec<SearchHit> {
    hits.into_iter()
        .filter_map(|hit| match serde_json::from_value::<HitSource>(hit.source) {
            Ok(source) => Some(SearchHit {
                id: source.id,
                name: source.name,
                email: source.email,
                avatar: source.avatar,
            }),
            Err(e) => {
                warn!(doc_id = %hit.id, error = %e, "Skipping hit with malformed source");
                None
            }
        })
        .collect()
}

/// Best-effort user search.
///
/// Stateless apart from its configuration, so one instance can serve any
/// number of concurrent requests. Engine failures are logged and answered
/// with an empty result.
#[derive(Clone)]
pub struct UserSearchService {
    engine: Arc<dyn SearchIndex>,
    index: String,
    config: SearchConfig,
    builder: QueryBuilder,
}

impl UserSearchService {
    /// Create a new search service over `index`.
    ///
    /// A `min_query_chars` below [`MIN_QUERY_CHARS`] is raised to it.
    pub fn new(engine: Arc<dyn SearchIndex>, index: impl Into<String>, mut config: SearchConfig) -> Self {
        if config.min_query_chars < MIN_QUERY_CHARS {
            warn!(
                configured = config.min_query_chars,
                floor = MIN_QUERY_CHARS,
                "min_query_chars below floor, raising it"
            );
            config.min_query_chars = MIN_QUERY_CHARS;
        }

        Self {
            engine,
            index: index.into(),
            config,
            builder: QueryBuilder::new(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Dropdown lookup, capped at `limit` (configured default when `None`)
    pub async fn search_users(&self, text: &str, limit: Option<usize>) -> Vec<SearchHit> {
        let limit = limit.unwrap_or(self.config.typeahead_limit);
        self.run(SearchSurface::Typeahead, SearchQuery::new(text, limit))
            .await
    }

    /// Results-page lookup returning up to `per_page` hits (configured default when `None`)
    pub async fn search_users_paginated(&self, text: &str, per_page: Option<usize>) -> Vec<SearchHit> {
        let per_page = per_page.unwrap_or(self.config.page_size);
        self.run(SearchSurface::Paginated, SearchQuery::new(text, per_page))
            .await
    }

    async fn run(&self, surface: SearchSurface, query: SearchQuery) -> Vec<SearchHit> {
        SEARCH_METRICS
            .requests_total
            .with_label_values(&[surface.as_ref()])
            .inc();

        if query.char_len() < self.config.min_query_chars {
            SEARCH_METRICS
                .short_circuited_total
                .with_label_values(&[surface.as_ref()])
                .inc();
            debug!(%surface, "Query below minimum length, skipping engine");
            return Vec::new();
        }

        let structured = self.builder.build(&query);
        let start = Instant::now();
        let outcome = self.engine.search(&self.index, &structured).await;
        let elapsed = start.elapsed().as_secs_f64();

        SEARCH_METRICS.record_search(surface.as_ref(), outcome.is_ok(), elapsed);

        match outcome {
            Ok(hits) => {
                debug!(%surface, hits = hits.len(), "Search completed");
                format_hits(hits)
            }
            Err(e) => {
                error!(
                    %surface,
                    index = %self.index,
                    query = %query.text,
                    error = %e,
                    "Search engine error"
                );
                Vec::new()
            }
        }
    }
}
