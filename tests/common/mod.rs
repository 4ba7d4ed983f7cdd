//! Shared stubs for the integration tests
//!
//! The stubs stand in for the search engine and count what the code under
//! test does to them.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use user_search::indexing::{RecordPage, RecordSource, SourceError};
use user_search::models::IndexableRecord;
use user_search::search::{
    BulkAck, BulkIndexClient, BulkRequest, RawHit, SearchError, SearchIndex, SearchResult,
    StructuredQuery, UserDocument,
};

/// Build `n` users with ids 1..=n
pub fn users(n: i64) -> Vec<IndexableRecord> {
    (1..=n)
        .map(|i| IndexableRecord::new(i, format!("User {}", i), format!("user{}@example.com", i)))
        .collect()
}

/// Bulk client that measures concurrency and can be told to fail or stall.
///
/// Calls are numbered in the order they start.
pub struct InstrumentedBulkClient {
    delay: Duration,
    slow_call: Option<(usize, Duration)>,
    fail_on_call: Option<usize>,
    started: AtomicUsize,
    completed: AtomicUsize,
    inflight: AtomicUsize,
    max_inflight: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
    store: Mutex<HashMap<i64, UserDocument>>,
}

impl InstrumentedBulkClient {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            slow_call: None,
            fail_on_call: None,
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            inflight: AtomicUsize::new(0),
            max_inflight: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
            store: Mutex::new(HashMap::new()),
        }
    }

    /// Every call sleeps this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Call number `call` sleeps `delay` instead of the default
    pub fn with_slow_call(mut self, call: usize, delay: Duration) -> Self {
        self.slow_call = Some((call, delay));
        self
    }

    /// Call number `call` is rejected by the engine
    pub fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn max_inflight(&self) -> usize {
        self.max_inflight.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    pub fn stored_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.store.lock().unwrap().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl BulkIndexClient for InstrumentedBulkClient {
    async fn bulk_index(&self, request: &BulkRequest) -> SearchResult<BulkAck> {
        let call = self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_inflight.fetch_max(now, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(request.len());

        let delay = match self.slow_call {
            Some((slow, delay)) if slow == call => delay,
            _ => self.delay,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.inflight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.fail_on_call == Some(call) {
            return Err(SearchError::BulkRejected {
                failed: 1,
                first_reason: "mapper_parsing_exception".to_string(),
            });
        }

        let mut store = self.store.lock().unwrap();
        for document in request.documents() {
            store.insert(document.id, document.clone());
        }

        Ok(BulkAck {
            indexed: request.len(),
            took_ms: delay.as_millis() as u64,
        })
    }
}

/// Record source that serves `records` and then fails at `fail_at_offset`
pub struct FailingRecordSource {
    pub records: Vec<IndexableRecord>,
    pub fail_at_offset: usize,
    pub pages_served: AtomicUsize,
}

#[async_trait]
impl RecordSource for FailingRecordSource {
    async fn page(&self, offset: usize, size: usize) -> Result<RecordPage, SourceError> {
        if offset >= self.fail_at_offset {
            return Err(SourceError::new("connection reset by storage"));
        }
        self.pages_served.fetch_add(1, Ordering::SeqCst);

        let end = (offset + size).min(self.records.len());
        Ok(RecordPage {
            records: self.records[offset..end].to_vec(),
            has_more: true,
        })
    }
}

/// Search index stub that counts calls and replays canned hits
pub struct StubSearchIndex {
    hits: Vec<RawHit>,
    fail: bool,
    calls: AtomicUsize,
    last_query: Mutex<Option<(String, StructuredQuery)>>,
}

impl StubSearchIndex {
    pub fn returning(hits: Vec<RawHit>) -> Self {
        Self {
            hits,
            fail: false,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::returning(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<(String, StructuredQuery)> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchIndex for StubSearchIndex {
    async fn search(&self, index: &str, query: &StructuredQuery) -> SearchResult<Vec<RawHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some((index.to_string(), query.clone()));

        if self.fail {
            return Err(SearchError::Transport("connection refused".to_string()));
        }
        Ok(self.hits.clone())
    }
}

/// A raw hit as the engine would return it
pub fn raw_hit(id: i64, score: f64, name: &str) -> RawHit {
    RawHit {
        id: id.to_string(),
        score: Some(score),
        source: serde_json::json!({
            "id": id,
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "avatar": null,
        }),
    }
}
