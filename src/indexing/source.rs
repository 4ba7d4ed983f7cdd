//! Record sources feeding the reindex pipeline

use crate::models::IndexableRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::sync::Mutex;

/// Failure reading from a record source
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SourceError {
    message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::new(format!("IO error: {}", err))
    }
}

/// One page of records
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub records: Vec<IndexableRecord>,

    /// Whether the source may hold records past this page
    pub has_more: bool,
}

/// Paginated pull over the full population of indexable records.
///
/// Pages are requested with increasing offsets; an empty page ends the run.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn page(&self, offset: usize, size: usize) -> Result<RecordPage, SourceError>;
}

/// Record source backed by a vector
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSource {
    records: Vec<IndexableRecord>,
}

impl InMemoryRecordSource {
    pub fn new(records: Vec<IndexableRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn page(&self, offset: usize, size: usize) -> Result<RecordPage, SourceError> {
        let start = offset.min(self.records.len());
        let end = start.saturating_add(size).min(self.records.len());

        Ok(RecordPage {
            records: self.records[start..end].to_vec(),
            has_more: end < self.records.len(),
        })
    }
}

struct JsonLinesCursor {
    lines: Lines<BufReader<File>>,
    position: usize,
    line_no: usize,
}

/// Streams records from a JSON Lines file, one object per line.
///
/// Reads are sequential: each page must start where the previous one ended,
/// so only one page is held in memory at a time.
pub struct JsonLinesRecordSource {
    path: PathBuf,
    cursor: Mutex<JsonLinesCursor>,
}

impl JsonLinesRecordSource {
    /// Open `path` for reading
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .map_err(|e| SourceError::new(format!("Failed to open {}: {}", path.display(), e)))?;

        Ok(Self {
            path,
            cursor: Mutex::new(JsonLinesCursor {
                lines: BufReader::new(file).lines(),
                position: 0,
                line_no: 0,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSource for JsonLinesRecordSource {
    async fn page(&self, offset: usize, size: usize) -> Result<RecordPage, SourceError> {
        let mut cursor = self.cursor.lock().await;

        if offset != cursor.position {
            return Err(SourceError::new(format!(
                "Non-sequential read of {}: requested offset {}, cursor at {}",
                self.path.display(),
                offset,
                cursor.position
            )));
        }

        let mut records = Vec::with_capacity(size.min(1024));
        while records.len() < size {
            let Some(line) = cursor.lines.next_line().await? else {
                break;
            };
            cursor.line_no += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let record: IndexableRecord = serde_json::from_str(line).map_err(|e| {
                SourceError::new(format!(
                    "{}:{}: invalid record: {}",
                    self.path.display(),
                    cursor.line_no,
                    e
                ))
            })?;
            records.push(record);
        }

        cursor.position += records.len();
        let has_more = records.len() == size;

        Ok(RecordPage { records, has_more })
    }
}
