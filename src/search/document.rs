//! Search document structures and bulk payloads

use crate::models::IndexableRecord;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Sub-field holding the untokenized keyword form of a text field
pub const EXACT_SUBFIELD: &str = "keyword";

/// Document stored in the user index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    /// User ID
    pub id: i64,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Avatar reference
    #[serde(default)]
    pub avatar: Option<String>,
}

impl From<&IndexableRecord> for UserDocument {
    fn from(record: &IndexableRecord) -> Self {
        Self {
            id: record.id,
            name: record.display_name.clone(),
            email: record.email.clone(),
            avatar: record.avatar_ref.clone(),
        }
    }
}

impl From<IndexableRecord> for UserDocument {
    fn from(record: IndexableRecord) -> Self {
        Self {
            id: record.id,
            name: record.display_name,
            email: record.email,
            avatar: record.avatar_ref,
        }
    }
}

/// One bulk-index call: a target index plus the documents to write into it.
///
/// Each document is written with `_id` equal to its user id, so replaying the
/// same request overwrites rather than duplicates.
#[derive(Debug, Clone)]
pub struct BulkRequest {
    index: String,
    documents: Vec<UserDocument>,
}

impl BulkRequest {
    /// Map records into documents for `index`
    pub fn from_records<'a>(
        index: impl Into<String>,
        records: impl IntoIterator<Item = &'a IndexableRecord>,
    ) -> Self {
        Self {
            index: index.into(),
            documents: records.into_iter().map(UserDocument::from).collect(),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn documents(&self) -> &[UserDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Render the newline-delimited action/source pairs of the `_bulk` API
    pub fn to_ndjson(&self) -> Result<String, serde_json::Error> {
        let mut body = String::new();
        for document in &self.documents {
            let action = BulkAction {
                index: BulkActionMeta {
                    index: &self.index,
                    id: document.id.to_string(),
                },
            };
            body.push_str(&serde_json::to_string(&action)?);
            body.push('\n');
            body.push_str(&serde_json::to_string(document)?);
            body.push('\n');
        }
        Ok(body)
    }
}

/// Action line of a bulk pair. Field order is the wire order.
#[derive(Serialize)]
struct BulkAction<'a> {
    index: BulkActionMeta<'a>,
}

#[derive(Serialize)]
struct BulkActionMeta<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_id")]
    id: String,
}

/// Mapping applied when the user index is first created
pub fn user_index_mapping() -> serde_json::Value {
    let text_with_keyword = json!({
        "type": "text",
        "fields": {
            EXACT_SUBFIELD: { "type": "keyword", "ignore_above": 256 }
        }
    });

    json!({
        "properties": {
            "id": { "type": "long" },
            "name": text_with_keyword.clone(),
            "email": text_with_keyword,
            "avatar": { "type": "keyword", "index": false }
        }
    })
}
