use serde::{Deserialize, Serialize};

/// Immutable snapshot of a user as supplied by a record source.
///
/// Every field the search document needs is already materialized here;
/// the indexing path never goes back to storage for relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexableRecord {
    /// Primary key, reused as the search document `_id`
    pub id: i64,

    /// Name shown in search results
    #[serde(alias = "name")]
    pub display_name: String,

    /// Email address
    pub email: String,

    /// Avatar path or URL
    #[serde(default, alias = "avatar")]
    pub avatar_ref: Option<String>,
}

impl IndexableRecord {
    /// Create a new record
    pub fn new(id: i64, display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            email: email.into(),
            avatar_ref: None,
        }
    }

    /// Set the avatar reference
    pub fn with_avatar(mut self, avatar_ref: impl Into<String>) -> Self {
        self.avatar_ref = Some(avatar_ref.into());
        self
    }
}
