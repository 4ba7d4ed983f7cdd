//! Search query building
//!
//! Every user lookup runs the same disjunctive query: eight `should` clauses over
//! the name and email fields, at least one of which must match. Clause order and
//! boosts come from [`CLAUSE_TABLE`] and never vary with the input.

use crate::search::document::EXACT_SUBFIELD;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Document field a clause targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SearchField {
    DisplayName,
    Email,
}

impl SearchField {
    /// Analyzed text field name in the index
    pub fn field_name(self) -> &'static str {
        match self {
            SearchField::DisplayName => "name",
            SearchField::Email => "email",
        }
    }

    /// Keyword sub-field used for exact prefix matching
    pub fn exact_field_name(self) -> String {
        format!("{}.{}", self.field_name(), EXACT_SUBFIELD)
    }
}

/// Clause family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ClauseKind {
    ExactPhrase,
    Fuzzy,
    Prefix,
    Wildcard,
}

/// Fixed clause table: kind, field, boost
pub const CLAUSE_TABLE: [(ClauseKind, SearchField, f64); 8] = [
    (ClauseKind::ExactPhrase, SearchField::DisplayName, 3.0),
    (ClauseKind::Fuzzy, SearchField::DisplayName, 2.0),
    (ClauseKind::Prefix, SearchField::DisplayName, 2.5),
    (ClauseKind::ExactPhrase, SearchField::Email, 2.5),
    (ClauseKind::Fuzzy, SearchField::Email, 1.5),
    (ClauseKind::Prefix, SearchField::Email, 2.0),
    (ClauseKind::Wildcard, SearchField::DisplayName, 1.0),
    (ClauseKind::Wildcard, SearchField::Email, 0.8),
];

/// A user lookup request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free text typed by the user
    pub text: String,

    /// Maximum number of hits to return
    pub result_limit: usize,
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(text: impl Into<String>, result_limit: usize) -> Self {
        Self {
            text: text.into(),
            result_limit,
        }
    }

    /// Number of characters (not bytes) in the query text
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One boosted `should` clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryClause {
    /// Literal phrase match on the analyzed field
    ExactPhrase {
        field: SearchField,
        query: String,
        boost: f64,
    },

    /// Edit-distance tolerant match; `require_all_terms` switches the operator to AND
    Fuzzy {
        field: SearchField,
        query: String,
        boost: f64,
        require_all_terms: bool,
    },

    /// Prefix match on the keyword sub-field
    Prefix {
        field: SearchField,
        value: String,
        boost: f64,
    },

    /// Lower-cased `*term*` substring fallback
    Wildcard {
        field: SearchField,
        pattern: String,
        boost: f64,
    },
}

impl QueryClause {
    pub fn kind(&self) -> ClauseKind {
        match self {
            QueryClause::ExactPhrase { .. } => ClauseKind::ExactPhrase,
            QueryClause::Fuzzy { .. } => ClauseKind::Fuzzy,
            QueryClause::Prefix { .. } => ClauseKind::Prefix,
            QueryClause::Wildcard { .. } => ClauseKind::Wildcard,
        }
    }

    pub fn field(&self) -> SearchField {
        match self {
            QueryClause::ExactPhrase { field, .. }
            | QueryClause::Fuzzy { field, .. }
            | QueryClause::Prefix { field, .. }
            | QueryClause::Wildcard { field, .. } => *field,
        }
    }

    pub fn boost(&self) -> f64 {
        match self {
            QueryClause::ExactPhrase { boost, .. }
            | QueryClause::Fuzzy { boost, .. }
            | QueryClause::Prefix { boost, .. }
            | QueryClause::Wildcard { boost, .. } => *boost,
        }
    }

    /// Render as Elasticsearch query DSL
    pub fn to_dsl(&self) -> serde_json::Value {
        match self {
            QueryClause::ExactPhrase { field, query, boost } => json!({
                "match_phrase": {
                    field.field_name(): { "query": query, "boost": boost }
                }
            }),
            QueryClause::Fuzzy {
                field,
                query,
                boost,
                require_all_terms,
            } => {
                let mut body = json!({
                    "query": query,
                    "boost": boost,
                    "fuzziness": "AUTO",
                });
                if *require_all_terms {
                    body["operator"] = json!("and");
                }
                json!({ "match": { field.field_name(): body } })
            }
            QueryClause::Prefix { field, value, boost } => json!({
                "prefix": {
                    field.exact_field_name(): { "value": value, "boost": boost }
                }
            }),
            QueryClause::Wildcard { field, pattern, boost } => json!({
                "wildcard": {
                    field.field_name(): { "value": pattern, "boost": boost }
                }
            }),
        }
    }
}

/// Fully built request body for one lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuery {
    /// Ordered `should` clauses
    pub clauses: Vec<QueryClause>,

    /// Always 1: any clause may match
    pub minimum_should_match: u32,

    /// Number of hits requested
    pub size: usize,
}

impl StructuredQuery {
    /// Render the `_search` request body, sorted by descending score
    pub fn to_body(&self) -> serde_json::Value {
        let should: Vec<serde_json::Value> = self.clauses.iter().map(QueryClause::to_dsl).collect();

        json!({
            "query": {
                "bool": {
                    "should": should,
                    "minimum_should_match": self.minimum_should_match,
                }
            },
            "size": self.size,
            "sort": [
                { "_score": { "order": "desc" } }
            ]
        })
    }
}

/// Builds the boosted multi-clause user query. Pure and stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    /// Create a new query builder
    pub fn new() -> Self {
        Self
    }

    /// Build the structured query for `query`
    pub fn build(&self, query: &SearchQuery) -> StructuredQuery {
        let pattern = wildcard_pattern(&query.text);

        let clauses = CLAUSE_TABLE
            .iter()
            .map(|&(kind, field, boost)| match kind {
                ClauseKind::ExactPhrase => QueryClause::ExactPhrase {
                    field,
                    query: query.text.clone(),
                    boost,
                },
                ClauseKind::Fuzzy => QueryClause::Fuzzy {
                    field,
                    query: query.text.clone(),
                    boost,
                    require_all_terms: field == SearchField::DisplayName,
                },
                ClauseKind::Prefix => QueryClause::Prefix {
                    field,
                    value: query.text.clone(),
                    boost,
                },
                ClauseKind::Wildcard => QueryClause::Wildcard {
                    field,
                    pattern: pattern.clone(),
                    boost,
                },
            })
            .collect();

        StructuredQuery {
            clauses,
            minimum_should_match: 1,
            size: query.result_limit,
        }
    }
}

/// `*term*` with the term lower-cased and wildcard metacharacters escaped
fn wildcard_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('*');
    for c in text.to_lowercase().chars() {
        if matches!(c, '*' | '?' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_yields_fixed_clause_table() {
        let query = QueryBuilder::new().build(&SearchQuery::new("ann", 5));

        let observed: Vec<(ClauseKind, SearchField, f64)> = query
            .clauses
            .iter()
            .map(|c| (c.kind(), c.field(), c.boost()))
            .collect();

        assert_eq!(observed, CLAUSE_TABLE.to_vec());
        assert_eq!(query.minimum_should_match, 1);
        assert_eq!(query.size, 5);
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = QueryBuilder::new();
        let first = builder.build(&SearchQuery::new("ann", 5));
        let _other = builder.build(&SearchQuery::new("zed", 20));
        let second = builder.build(&SearchQuery::new("ann", 5));

        assert_eq!(first, second);
        assert_eq!(first.to_body(), second.to_body());
    }

    #[test]
    fn test_wildcard_is_lowercased_and_escaped() {
        assert_eq!(wildcard_pattern("AnN"), "*ann*");
        assert_eq!(wildcard_pattern("a*b?"), "*a\\*b\\?*");
    }

    #[test]
    fn test_prefix_keeps_original_case() {
        let query = QueryBuilder::new().build(&SearchQuery::new("Ann", 5));
        let body = query.to_body();

        assert_eq!(
            body["query"]["bool"]["should"][2]["prefix"]["name.keyword"]["value"],
            "Ann"
        );
        assert_eq!(
            body["query"]["bool"]["should"][6]["wildcard"]["name"]["value"],
            "*ann*"
        );
    }

    #[test]
    fn test_fuzzy_operator_only_on_display_name() {
        let body = QueryBuilder::new().build(&SearchQuery::new("ann", 5)).to_body();
        let should = &body["query"]["bool"]["should"];

        assert_eq!(should[1]["match"]["name"]["operator"], "and");
        assert_eq!(should[1]["match"]["name"]["fuzziness"], "AUTO");
        assert!(should[4]["match"]["email"].get("operator").is_none());
        assert_eq!(should[4]["match"]["email"]["fuzziness"], "AUTO");
    }

    #[test]
    fn test_body_sorts_by_score_desc() {
        let body = QueryBuilder::new().build(&SearchQuery::new("ann", 20)).to_body();

        assert_eq!(body["size"], 20);
        assert_eq!(body["sort"][0]["_score"]["order"], "desc");
        assert_eq!(body["query"]["bool"]["minimum_should_match"], 1);
        assert_eq!(body["query"]["bool"]["should"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn test_char_len_counts_characters() {
        assert_eq!(SearchQuery::new("é", 5).char_len(), 1);
        assert_eq!(SearchQuery::new("ab", 5).char_len(), 2);
    }
}
