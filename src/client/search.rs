//! Investigation search request body

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field holding the owning case on every evidence document
pub const CASE_FIELD: &str = "caseId";
/// Document id field
pub const ID_FIELD: &str = "_id";
/// Field used for date sorting
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// `POST /search` body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Free-text query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Filters, all of which must match
    pub filters: Vec<SearchFilter>,
    /// Retrieval mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_mode: Option<SearchMode>,
    /// Sort clauses; absent means relevance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<SortClause>>,
    /// Paging window
    pub pagination: Pagination,
    /// Aggregations to compute over the matched set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Vec<AggregationRequest>>,
}

impl SearchRequest {
    /// Search scoped to one case
    pub fn for_case(case_id: impl Into<String>) -> Self {
        Self {
            filters: vec![SearchFilter::term(CASE_FIELD, case_id.into())],
            ..Self::default()
        }
    }

    /// Lookup of specific documents in one case, one page sized to the id list
    #[must_use]
    pub fn by_ids(case_id: &str, ids: &[String]) -> Self {
        Self {
            filters: vec![
                SearchFilter::terms(ID_FIELD, ids.iter().cloned().map(Value::String).collect()),
                SearchFilter::term(CASE_FIELD, case_id),
            ],
            pagination: Pagination::first(u32::try_from(ids.len()).unwrap_or(u32::MAX)),
            ..Self::default()
        }
    }
}

/// Filter operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Exact single value
    Term,
    /// Exact, any of several values
    Terms,
    /// Analyzed match
    Match,
}

/// One filter clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Document field
    pub field: String,
    /// Operator
    pub operator: FilterOperator,
    /// Value to compare with
    pub value: Value,
}

impl SearchFilter {
    /// `term` filter
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::Term,
            value: value.into(),
        }
    }

    /// `terms` filter
    pub fn terms(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::Terms,
            value: Value::Array(values),
        }
    }

    /// `match` filter
    pub fn matching(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::Match,
            value,
        }
    }
}

/// Search mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Lexical
    Keyword,
    /// Vector
    Semantic,
    /// Both, fused
    #[default]
    Hybrid,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first
    Asc,
    /// Newest first
    Desc,
}

/// One sort clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortClause {
    /// Field to sort on
    pub field: String,
    /// Direction
    pub order: SortOrder,
}

/// Offset pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Always `offset`
    pub strategy: PaginationStrategy,
    /// 1-based page
    pub page: u32,
    /// Page size
    pub size: u32,
}

impl Pagination {
    /// First page of `size` hits
    #[must_use]
    pub const fn first(size: u32) -> Self {
        Self {
            strategy: PaginationStrategy::Offset,
            page: 1,
            size,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::first(10)
    }
}

/// Pagination strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationStrategy {
    /// page/size windows
    Offset,
}

/// Aggregation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    /// Top values
    Terms,
    /// Timeline buckets
    DateHistogram,
    /// count/min/max/avg/sum
    Stats,
}

impl AggregationKind {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Terms => "terms",
            Self::DateHistogram => "date_histogram",
            Self::Stats => "stats",
        }
    }
}

/// One aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRequest {
    /// Result key under `aggregations`
    pub name: String,
    /// Kind
    #[serde(rename = "type")]
    pub kind: AggregationKind,
    /// Field to aggregate
    pub field: String,
    /// Max buckets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Histogram interval (`1d`, `1M`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}
