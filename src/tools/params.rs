//! Parameter types shared by several tools

use serde::{Deserialize, Serialize};

use crate::client::search::{SortClause, SortOrder, TIMESTAMP_FIELD};

/// Tag written into the `source` field of records the agent creates
pub const AGENT_SOURCE: &str = "openclaw-agent";

/// Priority / severity scale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Low
    Low,
    /// Medium
    #[default]
    Medium,
    /// High
    High,
    /// Critical
    Critical,
}

impl Priority {
    /// Wire spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Result ordering requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Engine relevance
    #[default]
    Relevance,
    /// Oldest first
    DateAsc,
    /// Newest first
    DateDesc,
}

impl SortMode {
    /// Sort clauses for the search body; relevance sends none
    #[must_use]
    pub fn clauses(self) -> Option<Vec<SortClause>> {
        let order = match self {
            Self::Relevance => return None,
            Self::DateAsc => SortOrder::Asc,
            Self::DateDesc => SortOrder::Desc,
        };
        Some(vec![SortClause {
            field: TIMESTAMP_FIELD.to_string(),
            order,
        }])
    }
}

/// Percent-encode a caller-supplied id for use as one path segment
#[must_use]
pub fn path_segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub(crate) const fn default_size() -> u32 {
    10
}

pub(crate) const fn default_page() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_wire_names() {
        let parsed: Priority = serde_json::from_str("\"CRITICAL\"").unwrap();
        assert_eq!(parsed, Priority::Critical);
        assert_eq!(Priority::default().as_str(), "MEDIUM");
    }

    #[test]
    fn relevance_sends_no_sort() {
        assert!(SortMode::Relevance.clauses().is_none());
        let clauses = SortMode::DateAsc.clauses().unwrap();
        assert_eq!(clauses[0].field, "timestamp");
        assert_eq!(clauses[0].order, SortOrder::Asc);
    }

    #[test]
    fn path_segments_are_encoded() {
        assert_eq!(path_segment("task-42"), "task-42");
        assert_eq!(path_segment("a/b c?d"), "a%2Fb%20c%3Fd");
        assert_eq!(path_segment("x+y"), "x%2By");
    }
}
