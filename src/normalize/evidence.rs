//! Evidence search hits rendered as numbered item blocks

use std::fmt::Write as _;

use serde_json::Value;

use super::fields::{
    self, HITS_TOTAL, ITEM_DATE, ITEM_SUBJECT, ITEM_TEXT, PARTICIPANT_NAME, get_path, lookup_text,
};
use super::{DETAIL_LIMIT, SUMMARY_LIMIT, truncate};

const ITEM_ID: fields::Chain = &["id", "_id"];

/// How much of each item's content to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    /// Search result listing
    Summary,
    /// Full item retrieval
    Full,
}

impl Detail {
    const fn limit(self) -> usize {
        match self {
            Self::Summary => SUMMARY_LIMIT,
            Self::Full => DETAIL_LIMIT,
        }
    }
}

/// Hit list of a search response (empty when absent)
#[must_use]
pub fn hit_items(result: &Value) -> &[Value] {
    get_path(result, "hits.items")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice)
}

/// Total matched documents reported by a search response
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn hit_total(result: &Value) -> Option<u64> {
    fields::lookup_f64(result, HITS_TOTAL).map(|n| n.max(0.0) as u64)
}

/// Render a `search_evidence` response
#[must_use]
pub fn render_search(result: &Value, query: Option<&str>) -> String {
    let shown_query = query.filter(|q| !q.trim().is_empty()).unwrap_or("all");
    let items = hit_items(result);

    if items.is_empty() {
        return format!(
            "No results found for \"{shown_query}\" (searched {} total items).",
            hit_total(result).unwrap_or(0)
        );
    }

    let total = hit_total(result).unwrap_or(items.len() as u64);
    format!(
        "Found {total} results for \"{shown_query}\". Showing top {}:\n\n{}",
        items.len(),
        format_items(items, Detail::Summary)
    )
}

/// Render a `get_item_details` response
#[must_use]
pub fn render_details(result: &Value) -> String {
    let items = hit_items(result);
    if items.is_empty() {
        return "No items found for the provided IDs.".to_string();
    }
    format!(
        "Retrieved {} items:\n\n{}",
        items.len(),
        format_items(items, Detail::Full)
    )
}

/// One block per hit, blank line between blocks
#[must_use]
pub fn format_items(items: &[Value], detail: Detail) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format_item(i + 1, item, detail))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_item(position: usize, item: &Value, detail: Detail) -> String {
    let empty = Value::Null;
    let data = item.get("data").unwrap_or(&empty);

    let id = lookup_text(item, ITEM_ID).unwrap_or_else(|| "unknown".to_string());
    let kind = lookup_text(data, &["type"]).unwrap_or_else(|| "unknown".to_string());
    let date = lookup_text(data, ITEM_DATE).unwrap_or_else(|| "N/A".to_string());

    let mut block = format!("[{position}] ID: {id}\n    Type: {kind} | Date: {date}\n");

    if let Some(from) = get_path(data, "communication.from").and_then(participants) {
        let _ = writeln!(block, "    From: {from}");
    }
    if let Some(to) = get_path(data, "communication.to").and_then(participants) {
        let _ = writeln!(block, "    To: {to}");
    }
    if let Some(subject) = lookup_text(data, ITEM_SUBJECT) {
        let _ = writeln!(block, "    Subject: {subject}");
    }
    if let Some(source) = lookup_text(data, &["source"]) {
        let _ = writeln!(block, "    Source: {source}");
    }
    if let Some(text) = lookup_text(data, ITEM_TEXT) {
        let _ = writeln!(block, "    Content: {}", truncate(&text, detail.limit()));
    }

    block
}

/// Participant field as display text: a list, a single record, or a bare value
fn participants(field: &Value) -> Option<String> {
    let names = match field {
        Value::Array(entries) => entries
            .iter()
            .filter_map(participant_name)
            .collect::<Vec<_>>()
            .join(", "),
        other => participant_name(other)?,
    };
    (!names.is_empty()).then_some(names)
}

fn participant_name(entry: &Value) -> Option<String> {
    match entry {
        Value::Object(_) => lookup_text(entry, PARTICIPANT_NAME),
        other => fields::scalar_text(other).filter(|s| !s.is_empty()),
    }
}
