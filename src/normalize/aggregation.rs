//! Aggregation results (`terms`, `date_histogram`, `stats`)

use std::fmt::Write as _;

use chrono::DateTime;
use serde_json::Value;

use super::evidence::hit_total;
use super::fields::{as_number, get_path, is_present, scalar_text};
use crate::client::search::AggregationKind;

/// Name the single aggregation is requested under
pub const RESULT_NAME: &str = "result";
/// Histogram interval used when the caller gives none
pub const DEFAULT_INTERVAL: &str = "1d";

/// Render the `result` aggregation of a search response
#[must_use]
pub fn render(result: &Value, kind: AggregationKind, field: &str) -> String {
    let Some(agg) = get_path(result, "aggregations")
        .and_then(|aggs| aggs.get(RESULT_NAME))
        .filter(|agg| is_present(agg))
    else {
        return format!(
            "No aggregation results for {} on field \"{field}\".",
            kind.as_str()
        );
    };

    match kind {
        AggregationKind::Stats => render_stats(agg, field),
        AggregationKind::Terms | AggregationKind::DateHistogram => {
            render_buckets(agg, kind, field, hit_total(result).unwrap_or(0))
        }
    }
}

fn render_stats(agg: &Value, field: &str) -> String {
    const STATS: [&str; 5] = ["count", "min", "max", "avg", "sum"];

    let empty_count = agg
        .get("count")
        .and_then(as_number)
        .is_some_and(|count| count <= 0.0);
    let nothing_reported = STATS
        .iter()
        .all(|name| agg.get(*name).is_none_or(|v| !is_present(v)));
    if empty_count || nothing_reported {
        return no_data(AggregationKind::Stats, field);
    }

    let stat = |name: &str| {
        agg.get(name)
            .and_then(scalar_text)
            .unwrap_or_else(|| "N/A".to_string())
    };
    let avg = agg
        .get("avg")
        .and_then(as_number)
        .map_or_else(|| "N/A".to_string(), |avg| format!("{avg:.2}"));

    format!(
        "**Stats for \"{field}\":**\n  Count: {}\n  Min: {}\n  Max: {}\n  Avg: {avg}\n  Sum: {}\n",
        stat("count"),
        stat("min"),
        stat("max"),
        stat("sum")
    )
}

fn render_buckets(agg: &Value, kind: AggregationKind, field: &str, total: u64) -> String {
    let buckets: Vec<(String, String)> = match agg.get("buckets") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|b| (bucket_key(b, kind, None), doc_count(b)))
            .collect(),
        // Keyed buckets: `{ "email": { "doc_count": 3 } }`
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, b)| (bucket_key(b, kind, Some(name)), doc_count(b)))
            .collect(),
        _ => Vec::new(),
    };

    if buckets.is_empty() {
        return no_data(kind, field);
    }

    let label = match kind {
        AggregationKind::DateHistogram => "Timeline",
        _ => "Top values",
    };
    let mut out = format!("**{label} for \"{field}\"** ({total} total items):\n\n");
    for (key, count) in buckets {
        let _ = writeln!(out, "  {key}: {count}");
    }
    out
}

fn no_data(kind: AggregationKind, field: &str) -> String {
    format!("No data found for {} on field \"{field}\".", kind.as_str())
}

fn bucket_key(bucket: &Value, kind: AggregationKind, map_key: Option<&str>) -> String {
    if let Some(label) = bucket
        .get("key_as_string")
        .filter(|v| is_present(v))
        .and_then(scalar_text)
    {
        return label;
    }

    let key = bucket.get("key");
    if kind == AggregationKind::DateHistogram {
        if let Some(date) = key.and_then(as_number).and_then(calendar_date) {
            return date;
        }
    }

    key.and_then(scalar_text)
        .or_else(|| map_key.map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Epoch milliseconds as a UTC `YYYY-MM-DD`
#[allow(clippy::cast_possible_truncation)]
fn calendar_date(millis: f64) -> Option<String> {
    DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.format("%Y-%m-%d").to_string())
}

fn doc_count(bucket: &Value) -> String {
    bucket
        .get("doc_count")
        .and_then(scalar_text)
        .unwrap_or_else(|| "0".to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn stats_average_has_two_decimals() {
        let result = json!({
            "aggregations": { "result": { "count": 5, "min": 1, "max": 99, "avg": 40.666, "sum": 203 } }
        });
        assert_eq!(
            render(&result, AggregationKind::Stats, "size"),
            "**Stats for \"size\":**\n  Count: 5\n  Min: 1\n  Max: 99\n  Avg: 40.67\n  Sum: 203\n"
        );
    }

    #[test]
    fn stats_over_nothing_is_empty() {
        let result = json!({ "aggregations": { "result": { "count": 0, "min": null, "max": null, "avg": null, "sum": 0 } } });
        assert_eq!(
            render(&result, AggregationKind::Stats, "size"),
            "No data found for stats on field \"size\"."
        );
    }

    #[test]
    fn stats_without_count_still_render() {
        let result = json!({ "aggregations": { "result": { "min": 1, "max": 99, "avg": 40.666, "sum": 203 } } });
        assert_eq!(
            render(&result, AggregationKind::Stats, "size"),
            "**Stats for \"size\":**\n  Count: N/A\n  Min: 1\n  Max: 99\n  Avg: 40.67\n  Sum: 203\n"
        );
    }

    #[test]
    fn stats_with_every_value_missing_is_empty() {
        let result = json!({ "aggregations": { "result": { "min": null, "avg": null } } });
        assert_eq!(
            render(&result, AggregationKind::Stats, "size"),
            "No data found for stats on field \"size\"."
        );
    }

    #[test]
    fn terms_buckets_list_top_values() {
        let result = json!({
            "hits": { "total": 12 },
            "aggregations": { "result": { "buckets": [
                { "key": "email", "doc_count": 9 },
                { "key": "chat", "doc_count": 3 }
            ] } }
        });
        assert_eq!(
            render(&result, AggregationKind::Terms, "type"),
            "**Top values for \"type\"** (12 total items):\n\n  email: 9\n  chat: 3\n"
        );
    }

    #[test]
    fn keyed_buckets_use_map_keys() {
        let result = json!({ "aggregations": { "result": { "buckets": { "pdf": { "doc_count": 4 } } } } });
        assert!(render(&result, AggregationKind::Terms, "ext").contains("  pdf: 4\n"));
    }

    #[test]
    fn date_buckets_prefer_label_then_calendar_date() {
        let result = json!({
            "aggregations": { "result": { "buckets": [
                { "key": 1_709_251_200_000_i64, "key_as_string": "2024-03-01", "doc_count": 2 },
                { "key": 1_709_337_600_000_i64, "doc_count": 5 }
            ] } }
        });
        let text = render(&result, AggregationKind::DateHistogram, "timestamp");
        assert!(text.starts_with("**Timeline for \"timestamp\"** (0 total items):\n\n"));
        assert!(text.contains("  2024-03-01: 2\n"));
        assert!(text.contains("  2024-03-02: 5\n"));
    }

    #[test]
    fn zero_buckets_emit_empty_message() {
        let result = json!({ "aggregations": { "result": { "buckets": [] } } });
        assert_eq!(
            render(&result, AggregationKind::Terms, "type"),
            "No data found for terms on field \"type\"."
        );
    }

    #[test]
    fn missing_aggregation_is_reported() {
        assert_eq!(
            render(&json!({ "hits": { "total": 0 } }), AggregationKind::DateHistogram, "timestamp"),
            "No aggregation results for date_histogram on field \"timestamp\"."
        );
    }
}
