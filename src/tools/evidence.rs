//! Evidence tools (service `investigation`)

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

use super::params::{SortMode, default_page, default_size};
use super::{ToolHandler, ToolOutput, definition, parse_args};
use crate::Result;
use crate::client::search::{
    AggregationKind, AggregationRequest, Pagination, SearchFilter, SearchMode, SearchRequest,
};
use crate::client::{GatewayApi, GatewayRequest, Service};
use crate::normalize::aggregation::{self, DEFAULT_INTERVAL, RESULT_NAME};
use crate::normalize::evidence;
use crate::normalize::fields::scalar_text;
use crate::protocol::{Tool, ToolAnnotations};

const SEARCH_PATH: &str = "/search";
const DEFAULT_TAG_COLOR: &str = "#3B82F6";

pub(super) fn tools() -> Vec<Box<dyn ToolHandler>> {
    vec![
        Box::new(SearchEvidence),
        Box::new(TagItems),
        Box::new(BulkTag),
        Box::new(GetItemDetails),
        Box::new(AggregateData),
    ]
}

fn search(body: &SearchRequest) -> Result<GatewayRequest> {
    GatewayRequest::post(Service::Investigation, SEARCH_PATH).with_json(body)
}

// ── search_evidence ──────────────────────────────────────────────────────────

struct SearchEvidence;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchEvidenceParams {
    case_id: String,
    query: Option<String>,
    #[serde(default)]
    filters: Vec<FieldFilter>,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_size")]
    size: u32,
    #[serde(default)]
    sort: SortMode,
    #[serde(default)]
    search_mode: SearchMode,
}

#[derive(Debug, Deserialize)]
struct FieldFilter {
    field: String,
    value: Value,
}

#[async_trait]
impl ToolHandler for SearchEvidence {
    fn definition(&self) -> Tool {
        definition(
            "search_evidence",
            "Search Evidence",
            "Search evidence items in a case using full-text, keyword, or hybrid search. \
             Returns matching items with metadata, content preview, and total count. \
             Use filters to narrow by type, source, date range, tags, or any field.",
            json!({
                "type": "object",
                "properties": {
                    "caseId": { "type": "string", "minLength": 1, "description": "The case ID to search within" },
                    "query": { "type": "string", "description": "Search query text" },
                    "filters": {
                        "type": "array",
                        "description": "Filters to narrow results",
                        "items": {
                            "type": "object",
                            "properties": {
                                "field": { "type": "string", "description": "Field name (e.g. type, source, tags)" },
                                "value": { "description": "Value to filter by" }
                            },
                            "required": ["field", "value"]
                        }
                    },
                    "page": { "type": "integer", "minimum": 1, "default": 1, "description": "Result page (1-based)" },
                    "size": { "type": "integer", "minimum": 1, "maximum": 50, "default": 10, "description": "Number of results to return (max 50)" },
                    "sort": { "type": "string", "enum": ["relevance", "date_asc", "date_desc"], "default": "relevance", "description": "Sort order" },
                    "searchMode": { "type": "string", "enum": ["keyword", "semantic", "hybrid"], "default": "hybrid", "description": "Search mode" }
                },
                "required": ["caseId"]
            }),
            ToolAnnotations::read_only(),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Evidence search failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: SearchEvidenceParams = parse_args(args)?;

        let mut body = SearchRequest::for_case(&params.case_id);
        body.filters.extend(
            params
                .filters
                .into_iter()
                .map(|f| SearchFilter::matching(f.field, f.value)),
        );
        body.query = params.query.clone().filter(|q| !q.is_empty());
        body.search_mode = Some(params.search_mode);
        body.sort = params.sort.clauses();
        body.pagination = Pagination {
            page: params.page,
            ..Pagination::first(params.size)
        };

        let result = gateway.call(search(&body)?).await?;
        Ok(ToolOutput::text(evidence::render_search(
            &result,
            params.query.as_deref(),
        )))
    }
}

// ── tag_items ────────────────────────────────────────────────────────────────

struct TagItems;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct TagItemsParams {
    case_id: String,
    organization_id: String,
    tag_name: String,
    #[serde(default = "default_tag_color", deserialize_with = "tag_color_or_default")]
    tag_color: String,
    item_ids: Vec<String>,
}

fn default_tag_color() -> String {
    DEFAULT_TAG_COLOR.to_string()
}

/// A blank color means the default one
fn tag_color_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let color = String::deserialize(deserializer)?;
    Ok(if color.trim().is_empty() {
        default_tag_color()
    } else {
        color
    })
}

#[async_trait]
impl ToolHandler for TagItems {
    fn definition(&self) -> Tool {
        definition(
            "tag_items",
            "Tag Items",
            "Apply a tag to specific evidence items by their IDs. \
             Tags are used for classification (e.g. \"eDiscovery/Privileged\", \"Privacy/PII-High\").",
            json!({
                "type": "object",
                "properties": {
                    "caseId": { "type": "string", "minLength": 1, "description": "The case ID" },
                    "organizationId": { "type": "string", "minLength": 1, "description": "The organization ID" },
                    "tagName": { "type": "string", "minLength": 1, "description": "Tag name (e.g. \"eDiscovery/Privileged\")" },
                    "tagColor": { "type": "string", "default": DEFAULT_TAG_COLOR, "description": "Tag color hex (e.g. \"#FF0000\")" },
                    "itemIds": { "type": "array", "items": { "type": "string" }, "minItems": 1, "maxItems": 500, "description": "Item IDs to tag" }
                },
                "required": ["caseId", "organizationId", "tagName", "itemIds"]
            }),
            ToolAnnotations::mutating(true),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Tagging failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: TagItemsParams = parse_args(args)?;
        let request = GatewayRequest::post(Service::Investigation, "/tags/apply").with_json(&params)?;
        let result = gateway.call(request).await?;

        let updated = result
            .get("modified")
            .and_then(scalar_text)
            .filter(|n| n != "0")
            .unwrap_or_else(|| params.item_ids.len().to_string());
        Ok(ToolOutput::text(format!(
            "Tagged {} item(s) as \"{}\". {updated} items updated.",
            params.item_ids.len(),
            params.tag_name
        )))
    }
}

// ── bulk_tag ─────────────────────────────────────────────────────────────────

struct BulkTag;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct BulkTagParams {
    case_id: String,
    organization_id: String,
    search_term: String,
    #[serde(default)]
    search_method: SearchMode,
    tag_name: String,
}

#[async_trait]
impl ToolHandler for BulkTag {
    fn definition(&self) -> Tool {
        definition(
            "bulk_tag",
            "Bulk Tag",
            "Tag all items matching a search query. More efficient than search + tag for large batches. \
             Uses server-side search-and-tag to handle pagination automatically.",
            json!({
                "type": "object",
                "properties": {
                    "caseId": { "type": "string", "minLength": 1, "description": "The case ID" },
                    "organizationId": { "type": "string", "minLength": 1, "description": "The organization ID" },
                    "searchTerm": { "type": "string", "minLength": 1, "description": "Search query to match items" },
                    "searchMethod": { "type": "string", "enum": ["keyword", "semantic", "hybrid"], "default": "hybrid", "description": "Search method" },
                    "tagName": { "type": "string", "minLength": 1, "description": "Tag name to apply" }
                },
                "required": ["caseId", "organizationId", "searchTerm", "tagName"]
            }),
            ToolAnnotations::mutating(true),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Bulk tagging failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: BulkTagParams = parse_args(args)?;
        let request =
            GatewayRequest::post(Service::Investigation, "/tags/search-and-tag").with_json(&params)?;
        let result = gateway.call(request).await?;

        let tagged = result
            .get("tagged")
            .and_then(scalar_text)
            .filter(|n| n != "0")
            .unwrap_or_else(|| "all matching".to_string());
        Ok(ToolOutput::text(format!(
            "Bulk tag complete: \"{}\" applied to {tagged} items matching \"{}\".",
            params.tag_name, params.search_term
        )))
    }
}

// ── get_item_details ─────────────────────────────────────────────────────────

struct GetItemDetails;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetItemDetailsParams {
    case_id: String,
    item_ids: Vec<String>,
}

#[async_trait]
impl ToolHandler for GetItemDetails {
    fn definition(&self) -> Tool {
        definition(
            "get_item_details",
            "Get Item Details",
            "Retrieve full details for specific evidence items by their IDs. \
             Returns complete content, metadata, and communication details. Max 50 items per call.",
            json!({
                "type": "object",
                "properties": {
                    "caseId": { "type": "string", "minLength": 1, "description": "The case ID" },
                    "itemIds": { "type": "array", "items": { "type": "string" }, "minItems": 1, "maxItems": 50, "description": "Item IDs to retrieve (max 50)" }
                },
                "required": ["caseId", "itemIds"]
            }),
            ToolAnnotations::read_only(),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Item retrieval failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: GetItemDetailsParams = parse_args(args)?;
        let body = SearchRequest::by_ids(&params.case_id, &params.item_ids);
        let result = gateway.call(search(&body)?).await?;
        Ok(ToolOutput::text(evidence::render_details(&result)))
    }
}

// ── aggregate_data ───────────────────────────────────────────────────────────

struct AggregateData;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregateDataParams {
    case_id: String,
    agg_type: AggregationKind,
    field: String,
    interval: Option<String>,
    #[serde(default = "default_size")]
    size: u32,
}

#[async_trait]
impl ToolHandler for AggregateData {
    fn definition(&self) -> Tool {
        definition(
            "aggregate_data",
            "Aggregate Data",
            "Run aggregations on evidence data: terms (top values), date_histogram (timeline), or stats (min/max/avg). \
             Useful for case overview, distribution analysis, and trend detection.",
            json!({
                "type": "object",
                "properties": {
                    "caseId": { "type": "string", "minLength": 1, "description": "The case ID" },
                    "aggType": { "type": "string", "enum": ["terms", "date_histogram", "stats"], "description": "Aggregation type" },
                    "field": { "type": "string", "minLength": 1, "description": "Field to aggregate on (e.g. \"type\", \"source\", \"timestamp\")" },
                    "interval": { "type": "string", "description": "Interval for date_histogram (e.g. \"1d\", \"1M\"); defaults to 1d" },
                    "size": { "type": "integer", "minimum": 1, "maximum": 50, "default": 10, "description": "Max buckets for terms aggregation" }
                },
                "required": ["caseId", "aggType", "field"]
            }),
            ToolAnnotations::read_only(),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Aggregation failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: AggregateDataParams = parse_args(args)?;

        let interval = (params.agg_type == AggregationKind::DateHistogram).then(|| {
            params
                .interval
                .clone()
                .filter(|i| !i.is_empty())
                .unwrap_or_else(|| DEFAULT_INTERVAL.to_string())
        });
        let body = SearchRequest {
            aggregations: Some(vec![AggregationRequest {
                name: RESULT_NAME.to_string(),
                kind: params.agg_type,
                field: params.field.clone(),
                size: Some(params.size),
                interval,
            }]),
            pagination: Pagination::first(0),
            ..SearchRequest::for_case(&params.case_id)
        };

        let result = gateway.call(search(&body)?).await?;
        Ok(ToolOutput::text(aggregation::render(
            &result,
            params.agg_type,
            &params.field,
        )))
    }
}
