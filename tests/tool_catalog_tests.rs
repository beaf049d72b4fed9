//! Tool catalog scenarios against a recording in-memory gateway

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use orchesight_mcp::Error;
use orchesight_mcp::client::{GatewayApi, GatewayError, GatewayRequest, Method, Service};
use orchesight_mcp::tools::{ToolCatalog, ToolContext, ToolOutput};

/// Answers calls from a queue and records every request it sees
#[derive(Default)]
struct RecordingGateway {
    responses: Mutex<VecDeque<Result<Value, GatewayError>>>,
    calls: Mutex<Vec<GatewayRequest>>,
}

impl RecordingGateway {
    fn with_responses(responses: impl IntoIterator<Item = Result<Value, GatewayError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<GatewayRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl GatewayApi for RecordingGateway {
    async fn call(&self, request: GatewayRequest) -> Result<Value, GatewayError> {
        self.calls.lock().push(request);
        self.responses.lock().pop_front().unwrap_or(Ok(Value::Null))
    }

    async fn check_health(&self) -> bool {
        true
    }
}

async fn invoke(gateway: &RecordingGateway, tool: &str, args: Value) -> orchesight_mcp::Result<ToolOutput> {
    ToolCatalog::standard()
        .invoke(gateway, tool, args, &ToolContext::default())
        .await
}

#[tokio::test]
async fn search_renders_header_and_sends_case_filter() {
    let gateway = RecordingGateway::with_responses([Ok(json!({
        "hits": {
            "total": { "value": 42 },
            "items": [
                { "id": "doc-1", "score": 3.2, "data": { "type": "email", "content": { "subject": "Invoice 1234" } } },
                { "id": "doc-2", "score": 1.1, "data": { "type": "document" } }
            ]
        }
    }))]);

    let output = invoke(&gateway, "search_evidence", json!({ "caseId": "case-7", "query": "invoice" }))
        .await
        .unwrap();

    assert!(!output.is_error);
    assert!(
        output.text.starts_with("Found 42 results for \"invoice\". Showing top 2:"),
        "{}",
        output.text
    );
    assert!(output.text.contains("[1] ID: doc-1"));

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].service, Service::Investigation);
    assert_eq!(calls[0].method, Method::Post);
    assert_eq!(calls[0].path, "/search");
    let body = calls[0].body.as_ref().unwrap();
    assert_eq!(body["query"], "invoice");
    assert_eq!(body["filters"][0]["value"], "case-7");
    assert_eq!(body["pagination"]["size"], 10);
}

#[tokio::test]
async fn search_without_hits_reports_total() {
    let gateway = RecordingGateway::with_responses([Ok(json!({ "hits": { "total": 0, "items": [] } }))]);
    let output = invoke(&gateway, "search_evidence", json!({ "caseId": "c" })).await.unwrap();
    assert_eq!(output.text, "No results found for \"all\" (searched 0 total items).");
}

#[tokio::test]
async fn image_analysis_stops_when_item_is_missing() {
    let gateway = RecordingGateway::with_responses([Ok(json!({ "hits": { "total": 0, "items": [] } }))]);

    let output = invoke(
        &gateway,
        "analyze_image",
        json!({ "caseId": "c-1", "itemId": "img-9", "analysisType": "ocr" }),
    )
    .await
    .unwrap();

    assert!(!output.is_error);
    assert_eq!(output.text, "Item \"img-9\" not found in case c-1.");
    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls.iter().all(|c| c.service != Service::Ml));
}

#[tokio::test]
async fn image_analysis_without_stored_file_is_reported() {
    let gateway = RecordingGateway::with_responses([Ok(json!({
        "hits": { "items": [{ "id": "img-9", "data": { "type": "image" } }] }
    }))]);

    let output = invoke(
        &gateway,
        "analyze_image",
        json!({ "caseId": "c-1", "itemId": "img-9", "analysisType": "detect_faces" }),
    )
    .await
    .unwrap();

    assert_eq!(output.text, "Item \"img-9\" does not have a stored file to analyze.");
    assert_eq!(gateway.calls().len(), 1);
}

#[tokio::test]
async fn image_analysis_lookup_failure_is_distinguishable() {
    let gateway = RecordingGateway::with_responses([Err(GatewayError::new(
        "investigation",
        "/search",
        503,
        "Service Unavailable",
    ))]);

    let output = invoke(
        &gateway,
        "analyze_image",
        json!({ "caseId": "c-1", "itemId": "img-9", "analysisType": "ocr" }),
    )
    .await
    .unwrap();

    assert!(output.is_error);
    assert!(
        output.text.starts_with("Error: Could not look up item \"img-9\":"),
        "{}",
        output.text
    );
    assert_eq!(gateway.calls().len(), 1);
}

#[tokio::test]
async fn image_analysis_runs_ml_on_resolved_path() {
    let gateway = RecordingGateway::with_responses([
        Ok(json!({ "hits": { "items": [{ "id": "img-9", "data": { "paths": { "minioPath": "evidence/c-1/img-9.png" } } }] } })),
        Ok(json!({ "text": "TOP SECRET" })),
    ]);

    let output = invoke(
        &gateway,
        "analyze_image",
        json!({ "caseId": "c-1", "itemId": "img-9", "analysisType": "ocr" }),
    )
    .await
    .unwrap();

    assert!(!output.is_error, "{}", output.text);
    let calls = gateway.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].service, Service::Ml);
    assert_eq!(calls[1].path, "/analyze/image");
    assert_eq!(calls[1].body.as_ref().unwrap()["filePath"], "evidence/c-1/img-9.png");
    assert!(output.text.contains("TOP SECRET"));
    assert!(calls[1].timeout.is_some());
}

#[tokio::test]
async fn update_task_without_changes_makes_no_calls() {
    let gateway = RecordingGateway::default();
    let output = invoke(&gateway, "update_task", json!({ "taskId": "t-1" })).await.unwrap();
    assert_eq!(output.text, "Task t-1 updated: no changes.");
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn update_task_patches_then_comments() {
    let gateway = RecordingGateway::default();
    let output = invoke(
        &gateway,
        "update_task",
        json!({ "taskId": "t-1", "status": "DONE", "comment": "reviewed" }),
    )
    .await
    .unwrap();

    assert_eq!(output.text, "Task t-1 updated: status → DONE, comment added.");
    let calls = gateway.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].method, Method::Patch);
    assert_eq!(calls[0].path, "/tasks/t-1");
    assert_eq!(calls[1].path, "/tasks/t-1/comments");
    assert_eq!(calls[1].body.as_ref().unwrap()["source"], "openclaw-agent");
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_gateway() {
    let gateway = RecordingGateway::default();

    let err = invoke(&gateway, "tag_items", json!({ "caseId": "c", "tagName": "hot", "itemIds": [] }))
        .await
        .unwrap_err();

    match err {
        Error::Validation(message) => {
            assert!(message.contains("organizationId"), "{message}");
            assert!(message.contains("itemIds"), "{message}");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn unknown_parameters_are_rejected() {
    let gateway = RecordingGateway::default();
    let err = invoke(&gateway, "get_pipeline_status", json!({ "pipelineId": "p", "verbose": true }))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn gateway_failure_becomes_error_text() {
    let gateway = RecordingGateway::with_responses([Err(GatewayError::new(
        "investigation",
        "/tags/apply",
        403,
        "Forbidden resource",
    ))]);

    let output = invoke(
        &gateway,
        "tag_items",
        json!({ "caseId": "c", "organizationId": "o", "tagName": "hot", "itemIds": ["a"] }),
    )
    .await
    .unwrap();

    assert!(output.is_error);
    assert_eq!(
        output.text,
        "Error: Tagging failed: Gateway call failed (investigation/tags/apply): 403 Forbidden resource"
    );
}

#[tokio::test]
async fn unknown_tool_is_an_error() {
    let gateway = RecordingGateway::default();
    let err = invoke(&gateway, "delete_case", json!({})).await.unwrap_err();
    assert!(matches!(err, Error::UnknownTool(name) if name == "delete_case"));
}

#[tokio::test]
async fn loosely_typed_arguments_never_reach_the_gateway() {
    let gateway = RecordingGateway::default();

    for args in [
        json!({ "caseId": 42 }),
        json!({ "caseId": "c", "size": "25" }),
    ] {
        let err = invoke(&gateway, "search_evidence", args).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err:?}");
    }

    let err = invoke(
        &gateway,
        "log_audit",
        json!({ "action": "pii_detected", "resourceType": "evidence", "compliance": { "gdprRelevant": "yes" } }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Validation(ref message) if message.contains("gdprRelevant")), "{err:?}");
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn date_histogram_defaults_interval_and_skips_hits() {
    let gateway = RecordingGateway::with_responses([Ok(json!({}))]);

    let output = invoke(
        &gateway,
        "aggregate_data",
        json!({ "caseId": "c-2", "aggType": "date_histogram", "field": "timestamp" }),
    )
    .await
    .unwrap();
    assert_eq!(
        output.text,
        "No aggregation results for date_histogram on field \"timestamp\"."
    );

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].service, Service::Investigation);
    assert_eq!(calls[0].method, Method::Post);
    assert_eq!(calls[0].path, "/search");
    let body = calls[0].body.as_ref().unwrap();
    assert_eq!(body["pagination"]["size"], 0);
    assert_eq!(body["filters"][0]["value"], "c-2");
    let aggregation = &body["aggregations"][0];
    assert_eq!(aggregation["name"], "result");
    assert_eq!(aggregation["type"], "date_histogram");
    assert_eq!(aggregation["field"], "timestamp");
    assert_eq!(aggregation["interval"], "1d");
}

#[tokio::test]
async fn item_details_filter_by_ids_within_case() {
    let gateway = RecordingGateway::with_responses([Ok(json!({ "hits": [] }))]);

    let output = invoke(
        &gateway,
        "get_item_details",
        json!({ "caseId": "c-3", "itemIds": ["a", "b"] }),
    )
    .await
    .unwrap();
    assert_eq!(output.text, "No items found for the provided IDs.");

    let calls = gateway.calls();
    assert_eq!(calls[0].path, "/search");
    let body = calls[0].body.as_ref().unwrap();
    assert_eq!(
        body["filters"],
        json!([
            { "field": "_id", "operator": "terms", "value": ["a", "b"] },
            { "field": "caseId", "operator": "term", "value": "c-3" }
        ])
    );
    assert_eq!(body["pagination"]["size"], 2);
}

#[tokio::test]
async fn report_generation_uses_long_timeout() {
    let gateway = RecordingGateway::with_responses([Ok(json!({
        "reportId": "r-1",
        "downloadUrl": "https://files.local/r-1.pdf"
    }))]);

    let output = invoke(
        &gateway,
        "generate_report",
        json!({ "caseId": "c-4", "reportType": "timeline-report" }),
    )
    .await
    .unwrap();
    assert_eq!(
        output.text,
        "Report \"timeline-report\" generated for case c-4. Report ID: r-1. Download: https://files.local/r-1.pdf"
    );

    let calls = gateway.calls();
    assert_eq!(calls[0].service, Service::Reporting);
    assert_eq!(calls[0].path, "/investigation-reports/timeline-report");
    assert_eq!(calls[0].timeout, Some(Duration::from_secs(120)));
    assert_eq!(calls[0].body, Some(json!({ "caseId": "c-4" })));
}

#[tokio::test]
async fn export_uses_long_timeout_and_reports_location() {
    let gateway = RecordingGateway::with_responses([Ok(json!({ "path": "exports/c-5.xlsx" }))]);

    let output = invoke(
        &gateway,
        "export_items",
        json!({ "caseId": "c-5", "itemIds": ["a", "b", "c"], "format": "xlsx" }),
    )
    .await
    .unwrap();
    assert_eq!(
        output.text,
        "Export complete (xlsx): exports/c-5.xlsx. 3 items exported."
    );

    let calls = gateway.calls();
    assert_eq!(calls[0].service, Service::Reporting);
    assert_eq!(calls[0].path, "/investigation-reports/export-items");
    assert_eq!(calls[0].timeout, Some(Duration::from_secs(120)));
    assert_eq!(
        calls[0].body,
        Some(json!({ "caseId": "c-5", "itemIds": ["a", "b", "c"], "format": "xlsx" }))
    );
}

#[tokio::test]
async fn text_analysis_uses_ml_timeout() {
    let gateway =
        RecordingGateway::with_responses([Ok(json!({ "sentiment": "positive", "score": 0.87 }))]);

    let output = invoke(
        &gateway,
        "analyze_text",
        json!({ "text": "great news", "analysisType": "sentiment", "targetLanguage": "en" }),
    )
    .await
    .unwrap();
    assert_eq!(output.text, "**Sentiment:** positive (87.0%)");

    let calls = gateway.calls();
    assert_eq!(calls[0].service, Service::Ml);
    assert_eq!(calls[0].path, "/analyze/text");
    assert_eq!(calls[0].timeout, Some(Duration::from_secs(60)));
    assert_eq!(
        calls[0].body,
        Some(json!({ "text": "great news", "analysisType": "sentiment" }))
    );
}
