//! Pipeline tools (service `process`)

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::params::path_segment;
use super::{ToolHandler, ToolOutput, definition, parse_args};
use crate::Result;
use crate::client::{GatewayApi, GatewayRequest, Service};
use crate::normalize::fields::{JOB_ID, lookup_text, scalar_text};
use crate::protocol::{Tool, ToolAnnotations};

pub(super) fn tools() -> Vec<Box<dyn ToolHandler>> {
    vec![Box::new(GetPipelineStatus), Box::new(TriggerEnrichment)]
}

// ── get_pipeline_status ──────────────────────────────────────────────────────

struct GetPipelineStatus;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineStatusParams {
    pipeline_id: String,
}

/// Status block for one pipeline; absent fields are left out
fn render_status(pipeline_id: &str, status: &Value) -> String {
    let field = |name: &str| status.get(name).and_then(scalar_text);

    let mut out = format!("**Pipeline {pipeline_id}:**\n");
    let _ = writeln!(
        out,
        "  Status: {}",
        field("status").filter(|s| !s.is_empty()).unwrap_or_else(|| "unknown".to_string())
    );
    if let Some(progress) = field("progress") {
        let _ = writeln!(out, "  Progress: {progress}%");
    }
    if let Some(stage) = field("stage").filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "  Stage: {stage}");
    }
    if let Some(processed) = field("processedItems") {
        let total = field("totalItems")
            .filter(|t| t != "0")
            .unwrap_or_else(|| "?".to_string());
        let _ = writeln!(out, "  Processed: {processed}/{total}");
    }
    if let Some(errors) = field("errorCount") {
        let _ = writeln!(out, "  Errors: {errors}");
    }
    if let Some(eta) = field("estimatedCompletion").filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "  ETA: {eta}");
    }
    out
}

#[async_trait]
impl ToolHandler for GetPipelineStatus {
    fn definition(&self) -> Tool {
        definition(
            "get_pipeline_status",
            "Get Pipeline Status",
            "Check the status of a data processing pipeline. \
             Returns progress, stage, error count, and completion estimate.",
            json!({
                "type": "object",
                "properties": {
                    "pipelineId": { "type": "string", "minLength": 1, "description": "Pipeline/job ID to check" }
                },
                "required": ["pipelineId"]
            }),
            ToolAnnotations::read_only(),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Pipeline status check failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: PipelineStatusParams = parse_args(args)?;
        let path = format!("/pipelines/{}/status", path_segment(&params.pipeline_id));
        let status = gateway.call(GatewayRequest::get(Service::Process, path)).await?;
        Ok(ToolOutput::text(render_status(&params.pipeline_id, &status)))
    }
}

// ── trigger_enrichment ───────────────────────────────────────────────────────

struct TriggerEnrichment;

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum EnrichmentKind {
    Ocr,
    Translation,
    EntityExtraction,
    Deduplication,
    Full,
}

impl EnrichmentKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Ocr => "ocr",
            Self::Translation => "translation",
            Self::EntityExtraction => "entity_extraction",
            Self::Deduplication => "deduplication",
            Self::Full => "full",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnrichmentParams {
    case_id: String,
    enrichment_type: EnrichmentKind,
    item_ids: Option<Vec<String>>,
    options: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PipelineStart<'a> {
    case_id: &'a str,
    #[serde(rename = "type")]
    kind: EnrichmentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_ids: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a Map<String, Value>>,
}

#[async_trait]
impl ToolHandler for TriggerEnrichment {
    fn definition(&self) -> Tool {
        definition(
            "trigger_enrichment",
            "Trigger Enrichment",
            "Trigger data enrichment or post-processing on evidence items. \
             Starts an async pipeline job and returns the job ID for status tracking.",
            json!({
                "type": "object",
                "properties": {
                    "caseId": { "type": "string", "minLength": 1, "description": "The case ID" },
                    "enrichmentType": { "type": "string", "enum": ["ocr", "translation", "entity_extraction", "deduplication", "full"], "description": "Type of enrichment to run" },
                    "itemIds": { "type": "array", "items": { "type": "string" }, "description": "Specific item IDs (omit for all items in case)" },
                    "options": { "type": "object", "description": "Enrichment-specific options" }
                },
                "required": ["caseId", "enrichmentType"]
            }),
            ToolAnnotations::mutating(false),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Triggering enrichment failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: EnrichmentParams = parse_args(args)?;
        let body = PipelineStart {
            case_id: &params.case_id,
            kind: params.enrichment_type,
            item_ids: params.item_ids.as_deref(),
            options: params.options.as_ref(),
        };
        let request = GatewayRequest::post(Service::Process, "/pipelines/start").with_json(&body)?;
        let result = gateway.call(request).await?;

        Ok(ToolOutput::text(format!(
            "Enrichment pipeline started: {} for case {}. Job ID: {}. Use get_pipeline_status to track progress.",
            params.enrichment_type.as_str(),
            params.case_id,
            lookup_text(&result, JOB_ID).unwrap_or_else(|| "created".to_string())
        )))
    }
}
