//! Reporting tools (service `reporting`)

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{ToolHandler, ToolOutput, definition, parse_args};
use crate::Result;
use crate::client::{GatewayApi, GatewayRequest, REPORT_TIMEOUT, Service};
use crate::normalize::fields::{DOWNLOAD_URL, EXPORT_PATH, REPORT_ID, lookup_text};
use crate::protocol::{Tool, ToolAnnotations};

pub(super) fn tools() -> Vec<Box<dyn ToolHandler>> {
    vec![Box::new(GenerateReport), Box::new(ExportItems)]
}

// ── generate_report ──────────────────────────────────────────────────────────

struct GenerateReport;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ReportKind {
    EvidenceStatistics,
    PoisReport,
    TimelineReport,
    CommunicationsReport,
}

impl ReportKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::EvidenceStatistics => "evidence-statistics",
            Self::PoisReport => "pois-report",
            Self::TimelineReport => "timeline-report",
            Self::CommunicationsReport => "communications-report",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportParams {
    case_id: String,
    report_type: ReportKind,
    filters: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportRequest<'a> {
    case_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<&'a Map<String, Value>>,
}

#[async_trait]
impl ToolHandler for GenerateReport {
    fn definition(&self) -> Tool {
        definition(
            "generate_report",
            "Generate Report",
            "Generate an investigation report. Returns a download URL or report ID. \
             Available types: evidence-statistics, pois-report, timeline-report, communications-report.",
            json!({
                "type": "object",
                "properties": {
                    "caseId": { "type": "string", "minLength": 1, "description": "The case ID" },
                    "reportType": { "type": "string", "enum": ["evidence-statistics", "pois-report", "timeline-report", "communications-report"], "description": "Type of report to generate" },
                    "filters": { "type": "object", "description": "Optional filters to narrow the report scope" }
                },
                "required": ["caseId", "reportType"]
            }),
            ToolAnnotations::mutating(false),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Report generation failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: ReportParams = parse_args(args)?;
        let body = ReportRequest {
            case_id: &params.case_id,
            filters: params.filters.as_ref(),
        };
        let path = format!("/investigation-reports/{}", params.report_type.as_str());
        let request = GatewayRequest::post(Service::Reporting, path)
            .with_json(&body)?
            .with_timeout(REPORT_TIMEOUT);
        let result = gateway.call(request).await?;

        let mut text = format!(
            "Report \"{}\" generated for case {}.",
            params.report_type.as_str(),
            params.case_id
        );
        if let Some(id) = lookup_text(&result, REPORT_ID) {
            let _ = write!(text, " Report ID: {id}.");
        }
        if let Some(url) = lookup_text(&result, DOWNLOAD_URL) {
            let _ = write!(text, " Download: {url}");
        }
        Ok(ToolOutput::text(text))
    }
}

// ── export_items ─────────────────────────────────────────────────────────────

struct ExportItems;

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
enum ExportFormat {
    #[default]
    Csv,
    Pdf,
    Xlsx,
}

impl ExportFormat {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "pdf",
            Self::Xlsx => "xlsx",
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportParams {
    case_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_ids: Option<Vec<String>>,
    #[serde(default)]
    format: ExportFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<String>>,
}

#[async_trait]
impl ToolHandler for ExportItems {
    fn definition(&self) -> Tool {
        definition(
            "export_items",
            "Export Items",
            "Export evidence items to a file (CSV, PDF, or XLSX). \
             Returns the storage path of the exported file.",
            json!({
                "type": "object",
                "properties": {
                    "caseId": { "type": "string", "minLength": 1, "description": "The case ID" },
                    "itemIds": { "type": "array", "items": { "type": "string" }, "description": "Specific item IDs to export (omit for all)" },
                    "format": { "type": "string", "enum": ["csv", "pdf", "xlsx"], "default": "csv", "description": "Export format" },
                    "fields": { "type": "array", "items": { "type": "string" }, "description": "Fields to include in export" }
                },
                "required": ["caseId"]
            }),
            ToolAnnotations::mutating(false),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Export failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: ExportParams = parse_args(args)?;
        let request = GatewayRequest::post(Service::Reporting, "/investigation-reports/export-items")
            .with_json(&params)?
            .with_timeout(REPORT_TIMEOUT);
        let result = gateway.call(request).await?;

        let location = lookup_text(&result, EXPORT_PATH).unwrap_or_else(|| "file created".to_string());
        let scope = match params.item_ids.as_deref() {
            Some(ids) if !ids.is_empty() => format!("{} items", ids.len()),
            _ => "All items".to_string(),
        };
        Ok(ToolOutput::text(format!(
            "Export complete ({}): {location}. {scope} exported.",
            params.format.as_str()
        )))
    }
}
