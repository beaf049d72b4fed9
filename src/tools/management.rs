//! Project management tools (service `project`)

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value, json};

use super::params::{AGENT_SOURCE, Priority, path_segment};
use super::{ToolHandler, ToolOutput, definition, parse_args, priority_schema};
use crate::client::{GatewayApi, GatewayRequest, Service};
use crate::normalize::fields::{RECORD_ID, format_number, lookup_text};
use crate::protocol::{Tool, ToolAnnotations};
use crate::{Error, Result};

pub(super) fn tools() -> Vec<Box<dyn ToolHandler>> {
    vec![
        Box::new(CreateNotification),
        Box::new(CreateTask),
        Box::new(UpdateTask),
        Box::new(UpdateCaseProgress),
        Box::new(LogAudit),
    ]
}

/// Record fields plus the agent `source` tag
#[derive(Serialize)]
struct AgentRecord<'a, T: Serialize> {
    #[serde(flatten)]
    fields: &'a T,
    source: &'static str,
}

impl<'a, T: Serialize> AgentRecord<'a, T> {
    fn new(fields: &'a T) -> Self {
        Self {
            fields,
            source: AGENT_SOURCE,
        }
    }
}

fn created_id(result: &Value) -> String {
    lookup_text(result, RECORD_ID).unwrap_or_else(|| "created".to_string())
}

// ── create_notification ──────────────────────────────────────────────────────

struct CreateNotification;

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
enum NotificationKind {
    #[default]
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationParams {
    user_id: String,
    title: String,
    message: String,
    #[serde(rename = "type", default)]
    kind: NotificationKind,
    #[serde(default)]
    priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    action_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    case_id: Option<String>,
}

#[async_trait]
impl ToolHandler for CreateNotification {
    fn definition(&self) -> Tool {
        definition(
            "create_notification",
            "Create Notification",
            "Send a notification to a user. Use for alerts about critical findings, \
             task assignments, or case updates. Supports priority levels and action URLs.",
            json!({
                "type": "object",
                "properties": {
                    "userId": { "type": "string", "minLength": 1, "description": "Target user ID" },
                    "title": { "type": "string", "minLength": 1, "maxLength": 200, "description": "Notification title" },
                    "message": { "type": "string", "minLength": 1, "maxLength": 1000, "description": "Notification message body" },
                    "type": { "type": "string", "enum": ["info", "warning", "error", "success"], "default": "info", "description": "Notification type" },
                    "priority": priority_schema("Priority level", "MEDIUM"),
                    "actionUrl": { "type": "string", "description": "URL to navigate to when clicked" },
                    "caseId": { "type": "string", "description": "Related case ID" }
                },
                "required": ["userId", "title", "message"]
            }),
            ToolAnnotations::mutating(false),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Notification failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: NotificationParams = parse_args(args)?;
        let request = GatewayRequest::post(Service::Project, "/notifications")
            .with_json(&AgentRecord::new(&params))?;
        let result = gateway.call(request).await?;

        Ok(ToolOutput::text(format!(
            "Notification sent to user {}: \"{}\" (priority: {}). ID: {}",
            params.user_id,
            params.title,
            params.priority.as_str(),
            created_id(&result)
        )))
    }
}

// ── create_task ──────────────────────────────────────────────────────────────

struct CreateTask;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskParams {
    title: String,
    organization_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    case_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assigned_to_list: Option<Vec<String>>,
    #[serde(default)]
    priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
}

/// Accept an RFC 3339 timestamp or a plain `YYYY-MM-DD` date
fn check_due_date(raw: &str) -> Result<()> {
    if DateTime::parse_from_rfc3339(raw).is_ok() || NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "Parameter 'dueDate': \"{raw}\" is not an ISO 8601 date (e.g. 2025-01-31 or 2025-01-31T17:00:00Z)"
        )))
    }
}

#[async_trait]
impl ToolHandler for CreateTask {
    fn definition(&self) -> Tool {
        definition(
            "create_task",
            "Create Task",
            "Create a task in the project management system. Use for assigning review work, \
             follow-up actions, or compliance checks to team members.",
            json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string", "minLength": 1, "maxLength": 300, "description": "Task title" },
                    "organizationId": { "type": "string", "minLength": 1, "description": "Organization ID" },
                    "caseId": { "type": "string", "description": "Related case ID" },
                    "assignedToList": { "type": "array", "items": { "type": "string" }, "description": "User IDs to assign" },
                    "priority": priority_schema("Task priority", "MEDIUM"),
                    "dueDate": { "type": "string", "description": "Due date (ISO 8601 format)" },
                    "description": { "type": "string", "maxLength": 2000, "description": "Task description" },
                    "tags": { "type": "array", "items": { "type": "string" }, "description": "Tags for categorization" }
                },
                "required": ["title", "organizationId"]
            }),
            ToolAnnotations::mutating(false),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Task creation failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: CreateTaskParams = parse_args(args)?;
        if let Some(due) = &params.due_date {
            check_due_date(due)?;
        }

        let request =
            GatewayRequest::post(Service::Project, "/tasks").with_json(&AgentRecord::new(&params))?;
        let result = gateway.call(request).await?;

        let assigned = match params.assigned_to_list.as_deref() {
            Some(users) if !users.is_empty() => format!(", assigned to {} user(s)", users.len()),
            _ => String::new(),
        };
        Ok(ToolOutput::text(format!(
            "Task created: \"{}\" (priority: {}). ID: {}{assigned}",
            params.title,
            params.priority.as_str(),
            created_id(&result)
        )))
    }
}

// ── update_task ──────────────────────────────────────────────────────────────

struct UpdateTask;

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskStatus {
    Todo,
    InProgress,
    InReview,
    Done,
    Cancelled,
}

impl TaskStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::InReview => "IN_REVIEW",
            Self::Done => "DONE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskParams {
    task_id: String,
    status: Option<TaskStatus>,
    progress: Option<Number>,
    comment: Option<String>,
}

#[derive(Debug, Serialize)]
struct TaskPatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<&'a Number>,
}

#[derive(Debug, Serialize)]
struct TaskComment<'a> {
    text: &'a str,
}

#[async_trait]
impl ToolHandler for UpdateTask {
    fn definition(&self) -> Tool {
        definition(
            "update_task",
            "Update Task",
            "Update an existing task: change status, progress, or add a comment. \
             Use to track work progress on review tasks.",
            json!({
                "type": "object",
                "properties": {
                    "taskId": { "type": "string", "minLength": 1, "description": "Task ID to update" },
                    "status": { "type": "string", "enum": ["TODO", "IN_PROGRESS", "IN_REVIEW", "DONE", "CANCELLED"], "description": "New task status" },
                    "progress": { "type": "number", "minimum": 0, "maximum": 100, "description": "Progress percentage (0-100)" },
                    "comment": { "type": "string", "maxLength": 2000, "description": "Comment to add to the task" }
                },
                "required": ["taskId"]
            }),
            ToolAnnotations::mutating(false),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Task update failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: UpdateTaskParams = parse_args(args)?;
        let task = path_segment(&params.task_id);
        let mut updates = Vec::new();

        if params.status.is_some() || params.progress.is_some() {
            let patch = TaskPatch {
                status: params.status,
                progress: params.progress.as_ref(),
            };
            let request =
                GatewayRequest::patch(Service::Project, format!("/tasks/{task}")).with_json(&patch)?;
            gateway.call(request).await?;

            if let Some(status) = params.status {
                updates.push(format!("status → {}", status.as_str()));
            }
            if let Some(progress) = &params.progress {
                updates.push(format!("progress → {}%", format_number(progress)));
            }
        }

        if let Some(comment) = params.comment.as_deref().filter(|c| !c.is_empty()) {
            let request = GatewayRequest::post(Service::Project, format!("/tasks/{task}/comments"))
                .with_json(&AgentRecord::new(&TaskComment { text: comment }))?;
            gateway.call(request).await?;
            updates.push("comment added".to_string());
        }

        let summary = if updates.is_empty() {
            "no changes".to_string()
        } else {
            updates.join(", ")
        };
        Ok(ToolOutput::text(format!(
            "Task {} updated: {summary}.",
            params.task_id
        )))
    }
}

// ── update_case_progress ─────────────────────────────────────────────────────

struct UpdateCaseProgress;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaseProgressParams {
    case_id: String,
    progress: Number,
}

#[async_trait]
impl ToolHandler for UpdateCaseProgress {
    fn definition(&self) -> Tool {
        definition(
            "update_case_progress",
            "Update Case Progress",
            "Update the overall progress percentage for a case. \
             Use to reflect how much of the evidence has been reviewed/processed.",
            json!({
                "type": "object",
                "properties": {
                    "caseId": { "type": "string", "minLength": 1, "description": "Case ID" },
                    "progress": { "type": "number", "minimum": 0, "maximum": 100, "description": "Progress percentage (0-100)" }
                },
                "required": ["caseId", "progress"]
            }),
            ToolAnnotations::mutating(true),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Case progress update failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: CaseProgressParams = parse_args(args)?;
        let path = format!("/cases/{}/progress", path_segment(&params.case_id));
        let request = GatewayRequest::patch(Service::Project, path)
            .with_json(&json!({ "progress": params.progress }))?;
        gateway.call(request).await?;

        Ok(ToolOutput::text(format!(
            "Case {} progress updated to {}%.",
            params.case_id,
            format_number(&params.progress)
        )))
    }
}

// ── log_audit ────────────────────────────────────────────────────────────────

struct LogAudit;

fn low_priority() -> Priority {
    Priority::Low
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct Compliance {
    #[serde(skip_serializing_if = "Option::is_none")]
    gdpr_relevant: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ccpa_relevant: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retention_required: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditParams {
    action: String,
    resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource_id: Option<String>,
    #[serde(default = "low_priority")]
    severity: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compliance: Option<Compliance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Serialize)]
struct AuditEntry<'a> {
    #[serde(flatten)]
    record: AgentRecord<'a, AuditParams>,
    timestamp: String,
}

#[async_trait]
impl ToolHandler for LogAudit {
    fn definition(&self) -> Tool {
        definition(
            "log_audit",
            "Log Audit Event",
            "Create an audit log entry for compliance tracking. \
             Records agent actions, evidence access, and regulatory events.",
            json!({
                "type": "object",
                "properties": {
                    "action": { "type": "string", "minLength": 1, "description": "Action performed (e.g. \"evidence_classified\", \"pii_detected\")" },
                    "resourceType": { "type": "string", "minLength": 1, "description": "Resource type (e.g. \"evidence\", \"case\", \"task\")" },
                    "resourceId": { "type": "string", "description": "ID of the affected resource" },
                    "severity": priority_schema("Severity level", "LOW"),
                    "category": { "type": "string", "description": "Category (e.g. \"ediscovery\", \"privacy\", \"cyber\")" },
                    "compliance": {
                        "type": "object",
                        "description": "Compliance metadata",
                        "properties": {
                            "gdprRelevant": { "type": "boolean", "description": "Subject to GDPR" },
                            "ccpaRelevant": { "type": "boolean", "description": "Subject to CCPA" },
                            "retentionRequired": { "type": "boolean", "description": "Must be retained" }
                        }
                    },
                    "details": { "type": "string", "maxLength": 2000, "description": "Additional details" }
                },
                "required": ["action", "resourceType"]
            }),
            ToolAnnotations::mutating(false),
        )
    }

    fn failure_context(&self) -> &'static str {
        "Audit logging failed"
    }

    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput> {
        let params: AuditParams = parse_args(args)?;
        let entry = AuditEntry {
            record: AgentRecord::new(&params),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        let request = GatewayRequest::post(Service::Project, "/audit-logs").with_json(&entry)?;
        gateway.call(request).await?;

        let resource = params
            .resource_id
            .as_deref()
            .map(|id| format!(" ({id})"))
            .unwrap_or_default();
        Ok(ToolOutput::text(format!(
            "Audit log created: {} on {}{resource} [{}]",
            params.action,
            params.resource_type,
            params.severity.as_str()
        )))
    }
}
