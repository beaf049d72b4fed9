//! JSON-RPC dispatch for the MCP endpoint

use serde_json::{Value, json};
use tracing::debug;

use super::AppState;
use crate::error::rpc_codes;
use crate::protocol::{
    Content, Info, InitializeParams, InitializeResult, JSONRPC_VERSION, JsonRpcRequest,
    JsonRpcResponse, PROTOCOL_VERSION, RequestId, ServerCapabilities, ToolsCallParams,
    ToolsCallResult, ToolsCapability, ToolsListResult, negotiate_version,
};
use crate::tools::{ToolContext, ToolOutput};

/// What the HTTP layer should send back for one message
#[derive(Debug)]
pub enum Reply {
    /// A JSON-RPC response body
    Response(JsonRpcResponse),
    /// Notification accepted, nothing to send
    Accepted,
}

/// Read one JSON-RPC message from a decoded body.
///
/// A message without an `id` is a notification, whatever its method.
#[allow(clippy::result_large_err)]
pub fn parse_message(value: Value) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let id = value.get("id").and_then(request_id);

    let request: JsonRpcRequest = serde_json::from_value(value).map_err(|e| {
        JsonRpcResponse::error(
            id.clone(),
            rpc_codes::INVALID_REQUEST,
            format!("Invalid request: {e}"),
        )
    })?;

    if request.jsonrpc != JSONRPC_VERSION {
        return Err(JsonRpcResponse::error(
            id,
            rpc_codes::INVALID_REQUEST,
            "Invalid JSON-RPC version",
        ));
    }

    Ok(request)
}

fn request_id(value: &Value) -> Option<RequestId> {
    serde_json::from_value(value.clone()).ok()
}

/// Route one parsed message to its handler
pub async fn dispatch(state: &AppState, request: JsonRpcRequest, session_id: Option<String>) -> Reply {
    let Some(id) = request.id else {
        debug!(notification = %request.method, "Notification received");
        return Reply::Accepted;
    };
    debug!(method = %request.method, id = %id, "MCP request");

    let response = match request.method.as_str() {
        "initialize" => handle_initialize(id, request.params),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => handle_tools_list(state, id),
        "tools/call" => handle_tools_call(state, id, request.params, session_id).await,
        other => JsonRpcResponse::error(
            Some(id),
            rpc_codes::METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        ),
    };
    Reply::Response(response)
}

fn handle_initialize(id: RequestId, params: Option<Value>) -> JsonRpcResponse {
    let requested = params
        .and_then(|p| serde_json::from_value::<InitializeParams>(p).ok())
        .map(|p| p.protocol_version);
    let version = requested.as_deref().map_or(PROTOCOL_VERSION, negotiate_version);

    let result = InitializeResult {
        protocol_version: version.to_string(),
        capabilities: ServerCapabilities {
            logging: None,
            tools: Some(ToolsCapability { list_changed: false }),
        },
        server_info: server_info(),
        instructions: Some(
            "Investigation tools for OrcheSight cases. Search and read evidence, tag items, \
             manage tasks and notifications, run ML analysis, and generate reports. \
             Every tool is scoped by caseId."
                .to_string(),
        ),
    };
    to_response(id, &result)
}

fn handle_tools_list(state: &AppState, id: RequestId) -> JsonRpcResponse {
    let result = ToolsListResult {
        tools: state.catalog.definitions(),
        next_cursor: None,
    };
    to_response(id, &result)
}

async fn handle_tools_call(
    state: &AppState,
    id: RequestId,
    params: Option<Value>,
    session_id: Option<String>,
) -> JsonRpcResponse {
    let params: ToolsCallParams = match params.map(serde_json::from_value).transpose() {
        Ok(Some(p)) => p,
        Ok(None) => {
            return JsonRpcResponse::error(Some(id), rpc_codes::INVALID_PARAMS, "Missing params");
        }
        Err(e) => {
            return JsonRpcResponse::error(
                Some(id),
                rpc_codes::INVALID_PARAMS,
                format!("Invalid tools/call params: {e}"),
            );
        }
    };

    let arguments = if params.arguments.is_null() {
        json!({})
    } else {
        params.arguments
    };
    let ctx = ToolContext {
        invocation_id: Some(id.to_string()),
        session_id,
    };

    match state
        .catalog
        .invoke(state.gateway.as_ref(), &params.name, arguments, &ctx)
        .await
    {
        Ok(output) => to_response(id, &call_result(output)),
        Err(e) => JsonRpcResponse::error(Some(id), e.to_rpc_code(), e.to_string()),
    }
}

/// MCP shape of a tool's output
#[must_use]
pub fn call_result(output: ToolOutput) -> ToolsCallResult {
    ToolsCallResult {
        content: vec![Content::text(output.text)],
        is_error: output.is_error,
    }
}

fn server_info() -> Info {
    Info {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        title: Some("OrcheSight MCP Server".to_string()),
        description: Some(env!("CARGO_PKG_DESCRIPTION").to_string()),
    }
}

fn to_response<T: serde::Serialize>(id: RequestId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(Some(id), rpc_codes::INTERNAL_ERROR, e.to_string()),
    }
}
