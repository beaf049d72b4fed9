//! HTTP router and handlers

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::debug;

use super::AppState;
use super::health::HealthReport;
use super::rpc::{self, Reply};
use crate::config::ServerConfig;
use crate::error::rpc_codes;
use crate::protocol::JsonRpcResponse;

/// Session header of the MCP streamable HTTP transport
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Create the router
pub fn create_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/mcp", post(mcp_handler).get(mcp_get_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::new())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    config.request_timeout,
                ))
                .layer(DefaultBodyLimit::max(config.max_body_size)),
        )
        .with_state(state)
}

/// Health check handler; always 200, the document says whether the gateway answered
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(HealthReport::probe(state.gateway.as_ref()).await)
}

/// MCP handler (POST /mcp)
async fn mcp_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::error(
                    None,
                    rpc_codes::PARSE_ERROR,
                    format!("Invalid JSON: {e}"),
                )),
            )
                .into_response();
        }
    };

    let request = match rpc::parse_message(value) {
        Ok(r) => r,
        Err(response) => return (StatusCode::BAD_REQUEST, Json(response)).into_response(),
    };

    let existing_session = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let new_session = (request.method == "initialize" && existing_session.is_none())
        .then(|| uuid::Uuid::new_v4().to_string());
    let session_id = existing_session.or_else(|| new_session.clone());

    match rpc::dispatch(&state, request, session_id).await {
        Reply::Accepted => StatusCode::ACCEPTED.into_response(),
        Reply::Response(response) => {
            let mut resp = Json(response).into_response();
            if let Some(id) = new_session.and_then(|s| HeaderValue::from_str(&s).ok()) {
                debug!(session_id = ?id, "Issued MCP session");
                resp.headers_mut()
                    .insert(HeaderName::from_static(SESSION_HEADER), id);
            }
            resp
        }
    }
}

/// GET /mcp: no server-initiated stream is offered
async fn mcp_get_handler() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(JsonRpcResponse::error(
            None,
            rpc_codes::INVALID_REQUEST,
            "Server-initiated streaming is not supported; POST JSON-RPC messages to /mcp",
        )),
    )
}
