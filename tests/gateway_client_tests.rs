//! Gateway client against a local HTTP server

use std::time::Duration;

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use orchesight_mcp::client::{GatewayApi, GatewayClient, GatewayRequest, Service};
use orchesight_mcp::config::{AuthMode, GatewayAuthConfig, GatewayConfig, IdentityConfig};

fn header(headers: &HeaderMap, name: &str) -> Value {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map_or(Value::Null, |v| Value::String(v.to_string()))
}

async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "apiKey": header(&headers, "x-api-key"),
        "userId": header(&headers, "x-user-id"),
        "email": header(&headers, "x-user-email"),
        "authorization": header(&headers, "authorization"),
        "body": body,
    }))
}

/// Start a fake gateway on an ephemeral port; returns its base URL
async fn spawn_gateway() -> String {
    let app = Router::new()
        .route("/api/v1/investigation/search", post(echo))
        .route("/api/v1/investigation/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route(
            "/api/v1/project/rejected",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "message": ["title must not be empty", "priority is invalid"] })),
                )
            }),
        )
        .route(
            "/api/v1/project/forbidden",
            get(|| async { (StatusCode::FORBIDDEN, Json(json!({ "message": "Forbidden resource" }))) }),
        )
        .route("/api/v1/project/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/api/v1/project/empty", get(|| async { StatusCode::NO_CONTENT }))
        .route(
            "/api/v1/ml/slow",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/v1")
}

fn config(base_url: String) -> GatewayConfig {
    GatewayConfig {
        base_url,
        identity: IdentityConfig {
            user_id: "agent-1".to_string(),
            email: "agent@test.local".to_string(),
        },
        auth: GatewayAuthConfig {
            mode: AuthMode::ApiKey,
            api_key: Some("k-test".to_string()),
            ..GatewayAuthConfig::default()
        },
        ..GatewayConfig::default()
    }
}

async fn client() -> GatewayClient {
    GatewayClient::new(&config(spawn_gateway().await)).unwrap()
}

#[test]
fn build_request_targets_service_route() {
    let client = GatewayClient::new(&config("http://gw.test/api/v1/".to_string())).unwrap();
    let request = GatewayRequest::get(Service::Process, "/pipelines/p-1/status");

    let built = client.build_request(&request).unwrap();

    assert_eq!(built.method(), reqwest::Method::GET);
    assert_eq!(
        built.url().as_str(),
        "http://gw.test/api/v1/process/pipelines/p-1/status"
    );
    assert_eq!(built.headers()["x-api-key"], "k-test");
    assert_eq!(built.headers()["x-user-id"], "agent-1");
    assert_eq!(built.headers()["content-type"], "application/json");
    assert!(built.headers().get("authorization").is_none());
    assert_eq!(built.timeout(), Some(&Duration::from_secs(30)));
}

#[test]
fn signed_token_mode_sends_bearer_only() {
    let mut gateway = config("http://gw.test/api/v1".to_string());
    gateway.auth.mode = AuthMode::SignedToken;
    gateway.auth.signing_secret = Some("s3cret".to_string());
    let client = GatewayClient::new(&gateway).unwrap();

    let built = client
        .build_request(&GatewayRequest::get(Service::Reporting, "/reports"))
        .unwrap();

    let auth = built.headers()["authorization"].to_str().unwrap();
    assert!(auth.starts_with("Bearer "), "{auth}");
    assert!(built.headers().get("x-api-key").is_none());
}

#[tokio::test]
async fn call_sends_identity_credential_and_body() {
    let client = client().await;
    let request = GatewayRequest::post(Service::Investigation, "/search")
        .with_json(&json!({ "query": "invoice" }))
        .unwrap();

    let echoed = client.call(request).await.unwrap();

    assert_eq!(echoed["apiKey"], "k-test");
    assert_eq!(echoed["userId"], "agent-1");
    assert_eq!(echoed["email"], "agent@test.local");
    assert_eq!(echoed["authorization"], Value::Null);
    assert_eq!(echoed["body"], json!({ "query": "invoice" }));
}

#[tokio::test]
async fn error_message_array_is_joined() {
    let client = client().await;
    let request = GatewayRequest::post(Service::Project, "/rejected")
        .with_json(&json!({}))
        .unwrap();

    let err = client.call(request).await.unwrap_err();

    assert_eq!(err.service, "project");
    assert_eq!(err.path, "/rejected");
    assert_eq!(err.status, 400);
    assert_eq!(err.message, "title must not be empty, priority is invalid");
}

#[tokio::test]
async fn error_message_string_is_used() {
    let err = client()
        .await
        .call(GatewayRequest::get(Service::Project, "/forbidden"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Gateway call failed (project/forbidden): 403 Forbidden resource"
    );
}

#[tokio::test]
async fn error_without_body_falls_back_to_status_text() {
    let err = client()
        .await
        .call(GatewayRequest::get(Service::Project, "/broken"))
        .await
        .unwrap_err();
    assert_eq!(err.status, 500);
    assert_eq!(err.message, "Request failed with status code 500");
    assert!(err.has_response());
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let value = client()
        .await
        .call(GatewayRequest::get(Service::Project, "/empty"))
        .await
        .unwrap();
    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn per_call_timeout_is_reported() {
    let request = GatewayRequest::post(Service::Ml, "/slow")
        .with_json(&json!({}))
        .unwrap()
        .with_timeout(Duration::from_millis(200));

    let err = client().await.call(request).await.unwrap_err();

    assert_eq!(err.status, 0);
    assert_eq!(err.message, "timeout of 200ms exceeded");
    assert!(!err.has_response());
}

#[tokio::test]
async fn health_probe_succeeds_against_live_gateway() {
    assert!(client().await.check_health().await);
}

#[tokio::test]
async fn health_probe_reports_unreachable_gateway() {
    let mut gateway = config("http://127.0.0.1:1/api/v1".to_string());
    gateway.health_timeout = Duration::from_secs(2);
    let client = GatewayClient::new(&gateway).unwrap();
    assert!(!client.check_health().await);
}
