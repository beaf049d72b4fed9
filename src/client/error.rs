//! Uniform failure record for gateway calls

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Message used when neither the body nor the transport explains a failure
pub const UNKNOWN_GATEWAY_ERROR: &str = "Unknown gateway error";

/// A failed gateway call.
///
/// `status` is 0 when no HTTP response was received (connect failure,
/// timeout, credential minting failure).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Gateway call failed ({service}{path}): {status} {message}")]
pub struct GatewayError {
    /// Logical service name
    pub service: String,
    /// Request path within the service
    pub path: String,
    /// HTTP status, or 0
    pub status: u16,
    /// Resolved failure message
    pub message: String,
}

impl GatewayError {
    /// Build an error record
    pub fn new(
        service: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self {
            service: service.into(),
            path: path.into(),
            status,
            message: if message.trim().is_empty() {
                UNKNOWN_GATEWAY_ERROR.to_string()
            } else {
                message
            },
        }
    }

    /// Failure after a non-2xx response.
    ///
    /// Prefers the body's `message` field, then the generic status text.
    pub fn from_response(service: &str, path: &str, status: u16, body: Option<&Value>) -> Self {
        let message = body
            .and_then(body_message)
            .unwrap_or_else(|| format!("Request failed with status code {status}"));
        Self::new(service, path, status, message)
    }

    /// Failure before any response was received
    pub fn from_transport(service: &str, path: &str, err: &reqwest::Error, timeout: Duration) -> Self {
        let message = if err.is_timeout() {
            format!("timeout of {}ms exceeded", timeout.as_millis())
        } else {
            transport_message(err)
        };
        Self::new(service, path, err.status().map_or(0, |s| s.as_u16()), message)
    }

    /// True when the backend answered at all
    #[must_use]
    pub fn has_response(&self) -> bool {
        self.status != 0
    }
}

/// Extract `message` from an error body: a string, or an array of strings
/// (validation pipes commonly return one entry per failed field).
fn body_message(body: &Value) -> Option<String> {
    match body.get("message")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(parts) => {
            let parts: Vec<&str> = parts.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

/// Innermost transport cause; reqwest's top-level text repeats the URL.
fn transport_message(err: &reqwest::Error) -> String {
    let mut source: Option<&dyn std::error::Error> = std::error::Error::source(err);
    let mut last = None;
    while let Some(cause) = source {
        last = Some(cause.to_string());
        source = cause.source();
    }
    last.unwrap_or_else(|| err.to_string())
}
