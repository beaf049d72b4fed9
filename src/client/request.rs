//! Outbound request description

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::Service;
use crate::Result;

/// HTTP verbs the backends are called with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Upper-case verb
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
        }
    }
}

/// One call to one backend; built per call and consumed by dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    /// Target service
    pub service: Service,
    /// HTTP method
    pub method: Method,
    /// Path within the service, starting with `/`
    pub path: String,
    /// JSON body
    pub body: Option<Value>,
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// Per-call timeout; `None` uses the client default
    pub timeout: Option<Duration>,
}

impl GatewayRequest {
    fn new(service: Service, method: Method, path: impl Into<String>) -> Self {
        Self {
            service,
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
            timeout: None,
        }
    }

    /// GET request
    pub fn get(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Method::Get, path)
    }

    /// POST request
    pub fn post(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Method::Post, path)
    }

    /// PATCH request
    pub fn patch(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Method::Patch, path)
    }

    /// DELETE request
    pub fn delete(service: Service, path: impl Into<String>) -> Self {
        Self::new(service, Method::Delete, path)
    }

    /// Attach a serialized JSON body
    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach a query parameter
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Override the client's default timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builder_sets_every_part() {
        let request = GatewayRequest::post(Service::Ml, "/analyze/text")
            .with_json(&json!({ "text": "hi" }))
            .unwrap()
            .with_query("verbose", "true")
            .with_timeout(Duration::from_secs(60));

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body, Some(json!({ "text": "hi" })));
        assert_eq!(request.query, vec![("verbose".to_string(), "true".to_string())]);
        assert_eq!(request.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn get_has_no_body() {
        let request = GatewayRequest::get(Service::Process, "/pipelines/p1/status");
        assert!(request.body.is_none());
        assert_eq!(request.method.as_str(), "GET");
        assert_eq!(reqwest::Method::from(request.method), reqwest::Method::GET);
    }
}
