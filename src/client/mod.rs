//! Authenticated client for the OrcheSight API gateway
//!
//! Every backend call goes through [`GatewayApi::call`]: it resolves the
//! service route, attaches caller identity and credential, enforces the
//! per-call timeout and folds every failure into one [`GatewayError`].

mod credential;
mod error;
mod request;
mod route;
pub mod search;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

pub use credential::{
    API_KEY_HEADER, CallerIdentity, Credential, GatewayAuth, TOKEN_TTL_SECS, TokenClaims,
    USER_EMAIL_HEADER, USER_ID_HEADER,
};
pub use error::{GatewayError, UNKNOWN_GATEWAY_ERROR};
pub use request::{GatewayRequest, Method};
pub use route::{Service, ServiceRoutes};

use crate::config::GatewayConfig;
use crate::{Error, Result};

/// Timeout for ML inference calls
pub const ML_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout for report generation and export
pub const REPORT_TIMEOUT: Duration = Duration::from_secs(120);
/// Path probed by the health check on the investigation service
pub const HEALTH_PATH: &str = "/health";

/// Gateway operations the tools depend on
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Execute one request and return the decoded JSON body.
    ///
    /// An empty body decodes to `Value::Null`.
    async fn call(&self, request: GatewayRequest) -> std::result::Result<Value, GatewayError>;

    /// Probe the gateway; never fails, any problem reads as `false`
    async fn check_health(&self) -> bool;
}

/// reqwest-backed [`GatewayApi`]
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    routes: Arc<ServiceRoutes>,
    auth: Arc<GatewayAuth>,
    timeout: Duration,
    health_timeout: Duration,
}

impl GatewayClient {
    /// Build a client from the gateway configuration
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Self::with_parts(
            ServiceRoutes::from_config(config)?,
            GatewayAuth::from_config(config)?,
            config.timeout,
            config.health_timeout,
        )
    }

    /// Build a client from already-resolved parts
    pub fn with_parts(
        routes: ServiceRoutes,
        auth: GatewayAuth,
        timeout: Duration,
        health_timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("orchesight-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            routes: Arc::new(routes),
            auth: Arc::new(auth),
            timeout,
            health_timeout,
        })
    }

    /// Resolved route table
    #[must_use]
    pub fn routes(&self) -> &ServiceRoutes {
        &self.routes
    }

    /// Turn a [`GatewayRequest`] into a ready-to-send HTTP request.
    ///
    /// Mints the credential, so a signing failure surfaces here.
    pub fn build_request(
        &self,
        request: &GatewayRequest,
    ) -> std::result::Result<reqwest::Request, GatewayError> {
        let fail = |message: String| {
            GatewayError::new(request.service.as_str(), request.path.as_str(), 0, message)
        };

        let headers = self.auth.headers().map_err(fail)?;
        let url = self.routes.url(request.service, &request.path);

        let mut builder = self
            .http
            .request(request.method.into(), url)
            .headers(headers)
            .timeout(request.timeout.unwrap_or(self.timeout));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.build().map_err(|e| fail(e.to_string()))
    }

    async fn send(&self, request: &GatewayRequest) -> std::result::Result<Value, GatewayError> {
        let service = request.service.as_str();
        let path = request.path.as_str();
        let timeout = request.timeout.unwrap_or(self.timeout);

        let http_request = self.build_request(request)?;
        debug!(method = %http_request.method(), url = %http_request.url(), "Gateway call");

        let response = self
            .http
            .execute(http_request)
            .await
            .map_err(|e| GatewayError::from_transport(service, path, &e, timeout))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::from_transport(service, path, &e, timeout))?;
        let body = decode_body(&bytes);

        if status.is_success() {
            Ok(body)
        } else {
            Err(GatewayError::from_response(service, path, status.as_u16(), Some(&body)))
        }
    }
}

#[async_trait]
impl GatewayApi for GatewayClient {
    async fn call(&self, request: GatewayRequest) -> std::result::Result<Value, GatewayError> {
        self.send(&request).await.inspect_err(|e| {
            error!(
                service = %e.service,
                path = %e.path,
                status = e.status,
                message = %e.message,
                "Gateway call failed"
            );
        })
    }

    async fn check_health(&self) -> bool {
        let probe = GatewayRequest::get(Service::Investigation, HEALTH_PATH)
            .with_timeout(self.health_timeout);
        match self.send(&probe).await {
            Ok(_) => true,
            Err(e) => {
                debug!(status = e.status, message = %e.message, "Gateway health probe failed");
                false
            }
        }
    }
}

/// JSON when it parses, the raw text otherwise, `Null` when empty
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
