//! Liveness document for `GET /health` and the `health` subcommand

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::client::GatewayApi;

/// Result of one gateway probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// `ok` when the gateway answered, `degraded` otherwise
    pub status: String,
    /// `reachable` or `unreachable`
    pub gateway: String,
    /// RFC 3339 time of the probe
    pub timestamp: String,
}

impl HealthReport {
    /// Probe the gateway now
    ///
    /// ```
    /// use async_trait::async_trait;
    /// use orchesight_mcp::client::{GatewayApi, GatewayError, GatewayRequest};
    /// use orchesight_mcp::server::HealthReport;
    /// use serde_json::Value;
    ///
    /// struct Down;
    ///
    /// #[async_trait]
    /// impl GatewayApi for Down {
    ///     async fn call(&self, _: GatewayRequest) -> Result<Value, GatewayError> {
    ///         Err(GatewayError::new("investigation", "/health", 0, "connection refused"))
    ///     }
    ///     async fn check_health(&self) -> bool {
    ///         false
    ///     }
    /// }
    ///
    /// # tokio_test::block_on(async {
    /// let report = HealthReport::probe(&Down).await;
    /// assert_eq!(report.status, "degraded");
    /// # });
    /// ```
    pub async fn probe(gateway: &dyn GatewayApi) -> Self {
        Self::from_reachability(gateway.check_health().await)
    }

    /// Build the document for a known probe outcome
    #[must_use]
    pub fn from_reachability(reachable: bool) -> Self {
        let (status, gateway) = if reachable {
            ("ok", "reachable")
        } else {
            ("degraded", "unreachable")
        };
        Self {
            status: status.to_string(),
            gateway: gateway.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Whether the gateway answered the probe
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.gateway == "reachable"
    }
}
