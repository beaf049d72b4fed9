//! Logical backend services and their resolved base addresses

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::config::GatewayConfig;
use crate::{Error, Result};

/// Backend service reachable through the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Evidence search, tagging, aggregation
    Investigation,
    /// Tasks, notifications, cases, audit logs
    Project,
    /// Text and image inference
    Ml,
    /// Enrichment pipelines
    Process,
    /// Report generation and export
    Reporting,
}

impl Service {
    /// Every service, in route-table order
    pub const ALL: [Self; 5] = [
        Self::Investigation,
        Self::Project,
        Self::Ml,
        Self::Process,
        Self::Reporting,
    ];

    /// Path segment / config key for this service
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Investigation => "investigation",
            Self::Project => "project",
            Self::Ml => "ml",
            Self::Process => "process",
            Self::Reporting => "reporting",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|svc| svc.as_str() == s)
            .ok_or_else(|| Error::Config(format!("Unknown service '{s}'")))
    }
}

/// Base address per service, validated once at startup.
///
/// Lookup is infallible: a table only exists if every route parsed.
#[derive(Debug, Clone)]
pub struct ServiceRoutes {
    bases: [String; 5],
}

impl ServiceRoutes {
    /// Resolve and validate every route from the gateway configuration
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        for key in config.services.keys() {
            key.parse::<Service>().map_err(|_| {
                Error::Config(format!(
                    "gateway.services.{key}: unknown service (expected one of investigation, project, ml, process, reporting)"
                ))
            })?;
        }

        for service in Service::ALL {
            let base = config.service_base(service);
            let url = Url::parse(&base).map_err(|e| {
                Error::Config(format!("Invalid route for service '{service}' ({base}): {e}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "Invalid route for service '{service}' ({base}): scheme must be http or https"
                )));
            }
        }

        Ok(Self {
            bases: Service::ALL.map(|service| config.service_base(service)),
        })
    }

    /// Base address of a service (no trailing slash)
    #[must_use]
    pub fn base(&self, service: Service) -> &str {
        &self.bases[service.index()]
    }

    /// Full URL for a service path (`path` starts with `/`)
    #[must_use]
    pub fn url(&self, service: Service, path: &str) -> String {
        format!("{}{path}", self.base(service))
    }
}
