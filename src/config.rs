//! Configuration management

use std::{collections::BTreeMap, env, path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
    value::{Uncased, UncasedStr},
};
use serde::{Deserialize, Serialize};

use crate::client::{Service, ServiceRoutes};
use crate::{Error, Result};

/// Environment variable prefix for structured overrides (`ORCHESIGHT_MCP_GATEWAY__TIMEOUT=45s`)
pub const ENV_PREFIX: &str = "ORCHESIGHT_MCP_";

/// Flat environment names used by existing deployments, mapped onto config paths.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("OS_API_GATEWAY_URL", "gateway.base_url"),
    ("OS_API_GATEWAY_KEY", "gateway.auth.api_key"),
    ("GATEWAY_JWT_SECRET", "gateway.auth.signing_secret"),
    ("AGENT_USER_ID", "gateway.identity.user_id"),
    ("AGENT_USER_EMAIL", "gateway.identity.email"),
    ("PORT", "server.port"),
];

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Outbound API gateway configuration
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load configuration from defaults, an optional YAML file and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist, cannot be parsed,
    /// or describes an unusable gateway (bad route, missing signing secret).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        let legacy_names: Vec<&str> = LEGACY_ENV.iter().map(|(name, _)| *name).collect();
        figment = figment
            .merge(Env::raw().only(&legacy_names).map(legacy_env_key))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check that every service route resolves and the auth mode is usable
    pub fn validate(&self) -> Result<()> {
        ServiceRoutes::from_config(&self.gateway)?;

        match self.gateway.auth.mode {
            AuthMode::SignedToken => {
                if self.gateway.auth.resolve_signing_secret().is_none() {
                    return Err(Error::Config(
                        "gateway.auth.mode is signed_token but no signing_secret is configured"
                            .to_string(),
                    ));
                }
            }
            AuthMode::ApiKey => {
                if self.gateway.auth.resolve_api_key().is_none() {
                    tracing::warn!("gateway.auth.api_key is empty; gateway calls will likely be rejected");
                }
            }
        }

        if self.gateway.identity.email.is_empty() {
            return Err(Error::Config(
                "gateway.identity.email must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn legacy_env_key(key: &UncasedStr) -> Uncased<'_> {
    LEGACY_ENV
        .iter()
        .find(|(name, _)| key == *name)
        .map_or_else(
            || Uncased::from_borrowed(key.as_str()),
            |(_, path)| Uncased::from(*path),
        )
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Upper bound on one MCP request, including every gateway call it makes
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3020,
            request_timeout: Duration::from_secs(150),
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Outbound API gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Gateway base URL; a service route defaults to `{base_url}/{service}`
    pub base_url: String,
    /// Per-service base address overrides, keyed by logical service name
    pub services: BTreeMap<String, String>,
    /// Default per-call timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Timeout for the health probe
    #[serde(with = "humantime_serde")]
    pub health_timeout: Duration,
    /// Caller identity attached to every call
    pub identity: IdentityConfig,
    /// Credential configuration
    pub auth: GatewayAuthConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://os-api-gateway-app/api/v1".to_string(),
            services: BTreeMap::new(),
            timeout: Duration::from_secs(30),
            health_timeout: Duration::from_secs(5),
            identity: IdentityConfig::default(),
            auth: GatewayAuthConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Base address for a service: explicit override, else `{base_url}/{service}`
    #[must_use]
    pub fn service_base(&self, service: Service) -> String {
        self.services.get(service.as_str()).map_or_else(
            || format!("{}/{}", self.base_url.trim_end_matches('/'), service),
            |url| url.trim_end_matches('/').to_string(),
        )
    }
}

/// Caller identity the agent acts as
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// User id sent as `X-User-Id` (and the token subject)
    pub user_id: String,
    /// Email sent as `X-User-Email`
    pub email: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            email: "openclaw-agent@orchesight.internal".to_string(),
        }
    }
}

/// How outbound calls authenticate against the gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Static shared key in `x-api-key`
    #[default]
    ApiKey,
    /// HS256 bearer token minted per call
    SignedToken,
}

/// Gateway credential configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayAuthConfig {
    /// Selected authentication mode
    pub mode: AuthMode,
    /// Static key (`api_key` mode). Supports literal value or `env:VAR_NAME`
    pub api_key: Option<String>,
    /// HMAC signing secret (`signed_token` mode). Supports literal value or `env:VAR_NAME`
    pub signing_secret: Option<String>,
    /// Optional `iss` claim for minted tokens
    pub issuer: Option<String>,
}

impl GatewayAuthConfig {
    /// Resolve the API key (expand env vars); `None` when unset or empty
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.as_deref().and_then(resolve_secret)
    }

    /// Resolve the signing secret (expand env vars); `None` when unset or empty
    #[must_use]
    pub fn resolve_signing_secret(&self) -> Option<String> {
        self.signing_secret.as_deref().and_then(resolve_secret)
    }
}

fn resolve_secret(raw: &str) -> Option<String> {
    let value = match raw.strip_prefix("env:") {
        Some(var_name) => env::var(var_name).ok()?,
        None => raw.to_string(),
    };
    (!value.is_empty()).then_some(value)
}
