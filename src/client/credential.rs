//! Caller identity and the credential attached to every gateway call
//!
//! Credentials are never logged; `Debug` output is redacted.

use std::fmt;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::{AuthMode, GatewayConfig};
use crate::{Error, Result};

/// Lifetime of a minted bearer token, in seconds
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Static key header
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");
/// Caller user id header
pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");
/// Caller email header
pub const USER_EMAIL_HEADER: HeaderName = HeaderName::from_static("x-user-email");

/// Identity the agent acts as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// User id
    pub user_id: String,
    /// Email address
    pub email: String,
}

/// Claims carried by a minted gateway token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Caller user id
    pub sub: String,
    /// Caller email
    pub email: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Optional issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Secret material proving the caller to the gateway
#[derive(Clone)]
pub enum Credential {
    /// Shared static key, sent as `x-api-key`
    ApiKey(String),
    /// HMAC key for per-call HS256 bearer tokens
    SignedToken {
        /// Signing key
        key: EncodingKey,
        /// `iss` claim, if configured
        issuer: Option<String>,
    },
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::SignedToken { issuer, .. } => f
                .debug_struct("SignedToken")
                .field("key", &"<redacted>")
                .field("issuer", issuer)
                .finish(),
        }
    }
}

/// Identity plus credential; immutable for the life of the process
#[derive(Debug, Clone)]
pub struct GatewayAuth {
    identity: CallerIdentity,
    credential: Credential,
}

impl GatewayAuth {
    /// Build from explicit parts
    #[must_use]
    pub fn new(identity: CallerIdentity, credential: Credential) -> Self {
        Self {
            identity,
            credential,
        }
    }

    /// Build from the gateway section of the configuration
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let identity = CallerIdentity {
            user_id: config.identity.user_id.clone(),
            email: config.identity.email.clone(),
        };

        let credential = match config.auth.mode {
            AuthMode::ApiKey => Credential::ApiKey(config.auth.resolve_api_key().unwrap_or_default()),
            AuthMode::SignedToken => {
                let secret = config.auth.resolve_signing_secret().ok_or_else(|| {
                    Error::Config("signed_token mode requires gateway.auth.signing_secret".to_string())
                })?;
                Credential::SignedToken {
                    key: EncodingKey::from_secret(secret.as_bytes()),
                    issuer: config.auth.issuer.clone(),
                }
            }
        };

        Ok(Self::new(identity, credential))
    }

    /// Caller identity
    #[must_use]
    pub fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    /// Headers for one outbound call.
    ///
    /// Signed tokens are minted here, fresh for every call. The error is a
    /// plain message so the caller can wrap it with service and path.
    pub fn headers(&self) -> std::result::Result<HeaderMap, String> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_ID_HEADER, header_value(&self.identity.user_id, "X-User-Id")?);
        headers.insert(USER_EMAIL_HEADER, header_value(&self.identity.email, "X-User-Email")?);

        match &self.credential {
            Credential::ApiKey(key) => {
                let mut value = header_value(key, "x-api-key")?;
                value.set_sensitive(true);
                headers.insert(API_KEY_HEADER, value);
            }
            Credential::SignedToken { key, issuer } => {
                let token = self.mint(key, issuer.clone())?;
                let mut value = header_value(&format!("Bearer {token}"), "Authorization")?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
        }

        Ok(headers)
    }

    fn mint(&self, key: &EncodingKey, issuer: Option<String>) -> std::result::Result<String, String> {
        let iat = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: self.identity.user_id.clone(),
            email: self.identity.email.clone(),
            iat,
            exp: iat + TOKEN_TTL_SECS,
            iss: issuer,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, key)
            .map_err(|e| format!("failed to sign gateway token: {e}"))
    }
}

fn header_value(value: &str, name: &str) -> std::result::Result<HeaderValue, String> {
    HeaderValue::from_str(value).map_err(|_| format!("invalid characters in {name} header value"))
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{DecodingKey, Validation};

    use super::*;

    fn identity() -> CallerIdentity {
        CallerIdentity {
            user_id: "agent-1".to_string(),
            email: "agent@orchesight.test".to_string(),
        }
    }

    #[test]
    fn api_key_mode_sets_key_and_identity() {
        let auth = GatewayAuth::new(identity(), Credential::ApiKey("k-1".to_string()));
        let headers = auth.headers().unwrap();
        assert_eq!(headers[API_KEY_HEADER], "k-1");
        assert_eq!(headers["X-User-Id"], "agent-1");
        assert_eq!(headers["X-User-Email"], "agent@orchesight.test");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert!(!headers.contains_key(AUTHORIZATION));
    }

    #[test]
    fn signed_token_mode_mints_valid_token() {
        let auth = GatewayAuth::new(
            identity(),
            Credential::SignedToken {
                key: EncodingKey::from_secret(b"test-secret"),
                issuer: Some("orchesight-mcp".to_string()),
            },
        );
        let headers = auth.headers().unwrap();
        assert!(!headers.contains_key(API_KEY_HEADER));

        let bearer = headers[AUTHORIZATION].to_str().unwrap();
        let token = bearer.strip_prefix("Bearer ").unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&["orchesight-mcp"]);
        validation.validate_aud = false;
        let data = jsonwebtoken::decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(b"test-secret"),
            &validation,
        )
        .unwrap();

        assert_eq!(data.claims.sub, "agent-1");
        assert_eq!(data.claims.email, "agent@orchesight.test");
        assert_eq!(data.claims.exp - data.claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn from_config_requires_secret_for_signed_tokens() {
        let mut config = GatewayConfig::default();
        config.auth.mode = AuthMode::SignedToken;
        assert!(GatewayAuth::from_config(&config).is_err());

        config.auth.signing_secret = Some("s".to_string());
        assert!(GatewayAuth::from_config(&config).is_ok());
    }

    #[test]
    fn debug_output_is_redacted() {
        let auth = GatewayAuth::new(identity(), Credential::ApiKey("super-secret".to_string()));
        let shown = format!("{auth:?}");
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn control_characters_in_identity_fail_cleanly() {
        let auth = GatewayAuth::new(
            CallerIdentity {
                user_id: "bad\nid".to_string(),
                email: "a@b".to_string(),
            },
            Credential::ApiKey("k".to_string()),
        );
        assert!(auth.headers().unwrap_err().contains("X-User-Id"));
    }
}
