//! Authorizer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Which gateway integration mode the authorizer is wired into.
///
/// The two modes differ only in the shape of the invocation and the name of
/// the principal key forwarded in the decision context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrationMode {
    /// HTTP API payload: resource arrives as `routeArn`, context carries
    /// `userId` (the token subject).
    HttpApi,
    /// REST API payload: resource arrives as `methodArn`, context carries
    /// `username` (the token's `username` claim).
    RestApi,
}

impl std::str::FromStr for IntegrationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "http-api" => Ok(IntegrationMode::HttpApi),
            "rest-api" => Ok(IntegrationMode::RestApi),
            other => Err(format!("unknown integration mode: {other}")),
        }
    }
}

impl std::fmt::Display for IntegrationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrationMode::HttpApi => write!(f, "http-api"),
            IntegrationMode::RestApi => write!(f, "rest-api"),
        }
    }
}

/// Identity-provider and runtime configuration, injected into the
/// [`Authorizer`](crate::Authorizer) at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizerConfig {
    /// Identity-provider region, e.g. "eu-west-1".
    pub region: String,

    /// Cognito user-pool identifier, e.g. "eu-west-1_AbCdEfGhI".
    pub user_pool_id: String,

    /// Application client identifier; the expected `aud` claim.
    pub app_client_id: String,

    /// Gateway integration mode.
    #[serde(default = "default_integration")]
    pub integration: IntegrationMode,

    /// How long a fetched key set stays fresh before a refresh is attempted.
    #[serde(default = "default_jwks_refresh")]
    pub jwks_refresh_secs: u64,

    /// Hard staleness bound: a key set older than this is never served,
    /// even when a refresh attempt fails.
    #[serde(default = "default_jwks_max_stale")]
    pub jwks_max_stale_secs: u64,

    /// Clock skew tolerance in seconds for `exp` validation.
    #[serde(default = "default_clock_skew")]
    pub clock_skew_secs: u64,

    /// Per-call deadline in milliseconds, covering the key-set fetch and
    /// signature verification. Inherited from the gateway's own timeout.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,

    /// Explicit JWKS endpoint. When unset the well-known Cognito URL is
    /// derived from region and pool id. Mainly for pointing tests at a
    /// fake identity provider.
    #[serde(default)]
    pub jwks_endpoint: Option<String>,
}

fn default_integration() -> IntegrationMode {
    IntegrationMode::HttpApi
}

fn default_jwks_refresh() -> u64 {
    3600
}

fn default_jwks_max_stale() -> u64 {
    86_400
}

fn default_clock_skew() -> u64 {
    30
}

fn default_deadline_ms() -> u64 {
    5_000
}

impl AuthorizerConfig {
    /// Create a configuration with default cache and deadline settings.
    pub fn new(
        region: impl Into<String>,
        user_pool_id: impl Into<String>,
        app_client_id: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            user_pool_id: user_pool_id.into(),
            app_client_id: app_client_id.into(),
            integration: default_integration(),
            jwks_refresh_secs: default_jwks_refresh(),
            jwks_max_stale_secs: default_jwks_max_stale(),
            clock_skew_secs: default_clock_skew(),
            deadline_ms: default_deadline_ms(),
            jwks_endpoint: None,
        }
    }

    /// Validate the configuration.
    ///
    /// Absent identifiers are an operator error, distinct from any
    /// per-request authorization failure.
    pub fn validate(&self) -> Result<()> {
        if self.region.is_empty() {
            return Err(AuthError::Misconfigured("region is required".into()));
        }
        if self.user_pool_id.is_empty() {
            return Err(AuthError::Misconfigured("user pool id is required".into()));
        }
        if self.app_client_id.is_empty() {
            return Err(AuthError::Misconfigured(
                "app client id is required".into(),
            ));
        }
        if self.jwks_max_stale_secs < self.jwks_refresh_secs {
            return Err(AuthError::Misconfigured(
                "jwks_max_stale_secs must be >= jwks_refresh_secs".into(),
            ));
        }
        Ok(())
    }

    /// JWKS endpoint: the explicit override if set, otherwise the
    /// well-known URL derived from region and pool id.
    pub fn jwks_url(&self) -> String {
        if let Some(ref endpoint) = self.jwks_endpoint {
            return endpoint.clone();
        }
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}/.well-known/jwks.json",
            self.region, self.user_pool_id
        )
    }

    /// Expected `iss` claim for tokens issued by the pool.
    pub fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }

    /// Per-call deadline as a [`Duration`].
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}
