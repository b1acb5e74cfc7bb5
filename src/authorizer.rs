//! The request authorizer.
//!
//! One call per invocation, no state shared between calls beyond the JWKS
//! cache. The gates run in a fixed order; any failure terminates the call
//! and, at the boundary, collapses into the opaque `Unauthorized` signal.

use std::collections::HashMap;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::{AuthorizerConfig, IntegrationMode};
use crate::cookie::CookieJar;
use crate::error::{AuthError, Result, Unauthorized};
use crate::event::{AuthorizerEvent, AuthorizerResponse};
use crate::jwks::JwksCache;
use crate::validator::validate_id_token;

/// Cookie that carries the session token.
const TOKEN_COOKIE: &str = "id_token";

/// Verifies inbound invocations and synthesizes authorization decisions.
pub struct Authorizer {
    config: AuthorizerConfig,
    jwks: JwksCache,
}

impl Authorizer {
    /// Build an authorizer from a validated configuration.
    pub fn new(config: AuthorizerConfig) -> Result<Self> {
        config.validate()?;

        let jwks = JwksCache::new(
            config.jwks_url(),
            std::time::Duration::from_secs(config.jwks_refresh_secs),
            std::time::Duration::from_secs(config.jwks_max_stale_secs),
            config.deadline(),
        )?;

        Ok(Self { config, jwks })
    }

    /// Run the full gate sequence for one invocation.
    ///
    /// Gates, in order: cookie present, token present, key set fetched, kid
    /// matched, signature valid, claims valid. The whole fetch-and-verify
    /// path is bounded by the configured deadline.
    pub async fn authorize(&self, event: &AuthorizerEvent) -> Result<AuthorizerResponse> {
        let resource = event.resource_arn().ok_or_else(|| {
            AuthError::Misconfigured(
                "event carries neither routeArn nor methodArn; check the integration mode".into(),
            )
        })?;

        let cookie_header = event
            .header("cookie")
            .filter(|h| !h.trim().is_empty())
            .ok_or(AuthError::MissingCredential)?;

        let jar = CookieJar::parse(cookie_header);
        let token = jar
            .get(TOKEN_COOKIE)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        debug!(cookie_count = jar.len(), token_present = true, "credential extracted");

        let claims = timeout(
            self.config.deadline(),
            validate_id_token(&self.config, &self.jwks, token),
        )
        .await
        .map_err(|_| AuthError::KeySetUnavailable("request deadline exceeded".into()))??;

        let principal = claims
            .sub
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::InvalidToken("missing sub claim".into()))?;

        let mut context = HashMap::new();
        match self.config.integration {
            IntegrationMode::HttpApi => {
                context.insert("userId".to_string(), principal.to_string());
            }
            IntegrationMode::RestApi => {
                context.insert(
                    "username".to_string(),
                    claims.username().unwrap_or_default().to_string(),
                );
            }
        }
        context.insert(
            "email".to_string(),
            claims.email.clone().unwrap_or_default(),
        );

        info!(principal = %principal, resource = %resource, "authorization allowed");

        Ok(AuthorizerResponse::allow(principal, resource, context))
    }

    /// Boundary wrapper: log the differentiated failure kind, then collapse
    /// every denial into the single signal the gateway understands.
    ///
    /// Operator-side failures (`Misconfigured`, `KeySetUnavailable`) log at
    /// error level so they stand apart from ordinary auth failures.
    pub async fn handle(
        &self,
        event: &AuthorizerEvent,
    ) -> std::result::Result<AuthorizerResponse, Unauthorized> {
        match self.authorize(event).await {
            Ok(response) => Ok(response),
            Err(e) => {
                match e {
                    AuthError::Misconfigured(_) | AuthError::KeySetUnavailable(_) => {
                        error!(kind = e.kind(), error = %e, "authorization denied");
                    }
                    _ => {
                        warn!(kind = e.kind(), "authorization denied");
                    }
                }
                Err(Unauthorized)
            }
        }
    }
}
