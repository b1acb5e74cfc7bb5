//! Token signature and claims verification.

use std::collections::HashMap;

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AuthorizerConfig;
use crate::error::{AuthError, Result};
use crate::jwks::JwksCache;

/// Verified token payload. Only trusted once [`validate_id_token`] returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the principal identifier.
    pub sub: Option<String>,
    /// Issuer.
    pub iss: Option<String>,
    /// Audience (single string or array).
    #[serde(default)]
    pub aud: Audience,
    /// Expiration time (seconds since epoch).
    pub exp: Option<u64>,
    /// Issued at.
    pub iat: Option<u64>,
    /// Email address.
    pub email: Option<String>,
    /// Plain `username` claim, if the pool maps one.
    pub username: Option<String>,
    /// Cognito's namespaced username claim on id tokens.
    #[serde(rename = "cognito:username")]
    pub cognito_username: Option<String>,
    /// Remaining claims.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Username for the decision context, whichever claim the pool used.
    pub fn username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or(self.cognito_username.as_deref())
    }
}

/// Audience can be a single string or array of strings.
///
/// Kept only so either wire shape deserializes; the audience check itself is
/// enforced by [`Validation::set_audience`] before `Claims` ever exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    #[default]
    None,
    Single(String),
    Multiple(Vec<String>),
}

/// Only RS256 is accepted. Everything else, `none` included, is rejected
/// before any key lookup to rule out algorithm-confusion attacks.
fn check_algorithm(alg: Algorithm) -> Result<()> {
    if alg == Algorithm::RS256 {
        Ok(())
    } else {
        Err(AuthError::InvalidToken(format!(
            "algorithm not allowed: {alg:?}"
        )))
    }
}

/// Verify an id token's signature and standard claims.
///
/// The header is decoded unverified only to learn the `kid`; nothing from it
/// is trusted until `decode` succeeds against the resolved public key with
/// issuer, audience, and expiry validation enabled.
pub async fn validate_id_token(
    config: &AuthorizerConfig,
    jwks: &JwksCache,
    token: &str,
) -> Result<Claims> {
    let header = decode_header(token)
        .map_err(|e| AuthError::InvalidToken(format!("bad token header: {e}")))?;

    check_algorithm(header.alg)?;

    let kid = header
        .kid
        .ok_or_else(|| AuthError::InvalidToken("missing kid in token header".into()))?;

    debug!(kid = %kid, "resolving signing key");
    let decoding_key = jwks.get_key(&kid).await?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = config.clock_skew_secs;
    validation.set_issuer(&[config.issuer()]);
    validation.set_audience(&[&config.app_client_id]);
    validation.set_required_spec_claims(&["exp", "aud", "iss"]);

    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_check_algorithm() {
        assert!(check_algorithm(Algorithm::RS256).is_ok());
        assert!(check_algorithm(Algorithm::HS256).is_err());
        assert!(check_algorithm(Algorithm::ES256).is_err());
    }

    #[test]
    fn test_claims_username_fallback() {
        let claims: Claims = serde_json::from_str(
            r#"{"sub": "u1", "cognito:username": "alice"}"#,
        )
        .unwrap();
        assert_eq!(claims.username(), Some("alice"));

        let claims: Claims =
            serde_json::from_str(r#"{"sub": "u1", "username": "bob"}"#).unwrap();
        assert_eq!(claims.username(), Some("bob"));

        let claims: Claims = serde_json::from_str(r#"{"sub": "u1"}"#).unwrap();
        assert_eq!(claims.username(), None);
    }

    #[test]
    fn test_claims_audience_shapes() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub": "u1", "aud": "client-1"}"#).unwrap();
        assert!(matches!(claims.aud, Audience::Single(ref s) if s == "client-1"));

        let claims: Claims =
            serde_json::from_str(r#"{"sub": "u1", "aud": ["client-1", "client-2"]}"#).unwrap();
        assert!(matches!(claims.aud, Audience::Multiple(ref v) if v.len() == 2));

        let claims: Claims = serde_json::from_str(r#"{"sub": "u1"}"#).unwrap();
        assert!(matches!(claims.aud, Audience::None));
    }

    #[tokio::test]
    async fn test_disallowed_algorithm_rejected_before_key_fetch() {
        let config = crate::config::AuthorizerConfig::new("eu-west-1", "pool", "client");
        // Unroutable URL: the algorithm gate must fire before any fetch.
        let jwks = JwksCache::new(
            "https://jwks.invalid/.well-known/jwks.json".to_string(),
            Duration::from_secs(60),
            Duration::from_secs(120),
            Duration::from_secs(1),
        )
        .unwrap();

        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(Algorithm::HS256),
            &serde_json::json!({"sub": "u1", "exp": 4102444800u64}),
            &jsonwebtoken::EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = validate_id_token(&config, &jwks, &token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let config = crate::config::AuthorizerConfig::new("eu-west-1", "pool", "client");
        let jwks = JwksCache::new(
            "https://jwks.invalid/.well-known/jwks.json".to_string(),
            Duration::from_secs(60),
            Duration::from_secs(120),
            Duration::from_secs(1),
        )
        .unwrap();

        let err = validate_id_token(&config, &jwks, "not-a-jwt")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
