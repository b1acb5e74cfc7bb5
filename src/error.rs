//! Authorization error taxonomy.
//!
//! Every failure the authorizer can hit maps to exactly one variant here.
//! At the gateway boundary all variants collapse into a single opaque
//! "Unauthorized" signal; the variant is logged before collapsing so
//! operators can tell configuration bugs from genuine auth failures.

use thiserror::Error;

/// Authorization errors, ordered roughly by the gate they occur at.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable token was presented: the `cookie` header is absent or
    /// empty, or it carries no `id_token` entry.
    #[error("no usable credential presented")]
    MissingCredential,

    /// Required configuration is absent or invalid. This is an operator
    /// problem, not a caller problem, but it still denies access.
    #[error("authorizer misconfigured: {0}")]
    Misconfigured(String),

    /// The JWKS endpoint could not be reached, returned a non-2xx status,
    /// or the fetch exceeded the request deadline.
    #[error("key set unavailable: {0}")]
    KeySetUnavailable(String),

    /// The token names a `kid` that is not present in the fetched key set,
    /// even after a forced refresh.
    #[error("unknown signing key: {0}")]
    UnknownSigningKey(String),

    /// The token's `exp` claim is in the past.
    #[error("token expired")]
    TokenExpired,

    /// Signature mismatch, audience/issuer mismatch, disallowed algorithm,
    /// or a malformed token or payload.
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

impl AuthError {
    /// Stable short name for structured logging.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::Misconfigured(_) => "misconfigured",
            AuthError::KeySetUnavailable(_) => "key_set_unavailable",
            AuthError::UnknownSigningKey(_) => "unknown_signing_key",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidToken(_) => "invalid_token",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidToken("signature mismatch".into()),
            ErrorKind::InvalidAudience => AuthError::InvalidToken("audience mismatch".into()),
            ErrorKind::InvalidIssuer => AuthError::InvalidToken("issuer mismatch".into()),
            ErrorKind::InvalidAlgorithm => {
                AuthError::InvalidToken("algorithm not allowed".into())
            }
            ErrorKind::ImmatureSignature => {
                AuthError::InvalidToken("token not yet valid".into())
            }
            _ => AuthError::InvalidToken(err.to_string()),
        }
    }
}

/// Result alias for authorizer operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// The single signal the invoking gateway sees on any denial.
///
/// The gateway authorizer protocol offers no richer error channel, so every
/// [`AuthError`] collapses into this at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unauthorized;

impl std::fmt::Display for Unauthorized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unauthorized")
    }
}

impl std::error::Error for Unauthorized {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AuthError::MissingCredential.to_string(),
            "no usable credential presented"
        );
        assert_eq!(AuthError::TokenExpired.to_string(), "token expired");
        assert_eq!(
            AuthError::UnknownSigningKey("key-1".into()).to_string(),
            "unknown signing key: key-1"
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(AuthError::MissingCredential.kind(), "missing_credential");
        assert_eq!(
            AuthError::Misconfigured("x".into()).kind(),
            "misconfigured"
        );
        assert_eq!(AuthError::TokenExpired.kind(), "token_expired");
    }

    #[test]
    fn test_from_jsonwebtoken_expired() {
        let jwt_err = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::ExpiredSignature,
        );
        let err: AuthError = jwt_err.into();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn test_from_jsonwebtoken_audience() {
        let jwt_err =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidAudience);
        let err: AuthError = jwt_err.into();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_unauthorized_display() {
        assert_eq!(Unauthorized.to_string(), "Unauthorized");
    }
}
