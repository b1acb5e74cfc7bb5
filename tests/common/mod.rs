//! Shared helpers: RSA test keypairs, token minting, and event building.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::rngs::OsRng;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};

use gateway_authorizer::{AuthorizerConfig, AuthorizerEvent};

pub const TEST_REGION: &str = "eu-west-1";
pub const TEST_POOL_ID: &str = "eu-west-1_TestPool";
pub const TEST_CLIENT_ID: &str = "test-client-id";
pub const TEST_KID: &str = "test-key-1";
pub const TEST_ROUTE_ARN: &str = "arn:aws:execute-api:eu-west-1:123456789012:api/*/GET/tasks";

/// RSA keypair whose public half can be served as a JWK.
pub struct TestKey {
    private_key: RsaPrivateKey,
    pub kid: String,
}

impl TestKey {
    pub fn generate(kid: &str) -> Self {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        Self {
            private_key,
            kid: kid.to_string(),
        }
    }

    /// Public half as a JWK object.
    pub fn jwk(&self) -> Value {
        let public_key = self.private_key.to_public_key();
        json!({
            "kid": self.kid,
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "n": URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            "e": URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        })
    }

    /// A JWKS document containing only this key.
    pub fn jwks(&self) -> Value {
        json!({ "keys": [self.jwk()] })
    }

    /// Mint an RS256 token with this key's kid in the header.
    pub fn sign(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.clone());

        let pem = self
            .private_key
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .unwrap();
        let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();

        encode(&header, claims, &key).unwrap()
    }
}

/// The issuer URL tokens must carry for the test pool.
pub fn issuer() -> String {
    format!("https://cognito-idp.{TEST_REGION}.amazonaws.com/{TEST_POOL_ID}")
}

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Well-formed claims for a token expiring `ttl` from now.
pub fn valid_claims(ttl: Duration) -> Value {
    json!({
        "sub": "u1",
        "email": "a@b.com",
        "iss": issuer(),
        "aud": TEST_CLIENT_ID,
        "iat": now(),
        "exp": now() + ttl.as_secs(),
    })
}

/// Config pointed at a mock JWKS endpoint.
pub fn test_config(jwks_url: &str) -> AuthorizerConfig {
    let mut config = AuthorizerConfig::new(TEST_REGION, TEST_POOL_ID, TEST_CLIENT_ID);
    config.jwks_endpoint = Some(jwks_url.to_string());
    config
}

/// HTTP API event with the given cookie header.
pub fn http_api_event(cookie: &str) -> AuthorizerEvent {
    serde_json::from_value(json!({
        "headers": { "cookie": cookie },
        "routeArn": TEST_ROUTE_ARN,
    }))
    .unwrap()
}

/// REST API event with the given cookie header.
pub fn rest_api_event(cookie: &str) -> AuthorizerEvent {
    serde_json::from_value(json!({
        "headers": { "Cookie": cookie },
        "methodArn": TEST_ROUTE_ARN,
    }))
    .unwrap()
}
