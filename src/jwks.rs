//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! The cache is process-wide and time-bounded: reads are concurrent, a
//! refresh is single-flight (one fetch in flight, other callers wait on the
//! refresh lock), and a failed refresh falls back to the previous key set as
//! long as it is younger than the hard staleness bound.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{AuthError, Result};

/// JWKS response from the well-known endpoint.
#[derive(Debug, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// Individual JSON Web Key. Only RSA signing keys are usable here.
#[derive(Debug, Deserialize)]
pub struct Jwk {
    /// Key type. Anything but "RSA" is skipped.
    pub kty: String,
    /// Key ID. Keys without one cannot be matched against a token header.
    pub kid: Option<String>,
    /// Advertised algorithm.
    pub alg: Option<String>,
    /// Key use (sig, enc).
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    /// RSA modulus (base64url).
    pub n: Option<String>,
    /// RSA exponent (base64url).
    pub e: Option<String>,
}

struct KeySet {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
}

/// Kid-indexed cache of decoding keys, refreshed from a JWKS endpoint.
pub struct JwksCache {
    jwks_url: String,
    refresh_interval: Duration,
    max_stale: Duration,
    http_client: reqwest::Client,
    keys: RwLock<Option<KeySet>>,
    /// Single-flight guard: at most one refresh in flight.
    refresh_lock: Mutex<()>,
}

impl JwksCache {
    /// Create a new cache. The first fetch happens lazily on first lookup.
    pub fn new(
        jwks_url: String,
        refresh_interval: Duration,
        max_stale: Duration,
        fetch_timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| AuthError::Misconfigured(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            jwks_url,
            refresh_interval,
            max_stale,
            http_client,
            keys: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Get a decoding key by key ID.
    ///
    /// A miss triggers exactly one forced refresh before giving up, so a
    /// freshly rotated key does not strand callers for a full TTL.
    pub async fn get_key(&self, kid: &str) -> Result<DecodingKey> {
        self.ensure_fresh().await?;

        let observed_at = {
            let guard = self.keys.read().await;
            match &*guard {
                Some(set) => {
                    if let Some(key) = set.keys.get(kid) {
                        return Ok(key.clone());
                    }
                    Some(set.fetched_at)
                }
                None => None,
            }
        };

        debug!(kid = %kid, "kid not in cached key set, forcing refresh");
        if let Err(e) = self.refresh_after_miss(observed_at).await {
            // The set we already consulted stays authoritative for the
            // miss; the fetch failure is only worth a warning here.
            warn!(error = %e, "forced JWKS refresh failed");
        }

        let guard = self.keys.read().await;
        guard
            .as_ref()
            .and_then(|set| set.keys.get(kid))
            .cloned()
            .ok_or_else(|| AuthError::UnknownSigningKey(kid.to_string()))
    }

    /// Refresh the key set if it is missing or past the refresh interval.
    async fn ensure_fresh(&self) -> Result<()> {
        if self.is_fresh().await {
            return Ok(());
        }

        let _flight = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        if self.is_fresh().await {
            return Ok(());
        }

        match self.fetch().await {
            Ok(set) => {
                info!(url = %self.jwks_url, key_count = set.keys.len(), "key set refreshed");
                *self.keys.write().await = Some(set);
                Ok(())
            }
            Err(e) => {
                let guard = self.keys.read().await;
                if let Some(set) = &*guard {
                    if set.fetched_at.elapsed() < self.max_stale {
                        warn!(
                            error = %e,
                            age_secs = set.fetched_at.elapsed().as_secs(),
                            "key set refresh failed, serving stale set"
                        );
                        return Ok(());
                    }
                }
                Err(e)
            }
        }
    }

    /// Forced refresh after a kid miss. Skipped if another caller already
    /// replaced the set we observed the miss against.
    async fn refresh_after_miss(&self, observed_at: Option<Instant>) -> Result<()> {
        let _flight = self.refresh_lock.lock().await;

        {
            let guard = self.keys.read().await;
            if guard.as_ref().map(|s| s.fetched_at) != observed_at {
                return Ok(());
            }
        }

        let set = self.fetch().await?;
        *self.keys.write().await = Some(set);
        Ok(())
    }

    async fn is_fresh(&self) -> bool {
        let guard = self.keys.read().await;
        matches!(&*guard, Some(set) if set.fetched_at.elapsed() < self.refresh_interval)
    }

    /// One GET against the well-known endpoint.
    async fn fetch(&self) -> Result<KeySet> {
        debug!(url = %self.jwks_url, "fetching key set");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::KeySetUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeySetUnavailable(format!(
                "endpoint returned status {}",
                response.status()
            )));
        }

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| AuthError::KeySetUnavailable(format!("failed to parse key set: {e}")))?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            if jwk.key_use.as_deref() == Some("enc") {
                continue;
            }
            let Some(kid) = jwk.kid.clone() else {
                debug!(kty = %jwk.kty, "skipping key without kid");
                continue;
            };
            match jwk_to_decoding_key(&jwk) {
                Ok(key) => {
                    debug!(kid = %kid, kty = %jwk.kty, "loaded signing key");
                    keys.insert(kid, key);
                }
                Err(e) => {
                    warn!(kid = %kid, kty = %jwk.kty, error = %e, "skipping unusable key");
                }
            }
        }

        if keys.is_empty() {
            return Err(AuthError::KeySetUnavailable(
                "no usable signing keys in key set".into(),
            ));
        }

        Ok(KeySet {
            keys,
            fetched_at: Instant::now(),
        })
    }
}

/// Convert an RSA JWK into a decoding key.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey> {
    if jwk.kty != "RSA" {
        return Err(AuthError::KeySetUnavailable(format!(
            "unsupported key type: {}",
            jwk.kty
        )));
    }

    let n = jwk
        .n
        .as_ref()
        .ok_or_else(|| AuthError::KeySetUnavailable("RSA key missing 'n'".into()))?;
    let e = jwk
        .e
        .as_ref()
        .ok_or_else(|| AuthError::KeySetUnavailable("RSA key missing 'e'".into()))?;

    DecodingKey::from_rsa_components(n, e)
        .map_err(|e| AuthError::KeySetUnavailable(format!("bad RSA components: {e}")))
}
