//! Firebase Authentication ID token verification.
//!
//! ID tokens are RS256 JWTs signed by `securetoken@system.gserviceaccount.com`.
//! A token is accepted when:
//! - the header names RS256 and a `kid` present in Google's published JWK set
//! - the signature verifies with that key
//! - `iss` is `https://securetoken.google.com/<project>` and `aud` is `<project>`
//! - `exp` is in the future, `iat` and `auth_time` are not (leeway applies)
//! - `sub` is a non-empty string
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::services::identity::verifier::{Identity, IdentityVerifier, VerifyError};

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

// Google rotates signing keys every few hours.
const KEY_SET_MAX_AGE: Duration = Duration::from_secs(60 * 60);
// Unknown `kid`s trigger a refetch, but not more often than this.
const KEY_SET_MIN_REFRESH: Duration = Duration::from_secs(60);

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

pub struct FirebaseVerifier {
    project_id: String,
    jwks_url: String,
    http: reqwest::Client,
    validation: Validation,
    leeway_seconds: u64,
    keys: RwLock<Option<CachedKeys>>,
}

impl std::fmt::Debug for FirebaseVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseVerifier")
            .field("project_id", &self.project_id)
            .field("jwks_url", &self.jwks_url)
            .finish()
    }
}

impl FirebaseVerifier {
    pub fn new(project_id: &str, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[format!("{ISSUER_PREFIX}{project_id}")]);
        validation.set_audience(&[project_id]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "aud", "iss"]);
        validation.leeway = leeway_seconds;

        Self {
            project_id: project_id.to_string(),
            jwks_url: JWKS_URL.to_string(),
            http: reqwest::Client::new(),
            validation,
            leeway_seconds,
            keys: RwLock::new(None),
        }
    }

    #[cfg(test)]
    fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    async fn fetch_keys(&self) -> Result<JwkSet, VerifyError> {
        let resp = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| VerifyError::Backend(e.to_string()))?
            .error_for_status()
            .map_err(|e| VerifyError::Backend(e.to_string()))?;

        let set: JwkSet = resp
            .json()
            .await
            .map_err(|e| VerifyError::Backend(format!("invalid key set: {e}")))?;

        tracing::debug!(keys = set.keys.len(), "firebase signing keys refreshed");
        Ok(set)
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, VerifyError> {
        {
            let keys = self.keys.read().await;
            if let Some(cached) = keys.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < KEY_SET_MAX_AGE {
                    match cached.set.find(kid) {
                        Some(jwk) => return to_decoding_key(jwk),
                        None if age < KEY_SET_MIN_REFRESH => return Err(VerifyError::UnknownKey),
                        None => {}
                    }
                }
            }
        }

        let set = self.fetch_keys().await?;
        let key = set
            .find(kid)
            .map(to_decoding_key)
            .unwrap_or(Err(VerifyError::UnknownKey));

        *self.keys.write().await = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });

        key
    }
}

fn to_decoding_key(jwk: &jsonwebtoken::jwk::Jwk) -> Result<DecodingKey, VerifyError> {
    DecodingKey::from_jwk(jwk).map_err(|e| VerifyError::Backend(format!("unusable signing key: {e}")))
}

/// `iat` and `auth_time` must not lie in the future.
fn check_issue_times(claims: &Map<String, Value>, now: i64, leeway: u64) -> Result<(), VerifyError> {
    let latest = now.saturating_add(leeway as i64);

    for name in ["iat", "auth_time"] {
        let at = claims
            .get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| VerifyError::Invalid(format!("missing '{name}' claim")))?;
        if at > latest {
            return Err(VerifyError::Invalid(format!("'{name}' is in the future")));
        }
    }
    Ok(())
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    fn name(&self) -> &'static str {
        "firebase"
    }

    async fn verify(&self, credential: &str) -> Result<Identity, VerifyError> {
        let header = jsonwebtoken::decode_header(credential)?;
        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::Invalid(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header.kid.ok_or(VerifyError::UnknownKey)?;

        let key = self.decoding_key(&kid).await?;
        let data = jsonwebtoken::decode::<Map<String, Value>>(credential, &key, &self.validation)?;

        check_issue_times(&data.claims, chrono::Utc::now().timestamp(), self.leeway_seconds)?;

        Identity::from_claims(data.claims)
    }
}
