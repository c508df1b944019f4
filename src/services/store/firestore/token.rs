use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::services::store::client::{StoreError, StoreResult};

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL_SECONDS: i64 = 3600;
// Refresh a cached token this long before Google considers it expired.
const REFRESH_MARGIN_SECONDS: i64 = 60;

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// OAuth2 access tokens for a Google service account (JWT bearer grant).
///
/// The assertion is signed locally with the account's RSA key and exchanged at
/// the token endpoint. The resulting token is reused until shortly before it
/// expires; concurrent callers wait on the same refresh.
pub struct ServiceAccountTokenSource {
    client_email: String,
    encoding_key: EncodingKey,
    token_uri: String,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for ServiceAccountTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material or tokens
        f.debug_struct("ServiceAccountTokenSource")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountTokenSource {
    pub fn new(
        client_email: impl Into<String>,
        private_key_pem: &str,
        token_uri: impl Into<String>,
        http: reqwest::Client,
    ) -> StoreResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| StoreError::Auth(format!("invalid service account private key: {e}")))?;

        Ok(Self {
            client_email: client_email.into(),
            encoding_key,
            token_uri: token_uri.into(),
            http,
            cached: Mutex::new(None),
        })
    }

    pub async fn access_token(&self) -> StoreResult<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref()
            && token.expires_at - Duration::seconds(REFRESH_MARGIN_SECONDS) > now
        {
            return Ok(token.access_token.clone());
        }

        let fresh = self.fetch(now).await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);

        Ok(access_token)
    }

    fn assertion(&self, now: DateTime<Utc>) -> StoreResult<String> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_TTL_SECONDS,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| StoreError::Auth(format!("failed to sign token assertion: {e}")))
    }

    async fn fetch(&self, now: DateTime<Utc>) -> StoreResult<CachedToken> {
        let assertion = self.assertion(now)?;

        let resp = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Auth(format!("invalid token response: {e}")))?;

        tracing::debug!(expires_in = body.expires_in, "service account token refreshed");

        Ok(CachedToken {
            access_token: body.access_token,
            expires_at: now + Duration::seconds(body.expires_in),
        })
    }
}
