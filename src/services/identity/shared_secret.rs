use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use crate::services::identity::verifier::{Identity, IdentityVerifier, VerifyError};

/// HS256 verifier for local development and tests.
///
/// Tokens must carry `sub` and `exp`; `iss`/`aud` are checked only when configured.
pub struct SharedSecretVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for SharedSecretVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("SharedSecretVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl SharedSecretVerifier {
    pub fn new(
        secret: &str,
        issuer: Option<&str>,
        audience: Option<&str>,
        leeway_seconds: u64,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = leeway_seconds;

        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for SharedSecretVerifier {
    fn name(&self) -> &'static str {
        "shared_secret"
    }

    async fn verify(&self, credential: &str) -> Result<Identity, VerifyError> {
        let data = jsonwebtoken::decode::<Map<String, Value>>(
            credential,
            &self.decoding_key,
            &self.validation,
        )?;

        Identity::from_claims(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn mint(claims: Value, secret: &str) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn exp_in(seconds: i64) -> i64 {
        chrono::Utc::now().timestamp() + seconds
    }

    #[tokio::test]
    async fn valid_token_yields_its_subject() {
        let verifier = SharedSecretVerifier::new(SECRET, None, None, 0);
        let token = mint(json!({"sub": "u1", "exp": exp_in(600), "role": "x"}), SECRET);

        let identity = verifier.verify(&token).await.unwrap();
        assert_eq!(identity.subject_id, "u1");
        assert_eq!(identity.claims["role"], "x");
    }

    #[tokio::test]
    async fn expired_or_foreign_tokens_are_rejected() {
        let verifier = SharedSecretVerifier::new(SECRET, None, None, 0);

        let expired = mint(json!({"sub": "u1", "exp": exp_in(-600)}), SECRET);
        assert!(matches!(
            verifier.verify(&expired).await,
            Err(VerifyError::Invalid(_))
        ));

        let foreign = mint(json!({"sub": "u1", "exp": exp_in(600)}), "other-secret");
        assert!(matches!(
            verifier.verify(&foreign).await,
            Err(VerifyError::Invalid(_))
        ));

        assert!(matches!(
            verifier.verify("not-a-jwt").await,
            Err(VerifyError::Malformed)
        ));
    }

    #[tokio::test]
    async fn configured_issuer_and_audience_are_enforced() {
        let verifier = SharedSecretVerifier::new(SECRET, Some("helpity"), Some("gateway"), 0);

        let ok = mint(
            json!({"sub": "u1", "exp": exp_in(600), "iss": "helpity", "aud": "gateway"}),
            SECRET,
        );
        assert!(verifier.verify(&ok).await.is_ok());

        let wrong_aud = mint(
            json!({"sub": "u1", "exp": exp_in(600), "iss": "helpity", "aud": "other"}),
            SECRET,
        );
        assert!(verifier.verify(&wrong_aud).await.is_err());
    }

    #[tokio::test]
    async fn token_without_subject_is_rejected() {
        let verifier = SharedSecretVerifier::new(SECRET, None, None, 0);
        let token = mint(json!({"exp": exp_in(600)}), SECRET);
        assert!(verifier.verify(&token).await.is_err());
    }
}
