use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use serde_json::{Map, Value};
use thiserror::Error;

/// Max length of a Firebase uid.
const MAX_SUBJECT_LEN: usize = 128;

/// A verified caller: subject id plus every claim of the credential.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub subject_id: String,
    pub claims: Map<String, Value>,
}

impl Identity {
    /// Promote decoded claims to an `Identity`.
    ///
    /// `sub` is used verbatim; values with surrounding whitespace are rejected, never trimmed.
    pub fn from_claims(claims: Map<String, Value>) -> Result<Self, VerifyError> {
        let subject_id = claims
            .get("sub")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty() && s.trim() == *s && s.len() <= MAX_SUBJECT_LEN)
            .ok_or(VerifyError::InvalidSubject)?
            .to_string();

        Ok(Self { subject_id, claims })
    }

    /// `firebase.sign_in_provider` (e.g. `password`, `google.com`) when present.
    pub fn sign_in_provider(&self) -> Option<&str> {
        self.claims
            .get("firebase")
            .and_then(|f| f.get("sign_in_provider"))
            .and_then(Value::as_str)
    }
}

/// Why a credential was rejected.
///
/// Messages never contain the credential itself, so they are safe to log.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed credential")]
    Malformed,
    #[error("unknown signing key")]
    UnknownKey,
    #[error("invalid credential: {0}")]
    Invalid(String),
    #[error("missing or invalid subject")]
    InvalidSubject,
    #[error("verifier backend failure: {0}")]
    Backend(String),
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::Malformed,
            ErrorKind::InvalidSubject => Self::InvalidSubject,
            _ => Self::Invalid(e.to_string()),
        }
    }
}

/// Turns an opaque bearer credential into a verified `Identity`.
///
/// Shared behind `Arc<dyn IdentityVerifier>` for the whole process.
#[async_trait]
pub trait IdentityVerifier: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn verify(&self, credential: &str) -> Result<Identity, VerifyError>;
}
