/// Factory: build the configured `IdentityVerifier` from application `Config`.
use std::sync::Arc;

use crate::config::{Config, ConfigError, VerifierKind};
use crate::services::identity::IdentityVerifier;
use crate::services::identity::firebase::FirebaseVerifier;
use crate::services::identity::shared_secret::SharedSecretVerifier;

pub fn build_identity_verifier(config: &Config) -> Result<Arc<dyn IdentityVerifier>, ConfigError> {
    let verifier: Arc<dyn IdentityVerifier> = match config.identity_verifier {
        VerifierKind::Firebase => {
            let project_id = config
                .firebase_project_id
                .as_deref()
                .ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))?;
            Arc::new(FirebaseVerifier::new(project_id, config.auth_leeway_seconds))
        }
        VerifierKind::SharedSecret => {
            let secret = config
                .auth_shared_secret
                .as_deref()
                .ok_or(ConfigError::Missing("AUTH_SHARED_SECRET"))?;
            Arc::new(SharedSecretVerifier::new(
                secret,
                config.auth_issuer.as_deref(),
                config.auth_audience.as_deref(),
                config.auth_leeway_seconds,
            ))
        }
    };

    tracing::info!(verifier = verifier.name(), "identity verifier ready");
    Ok(verifier)
}
