/// Factory: build the configured `DocumentStore` from application `Config`.
use std::sync::Arc;

use crate::config::{Config, ConfigError, StoreBackend};
use crate::services::store::firestore::{FirestoreStore, ServiceAccountKey};
use crate::services::store::{DocumentStore, MemoryStore};

pub fn build_document_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Firestore => {
            let project_id = config
                .firebase_project_id
                .as_deref()
                .ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))?;

            match config.firestore_emulator_host.as_deref() {
                Some(host) => Arc::new(FirestoreStore::emulator(project_id, host)?),
                None => {
                    let key = ServiceAccountKey {
                        client_email: config
                            .firebase_client_email
                            .clone()
                            .ok_or(ConfigError::Missing("FIREBASE_CLIENT_EMAIL"))?,
                        private_key_pem: config
                            .firebase_private_key_pem
                            .clone()
                            .ok_or(ConfigError::Missing("FIREBASE_PRIVATE_KEY"))?,
                        token_uri: config.firebase_token_uri.clone(),
                    };
                    Arc::new(FirestoreStore::new(project_id, key)?)
                }
            }
        }
    };

    tracing::info!(backend = store.backend_name(), "document store ready");
    Ok(store)
}
