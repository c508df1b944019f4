/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - store: DocumentStore, verifier: IdentityVerifier
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - Read-only after startup: nothing request-scoped lives here
 */
use std::sync::Arc;

use crate::services::{identity::IdentityVerifier, store::DocumentStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { store, verifier }
    }
}
