/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - Token verification lives in services::identity; this is only the contract type
 * - Only the auth middleware can build one, so every AuthCtx a handler sees comes
 *   from a successful verification in the same request
 */
use crate::services::identity::Identity;

/// 認証済みのリクエストに付与されるコンテキスト
#[derive(Debug, Clone)]
pub struct AuthCtx {
    identity: Identity,
}

impl AuthCtx {
    pub(crate) fn new(identity: Identity) -> Self {
        Self { identity }
    }

    /// Document key for everything the caller owns.
    pub fn subject_id(&self) -> &str {
        &self.identity.subject_id
    }
}
