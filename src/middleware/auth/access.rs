//! Bearer credential 検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization: Bearer <credential>` を受け取り、IdentityVerifier で検証する
//! - 成功: `AuthCtx` を request extensions に格納して downstream handler を呼ぶ
//! - 失敗: 401 + JSON error body。downstream handler は呼ばない
//!
//! This is the only place an `AuthCtx` is created. Credentials are never logged.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// protected routes に認証を掛けるための middleware を適用する。
///
/// `route_layer` なので、この router に登録済みの route にだけ掛かる。
/// 例：
/// ```ignore
/// let protected = Router::new().route("/profile", get(get_profile));
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

/// `Authorization: Bearer <credential>` から `<credential>` を取り出す。
/// ヘッダが無い・形式が違う・credential が空なら None。
pub(crate) fn bearer_credential(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let credential = value.strip_prefix("Bearer ")?.trim();

    (!credential.is_empty()).then_some(credential)
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let credential = bearer_credential(req.headers())
        .ok_or(AppError::Unauthorized("missing or malformed bearer credential"))?;

    let identity = match state.verifier.verify(credential).await {
        Ok(identity) => identity,
        Err(err) => {
            tracing::warn!(
                error = %err,
                verifier = state.verifier.name(),
                "credential verification failed"
            );
            return Err(AppError::Unauthorized("invalid credential"));
        }
    };

    tracing::debug!(
        subject = %identity.subject_id,
        provider = identity.sign_in_provider().unwrap_or("-"),
        "request authenticated"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::new(identity));

    Ok(next.run(req).await)
}
