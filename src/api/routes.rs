/*
 * Responsibility
 * - /api 配下の URL 構造を定義
 * - /test, /protected, /users, /help-requests を nest
 * - Bearer が必要な範囲にだけ route_layer で access middleware を掛ける
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    api::handlers::{
        diagnostics::firebase_test,
        help_requests::{accept, create, list_mine, list_open},
        users::{get_profile, register, update_profile},
    },
    middleware::auth::access,
    state::AppState,
};

pub fn routes(state: &AppState, register_require_auth: bool) -> Router<AppState> {
    Router::new()
        .nest("/test", Router::new().route("/firebase-test", get(firebase_test)))
        .nest("/protected", protected(state))
        .nest("/users", users(state, register_require_auth))
        .nest("/help-requests", help_requests(state))
}

fn protected(state: &AppState) -> Router<AppState> {
    let router = Router::new().route("/profile", get(get_profile));
    access::apply(router, state.clone())
}

fn users(state: &AppState, register_require_auth: bool) -> Router<AppState> {
    let authed = Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/help-requests", get(list_mine).post(create));
    let authed = access::apply(authed, state.clone());

    let mut open = Router::new().route("/register", post(register));
    if register_require_auth {
        open = access::apply(open, state.clone());
    }

    authed.merge(open)
}

fn help_requests(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/open", get(list_open))
        .route("/{id}/accept", post(accept));
    access::apply(router, state.clone())
}
