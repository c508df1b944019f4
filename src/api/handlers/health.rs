/*
 * Responsibility
 * - GET / と GET /health (疎通用, 認証なし)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::services::store::now_timestamp;

pub async fn root() -> impl IntoResponse {
    Json(json!({"message": "Welcome to the Helpity API"}))
}

pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "timestamp": now_timestamp()})),
    )
}
