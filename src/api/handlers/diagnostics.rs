/*
 * Responsibility
 * - GET /api/test/firebase-test
 * - document store に 1 件書き込めるかだけを確認する
 */
use axum::{Json, extract::State};
use serde_json::Value;

use crate::{
    api::dto::MessageResponse,
    error::AppError,
    services::store::{Document, now_timestamp},
    state::AppState,
};

pub async fn firebase_test(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut doc = Document::new();
    doc.insert("timestamp".to_string(), Value::from(now_timestamp()));

    state
        .store
        .set("test", "test", doc)
        .await
        .map_err(|e| AppError::store("document store configuration error", e))?;

    Ok(Json(MessageResponse::new("Document store is properly configured")))
}
