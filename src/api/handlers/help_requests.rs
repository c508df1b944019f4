/*
 * Responsibility
 * - help request の作成 / 自分の一覧 (seeker 側)
 * - open 一覧 / accept (helper 側, profile の userType で判定)
 */
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    api::{
        dto::help_requests::{
            CreateHelpRequestRequest, HelpRequestAckResponse, HelpRequestResponse,
        },
        extractors::{AuthCtx, AuthCtxExtractor},
    },
    error::AppError,
    repos::{
        help_request_repo::{self, HelpRequestRow, HelpRequestStatus, NewHelpRequest},
        user_repo::{self, UserType},
    },
    services::store::DocumentStore,
    state::AppState,
};

fn to_responses(rows: Vec<HelpRequestRow>) -> Json<Vec<HelpRequestResponse>> {
    Json(rows.into_iter().map(Into::into).collect())
}

/// The caller must have a profile and be a helper.
async fn require_helper(store: &dyn DocumentStore, ctx: &AuthCtx) -> Result<(), AppError> {
    let profile = user_repo::get(store, ctx.subject_id())
        .await
        .map_err(|e| AppError::store("failed to fetch profile", e))?
        .ok_or(AppError::not_found("user"))?;

    if profile.user_type != UserType::Helper {
        return Err(AppError::Forbidden("only helpers can do this"));
    }
    Ok(())
}

pub async fn create(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    body: Result<Json<CreateHelpRequestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<HelpRequestAckResponse>), AppError> {
    let Json(req) = body?;
    req.validate().map_err(AppError::BadRequest)?;

    let new = NewHelpRequest {
        owner_id: ctx.subject_id(),
        title: &req.title,
        description: &req.description,
        location: req.location,
        urgency: &req.urgency,
    };
    let row = help_request_repo::create(state.store.as_ref(), new)
        .await
        .map_err(|e| AppError::store("failed to create help request", e))?;

    Ok((
        StatusCode::CREATED,
        Json(HelpRequestAckResponse {
            message: "Help request created successfully",
            request_id: row.id,
        }),
    ))
}

pub async fn list_mine(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<Vec<HelpRequestResponse>>, AppError> {
    let rows = help_request_repo::list_by_owner(state.store.as_ref(), ctx.subject_id())
        .await
        .map_err(|e| AppError::store("failed to fetch help requests", e))?;

    Ok(to_responses(rows))
}

pub async fn list_open(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<Vec<HelpRequestResponse>>, AppError> {
    let store = state.store.as_ref();
    require_helper(store, &ctx).await?;

    let rows = help_request_repo::list_open(store)
        .await
        .map_err(|e| AppError::store("failed to fetch help requests", e))?;

    Ok(to_responses(rows))
}

pub async fn accept(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(request_id): Path<String>,
) -> Result<Json<HelpRequestAckResponse>, AppError> {
    let store = state.store.as_ref();
    require_helper(store, &ctx).await?;

    let request = help_request_repo::get(store, &request_id)
        .await
        .map_err(|e| AppError::store("failed to fetch help request", e))?
        .ok_or(AppError::not_found("help request"))?;

    if request.owner_id == ctx.subject_id() {
        return Err(AppError::Forbidden("cannot accept your own help request"));
    }
    if request.status != HelpRequestStatus::Open {
        return Err(AppError::Conflict(format!(
            "help request {request_id} is not open"
        )));
    }

    let accepted = help_request_repo::accept(store, &request_id, ctx.subject_id())
        .await
        .map_err(|e| AppError::store("failed to accept help request", e))?;
    if !accepted {
        return Err(AppError::not_found("help request"));
    }

    tracing::info!(request_id = %request_id, helper = %ctx.subject_id(), "help request accepted");

    Ok(Json(HelpRequestAckResponse {
        message: "Help request accepted",
        request_id,
    }))
}
