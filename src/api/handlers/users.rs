/*
 * Responsibility
 * - /users/register, /users/profile, /protected/profile
 * - profile の key は常に AuthCtx の subject id (body の uid は register のみ)
 */
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    api::{
        dto::{
            MessageResponse,
            users::{RegisterRequest, UpdateProfileRequest, UserProfileResponse},
        },
        extractors::{AuthCtx, AuthCtxExtractor},
    },
    error::AppError,
    repos::user_repo::{self, NewUser, ProfileChanges},
    state::AppState,
};

/// `auth` is only present when registration sits behind the auth middleware;
/// then the body `uid` must name the caller.
pub async fn register(
    State(state): State<AppState>,
    auth: Option<Extension<AuthCtx>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let Json(req) = body?;
    let user_type = req.validate().map_err(AppError::BadRequest)?;

    if let Some(Extension(ctx)) = &auth
        && ctx.subject_id() != req.uid
    {
        return Err(AppError::Forbidden("uid does not match the authenticated user"));
    }

    let user = NewUser {
        email: &req.email,
        display_name: &req.display_name,
        user_type,
    };
    user_repo::register(state.store.as_ref(), &req.uid, user)
        .await
        .map_err(|e| AppError::store("failed to register user", e))?;

    tracing::info!(uid = %req.uid, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

pub async fn get_profile(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<UserProfileResponse>, AppError> {
    let row = user_repo::get(state.store.as_ref(), ctx.subject_id())
        .await
        .map_err(|e| AppError::store("failed to fetch profile", e))?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(req) = body?;
    req.validate().map_err(AppError::BadRequest)?;

    let changes = ProfileChanges {
        display_name: req.display_name.as_deref(),
        phone_number: req.phone_number.as_deref(),
        address: req.address.as_deref(),
    };
    let updated = user_repo::update(state.store.as_ref(), ctx.subject_id(), changes)
        .await
        .map_err(|e| AppError::store("failed to update profile", e))?;

    if !updated {
        return Err(AppError::not_found("user"));
    }

    Ok(Json(MessageResponse::new("Profile updated successfully")))
}
