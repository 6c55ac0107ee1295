use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use super::{ApiError, ApiResponse, AppState, PermissionsDto, UserDto, validation};
use crate::auth::{password, token};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ActivateRequest {
    pub token: String,
}

#[derive(Deserialize)]
pub struct GrantPermissionRequest {
    pub code: String,
}

/// POST /v1/users
/// Register a new, unactivated account. The activation token travels by
/// mail only; the response never contains it.
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let email = validation::validate_email(&payload.email)?.to_string();
    validation::validate_password(&payload.password)?;

    let password_hash = password::hash_async(payload.password, &state.config.security).await?;

    let user = state.store().create_user(&email, &password_hash).await?;

    let ttl_secs = state.config.security.activation_token_ttl_hours * 3600;
    let activation = token::Token::generate(user.id, ttl_secs, token::SCOPE_ACTIVATION);
    let plaintext = activation.plaintext.clone();

    state.store().insert_token(activation.into_model()).await?;

    info!(user_id = user.id, "user registered, activation token issued");

    // Mail delivery must not hold up the response
    let mailer = state.mailer.clone();
    let recipient = user.email.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer.send_activation(&recipient, &plaintext).await {
            error!("Failed to send activation mail to {recipient}: {e}");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// PUT /v1/users/activated
/// Redeem an activation token. Succeeding a second time with the same
/// token is impossible: all activation tokens for the user are dropped
/// once the account flips to activated.
pub async fn activate_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ActivateRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if !token::valid_plaintext(&payload.token) {
        return Err(ApiError::validation_field(
            "token",
            "must be 32 lowercase hex characters",
        ));
    }

    let hash = token::hash_plaintext(&payload.token);
    let user = state
        .store()
        .get_user_for_token(&hash, token::SCOPE_ACTIVATION)
        .await?
        .ok_or_else(|| {
            ApiError::validation_field("token", "invalid or expired activation token")
        })?;

    let user = state.store().activate_user(user.id, user.version).await?;

    // Awaited before responding so a 200 guarantees the token is dead
    state
        .store()
        .delete_all_tokens_for_user(token::SCOPE_ACTIVATION, user.id)
        .await?;

    info!(user_id = user.id, "account activated");

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// POST /v1/users/{id}/permissions
/// Grant a permission code to a user. Granting a code the user already
/// holds succeeds without effect.
pub async fn grant_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<GrantPermissionRequest>,
) -> Result<Json<ApiResponse<PermissionsDto>>, ApiError> {
    let id = validation::validate_id(id)?;

    let user = state
        .store()
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    let permission = state
        .store()
        .get_permission_by_code(&payload.code)
        .await?
        .ok_or_else(|| ApiError::validation_field("code", "unknown permission code"))?;

    state.store().grant_permission(user.id, permission.id).await?;

    let codes = state.store().permission_codes_for_user(user.id).await?;

    info!(user_id = user.id, code = %permission.code, "permission granted");

    Ok(Json(ApiResponse::success(PermissionsDto {
        user_id: user.id,
        codes,
    })))
}
