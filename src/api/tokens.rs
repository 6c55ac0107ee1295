use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::{ApiError, ApiResponse, AppState, TokenDto, validation};
use crate::auth::{password, token};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /v1/tokens/authentication
/// Exchange email and password for a bearer token. Unknown email and
/// wrong password are the same 401; activation is not required to log
/// in, only to pass the activated gate later.
pub async fn create_authentication_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenDto>>), ApiError> {
    let email = validation::validate_email(&payload.email)?.to_string();
    validation::validate_password(&payload.password)?;

    let user = state
        .store()
        .get_user_by_email(&email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let matches = password::verify_async(payload.password, user.password_hash.clone()).await?;
    if !matches {
        return Err(ApiError::InvalidCredentials);
    }

    let ttl_secs = state.config.security.authentication_token_ttl_hours * 3600;
    let auth_token = token::Token::generate(user.id, ttl_secs, token::SCOPE_AUTHENTICATION);
    let dto = TokenDto {
        token: auth_token.plaintext.clone(),
        expiry: auth_token.expiry,
    };

    state.store().insert_token(auth_token.into_model()).await?;

    info!(user_id = user.id, "authentication token issued");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
}
