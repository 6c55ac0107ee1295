use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::auth::token;

/// Identity attached to every request by [`identify`]. Downstream gates
/// read it from request extensions; its absence means the gate chain was
/// wired wrong, not that the caller is anonymous.
#[derive(Debug, Clone)]
pub enum CurrentUser {
    Anonymous,
    Known(AuthenticatedUser),
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub email: String,
    pub activated: bool,
}

/// First gate, applied to every route. Resolves the Authorization header
/// to an identity, or records the caller as anonymous when the header is
/// absent. A header that is present but does not resolve to a live
/// authentication token is rejected outright.
///
/// The checks run cheapest-first: scheme, then plaintext shape, then the
/// store lookup. A malformed token never reaches the database.
pub async fn identify(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match request.headers().get(header::AUTHORIZATION) {
        None => CurrentUser::Anonymous,
        Some(value) => {
            let value = value.to_str().map_err(|_| ApiError::InvalidToken)?;
            // Exactly "Bearer <token>"; padding fails the shape check below
            let plaintext = value
                .strip_prefix("Bearer ")
                .ok_or(ApiError::InvalidToken)?;

            if !token::valid_plaintext(plaintext) {
                return Err(ApiError::InvalidToken);
            }

            let hash = token::hash_plaintext(plaintext);
            let user = state
                .store()
                .get_user_for_token(&hash, token::SCOPE_AUTHENTICATION)
                .await?
                .ok_or(ApiError::InvalidToken)?;

            CurrentUser::Known(AuthenticatedUser {
                id: user.id,
                email: user.email,
                activated: user.activated,
            })
        }
    };

    request.extensions_mut().insert(identity);

    let mut response = next.run(request).await;
    // Responses differ by credential, so caches must key on the header
    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));

    Ok(response)
}

/// A gate running without [`identify`] in front of it is a wiring bug,
/// not an anonymous caller; treating it as anonymous would hide the bug.
fn current_identity(request: &Request) -> &CurrentUser {
    request
        .extensions()
        .get::<CurrentUser>()
        .expect("auth gate reached without the identity middleware in front of it")
}

/// Rejects anonymous callers. Anonymous on a protected route is always
/// 401, never 403: the caller's problem is missing credentials, not
/// missing rights.
pub async fn require_authenticated(request: Request, next: Next) -> Result<Response, ApiError> {
    match current_identity(&request) {
        CurrentUser::Known(_) => Ok(next.run(request).await),
        CurrentUser::Anonymous => Err(ApiError::AuthenticationRequired),
    }
}

/// Rejects authenticated-but-unactivated accounts. Sits inside
/// [`require_authenticated`], but handles the anonymous arm itself so it
/// is safe on a route of its own.
pub async fn require_activated(request: Request, next: Next) -> Result<Response, ApiError> {
    match current_identity(&request) {
        CurrentUser::Known(user) if user.activated => Ok(next.run(request).await),
        CurrentUser::Known(_) => Err(ApiError::InactiveAccount),
        CurrentUser::Anonymous => Err(ApiError::AuthenticationRequired),
    }
}

/// Innermost gate: the caller must hold one specific permission code.
/// Re-checks the outer conditions so the gate is safe even if attached
/// to a route on its own.
pub async fn require_permission(
    State((state, code)): State<(Arc<AppState>, &'static str)>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = match current_identity(&request) {
        CurrentUser::Known(user) => user.clone(),
        CurrentUser::Anonymous => return Err(ApiError::AuthenticationRequired),
    };

    if !user.activated {
        return Err(ApiError::InactiveAccount);
    }

    if !state.store().user_has_permission(user.id, code).await? {
        tracing::warn!(user_id = user.id, code, "permission denied");
        return Err(ApiError::NotPermitted);
    }

    Ok(next.run(request).await)
}
