use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::fmt;

use super::ApiResponse;
use crate::db::StoreError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    BadRequest(String),

    FailedValidation(HashMap<String, String>),

    /// Wrong email/password pair on login.
    InvalidCredentials,

    /// Missing, malformed, expired or unknown bearer token. Deliberately
    /// one variant: callers must not learn which case they hit.
    InvalidToken,

    AuthenticationRequired,

    InactiveAccount,

    NotPermitted,

    Conflict(String),

    /// Version check failed on a conditional update.
    EditConflict,

    RateLimited,

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::FailedValidation(fields) => {
                write!(f, "Validation failed on {} field(s)", fields.len())
            }
            ApiError::InvalidCredentials => write!(f, "Invalid authentication credentials"),
            ApiError::InvalidToken => write!(f, "Invalid or missing authentication token"),
            ApiError::AuthenticationRequired => write!(f, "Authentication required"),
            ApiError::InactiveAccount => write!(f, "Account not activated"),
            ApiError::NotPermitted => write!(f, "Not permitted"),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::EditConflict => write!(f, "Edit conflict"),
            ApiError::RateLimited => write!(f, "Rate limit exceeded"),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body): (StatusCode, ApiResponse<()>) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::error(msg)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiResponse::error(msg)),
            ApiError::FailedValidation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiResponse::failed_validation(fields),
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ApiResponse::error("invalid authentication credentials"),
            ),
            ApiError::InvalidToken => {
                let body = ApiResponse::<()>::error("invalid or missing authentication token");
                let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Bearer"),
                );
                return response;
            }
            ApiError::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                ApiResponse::error("you must be authenticated to access this resource"),
            ),
            ApiError::InactiveAccount => (
                StatusCode::FORBIDDEN,
                ApiResponse::error("your user account must be activated to access this resource"),
            ),
            ApiError::NotPermitted => (
                StatusCode::FORBIDDEN,
                ApiResponse::error(
                    "your user account doesn't have the necessary permissions to access this resource",
                ),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ApiResponse::error(msg)),
            ApiError::EditConflict => (
                StatusCode::CONFLICT,
                ApiResponse::error("unable to update the record due to an edit conflict, please try again"),
            ),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ApiResponse::error("rate limit exceeded"),
            ),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("the server encountered a problem and could not process your request"),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("the server encountered a problem and could not process your request"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RecordNotFound => {
                ApiError::NotFound("the requested resource could not be found".to_string())
            }
            StoreError::EditConflict => ApiError::EditConflict,
            StoreError::DuplicateEmail => ApiError::validation_field(
                "email",
                "a user with this email address already exists",
            ),
            StoreError::DuplicateKey(key) => ApiError::Conflict(format!("duplicate {key}")),
            StoreError::Timeout => ApiError::DatabaseError("operation timed out".to_string()),
            StoreError::Database(e) => ApiError::DatabaseError(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation_field(field: &str, message: &str) -> Self {
        let mut fields = HashMap::new();
        fields.insert(field.to_string(), message.to_string());
        ApiError::FailedValidation(fields)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
