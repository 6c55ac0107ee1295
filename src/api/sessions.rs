use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use std::sync::Arc;

use super::officers::check_expected_version;
use super::{ApiError, ApiResponse, AppState, MessageResponse, PageQuery, Paginated, validation};
use crate::db::SessionInput;
use crate::entities::{session_enrollment, training_sessions};

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub course_id: i64,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
}

#[derive(Deserialize)]
pub struct UpdateSessionRequest {
    pub course_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateEnrollmentRequest {
    pub personnel_id: i64,
}

fn validate_input(input: &SessionInput) -> Result<(), ApiError> {
    if input.start_date.is_empty() {
        return Err(ApiError::validation_field("start_date", "must be provided"));
    }
    if input.end_date.is_empty() {
        return Err(ApiError::validation_field("end_date", "must be provided"));
    }
    if input.end_date <= input.start_date {
        return Err(ApiError::validation_field(
            "end_date",
            "must be after start date",
        ));
    }
    if input.location.is_empty() {
        return Err(ApiError::validation_field("location", "must be provided"));
    }
    if input.location.len() > 100 {
        return Err(ApiError::validation_field(
            "location",
            "must not be more than 100 bytes long",
        ));
    }
    Ok(())
}

/// GET /v1/sessions
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Paginated<training_sessions::Model>>>, ApiError> {
    let (page, page_size) = validation::validate_page(query.page, query.page_size)?;

    let (items, total) = state.store().list_sessions(page, page_size).await?;

    Ok(Json(ApiResponse::success(Paginated::new(
        items, page, page_size, total,
    ))))
}

/// GET /v1/sessions/{id}
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<training_sessions::Model>>, ApiError> {
    let id = validation::validate_id(id)?;

    let session = state
        .store()
        .get_session(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Training session", id))?;

    Ok(Json(ApiResponse::success(session)))
}

/// POST /v1/sessions
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<training_sessions::Model>>), ApiError> {
    let course_id = validation::validate_id(payload.course_id)?;

    state
        .store()
        .get_course(course_id)
        .await?
        .ok_or_else(|| ApiError::validation_field("course_id", "unknown course"))?;

    let input = SessionInput {
        course_id,
        start_date: payload.start_date,
        end_date: payload.end_date,
        location: payload.location,
    };
    validate_input(&input)?;

    let session = state.store().create_session(input).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(session))))
}

/// PATCH /v1/sessions/{id}
pub async fn update_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<UpdateSessionRequest>,
) -> Result<Json<ApiResponse<training_sessions::Model>>, ApiError> {
    let id = validation::validate_id(id)?;

    let current = state
        .store()
        .get_session(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Training session", id))?;

    check_expected_version(&headers, current.version)?;

    let course_id = payload.course_id.unwrap_or(current.course_id);
    if course_id != current.course_id {
        state
            .store()
            .get_course(course_id)
            .await?
            .ok_or_else(|| ApiError::validation_field("course_id", "unknown course"))?;
    }

    let input = SessionInput {
        course_id,
        start_date: payload.start_date.unwrap_or(current.start_date),
        end_date: payload.end_date.unwrap_or(current.end_date),
        location: payload.location.unwrap_or(current.location),
    };
    validate_input(&input)?;

    let session = state
        .store()
        .update_session(id, current.version, input)
        .await?;

    Ok(Json(ApiResponse::success(session)))
}

/// DELETE /v1/sessions/{id}
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validation::validate_id(id)?;

    state.store().delete_session(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "training session successfully deleted".to_string(),
    })))
}

/// POST /v1/sessions/{id}/enrollments
pub async fn create_enrollment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateEnrollmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<session_enrollment::Model>>), ApiError> {
    let session_id = validation::validate_id(id)?;
    let personnel_id = validation::validate_id(payload.personnel_id)?;

    state
        .store()
        .get_session(session_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Training session", session_id))?;

    state
        .store()
        .get_officer(personnel_id)
        .await?
        .ok_or_else(|| ApiError::validation_field("personnel_id", "unknown officer"))?;

    let enrollment = state
        .store()
        .create_enrollment(session_id, personnel_id)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(enrollment))))
}

/// GET /v1/sessions/{id}/enrollments
pub async fn list_enrollments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<session_enrollment::Model>>>, ApiError> {
    let session_id = validation::validate_id(id)?;

    state
        .store()
        .get_session(session_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Training session", session_id))?;

    let enrollments = state
        .store()
        .list_enrollments_for_session(session_id)
        .await?;

    Ok(Json(ApiResponse::success(enrollments)))
}
