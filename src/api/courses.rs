use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use std::sync::Arc;

use super::officers::check_expected_version;
use super::{ApiError, ApiResponse, AppState, MessageResponse, validation};
use crate::db::CourseInput;
use crate::entities::courses;

#[derive(Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub credit_hours: f64,
}

#[derive(Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub credit_hours: Option<f64>,
}

fn validate_input(input: &CourseInput) -> Result<(), ApiError> {
    if input.title.is_empty() {
        return Err(ApiError::validation_field("title", "must be provided"));
    }
    if input.title.len() > 255 {
        return Err(ApiError::validation_field(
            "title",
            "must not be more than 255 bytes long",
        ));
    }
    validation::validate_category(&input.category)?;
    if input.credit_hours <= 0.0 {
        return Err(ApiError::validation_field(
            "credit_hours",
            "must be greater than 0",
        ));
    }
    Ok(())
}

/// GET /v1/courses
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<courses::Model>>>, ApiError> {
    let courses = state.store().list_courses().await?;
    Ok(Json(ApiResponse::success(courses)))
}

/// GET /v1/courses/{id}
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<courses::Model>>, ApiError> {
    let id = validation::validate_id(id)?;

    let course = state
        .store()
        .get_course(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course", id))?;

    Ok(Json(ApiResponse::success(course)))
}

/// POST /v1/courses
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<courses::Model>>), ApiError> {
    let input = CourseInput {
        title: payload.title,
        description: payload.description,
        category: payload.category,
        credit_hours: payload.credit_hours,
    };
    validate_input(&input)?;

    let course = state.store().create_course(input).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(course))))
}

/// PATCH /v1/courses/{id}
pub async fn update_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<Json<ApiResponse<courses::Model>>, ApiError> {
    let id = validation::validate_id(id)?;

    let current = state
        .store()
        .get_course(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course", id))?;

    check_expected_version(&headers, current.version)?;

    let input = CourseInput {
        title: payload.title.unwrap_or(current.title),
        description: payload.description.unwrap_or(current.description),
        category: payload.category.unwrap_or(current.category),
        credit_hours: payload.credit_hours.unwrap_or(current.credit_hours),
    };
    validate_input(&input)?;

    let course = state
        .store()
        .update_course(id, current.version, input)
        .await?;

    Ok(Json(ApiResponse::success(course)))
}

/// DELETE /v1/courses/{id}
pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validation::validate_id(id)?;

    state.store().delete_course(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "course successfully deleted".to_string(),
    })))
}
