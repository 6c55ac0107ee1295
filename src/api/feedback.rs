use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, validation};
use crate::entities::{course_ratings, facilitator_ratings, session_enrollment};

#[derive(Deserialize)]
pub struct FacilitatorFeedbackRequest {
    pub session_enrollment_id: i64,
    pub score: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Deserialize)]
pub struct CourseFeedbackRequest {
    pub session_enrollment_id: i64,
    pub score: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Deserialize)]
pub struct EnrollmentCourseRatingRequest {
    pub score: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Deserialize)]
pub struct EnrollmentFacilitatorRatingRequest {
    pub facilitator_id: i64,
    pub score: i32,
    #[serde(default)]
    pub comment: String,
}

/// Course rating enriched with the course it was resolved to belong to.
#[derive(Debug, Serialize)]
pub struct CourseRatingDto {
    pub id: i64,
    pub course_id: i64,
    pub session_enrollment_id: i64,
    pub score: i32,
    pub comment: String,
    pub created_at: String,
}

impl CourseRatingDto {
    fn from_model(model: course_ratings::Model, course_id: i64) -> Self {
        Self {
            id: model.id,
            course_id,
            session_enrollment_id: model.session_enrollment_id,
            score: model.score,
            comment: model.comment,
            created_at: model.created_at,
        }
    }
}

async fn resolve_enrollment(
    state: &AppState,
    enrollment_id: i64,
) -> Result<session_enrollment::Model, ApiError> {
    state
        .store()
        .get_enrollment(enrollment_id)
        .await?
        .ok_or_else(|| {
            ApiError::validation_field("session_enrollment_id", "unknown enrollment")
        })
}

/// POST /v1/facilitators/{id}/feedback
pub async fn create_facilitator_feedback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<FacilitatorFeedbackRequest>,
) -> Result<(StatusCode, Json<ApiResponse<facilitator_ratings::Model>>), ApiError> {
    let facilitator_id = validation::validate_id(id)?;
    validation::validate_score(payload.score)?;

    state
        .store()
        .get_facilitator(facilitator_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Facilitator", facilitator_id))?;

    resolve_enrollment(&state, payload.session_enrollment_id).await?;

    let rating = state
        .store()
        .insert_facilitator_rating(
            facilitator_id,
            payload.session_enrollment_id,
            payload.score,
            payload.comment,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(rating))))
}

/// GET /v1/facilitators/{id}/feedback
pub async fn list_facilitator_feedback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<facilitator_ratings::Model>>>, ApiError> {
    let facilitator_id = validation::validate_id(id)?;

    state
        .store()
        .get_facilitator(facilitator_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Facilitator", facilitator_id))?;

    let ratings = state
        .store()
        .list_facilitator_ratings(facilitator_id)
        .await?;

    Ok(Json(ApiResponse::success(ratings)))
}

/// POST /v1/courses/{id}/feedback
/// The enrollment must belong to a session of the course in the path.
pub async fn create_course_feedback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<CourseFeedbackRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CourseRatingDto>>), ApiError> {
    let course_id = validation::validate_id(id)?;
    validation::validate_score(payload.score)?;

    state
        .store()
        .get_course(course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course", course_id))?;

    let enrollment = resolve_enrollment(&state, payload.session_enrollment_id).await?;

    let session = state
        .store()
        .get_session(enrollment.session_id)
        .await?
        .ok_or_else(|| ApiError::internal("enrollment references a missing session"))?;

    if session.course_id != course_id {
        return Err(ApiError::validation_field(
            "session_enrollment_id",
            "enrollment does not belong to this course",
        ));
    }

    let rating = state
        .store()
        .insert_course_rating(payload.session_enrollment_id, payload.score, payload.comment)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CourseRatingDto::from_model(
            rating, course_id,
        ))),
    ))
}

/// GET /v1/courses/{id}/feedback
pub async fn list_course_feedback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<CourseRatingDto>>>, ApiError> {
    let course_id = validation::validate_id(id)?;

    state
        .store()
        .get_course(course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course", course_id))?;

    let ratings = state.store().list_course_ratings(course_id).await?;

    let dtos = ratings
        .into_iter()
        .map(|r| CourseRatingDto::from_model(r, course_id))
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /v1/enrollments/{id}/course-rating
/// Same write as course feedback, addressed from the enrollment side;
/// the course is derived by walking enrollment -> session -> course.
pub async fn create_enrollment_course_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<EnrollmentCourseRatingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CourseRatingDto>>), ApiError> {
    let enrollment_id = validation::validate_id(id)?;
    validation::validate_score(payload.score)?;

    let enrollment = state
        .store()
        .get_enrollment(enrollment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Enrollment", enrollment_id))?;

    let session = state
        .store()
        .get_session(enrollment.session_id)
        .await?
        .ok_or_else(|| ApiError::internal("enrollment references a missing session"))?;

    let rating = state
        .store()
        .insert_course_rating(enrollment_id, payload.score, payload.comment)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CourseRatingDto::from_model(
            rating,
            session.course_id,
        ))),
    ))
}

/// POST /v1/enrollments/{id}/facilitator-rating
pub async fn create_enrollment_facilitator_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<EnrollmentFacilitatorRatingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<facilitator_ratings::Model>>), ApiError> {
    let enrollment_id = validation::validate_id(id)?;
    let facilitator_id = validation::validate_id(payload.facilitator_id)?;
    validation::validate_score(payload.score)?;

    state
        .store()
        .get_enrollment(enrollment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Enrollment", enrollment_id))?;

    state
        .store()
        .get_facilitator(facilitator_id)
        .await?
        .ok_or_else(|| ApiError::validation_field("facilitator_id", "unknown facilitator"))?;

    let rating = state
        .store()
        .insert_facilitator_rating(facilitator_id, enrollment_id, payload.score, payload.comment)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(rating))))
}
