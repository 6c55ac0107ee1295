use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use std::sync::Arc;

use super::officers::check_expected_version;
use super::{ApiError, ApiResponse, AppState, MessageResponse, PageQuery, Paginated, validation};
use crate::db::{FacilitatorInput, StoreError};
use crate::entities::facilitators;

#[derive(Deserialize)]
pub struct CreateFacilitatorRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub personnel_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateFacilitatorRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub personnel_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct AssignFacilitatorRequest {
    pub facilitator_id: i64,
}

fn validate_input(input: &FacilitatorInput) -> Result<(), ApiError> {
    if input.first_name.is_empty() {
        return Err(ApiError::validation_field("first_name", "must be provided"));
    }
    if input.last_name.is_empty() {
        return Err(ApiError::validation_field("last_name", "must be provided"));
    }
    validation::validate_email(&input.email)?;
    Ok(())
}

/// GET /v1/facilitators
pub async fn list_facilitators(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Paginated<facilitators::Model>>>, ApiError> {
    let (page, page_size) = validation::validate_page(query.page, query.page_size)?;

    let (items, total) = state.store().list_facilitators(page, page_size).await?;

    Ok(Json(ApiResponse::success(Paginated::new(
        items, page, page_size, total,
    ))))
}

/// GET /v1/facilitators/{id}
pub async fn get_facilitator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<facilitators::Model>>, ApiError> {
    let id = validation::validate_id(id)?;

    let facilitator = state
        .store()
        .get_facilitator(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Facilitator", id))?;

    Ok(Json(ApiResponse::success(facilitator)))
}

/// POST /v1/facilitators
pub async fn create_facilitator(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateFacilitatorRequest>,
) -> Result<(StatusCode, Json<ApiResponse<facilitators::Model>>), ApiError> {
    let input = FacilitatorInput {
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        personnel_id: payload.personnel_id,
    };
    validate_input(&input)?;

    if let Some(personnel_id) = input.personnel_id {
        state
            .store()
            .get_officer(personnel_id)
            .await?
            .ok_or_else(|| ApiError::validation_field("personnel_id", "unknown officer"))?;
    }

    let facilitator = state.store().create_facilitator(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(facilitator)),
    ))
}

/// PATCH /v1/facilitators/{id}
pub async fn update_facilitator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<UpdateFacilitatorRequest>,
) -> Result<Json<ApiResponse<facilitators::Model>>, ApiError> {
    let id = validation::validate_id(id)?;

    let current = state
        .store()
        .get_facilitator(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Facilitator", id))?;

    check_expected_version(&headers, current.version)?;

    let input = FacilitatorInput {
        first_name: payload.first_name.unwrap_or(current.first_name),
        last_name: payload.last_name.unwrap_or(current.last_name),
        email: payload.email.unwrap_or(current.email),
        personnel_id: payload.personnel_id.or(current.personnel_id),
    };
    validate_input(&input)?;

    let facilitator = state
        .store()
        .update_facilitator(id, current.version, input)
        .await?;

    Ok(Json(ApiResponse::success(facilitator)))
}

/// DELETE /v1/facilitators/{id}
pub async fn delete_facilitator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validation::validate_id(id)?;

    state.store().delete_facilitator(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "facilitator successfully deleted".to_string(),
    })))
}

/// GET /v1/sessions/{id}/facilitators
pub async fn list_session_facilitators(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<facilitators::Model>>>, ApiError> {
    let session_id = validation::validate_id(id)?;

    state
        .store()
        .get_session(session_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Training session", session_id))?;

    let facilitators = state
        .store()
        .list_session_facilitators(session_id)
        .await?;

    Ok(Json(ApiResponse::success(facilitators)))
}

/// POST /v1/sessions/{id}/facilitators
pub async fn assign_facilitator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<AssignFacilitatorRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MessageResponse>>), ApiError> {
    let session_id = validation::validate_id(id)?;
    let facilitator_id = validation::validate_id(payload.facilitator_id)?;

    state
        .store()
        .get_session(session_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Training session", session_id))?;

    state
        .store()
        .get_facilitator(facilitator_id)
        .await?
        .ok_or_else(|| ApiError::validation_field("facilitator_id", "unknown facilitator"))?;

    state
        .store()
        .assign_facilitator(session_id, facilitator_id)
        .await
        .map_err(|e| match e {
            StoreError::DuplicateKey(_) => ApiError::Conflict(
                "facilitator already assigned to this session".to_string(),
            ),
            other => other.into(),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(MessageResponse {
            message: "facilitator assigned to session".to_string(),
        })),
    ))
}

/// DELETE /v1/sessions/{id}/facilitators/{facilitator_id}
pub async fn remove_facilitator(
    State(state): State<Arc<AppState>>,
    Path((id, facilitator_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let session_id = validation::validate_id(id)?;
    let facilitator_id = validation::validate_id(facilitator_id)?;

    state
        .store()
        .remove_facilitator_from_session(session_id, facilitator_id)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "facilitator removed from session".to_string(),
    })))
}
