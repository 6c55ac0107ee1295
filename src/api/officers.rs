use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse, PageQuery, Paginated, validation};
use crate::db::OfficerInput;
use crate::entities::personnel;

#[derive(Deserialize)]
pub struct CreateOfficerRequest {
    pub regulation_number: String,
    pub first_name: String,
    pub last_name: String,
    pub sex: String,
    pub rank_id: Option<i64>,
    pub formation_id: Option<i64>,
    pub posting_id: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// Partial update; absent fields keep their stored value.
#[derive(Deserialize)]
pub struct UpdateOfficerRequest {
    pub regulation_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sex: Option<String>,
    pub rank_id: Option<i64>,
    pub formation_id: Option<i64>,
    pub posting_id: Option<i64>,
    pub is_active: Option<bool>,
}

fn validate_input(input: &OfficerInput) -> Result<(), ApiError> {
    if input.regulation_number.is_empty() {
        return Err(ApiError::validation_field(
            "regulation_number",
            "must be provided",
        ));
    }
    if input.first_name.is_empty() {
        return Err(ApiError::validation_field("first_name", "must be provided"));
    }
    if input.last_name.is_empty() {
        return Err(ApiError::validation_field("last_name", "must be provided"));
    }
    validation::validate_sex(&input.sex)?;
    Ok(())
}

/// If the client sent X-Expected-Version, it must match the version just
/// read or the request is stale before we even try the update.
pub(super) fn check_expected_version(headers: &HeaderMap, version: i32) -> Result<(), ApiError> {
    if let Some(expected) = headers.get("X-Expected-Version") {
        let expected = expected
            .to_str()
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .ok_or_else(|| {
                ApiError::BadRequest("X-Expected-Version must be an integer".to_string())
            })?;

        if expected != version {
            return Err(ApiError::EditConflict);
        }
    }
    Ok(())
}

/// GET /v1/officers
pub async fn list_officers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Paginated<personnel::Model>>>, ApiError> {
    let (page, page_size) = validation::validate_page(query.page, query.page_size)?;

    let (items, total) = state.store().list_officers(page, page_size).await?;

    Ok(Json(ApiResponse::success(Paginated::new(
        items, page, page_size, total,
    ))))
}

/// GET /v1/officers/{id}
pub async fn get_officer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<personnel::Model>>, ApiError> {
    let id = validation::validate_id(id)?;

    let officer = state
        .store()
        .get_officer(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Officer", id))?;

    Ok(Json(ApiResponse::success(officer)))
}

/// POST /v1/officers
pub async fn create_officer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOfficerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<personnel::Model>>), ApiError> {
    let input = OfficerInput {
        regulation_number: payload.regulation_number,
        first_name: payload.first_name,
        last_name: payload.last_name,
        sex: payload.sex,
        rank_id: payload.rank_id,
        formation_id: payload.formation_id,
        posting_id: payload.posting_id,
        is_active: payload.is_active,
    };
    validate_input(&input)?;

    let officer = state.store().create_officer(input).await.map_err(|e| {
        if matches!(e, crate::db::StoreError::DuplicateKey(_)) {
            ApiError::validation_field(
                "regulation_number",
                "an officer with this regulation number already exists",
            )
        } else {
            e.into()
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(officer)),
    ))
}

/// PATCH /v1/officers/{id}
/// Read-modify-write against the version that was just read; a
/// concurrent writer surfaces as 409.
pub async fn update_officer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<UpdateOfficerRequest>,
) -> Result<Json<ApiResponse<personnel::Model>>, ApiError> {
    let id = validation::validate_id(id)?;

    let current = state
        .store()
        .get_officer(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Officer", id))?;

    check_expected_version(&headers, current.version)?;

    let input = OfficerInput {
        regulation_number: payload
            .regulation_number
            .unwrap_or(current.regulation_number),
        first_name: payload.first_name.unwrap_or(current.first_name),
        last_name: payload.last_name.unwrap_or(current.last_name),
        sex: payload.sex.unwrap_or(current.sex),
        rank_id: payload.rank_id.or(current.rank_id),
        formation_id: payload.formation_id.or(current.formation_id),
        posting_id: payload.posting_id.or(current.posting_id),
        is_active: payload.is_active.unwrap_or(current.is_active),
    };
    validate_input(&input)?;

    let officer = state
        .store()
        .update_officer(id, current.version, input)
        .await?;

    Ok(Json(ApiResponse::success(officer)))
}

/// DELETE /v1/officers/{id}
pub async fn delete_officer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validation::validate_id(id)?;

    state.store().delete_officer(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "officer successfully deleted".to_string(),
    })))
}
