use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entities::users;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-field messages for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<HashMap<String, String>>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            fields: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            fields: None,
        }
    }

    pub fn failed_validation(fields: HashMap<String, String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some("validation failed".to_string()),
            fields: Some(fields),
        }
    }
}

/// User representation returned by the API. Never carries the password
/// hash.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i64,
    pub email: String,
    pub activated: bool,
    pub created_at: String,
    pub version: i32,
}

impl From<users::Model> for UserDto {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            activated: model.activated,
            created_at: model.created_at,
            version: model.version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenDto {
    pub token: String,
    /// Unix epoch seconds.
    pub expiry: i64,
}

#[derive(Debug, Serialize)]
pub struct PermissionsDto {
    pub user_id: i64,
    pub codes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    pub current_page: u64,
    pub page_size: u64,
    pub total_records: u64,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub metadata: Metadata,
}

impl<T> Paginated<T> {
    pub const fn new(items: Vec<T>, current_page: u64, page_size: u64, total_records: u64) -> Self {
        Self {
            items,
            metadata: Metadata {
                current_page,
                page_size,
                total_records,
            },
        }
    }
}
