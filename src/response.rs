//! 统一响应信封
//! 所有接口返回 `{status, message, data, errors}`

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// 字段级错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    pub message: String,
    pub data: Option<T>,
    pub errors: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data,
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>, errors: Option<Vec<FieldError>>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            data: None,
            errors,
        }
    }
}

pub type JsonResponse<T> = (StatusCode, Json<ApiResponse<T>>);

/// 200 + 数据
pub fn ok<T: Serialize>(message: &str, data: T) -> JsonResponse<T> {
    (StatusCode::OK, Json(ApiResponse::success(message, Some(data))))
}

/// 200，无数据
pub fn ok_message(message: &str) -> JsonResponse<()> {
    (StatusCode::OK, Json(ApiResponse::success(message, None)))
}

/// 201，空消息回落到默认文案
pub fn created<T: Serialize>(message: &str, data: Option<T>) -> JsonResponse<T> {
    let message = if message.trim().is_empty() {
        "Resource created successfully"
    } else {
        message
    };
    (StatusCode::CREATED, Json(ApiResponse::success(message, data)))
}
