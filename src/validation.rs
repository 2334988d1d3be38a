//! 请求体校验
//! JSON 请求体在进入 handler 之前完成反序列化与规则校验

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::{error::AppError, response::FieldError};

/// 反序列化并校验的 JSON 提取器
///
/// 失败时返回 400 与字段级错误列表。
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            AppError::invalid("", vec![FieldError::new("body", rejection.body_text())])
        })?;

        value
            .validate()
            .map_err(|e| AppError::invalid("", collect_field_errors(&e)))?;

        Ok(Self(value))
    }
}

/// 路径中的数字 ID，非法时返回统一的 400 信封
#[derive(Debug, Clone, Copy)]
pub struct ResourceId(pub i64);

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        raw.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| AppError::field("id", "Expected number but received string"))
    }
}

/// 把 validator 的错误展开为 `{field, message}` 列表，按字段名排序
pub fn collect_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let name = to_camel_case(&field);
            errs.iter()
                .map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", name));
                    FieldError::new(&name, message)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

/// 请求体字段对外是 camelCase
fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
