//! 认证相关的 HTTP 处理器

use crate::{
    error::AppError,
    middleware::AppState,
    models::auth::*,
    response::{created, ok, JsonResponse},
    validation::ValidatedJson,
};
use axum::extract::State;
use std::sync::Arc;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<JsonResponse<()>, AppError> {
    state.auth_service.register(req).await?;

    Ok(created("User registered successfully", None))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<JsonResponse<LoginResponse>, AppError> {
    let response = state.auth_service.login(req).await?;

    Ok(ok("Login successful", response))
}
