//! 用户相关的 HTTP 处理器

use crate::{
    auth::{middleware::AuthContext, SuperAdmin},
    error::AppError,
    middleware::AppState,
    models::user::*,
    pagination::{base_url, paginate, PageQuery},
    repository::UserRepository,
    response::{ok, JsonResponse},
};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
};
use std::sync::Arc;

/// 当前登录用户
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<JsonResponse<UserResponse>, AppError> {
    let user = UserRepository::new(state.db.clone())
        .find_response_by_id(auth_context.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(ok("User data retrieved successfully", user))
}

/// 分页列出用户（仅 Super-admin）
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: SuperAdmin,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<JsonResponse<UserList>, AppError> {
    let repo = UserRepository::new(state.db.clone());
    let total = repo.count().await?;
    let users = repo.list(query.limit(), query.offset()).await?;

    let pagination = paginate(query.page(), query.limit(), total, &base_url(&headers, "/users"));

    Ok(ok("Users retrieved successfully", UserList { users, pagination }))
}
