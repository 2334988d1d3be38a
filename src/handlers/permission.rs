//! 权限查询

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::role::Permission,
    response::{ok, JsonResponse},
};
use axum::extract::State;
use std::sync::Arc;

/// 列出所有权限
pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
) -> Result<JsonResponse<Vec<Permission>>, AppError> {
    let permissions = state.role_service.list_permissions().await?;

    Ok(ok("Permissions retrieved successfully", permissions))
}
