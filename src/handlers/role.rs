//! 角色管理的 HTTP 处理器
//! 除按 ID 查询外均要求 Super-admin 角色

use crate::{
    auth::{middleware::AuthContext, SuperAdmin},
    error::AppError,
    middleware::AppState,
    models::role::*,
    pagination::{base_url, paginate, PageQuery},
    response::{created, ok, JsonResponse},
    services::role_service::AssignOutcome,
    validation::{ResourceId, ValidatedJson},
};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
};
use std::sync::Arc;

/// 创建角色
pub async fn create_role(
    State(state): State<Arc<AppState>>,
    _admin: SuperAdmin,
    ValidatedJson(req): ValidatedJson<CreateRoleRequest>,
) -> Result<JsonResponse<Role>, AppError> {
    let role = state.role_service.create(req).await?;

    Ok(created("Role created successfully", Some(role)))
}

/// 为角色分配权限
pub async fn assign_permissions(
    State(state): State<Arc<AppState>>,
    _admin: SuperAdmin,
    ValidatedJson(req): ValidatedJson<AssignPermissionsRequest>,
) -> Result<JsonResponse<()>, AppError> {
    let message = match state.role_service.assign_permissions(req).await? {
        AssignOutcome::AlreadyAssigned => "All permissions are already assigned to this role",
        AssignOutcome::Assigned(_) => "Permissions assigned successfully",
    };

    Ok(created(message, None))
}

/// 分页列出角色
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    _admin: SuperAdmin,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<JsonResponse<RoleList>, AppError> {
    let (roles, total) = state
        .role_service
        .list(query.limit(), query.offset())
        .await?;
    let pagination = paginate(query.page(), query.limit(), total, &base_url(&headers, "/roles"));

    Ok(ok("Roles retrieved successfully", RoleList { roles, pagination }))
}

/// 获取角色详情
pub async fn get_role(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
    ResourceId(id): ResourceId,
) -> Result<JsonResponse<RoleWithPermissions>, AppError> {
    let role = state.role_service.get(id).await?;

    Ok(ok("Role retrieved successfully", role))
}
