//! 分类管理的 HTTP 处理器（multipart 表单）

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::category::*,
    multipart::MultipartForm,
    pagination::{base_url, paginate, PageQuery},
    response::{created, ok, ok_message, JsonResponse},
    validation::ResourceId,
};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
};
use std::sync::Arc;

/// 创建分类
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
    form: MultipartForm,
) -> Result<JsonResponse<Category>, AppError> {
    let input = state.category_service.parse_create(form)?;
    let category = state.category_service.create(input).await?;

    Ok(created("Category created successfully", Some(category)))
}

/// 更新分类
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
    ResourceId(id): ResourceId,
    form: MultipartForm,
) -> Result<JsonResponse<Category>, AppError> {
    let input = state.category_service.parse_update(form)?;
    let category = state.category_service.update(id, input).await?;

    Ok(ok("Category updated successfully", category))
}

/// 分页列出顶级分类
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<JsonResponse<CategoryList>, AppError> {
    let (categories, total) = state
        .category_service
        .list(query.limit(), query.offset())
        .await?;
    let pagination = paginate(
        query.page(),
        query.limit(),
        total,
        &base_url(&headers, "/categories"),
    );

    Ok(ok(
        "Categories retrieved successfully",
        CategoryList {
            categories,
            pagination,
        },
    ))
}

/// 获取分类详情
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    ResourceId(id): ResourceId,
) -> Result<JsonResponse<CategoryDetail>, AppError> {
    let category = state.category_service.get(id).await?;

    Ok(ok("Category retrieved successfully", category))
}

/// 删除分类
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
    ResourceId(id): ResourceId,
) -> Result<JsonResponse<()>, AppError> {
    state.category_service.delete(id).await?;

    Ok(ok_message("Category deleted successfully"))
}
