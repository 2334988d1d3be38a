//! 商品管理的 HTTP 处理器
//! 写操作按权限守卫：create / update / delete

use crate::{
    auth::{CreatePermission, DeletePermission, Permitted, UpdatePermission},
    error::AppError,
    middleware::AppState,
    models::product::*,
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

/// 创建商品，卖家为当前用户
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    permitted: Permitted<CreatePermission>,
    form: MultipartForm,
) -> Result<JsonResponse<ProductDetail>, AppError> {
    let input = state.product_service.parse_create(form)?;
    let product = state
        .product_service
        .create(permitted.context.user_id, input)
        .await?;

    Ok(created("Product created successfully", Some(product)))
}

/// 分页列出商品
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<JsonResponse<ProductList>, AppError> {
    let (products, total) = state
        .product_service
        .list(query.limit(), query.offset())
        .await?;
    let pagination = paginate(
        query.page(),
        query.limit(),
        total,
        &base_url(&headers, "/products"),
    );

    Ok(ok(
        "Products retrieved successfully",
        ProductList {
            products,
            pagination,
        },
    ))
}

/// 获取商品详情
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    ResourceId(id): ResourceId,
) -> Result<JsonResponse<ProductDetail>, AppError> {
    let product = state.product_service.get(id).await?;

    Ok(ok("Product retrieved successfully", product))
}

/// 更新商品
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    _permitted: Permitted<UpdatePermission>,
    ResourceId(id): ResourceId,
    form: MultipartForm,
) -> Result<JsonResponse<ProductDetail>, AppError> {
    let input = state.product_service.parse_update(form)?;
    let product = state.product_service.update(id, input).await?;

    Ok(ok("Product updated successfully", product))
}

/// 删除商品及其图片
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    _permitted: Permitted<DeletePermission>,
    ResourceId(id): ResourceId,
) -> Result<JsonResponse<()>, AppError> {
    state.product_service.delete(id).await?;

    Ok(ok_message("Product deleted successfully"))
}

/// 追加特性图
pub async fn add_product_images(
    State(state): State<Arc<AppState>>,
    _permitted: Permitted<UpdatePermission>,
    ResourceId(id): ResourceId,
    form: MultipartForm,
) -> Result<JsonResponse<Vec<ProductImage>>, AppError> {
    let files = state.product_service.parse_feature_images(form)?;
    let images = state.product_service.add_images(id, files).await?;

    Ok(created("Images added successfully", Some(images)))
}
