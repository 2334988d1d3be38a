//! 购物车的 HTTP 处理器，只操作调用者自己的购物车

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::cart::*,
    pagination::{base_url, paginate, PageQuery},
    response::{created, ok, ok_message, JsonResponse},
    validation::{ResourceId, ValidatedJson},
};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
};
use std::sync::Arc;

pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateCartRequest>,
) -> Result<JsonResponse<CartItem>, AppError> {
    let item = state.cart_service.add(auth_context.user_id, req).await?;

    Ok(created("Product added to cart successfully", Some(item)))
}

pub async fn update_cart_item(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ResourceId(cart_id): ResourceId,
    ValidatedJson(req): ValidatedJson<UpdateCartRequest>,
) -> Result<JsonResponse<CartItem>, AppError> {
    let item = state
        .cart_service
        .update(auth_context.user_id, cart_id, req)
        .await?;

    Ok(ok("Cart item updated successfully", item))
}

pub async fn list_cart(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<JsonResponse<CartList>, AppError> {
    let (cart_items, total, subtotal) = state
        .cart_service
        .list(auth_context.user_id, query.limit(), query.offset())
        .await?;
    let pagination = paginate(query.page(), query.limit(), total, &base_url(&headers, "/carts"));

    Ok(ok(
        "Cart retrieved successfully",
        CartList {
            cart_items,
            pagination,
            subtotal,
        },
    ))
}

pub async fn remove_cart_item(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ResourceId(cart_id): ResourceId,
) -> Result<JsonResponse<()>, AppError> {
    state
        .cart_service
        .remove(auth_context.user_id, cart_id)
        .await?;

    Ok(ok_message("Cart item removed successfully"))
}

pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<JsonResponse<()>, AppError> {
    state.cart_service.clear(auth_context.user_id).await?;

    Ok(ok_message("Cart cleared successfully"))
}
