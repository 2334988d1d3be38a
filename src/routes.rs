//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
};

use crate::{handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    // 公开端点
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/categories", get(handlers::category::list_categories))
        .route("/categories/{id}", get(handlers::category::get_category))
        .route("/products", get(handlers::product::list_products))
        .route("/products/{id}", get(handlers::product::get_product));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        // 用户
        .route("/users", get(handlers::user::list_users))
        .route("/users/me", get(handlers::user::me))

        // 角色与权限
        .route(
            "/roles",
            get(handlers::role::list_roles).post(handlers::role::create_role),
        )
        .route("/roles/assign-permissions", post(handlers::role::assign_permissions))
        .route("/roles/{id}", get(handlers::role::get_role))
        .route("/permissions", get(handlers::permission::list_permissions))

        // 分类
        .route("/categories/create", post(handlers::category::create_category))
        .route("/categories/update/{id}", patch(handlers::category::update_category))
        .route("/categories/delete/{id}", delete(handlers::category::delete_category))

        // 商品
        .route("/products/create", post(handlers::product::create_product))
        .route("/products/update/{id}", patch(handlers::product::update_product))
        .route("/products/delete/{id}", delete(handlers::product::delete_product))
        .route("/products/{id}/images", post(handlers::product::add_product_images))

        // 购物车
        .route("/carts", get(handlers::cart::list_cart))
        .route("/carts/create", post(handlers::cart::add_to_cart))
        .route("/carts/update/{id}", patch(handlers::cart::update_cart_item))
        .route("/carts/remove/{id}", delete(handlers::cart::remove_cart_item))
        .route("/carts/clear", delete(handlers::cart::clear_cart))
        .route_layer(axum::middleware::from_fn_with_state(
            state.jwt_service.clone(),
            crate::auth::middleware::jwt_auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
