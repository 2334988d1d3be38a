//! 健康检查 API 集成测试

use axum::http::StatusCode;
use tower::ServiceExt;

mod common;
use common::{body_json, create_offline_app, empty_request};

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_offline_app();

    let response = app
        .oneshot(empty_request("GET", "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["uptime_secs"].is_number());
}

#[tokio::test]
async fn test_health_endpoint_sets_trace_headers() {
    let app = create_offline_app();

    let mut request = empty_request("GET", "/health", None);
    request
        .headers_mut()
        .insert("x-trace-id", "trace-from-client".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-trace-id"], "trace-from-client");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = create_offline_app();

    let response = app
        .oneshot(empty_request("GET", "/ready", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert_eq!(json["ready"], false);
    assert_eq!(json["checks"][0]["name"], "database");
    assert_eq!(json["checks"][0]["status"], "unhealthy");
}

#[tokio::test]
async fn test_not_found_endpoint() {
    let app = create_offline_app();

    let response = app
        .oneshot(empty_request("GET", "/nonexistent", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_upload_returns_not_found() {
    let app = create_offline_app();

    let response = app
        .oneshot(empty_request("GET", "/uploads/products/missing.png", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
