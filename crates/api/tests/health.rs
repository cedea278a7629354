//! Integration tests for the health endpoint and base routing.

mod common;

use axum::http::StatusCode;
use common::*;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
async fn health_reports_ok(pool: PgPool) {
    let (app, _config) = build_test_app(&pool).await;

    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_routes_return_404(pool: PgPool) {
    let (app, _config) = build_test_app(&pool).await;

    let response = send(&app, get("/api/v1/nonexistent", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
