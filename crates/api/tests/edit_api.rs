//! Integration tests for the edit workflow over HTTP: authentication,
//! role checks, and the propose/apply lifecycle with its error mapping.

mod common;

use axum::http::StatusCode;
use common::*;
use curio_core::types::new_id;
use curio_db::models::user::roles;
use serde_json::json;
use sqlx::PgPool;

fn tag_create_body(name: &str) -> serde_json::Value {
    json!({
        "edit": { "operation": "CREATE" },
        "details": { "name": name, "aliases": [] }
    })
}

#[sqlx::test(migrations = "../../migrations")]
async fn requests_without_a_token_are_unauthorized(pool: PgPool) {
    let (app, _config) = build_test_app(&pool).await;

    let request = post_json("/api/v1/edits/tags", None, &tag_create_body("Outdoor"));
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../migrations")]
async fn proposing_requires_the_edit_role(pool: PgPool) {
    let (app, config) = build_test_app(&pool).await;
    let reader = seed_user(&pool, "reader", &[roles::READ]).await;
    let token = token_for(&config, &reader);

    let request = post_json(
        "/api/v1/edits/tags",
        Some(&token),
        &tag_create_body("Outdoor"),
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_edits_return_404(pool: PgPool) {
    let (app, config) = build_test_app(&pool).await;
    let reader = seed_user(&pool, "reader", &[roles::READ]).await;
    let token = token_for(&config, &reader);

    let request = get(&format!("/api/v1/edits/{}", new_id()), Some(&token));
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../../migrations")]
async fn propose_and_apply_lifecycle(pool: PgPool) {
    let (app, config) = build_test_app(&pool).await;
    let editor = seed_user(&pool, "editor", &[roles::READ, roles::EDIT]).await;
    let admin = seed_user(&pool, "admin", &[roles::READ, roles::ADMIN]).await;
    let editor_token = token_for(&config, &editor);
    let admin_token = token_for(&config, &admin);

    // Editor proposes a new tag.
    let request = post_json(
        "/api/v1/edits/tags",
        Some(&editor_token),
        &tag_create_body("Outdoor"),
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["operation"], "CREATE");
    let edit_id = body["data"]["id"].as_str().unwrap().to_string();

    // Admin applies the edit, bypassing the vote threshold.
    let request = post(&format!("/api/v1/edits/{edit_id}/apply"), Some(&admin_token));
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["applied"], true);

    // The edit is closed; a late cancellation conflicts.
    let request = post(
        &format!("/api/v1/edits/{edit_id}/cancel"),
        Some(&editor_token),
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["code"], "CONFLICT");
}
