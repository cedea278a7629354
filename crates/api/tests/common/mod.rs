//! Shared fixtures for API integration tests.
//!
//! Builds the same router and middleware stack the binary serves,
//! backed by a test database pool, and drives it in-process with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use curio_api::auth::jwt::{generate_access_token, JwtConfig};
use curio_api::config::{ModerationConfig, ServerConfig};
use curio_api::state::AppState;
use curio_api::routes;
use curio_core::types::{new_id, Id};
use curio_db::models::user::CreateUser;
use curio_db::repositories::UserRepo;
use curio_edits::{EditService, EditUser};
use sqlx::PgPool;

/// Configuration mirroring the defaults the server loads from the
/// environment, minus anything that would touch the network.
pub fn test_config(system_user_id: Id) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
        moderation: ModerationConfig {
            vote_application_threshold: 2,
            voting_period_secs: 345_600,
            destructive_voting_period_secs: 0,
            edit_update_limit: 1,
            vote_promotion_threshold: 10,
            system_user_id,
            close_edits_interval_secs: 300,
        },
    }
}

/// Build the application router the way `main` does, seeding the system
/// user that authors failure comments. Background workers are not
/// started; tests drive the service through HTTP alone.
pub async fn build_test_app(pool: &PgPool) -> (Router, ServerConfig) {
    let system = seed_user(pool, "system", &[]).await;
    let config = test_config(system.id);

    let edits = Arc::new(EditService::new(
        pool.clone(),
        config.moderation.policy(),
        config.moderation.system_user_id,
    ));
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        edits,
    };

    let request_id_header = HeaderName::from_static("x-request-id");
    let router = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state);

    (router, config)
}

/// Insert a user with the given roles and return the service-side view.
pub async fn seed_user(pool: &PgPool, name: &str, user_roles: &[&str]) -> EditUser {
    let mut conn = pool.acquire().await.unwrap();
    let user = UserRepo::create(
        &mut conn,
        &CreateUser {
            id: new_id(),
            name: name.to_string(),
            email: None,
        },
    )
    .await
    .unwrap();
    for role in user_roles {
        UserRepo::grant_role(&mut conn, user.id, role).await.unwrap();
    }
    EditUser::new(user.id, user_roles.iter().map(|r| r.to_string()).collect())
}

/// Sign an access token for a seeded user.
pub fn token_for(config: &ServerConfig, user: &EditUser) -> String {
    generate_access_token(user.id, &user.roles, &config.jwt).unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    json_request("POST", uri, token, body)
}

pub fn put_json(uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    json_request("PUT", uri, token, body)
}

fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
