//! HTTP-level tests for the authentication service over in-memory storage

use std::sync::Arc;

use auth::{
    AppState, create_router,
    rate_limiter::{RateLimiter, RateLimiterConfig},
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use common::{
    cache::MemoryKeyValueStore,
    models::Role,
    repositories::{UserRepository, memory::MemoryStore},
    token::{JwtConfig, JwtService, TokenType},
};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: MemoryStore,
    jwt: JwtService,
}

fn test_app_with_limit(max_attempts: u32) -> TestApp {
    let store = MemoryStore::new();
    let jwt = JwtService::new(JwtConfig::with_secret("auth-test-secret")).unwrap();
    let state = AppState::new(
        Arc::new(store.clone()),
        jwt.clone(),
        Arc::new(MemoryKeyValueStore::new()),
        RateLimiter::new(RateLimiterConfig {
            max_attempts,
            window_seconds: 300,
            ban_duration_seconds: 3600,
        }),
    );

    TestApp {
        router: create_router(state),
        store,
        jwt,
    }
}

fn test_app() -> TestApp {
    test_app_with_limit(5)
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register(router: &Router, email: &str) -> (StatusCode, Value) {
    post(
        router,
        "/auth/register",
        json!({"name": "Guest", "email": email, "password": "Str0ngPass"}),
    )
    .await
}

async fn login(router: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    post(
        router,
        "/auth/login",
        json!({"email": email, "password": password}),
    )
    .await
}

#[tokio::test]
async fn test_register_creates_user_without_role() {
    let app = test_app();

    let (status, body) = register(&app.router, "Guest@Example.com").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "guest@example.com");
    assert_eq!(body["role"], Value::Null);
    assert!(body.get("password_hash").is_none());

    let (status, body) = register(&app.router, "guest@example.com").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email is already registered");
}

#[tokio::test]
async fn test_register_rejects_invalid_input() {
    let app = test_app();

    let (status, _) = register(&app.router, "not-an-email").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(
        &app.router,
        "/auth/register",
        json!({"name": "Guest", "email": "guest@example.com", "password": "weak"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("8 characters"));
}

#[tokio::test]
async fn test_incomplete_bodies_are_bad_requests() {
    let app = test_app();

    for (uri, body) in [
        ("/auth/register", json!({"email": "a@example.com"})),
        ("/auth/login", json!({"password": "Str0ngPass"})),
        ("/auth/refresh", json!({})),
        ("/auth/logout", json!({"token": 42})),
    ] {
        let (status, body) = post(&app.router, uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_login_issues_tokens_with_identity() {
    let app = test_app();
    register(&app.router, "guest@example.com").await;

    let (status, body) = login(&app.router, "guest@example.com", "Str0ngPass").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");

    let claims = app
        .jwt
        .validate_token(body["access_token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.token_type, TokenType::Access);
    assert_eq!(claims.email, "guest@example.com");
    assert_eq!(claims.role, None);

    let (status, body) = login(&app.router, "guest@example.com", "WrongPass1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, _) = login(&app.router, "nobody@example.com", "Str0ngPass").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let app = test_app_with_limit(2);
    register(&app.router, "guest@example.com").await;

    for _ in 0..2 {
        let (status, _) = login(&app.router, "guest@example.com", "WrongPass1").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _) = login(&app.router, "guest@example.com", "Str0ngPass").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_refresh_rotates_and_reads_current_role() {
    let app = test_app();
    let (_, user) = register(&app.router, "guest@example.com").await;
    let (_, tokens) = login(&app.router, "guest@example.com", "Str0ngPass").await;
    let first_refresh = tokens["refresh_token"].as_str().unwrap().to_string();

    let user_id = user["id"].as_str().unwrap().parse().unwrap();
    app.store
        .assign_role(user_id, Role::Customer)
        .await
        .unwrap();

    let (status, refreshed) = post(
        &app.router,
        "/auth/refresh",
        json!({"refresh_token": first_refresh}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let claims = app
        .jwt
        .validate_token(refreshed["access_token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.role, Some(Role::Customer));

    let second_refresh = refreshed["refresh_token"].as_str().unwrap();
    assert_ne!(second_refresh, first_refresh);

    let (status, _) = post(
        &app.router,
        "/auth/refresh",
        json!({"refresh_token": first_refresh}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rejects_access_tokens() {
    let app = test_app();
    register(&app.router, "guest@example.com").await;
    let (_, tokens) = login(&app.router, "guest@example.com", "Str0ngPass").await;

    let (status, _) = post(
        &app.router,
        "/auth/refresh",
        json!({"refresh_token": tokens["access_token"]}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(
        &app.router,
        "/auth/refresh",
        json!({"refresh_token": "garbage"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = test_app();
    register(&app.router, "guest@example.com").await;
    let (_, tokens) = login(&app.router, "guest@example.com", "Str0ngPass").await;
    let refresh = tokens["refresh_token"].clone();

    let (status, body) = post(&app.router, "/auth/logout", json!({"refresh_token": refresh})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    let (status, _) = post(&app.router, "/auth/refresh", json!({"refresh_token": refresh})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(&app.router, "/auth/logout", json!({"refresh_token": refresh})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
