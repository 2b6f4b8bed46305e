//! Redirect behaviour of the access policy middleware

mod support;

use axum::http::StatusCode;
use common::models::Role;
use serde_json::json;
use support::test_app;

#[tokio::test]
async fn test_anonymous_requests_to_protected_paths_redirect_to_sign_in() {
    let app = test_app();

    for path in [
        "/reservations",
        "/provider/listings",
        "/admin",
        "/admin/verifications",
        "/onboarding/role",
        "/messages",
        "/notifications",
    ] {
        let response = app.get(path, None).await;
        assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(response.location.as_deref(), Some("/sign-in"), "{path}");
    }
}

#[tokio::test]
async fn test_unrouted_paths_still_go_through_the_policy() {
    let app = test_app();

    for path in ["/settings", "/admin/unknown", "/provider/dashboard"] {
        let response = app.get(path, None).await;
        assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(response.location.as_deref(), Some("/sign-in"), "{path}");
    }

    let admin = app.user("admin@example.com", Some(Role::Admin)).await;
    let token = app.token(&admin);
    let response = app.get("/settings", Some(&token)).await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.location.as_deref(), Some("/admin"));

    let response = app.get("/admin/unknown", Some(&token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Page not found");
}

#[tokio::test]
async fn test_public_paths_are_open() {
    let app = test_app();

    assert_eq!(app.get("/", None).await.status, StatusCode::OK);
    assert_eq!(app.get("/listings", None).await.status, StatusCode::OK);
    assert_eq!(app.get("/health", None).await.status, StatusCode::OK);
    assert_eq!(app.get("/403", None).await.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unusable_tokens_count_as_anonymous() {
    let app = test_app();
    let customer = app.user("customer@example.com", Some(Role::Customer)).await;

    let response = app.get("/reservations", Some("not-a-token")).await;
    assert_eq!(response.location.as_deref(), Some("/sign-in"));

    let refresh = app.jwt.generate_refresh_token(&customer).unwrap();
    let response = app.get("/reservations", Some(&refresh)).await;
    assert_eq!(response.location.as_deref(), Some("/sign-in"));
}

#[tokio::test]
async fn test_admin_is_kept_in_the_admin_area() {
    let app = test_app();
    let admin = app.user("admin@example.com", Some(Role::Admin)).await;
    let token = app.token(&admin);

    for path in ["/reservations", "/listings", "/provider/listings", "/messages"] {
        let response = app.get(path, Some(&token)).await;
        assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(response.location.as_deref(), Some("/admin"), "{path}");
    }

    assert_eq!(app.get("/", Some(&token)).await.status, StatusCode::OK);
    let response = app.get("/admin", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["users"], 1);
}

#[tokio::test]
async fn test_user_without_role_is_sent_to_role_selection() {
    let app = test_app();
    let user = app.user("newcomer@example.com", None).await;
    let token = app.token(&user);

    let response = app.get("/reservations", Some(&token)).await;
    assert_eq!(response.location.as_deref(), Some("/onboarding/role"));

    let response = app.get("/onboarding/role", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["role"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_role_selection_happens_once() {
    let app = test_app();
    let user = app.user("newcomer@example.com", None).await;
    let token = app.token(&user);

    let response = app
        .post("/onboarding/role", &token, json!({"role": "ADMIN"}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post("/onboarding/role", &token, json!({"role": "CUSTOMER"}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["role"], "CUSTOMER");

    // The token predates the role, so the stored role is used
    let response = app.get("/reservations", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .post("/onboarding/role", &token, json!({"role": "PROVIDER"}))
        .await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.location.as_deref(), Some("/"));

    let stored = app.repos.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.role, Some(Role::Customer));
}

#[tokio::test]
async fn test_customer_is_kept_out_of_provider_and_admin_areas() {
    let app = test_app();
    let customer = app.user("customer@example.com", Some(Role::Customer)).await;
    let token = app.token(&customer);

    for path in ["/admin", "/admin/users", "/provider/listings"] {
        let response = app.get(path, Some(&token)).await;
        assert_eq!(response.location.as_deref(), Some("/403"), "{path}");
    }
}

#[tokio::test]
async fn test_unverified_provider_is_sent_to_verification() {
    let app = test_app();
    let provider = app.user("provider@example.com", Some(Role::Provider)).await;
    let token = app.token(&provider);

    let response = app.get("/provider/listings", Some(&token)).await;
    assert_eq!(response.location.as_deref(), Some("/onboarding/verification"));

    let response = app.get("/onboarding/role", Some(&token)).await;
    assert_eq!(response.location.as_deref(), Some("/onboarding/verification"));

    let response = app.get("/onboarding/verification", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["verified"], false);
}
