//! API service routes

mod admin;
mod listings;
mod messages;
mod onboarding;
mod provider;
mod reservations;
mod users;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use common::{
    models::{Listing, NotificationKind},
    notify::{email_best_effort, notify_best_effort},
};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extract::AuthUser,
    middleware::access_policy,
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let guarded_routes = Router::new()
        .route("/", get(home))
        .route("/403", get(forbidden))
        .merge(listings::router())
        .merge(onboarding::router())
        .merge(provider::router())
        .merge(reservations::router())
        .merge(messages::router())
        .merge(users::router())
        .merge(admin::router())
        .fallback(not_found)
        // Unmatched paths go through the policy before reaching the fallback
        .layer(middleware::from_fn_with_state(state.clone(), access_policy));

    Router::new()
        .route("/health", get(health_check))
        .merge(guarded_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = match state.revocations.health_check().await {
        Ok(true) => "ok",
        _ => "degraded",
    };

    Json(json!({
        "status": status,
        "service": "api-service"
    }))
}

/// Landing page data; anonymous callers get a generic greeting
pub async fn home(user: Option<AuthUser>) -> impl IntoResponse {
    match user {
        Some(AuthUser(principal)) => Json(json!({
            "message": "Welcome back",
            "user": principal,
        })),
        None => Json(json!({
            "message": "Welcome to the marketplace",
        })),
    }
}

/// Target of forbidden redirects
pub async fn forbidden() -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"error": "You do not have access to this page"})),
    )
}

async fn not_found() -> impl IntoResponse {
    ApiError::NotFound("Page".to_string())
}

async fn find_listing(state: &AppState, id: Uuid) -> ApiResult<Listing> {
    state
        .repos
        .listings
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Listing".to_string()))
}

/// Listing owned by the calling provider
async fn owned_listing(state: &AppState, provider_id: Uuid, id: Uuid) -> ApiResult<Listing> {
    let listing = find_listing(state, id).await?;
    if listing.provider_id != provider_id {
        return Err(ApiError::Forbidden(
            "You do not own this listing".to_string(),
        ));
    }
    Ok(listing)
}

/// In-app notification plus an e-mail to the user's address
async fn inform(
    state: &AppState,
    user_id: Uuid,
    subject: &str,
    message: &str,
    kind: NotificationKind,
    contact_details: Option<&str>,
) {
    notify_best_effort(
        state.dispatcher.as_ref(),
        user_id,
        message,
        kind,
        contact_details,
    )
    .await;

    match state.repos.users.find_by_id(user_id).await {
        Ok(Some(user)) => {
            email_best_effort(state.email.as_ref(), &user.email, subject, message).await
        }
        Ok(None) => warn!("Cannot e-mail unknown user {}", user_id),
        Err(e) => warn!("Failed to look up user {} for e-mail: {}", user_id, e),
    }
}
