//! Notifications and per-user scores

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use common::models::Page;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extract::AuthUser,
    state::AppState,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", post(mark_notification_read))
        .route("/users/:id/trust", get(user_trust))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(page): Query<Page>,
) -> ApiResult<impl IntoResponse> {
    let notifications = state
        .repos
        .notifications
        .list_for_user(principal.id, page)
        .await?;

    Ok(Json(notifications))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if state
        .repos
        .notifications
        .mark_read(id, principal.id)
        .await?
    {
        Ok(Json(json!({"message": "Notification marked as read"})))
    } else {
        Err(ApiError::NotFound("Notification".to_string()))
    }
}

/// Trust score of the caller's own account
pub async fn user_trust(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if id != principal.id && !principal.is_admin() {
        return Err(ApiError::Forbidden(
            "You can only view your own trust score".to_string(),
        ));
    }
    let assessment = state.risk.score_user_trust(id, Utc::now()).await?;

    Ok(Json(assessment))
}
