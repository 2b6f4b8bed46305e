//! Direct messages between users

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use common::{
    models::{NewMessage, NotificationKind, Page},
    notify::notify_best_effort,
};
use uuid::Uuid;

use super::find_listing;
use crate::{
    error::{ApiError, ApiResult},
    extract::{AuthUser, JsonBody},
    models::{MAX_MESSAGE_LENGTH, SendMessageRequest},
    state::AppState,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", get(inbox).post(send_message))
        .route("/messages/:user_id", get(conversation))
}

pub async fn inbox(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(page): Query<Page>,
) -> ApiResult<impl IntoResponse> {
    let messages = state.repos.messages.inbox(principal.id, page).await?;

    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    JsonBody(payload): JsonBody<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let body = payload.body.trim();
    if body.is_empty() {
        return Err(ApiError::BadRequest("Message body is required".to_string()));
    }
    if body.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Message body must be at most {} characters",
            MAX_MESSAGE_LENGTH
        )));
    }
    if payload.recipient_id == principal.id {
        return Err(ApiError::BadRequest(
            "You cannot message yourself".to_string(),
        ));
    }

    state
        .repos
        .users
        .find_by_id(payload.recipient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipient".to_string()))?;
    if let Some(listing_id) = payload.listing_id {
        find_listing(&state, listing_id).await?;
    }

    let message = state
        .repos
        .messages
        .send(&NewMessage {
            sender_id: principal.id,
            recipient_id: payload.recipient_id,
            listing_id: payload.listing_id,
            body: body.to_string(),
        })
        .await?;

    notify_best_effort(
        state.dispatcher.as_ref(),
        payload.recipient_id,
        &format!("New message from {}", principal.email),
        NotificationKind::Message,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Both directions with another user; their messages are marked read
pub async fn conversation(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(user_id): Path<Uuid>,
    Query(page): Query<Page>,
) -> ApiResult<impl IntoResponse> {
    let messages = state
        .repos
        .messages
        .conversation(principal.id, user_id, page)
        .await?;
    state
        .repos
        .messages
        .mark_read_from(principal.id, user_id)
        .await?;

    Ok(Json(messages))
}
