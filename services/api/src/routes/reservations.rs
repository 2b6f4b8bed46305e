//! Customer reservations

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use common::{
    models::{ListingStatus, NewReservation, NotificationKind, Page, Principal, Reservation, Role},
    notify::notify_best_effort,
};
use tracing::info;
use uuid::Uuid;

use super::find_listing;
use crate::{
    error::{ApiError, ApiResult},
    extract::{AuthUser, JsonBody},
    models::CreateReservationRequest,
    state::AppState,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/reservations",
            get(my_reservations).post(create_reservation),
        )
        .route("/reservations/:id", get(get_reservation))
        .route("/reservations/:id/cancel", post(cancel_reservation))
        .route("/reservations/:id/risk", get(reservation_risk))
}

pub async fn my_reservations(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(page): Query<Page>,
) -> ApiResult<impl IntoResponse> {
    let reservations = state
        .repos
        .reservations
        .list_for_user(principal.id, page)
        .await?;

    Ok(Json(reservations))
}

/// Book an approved listing; the provider is notified
pub async fn create_reservation(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreateReservationRequest>,
) -> ApiResult<impl IntoResponse> {
    let principal = user.require_role(Role::Customer)?;
    if payload.start_date >= payload.end_date {
        return Err(ApiError::BadRequest(
            "start_date must be before end_date".to_string(),
        ));
    }

    let listing = find_listing(&state, payload.listing_id).await?;
    if listing.status != ListingStatus::Approved {
        return Err(ApiError::NotFound("Listing".to_string()));
    }

    let nights = (payload.end_date - payload.start_date).num_days();
    let reservation = state
        .repos
        .reservations
        .create(&NewReservation {
            listing_id: listing.id,
            user_id: principal.id,
            start_date: payload.start_date,
            end_date: payload.end_date,
            total_price: listing.price_per_night * nights as f64,
        })
        .await?;
    info!(
        "User {} reserved listing {} ({} nights)",
        principal.id, listing.id, nights
    );

    notify_best_effort(
        state.dispatcher.as_ref(),
        listing.provider_id,
        &format!(
            "New reservation request for \"{}\" from {} to {}",
            listing.title, reservation.start_date, reservation.end_date
        ),
        NotificationKind::Reservation,
        Some(principal.email.as_str()),
    )
    .await;

    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Reservation visible to the booker or the listing's provider, with the listing owner
async fn visible_reservation(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> ApiResult<(Reservation, Uuid)> {
    let reservation = state
        .repos
        .reservations
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Reservation".to_string()))?;
    let listing = find_listing(state, reservation.listing_id).await?;

    if reservation.user_id != principal.id && listing.provider_id != principal.id {
        return Err(ApiError::Forbidden(
            "You cannot access this reservation".to_string(),
        ));
    }
    Ok((reservation, listing.provider_id))
}

/// Risk scores are computed on first read and cached afterwards
pub async fn get_reservation(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (reservation, _) = visible_reservation(&state, &principal, id).await?;
    let reservation = state
        .risk
        .reservation_with_risk(reservation, Utc::now())
        .await?;

    Ok(Json(reservation))
}

pub async fn cancel_reservation(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (reservation, provider_id) = visible_reservation(&state, &principal, id).await?;
    let cancelled = state.repos.reservations.cancel(reservation.id).await?;
    info!("User {} cancelled reservation {}", principal.id, id);

    let other_party = if principal.id == reservation.user_id {
        provider_id
    } else {
        reservation.user_id
    };
    notify_best_effort(
        state.dispatcher.as_ref(),
        other_party,
        &format!(
            "The reservation from {} to {} was cancelled",
            cancelled.start_date, cancelled.end_date
        ),
        NotificationKind::Reservation,
        None,
    )
    .await;

    Ok(Json(cancelled))
}

/// Recompute the scores with their contributing factors
pub async fn reservation_risk(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    visible_reservation(&state, &principal, id).await?;
    let report = state.risk.score_reservation(id, Utc::now()).await?;

    Ok(Json(report))
}
