//! Provider area: listing management, pricing and reservation approval

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;
use common::{
    models::{ListingFilter, NewListing, NotificationKind, Page, Reservation, Role, UpdateListing},
    notify::notify_best_effort,
};
use tracing::info;
use uuid::Uuid;

use super::owned_listing;
use crate::{
    error::{ApiError, ApiResult},
    extract::{AuthUser, JsonBody},
    models::{CreateListingRequest, require_text, validate_capacity, validate_price},
    state::AppState,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/provider/listings", get(my_listings).post(create_listing))
        .route(
            "/provider/listings/:id",
            put(update_listing).delete(delete_listing),
        )
        .route("/provider/listings/:id/pricing", get(listing_pricing))
        .route("/provider/listings/:id/occupancy", get(listing_occupancy))
        .route("/provider/reservations", get(my_reservations))
        .route(
            "/provider/reservations/:id/confirm",
            post(confirm_reservation),
        )
        .route("/provider/reservations/:id/reject", post(reject_reservation))
}

pub async fn my_listings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<Page>,
) -> ApiResult<impl IntoResponse> {
    let principal = user.require_role(Role::Provider)?;
    let filter = ListingFilter {
        provider_id: Some(principal.id),
        ..ListingFilter::default()
    };
    let listings = state.repos.listings.list(&filter, page).await?;

    Ok(Json(listings))
}

/// New listings wait for moderation
pub async fn create_listing(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreateListingRequest>,
) -> ApiResult<impl IntoResponse> {
    let principal = user.require_role(Role::Provider)?;
    payload.validate()?;

    let listing = state
        .repos
        .listings
        .create(&NewListing {
            provider_id: principal.id,
            title: payload.title.trim().to_string(),
            description: payload.description,
            category: payload.category.trim().to_string(),
            location: payload.location.trim().to_string(),
            price_per_night: payload.price_per_night,
            capacity: payload.capacity,
        })
        .await?;
    info!("Provider {} created listing {}", principal.id, listing.id);

    Ok((StatusCode::CREATED, Json(listing)))
}

pub async fn update_listing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(update): JsonBody<UpdateListing>,
) -> ApiResult<impl IntoResponse> {
    let principal = user.require_role(Role::Provider)?;
    if update.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }
    for (field, value) in [
        ("title", &update.title),
        ("category", &update.category),
        ("location", &update.location),
    ] {
        if let Some(value) = value {
            require_text(field, value)?;
        }
    }
    if let Some(price) = update.price_per_night {
        validate_price(price)?;
    }
    if let Some(capacity) = update.capacity {
        validate_capacity(capacity)?;
    }

    owned_listing(&state, principal.id, id).await?;
    let listing = state.repos.listings.update(id, &update).await?;

    Ok(Json(listing))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let principal = user.require_role(Role::Provider)?;
    owned_listing(&state, principal.id, id).await?;

    if state.repos.listings.delete(id).await? {
        info!("Provider {} deleted listing {}", principal.id, id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Listing".to_string()))
    }
}

pub async fn listing_pricing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let principal = user.require_role(Role::Provider)?;
    owned_listing(&state, principal.id, id).await?;
    let suggestion = state.risk.price_listing(id, Utc::now()).await?;

    Ok(Json(suggestion))
}

pub async fn listing_occupancy(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let principal = user.require_role(Role::Provider)?;
    owned_listing(&state, principal.id, id).await?;
    let forecast = state.risk.predict_occupancy(id, Utc::now()).await?;

    Ok(Json(forecast))
}

/// Reservations on any of the caller's listings
pub async fn my_reservations(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<Page>,
) -> ApiResult<impl IntoResponse> {
    let principal = user.require_role(Role::Provider)?;
    let reservations = state
        .repos
        .reservations
        .list_for_provider(principal.id, page)
        .await?;

    Ok(Json(reservations))
}

async fn provider_reservation(
    state: &AppState,
    provider_id: Uuid,
    id: Uuid,
) -> ApiResult<Reservation> {
    let reservation = state
        .repos
        .reservations
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Reservation".to_string()))?;
    owned_listing(state, provider_id, reservation.listing_id).await?;
    Ok(reservation)
}

pub async fn confirm_reservation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let principal = user.require_role(Role::Provider)?;
    provider_reservation(&state, principal.id, id).await?;

    let reservation = state.repos.reservations.confirm(id).await?;
    info!("Provider {} confirmed reservation {}", principal.id, id);

    notify_best_effort(
        state.dispatcher.as_ref(),
        reservation.user_id,
        &format!(
            "Your reservation from {} to {} was confirmed",
            reservation.start_date, reservation.end_date
        ),
        NotificationKind::Reservation,
        None,
    )
    .await;

    Ok(Json(reservation))
}

pub async fn reject_reservation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let principal = user.require_role(Role::Provider)?;
    provider_reservation(&state, principal.id, id).await?;

    let reservation = state.repos.reservations.cancel(id).await?;
    info!("Provider {} rejected reservation {}", principal.id, id);

    notify_best_effort(
        state.dispatcher.as_ref(),
        reservation.user_id,
        &format!(
            "Your reservation from {} to {} was declined by the provider",
            reservation.start_date, reservation.end_date
        ),
        NotificationKind::Reservation,
        None,
    )
    .await;

    Ok(Json(reservation))
}
