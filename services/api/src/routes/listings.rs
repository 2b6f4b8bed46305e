//! Public listing browse

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use common::models::{ListingFilter, ListingStatus, Page};
use uuid::Uuid;

use super::find_listing;
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/listings", get(list_listings))
        .route("/listings/:id", get(get_listing))
}

/// Approved listings, optionally filtered by category, location or provider
pub async fn list_listings(
    State(state): State<AppState>,
    Query(filter): Query<ListingFilter>,
    Query(page): Query<Page>,
) -> ApiResult<impl IntoResponse> {
    let filter = ListingFilter {
        status: Some(ListingStatus::Approved),
        ..filter
    };
    let listings = state.repos.listings.list(&filter, page).await?;

    Ok(Json(listings))
}

pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let listing = find_listing(&state, id).await?;
    if listing.status != ListingStatus::Approved {
        return Err(ApiError::NotFound("Listing".to_string()));
    }

    Ok(Json(listing))
}
