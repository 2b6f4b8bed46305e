//! Admin area: moderation, verification review and risk oversight

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
};
use common::models::{ListingFilter, ListingStatus, NotificationKind, Page, Role};
use tracing::info;
use uuid::Uuid;

use super::inform;
use crate::{
    error::{ApiError, ApiResult},
    extract::{AuthUser, JsonBody},
    models::{
        DashboardResponse, FlaggedQuery, IdentityChecksRequest, ModerateListingRequest,
        RejectVerificationRequest, VerificationQuery,
    },
    state::AppState,
};

/// Scores at or above this are flagged unless the caller picks another threshold
const DEFAULT_FLAG_THRESHOLD: f64 = 0.7;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard))
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id/identity", patch(set_identity_checks))
        .route("/admin/listings", get(list_listings))
        .route("/admin/listings/:id/moderate", post(moderate_listing))
        .route("/admin/verifications", get(list_verifications))
        .route("/admin/verifications/:id/approve", post(approve_verification))
        .route("/admin/verifications/:id/reject", post(reject_verification))
        .route("/admin/reservations/flagged", get(flagged_reservations))
}

pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    user.require_role(Role::Admin)?;
    let listings = &state.repos.listings;

    Ok(Json(DashboardResponse {
        users: state.repos.users.count().await?,
        listings_pending: listings.count_by_status(ListingStatus::Pending).await?,
        listings_approved: listings.count_by_status(ListingStatus::Approved).await?,
        listings_rejected: listings.count_by_status(ListingStatus::Rejected).await?,
        reservations: state.repos.reservations.count().await?,
    }))
}

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<Page>,
) -> ApiResult<impl IntoResponse> {
    user.require_role(Role::Admin)?;
    let users = state.repos.users.list(page).await?;

    Ok(Json(users))
}

/// Record the outcome of face or OTP checks done outside the platform
pub async fn set_identity_checks(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<IdentityChecksRequest>,
) -> ApiResult<impl IntoResponse> {
    user.require_role(Role::Admin)?;
    if payload.face_verified.is_none() && payload.otp_verified.is_none() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }

    let updated = state
        .repos
        .users
        .set_identity_checks(id, payload.face_verified, payload.otp_verified)
        .await?;

    Ok(Json(updated))
}

/// All listings regardless of moderation status
pub async fn list_listings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<ListingFilter>,
    Query(page): Query<Page>,
) -> ApiResult<impl IntoResponse> {
    user.require_role(Role::Admin)?;
    let listings = state.repos.listings.list(&filter, page).await?;

    Ok(Json(listings))
}

pub async fn moderate_listing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<ModerateListingRequest>,
) -> ApiResult<impl IntoResponse> {
    let admin = user.require_role(Role::Admin)?;
    let reason = match payload.status {
        ListingStatus::Pending => {
            return Err(ApiError::BadRequest(
                "status must be APPROVED or REJECTED".to_string(),
            ));
        }
        ListingStatus::Approved => None,
        ListingStatus::Rejected => payload.reason.filter(|r| !r.trim().is_empty()),
    };

    let listing = state
        .repos
        .listings
        .set_status(id, payload.status, reason.clone())
        .await?;
    info!("Admin {} set listing {} to {}", admin.id, id, listing.status);

    let message = match reason {
        Some(reason) => format!(
            "Your listing \"{}\" was {}: {}",
            listing.title,
            listing.status.as_str().to_lowercase(),
            reason
        ),
        None => format!(
            "Your listing \"{}\" was {}",
            listing.title,
            listing.status.as_str().to_lowercase()
        ),
    };
    inform(
        &state,
        listing.provider_id,
        "Listing moderation",
        &message,
        NotificationKind::Listing,
        None,
    )
    .await;

    Ok(Json(listing))
}

pub async fn list_verifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<VerificationQuery>,
    Query(page): Query<Page>,
) -> ApiResult<impl IntoResponse> {
    user.require_role(Role::Admin)?;
    let requests = state
        .repos
        .verifications
        .list(query.status, page)
        .await?;

    Ok(Json(requests))
}

/// Approve the request and verify the provider in one transaction, then notify
pub async fn approve_verification(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let admin = user.require_role(Role::Admin)?;
    let request = state.repos.verifications.approve(id, admin.id).await?;
    info!(
        "Admin {} approved verification {} for user {}",
        admin.id, id, request.user_id
    );

    inform(
        &state,
        request.user_id,
        "Business verification approved",
        &format!(
            "Your business \"{}\" has been verified. You can now publish listings.",
            request.business_name
        ),
        NotificationKind::Verification,
        request.contact_phone.as_deref(),
    )
    .await;

    Ok(Json(request))
}

pub async fn reject_verification(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<JsonBody<RejectVerificationRequest>>,
) -> ApiResult<impl IntoResponse> {
    let admin = user.require_role(Role::Admin)?;
    let note = payload
        .and_then(|JsonBody(payload)| payload.note)
        .filter(|note| !note.trim().is_empty());

    let request = state
        .repos
        .verifications
        .reject(id, admin.id, note.clone())
        .await?;
    info!("Admin {} rejected verification {}", admin.id, id);

    let message = match note {
        Some(note) => format!(
            "Your business verification for \"{}\" was rejected: {}",
            request.business_name, note
        ),
        None => format!(
            "Your business verification for \"{}\" was rejected",
            request.business_name
        ),
    };
    inform(
        &state,
        request.user_id,
        "Business verification rejected",
        &message,
        NotificationKind::Verification,
        None,
    )
    .await;

    Ok(Json(request))
}

/// Reservations with any risk score at or above the threshold
pub async fn flagged_reservations(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<FlaggedQuery>,
    Query(page): Query<Page>,
) -> ApiResult<impl IntoResponse> {
    user.require_role(Role::Admin)?;
    let threshold = query.threshold.unwrap_or(DEFAULT_FLAG_THRESHOLD);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ApiError::BadRequest(
            "threshold must be between 0 and 1".to_string(),
        ));
    }

    let reservations = state
        .repos
        .reservations
        .list_flagged(threshold, page)
        .await?;

    Ok(Json(reservations))
}
