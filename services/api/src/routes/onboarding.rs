//! Role selection and provider business verification

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use common::models::{NewBusinessVerification, Role};
use serde_json::json;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    extract::{AuthUser, JsonBody},
    models::{SelectRoleRequest, VerificationRequest},
    state::AppState,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/onboarding/role", get(role_status).post(select_role))
        .route(
            "/onboarding/verification",
            get(verification_status).post(submit_verification),
        )
}

pub async fn role_status(AuthUser(principal): AuthUser) -> impl IntoResponse {
    Json(json!({
        "role": principal.role,
        "available_roles": [Role::Customer, Role::Provider],
    }))
}

/// Pick CUSTOMER or PROVIDER; the role cannot be changed afterwards
pub async fn select_role(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    JsonBody(payload): JsonBody<SelectRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    if payload.role == Role::Admin {
        return Err(ApiError::BadRequest(
            "The admin role cannot be selected".to_string(),
        ));
    }

    let user = state
        .repos
        .users
        .assign_role(principal.id, payload.role)
        .await?;
    info!("User {} selected role {}", user.id, payload.role);

    Ok(Json(user))
}

/// Latest verification request of the caller, if any
pub async fn verification_status(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> ApiResult<impl IntoResponse> {
    let latest = state
        .repos
        .verifications
        .latest_for_user(principal.id)
        .await?;

    Ok(Json(json!({
        "verified": principal.verified,
        "request": latest,
    })))
}

pub async fn submit_verification(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<VerificationRequest>,
) -> ApiResult<impl IntoResponse> {
    let principal = user.require_role(Role::Provider)?;
    if principal.verified {
        return Err(ApiError::Conflict(
            "The account is already verified".to_string(),
        ));
    }
    payload.validate()?;

    let request = state
        .repos
        .verifications
        .submit(&NewBusinessVerification {
            user_id: principal.id,
            business_name: payload.business_name.trim().to_string(),
            registration_number: payload.registration_number.trim().to_string(),
            document_url: payload.document_url,
            contact_phone: payload.contact_phone,
        })
        .await?;
    info!("Provider {} submitted verification {}", principal.id, request.id);

    Ok((StatusCode::CREATED, Json(request)))
}
