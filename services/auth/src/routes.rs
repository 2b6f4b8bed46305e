//! Authentication service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use common::{
    models::{NewUser, User},
    token::{Claims, TokenType},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    AppState,
    error::{AuthError, AuthResult},
    extract::JsonBody,
    password::{hash_password, verify_password},
    validation::{validate_email, validate_name, validate_password},
};

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request carrying a refresh token
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Response for token generation
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: User,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/logout", post(logout))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = match state.sessions.health_check().await {
        Ok(true) => "ok",
        _ => "degraded",
    };

    Json(serde_json::json!({
        "status": status,
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AuthResult<impl IntoResponse> {
    let email = payload.email.trim().to_lowercase();

    validate_name(&payload.name).map_err(AuthError::Validation)?;
    validate_email(&email).map_err(AuthError::Validation)?;
    validate_password(&payload.password).map_err(AuthError::Validation)?;

    let user = state
        .users
        .create(&NewUser {
            name: payload.name.trim().to_string(),
            email,
            password_hash: hash_password(&payload.password)?,
        })
        .await?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Issue a token pair and make the refresh token the active session
async fn issue_tokens(state: &AppState, user: User) -> AuthResult<TokenResponse> {
    let access_token = state.jwt_service.generate_access_token(&user)?;
    let refresh_token = state.jwt_service.generate_refresh_token(&user)?;

    state.sessions.store_session(user.id, &refresh_token).await?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
        user,
    })
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    let email = payload.email.trim().to_lowercase();
    info!("Login attempt for user: {}", email);

    if !state.rate_limiter.is_allowed(&email).await {
        warn!("Rate limited login attempt for {}", email);
        return Err(AuthError::RateLimited);
    }

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .filter(|user| verify_password(&payload.password, &user.password_hash))
        .ok_or(AuthError::InvalidCredentials)?;

    state.rate_limiter.reset(&email).await;

    let response = issue_tokens(&state, user).await?;
    Ok((StatusCode::OK, Json(response)))
}

/// Validate a refresh token that is neither revoked nor superseded
async fn active_refresh_claims(state: &AppState, token: &str) -> AuthResult<Claims> {
    let claims = state
        .jwt_service
        .validate_token(token)
        .map_err(|_| AuthError::Unauthorized)?;

    if claims.token_type != TokenType::Refresh {
        return Err(AuthError::Unauthorized);
    }

    if state
        .jwt_service
        .is_revoked(state.revocations.as_ref(), token)
        .await?
    {
        return Err(AuthError::Unauthorized);
    }

    if !state.sessions.is_session_valid(claims.sub, token).await? {
        return Err(AuthError::Unauthorized);
    }

    Ok(claims)
}

/// Refresh token endpoint
///
/// The access token is rebuilt from the stored user so that a role picked or
/// a verification granted since sign-in shows up; the refresh token rotates.
pub async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshTokenRequest>,
) -> AuthResult<impl IntoResponse> {
    info!("Token refresh request");

    let claims = active_refresh_claims(&state, &payload.refresh_token).await?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AuthError::Unauthorized)?;

    state
        .jwt_service
        .revoke(state.revocations.as_ref(), &claims, &payload.refresh_token)
        .await?;

    let response = issue_tokens(&state, user).await?;
    Ok((StatusCode::OK, Json(response)))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshTokenRequest>,
) -> AuthResult<impl IntoResponse> {
    info!("Logout request");

    let claims = active_refresh_claims(&state, &payload.refresh_token).await?;

    state
        .jwt_service
        .revoke(state.revocations.as_ref(), &claims, &payload.refresh_token)
        .await?;
    state.sessions.delete_session(claims.sub).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Logged out successfully"})),
    ))
}
