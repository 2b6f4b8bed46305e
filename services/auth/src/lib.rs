//! Authentication service
//!
//! Registration, sign-in, refresh token rotation and sign-out. Access tokens
//! carry the user's role and verification flags for the marketplace API.

pub mod config;
pub mod error;
pub mod extract;
pub mod password;
pub mod rate_limiter;
pub mod routes;
pub mod session;
pub mod validation;

use common::{cache::KeyValueStore, repositories::UserRepository, token::JwtService};
use std::sync::Arc;

pub use routes::create_router;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub jwt_service: JwtService,
    pub sessions: session::SessionManager,
    pub revocations: Arc<dyn KeyValueStore>,
    pub rate_limiter: rate_limiter::RateLimiter,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        jwt_service: JwtService,
        store: Arc<dyn KeyValueStore>,
        rate_limiter: rate_limiter::RateLimiter,
    ) -> Self {
        let sessions = session::SessionManager::new(store.clone(), jwt_service.refresh_token_expiry());

        Self {
            users,
            jwt_service,
            sessions,
            revocations: store,
            rate_limiter,
        }
    }
}
