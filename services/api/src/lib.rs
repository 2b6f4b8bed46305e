//! Marketplace API service
//!
//! Listings, reservations, messaging, notifications and the admin area. Every
//! route except `/health` runs behind the access policy middleware.

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
