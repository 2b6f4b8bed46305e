//! Common library for the marketplace services
//!
//! This crate provides the functionality shared by the auth service, the
//! marketplace API and the risk worker: domain models, repository traits
//! with PostgreSQL and in-memory implementations, the request access policy,
//! risk scoring, tokens, the key/value cache and notification dispatch.
//!
//! # Example
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, init_pool, health_check};
//! use common::repositories::Repositories;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     let repos = Repositories::postgres(pool);
//!     println!("Users: {}", repos.users.count().await?);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod database;
pub mod error;
pub mod models;
pub mod notify;
pub mod policy;
pub mod repositories;
pub mod risk;
pub mod token;
