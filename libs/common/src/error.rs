//! Custom error types for the common library
//!
//! This module defines application-specific error types that can be used
//! throughout the marketplace services.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// PostgreSQL SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL SQLSTATE for exclusion constraint violations
const EXCLUSION_VIOLATION: &str = "23P01";
/// PostgreSQL SQLSTATE for check constraint violations
const CHECK_VIOLATION: &str = "23514";

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Error returned by the repository traits
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The addressed entity does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// The write would break a uniqueness or overlap rule
    #[error("{0}")]
    Conflict(String),

    /// The entity is not in a state that allows the operation
    #[error("{0}")]
    InvalidState(String),

    /// A stored value could not be mapped back onto the model
    #[error("Stored value could not be decoded: {0}")]
    Decode(String),

    /// Any other storage failure
    #[error("Storage error: {0}")]
    Storage(#[source] SqlxError),
}

impl From<crate::models::UnknownVariant> for RepositoryError {
    fn from(err: crate::models::UnknownVariant) -> Self {
        RepositoryError::Decode(err.to_string())
    }
}

impl From<SqlxError> for RepositoryError {
    fn from(err: SqlxError) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned());

        match code.as_deref() {
            Some(UNIQUE_VIOLATION) => RepositoryError::Conflict("Record already exists".to_string()),
            Some(EXCLUSION_VIOLATION) => RepositoryError::Conflict(
                "Dates overlap an existing confirmed reservation".to_string(),
            ),
            Some(CHECK_VIOLATION) => {
                RepositoryError::InvalidState("Record violates a storage constraint".to_string())
            }
            _ => RepositoryError::Storage(err),
        }
    }
}

/// Type alias for Result with RepositoryError
pub type RepositoryResult<T> = Result<T, RepositoryError>;
