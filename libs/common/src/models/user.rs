//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_enum;

text_enum! {
    /// Marketplace role; unset until the user picks one
    Role, "role" {
        Customer => "CUSTOMER",
        Provider => "PROVIDER",
        Admin => "ADMIN",
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Option<Role>,
    /// Business verification approved by an admin
    pub verified: bool,
    pub is_face_verified: bool,
    pub is_otp_verified: bool,
    pub trust_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Identity view carried through request handling
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            verified: self.verified,
            is_face_verified: self.is_face_verified,
            is_otp_verified: self.is_otp_verified,
        }
    }
}

/// New user creation payload (password already hashed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Authenticated principal as seen by the access policy and handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub role: Option<Role>,
    pub verified: bool,
    pub is_face_verified: bool,
    pub is_otp_verified: bool,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}
