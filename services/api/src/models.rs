//! API models for request and response payloads

use chrono::NaiveDate;
use common::models::{ListingStatus, Role, VerificationStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Longest message body accepted
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Request for picking the account role
#[derive(Deserialize)]
pub struct SelectRoleRequest {
    pub role: Role,
}

/// Request for provider business verification
#[derive(Deserialize)]
pub struct VerificationRequest {
    pub business_name: String,
    pub registration_number: String,
    pub document_url: Option<String>,
    pub contact_phone: Option<String>,
}

impl VerificationRequest {
    pub fn validate(&self) -> ApiResult<()> {
        require_text("business_name", &self.business_name)?;
        require_text("registration_number", &self.registration_number)
    }
}

/// Request for creating a listing
#[derive(Deserialize)]
pub struct CreateListingRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub location: String,
    pub price_per_night: f64,
    pub capacity: i32,
}

impl CreateListingRequest {
    pub fn validate(&self) -> ApiResult<()> {
        require_text("title", &self.title)?;
        require_text("category", &self.category)?;
        require_text("location", &self.location)?;
        validate_price(self.price_per_night)?;
        validate_capacity(self.capacity)
    }
}

pub fn validate_price(price: f64) -> ApiResult<()> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "price_per_night must be greater than zero".to_string(),
        ))
    }
}

pub fn validate_capacity(capacity: i32) -> ApiResult<()> {
    if capacity > 0 {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "capacity must be greater than zero".to_string(),
        ))
    }
}

pub fn require_text(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        Err(ApiError::BadRequest(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

/// Request for booking a listing
#[derive(Deserialize)]
pub struct CreateReservationRequest {
    pub listing_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Request for sending a message
#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub body: String,
}

/// Admin update of identity check flags
#[derive(Deserialize)]
pub struct IdentityChecksRequest {
    pub face_verified: Option<bool>,
    pub otp_verified: Option<bool>,
}

/// Admin moderation decision for a listing
#[derive(Deserialize)]
pub struct ModerateListingRequest {
    pub status: ListingStatus,
    pub reason: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct RejectVerificationRequest {
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct VerificationQuery {
    pub status: Option<VerificationStatus>,
}

#[derive(Deserialize)]
pub struct FlaggedQuery {
    pub threshold: Option<f64>,
}

/// Counts shown on the admin landing page
#[derive(Serialize)]
pub struct DashboardResponse {
    pub users: i64,
    pub listings_pending: i64,
    pub listings_approved: i64,
    pub listings_rejected: i64,
    pub reservations: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_validation() {
        let mut request = CreateListingRequest {
            title: "Loft".to_string(),
            description: String::new(),
            category: "apartment".to_string(),
            location: "Lisbon".to_string(),
            price_per_night: 80.0,
            capacity: 2,
        };
        assert!(request.validate().is_ok());

        request.price_per_night = 0.0;
        assert!(request.validate().is_err());

        request.price_per_night = 80.0;
        request.title = "   ".to_string();
        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "title is required");
    }

    #[test]
    fn test_capacity_must_be_positive() {
        assert!(validate_capacity(0).is_err());
        assert!(validate_capacity(4).is_ok());
    }
}
