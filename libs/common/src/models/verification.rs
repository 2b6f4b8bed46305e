//! Business verification requests submitted by providers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_enum;

text_enum! {
    /// Review status of a business verification request
    VerificationStatus, "verification status" {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
    }
}

/// Business verification entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessVerification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub registration_number: String,
    pub document_url: Option<String>,
    pub contact_phone: Option<String>,
    pub status: VerificationStatus,
    pub reviewed_by: Option<Uuid>,
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New verification request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBusinessVerification {
    pub user_id: Uuid,
    pub business_name: String,
    pub registration_number: String,
    pub document_url: Option<String>,
    pub contact_phone: Option<String>,
}
