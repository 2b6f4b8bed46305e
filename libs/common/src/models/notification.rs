//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_enum;

text_enum! {
    /// What a notification is about
    NotificationKind, "notification kind" {
        Reservation => "RESERVATION",
        Listing => "LISTING",
        Verification => "VERIFICATION",
        Message => "MESSAGE",
        System => "SYSTEM",
    }
}

/// Notification entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub contact_details: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// New notification payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub contact_details: Option<String>,
}
