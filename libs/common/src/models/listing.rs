//! Listing model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_enum;

text_enum! {
    /// Moderation status set by admins
    ListingStatus, "listing status" {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
    }
}

/// Listing entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub price_per_night: f64,
    pub capacity: i32,
    pub status: ListingStatus,
    pub rejection_reason: Option<String>,
    pub demand_score: Option<f64>,
    pub suggested_price: Option<f64>,
    pub occupancy_forecast: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New listing creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewListing {
    pub provider_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub price_per_night: f64,
    pub capacity: i32,
}

/// Listing update payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateListing {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub price_per_night: Option<f64>,
    pub capacity: Option<i32>,
}

impl UpdateListing {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.location.is_none()
            && self.price_per_night.is_none()
            && self.capacity.is_none()
    }

    /// Apply the present fields onto a listing
    pub fn apply(&self, listing: &mut Listing) {
        if let Some(title) = &self.title {
            listing.title = title.clone();
        }
        if let Some(description) = &self.description {
            listing.description = description.clone();
        }
        if let Some(category) = &self.category {
            listing.category = category.clone();
        }
        if let Some(location) = &self.location {
            listing.location = location.clone();
        }
        if let Some(price) = self.price_per_night {
            listing.price_per_night = price;
        }
        if let Some(capacity) = self.capacity {
            listing.capacity = capacity;
        }
    }
}

/// Query filter for listing searches
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingFilter {
    pub status: Option<ListingStatus>,
    pub provider_id: Option<Uuid>,
    pub category: Option<String>,
    pub location: Option<String>,
}

impl ListingFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        self.status.is_none_or(|status| listing.status == status)
            && self
                .provider_id
                .is_none_or(|provider| listing.provider_id == provider)
            && self
                .category
                .as_deref()
                .is_none_or(|category| listing.category.eq_ignore_ascii_case(category))
            && self.location.as_deref().is_none_or(|location| {
                listing
                    .location
                    .to_lowercase()
                    .contains(&location.to_lowercase())
            })
    }
}
