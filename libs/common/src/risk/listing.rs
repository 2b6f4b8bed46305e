//! Dynamic pricing and occupancy scorers

use serde::Serialize;

use super::{Assessment, ScoreCard, clamp_unit};
use crate::models::Listing;

/// Look-ahead window for occupancy, in nights
pub const OCCUPANCY_HORIZON_DAYS: i64 = 30;

/// Nights already requested within the occupancy horizon
#[derive(Debug, Clone, Copy, Default)]
pub struct OccupancySignals {
    pub confirmed_nights: i64,
    pub pending_nights: i64,
}

/// Expected share of the next [`OCCUPANCY_HORIZON_DAYS`] nights that will be occupied
pub fn occupancy_prediction(signals: &OccupancySignals) -> Assessment {
    let horizon = OCCUPANCY_HORIZON_DAYS as f64;
    let mut card = ScoreCard::new();

    card.add(
        "confirmed_nights",
        signals.confirmed_nights.max(0) as f64 / horizon,
    );
    card.add(
        "pending_nights",
        0.5 * signals.pending_nights.max(0) as f64 / horizon,
    );

    card.finish()
}

/// Recent demand for a listing
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingSignals {
    /// Reservations created in the last 30 days
    pub recent_bookings: i64,
    /// Predicted occupancy in `[0, 1]`
    pub occupancy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingSuggestion {
    pub base_price: f64,
    pub suggested_price: f64,
    pub demand: Assessment,
}

/// Demand score and the nightly price it suggests
pub fn suggest_price(listing: &Listing, signals: &PricingSignals) -> PricingSuggestion {
    let mut card = ScoreCard::new();

    card.add_if(signals.recent_bookings >= 5, "high_booking_volume", 0.4);
    card.add_if(clamp_unit(signals.occupancy) > 0.7, "high_occupancy", 0.4);
    card.add_if(signals.recent_bookings > 0, "recent_interest", 0.2);

    let demand = card.finish();
    let multiplier = 0.8 + 0.5 * demand.score;
    let suggested_price = (listing.price_per_night * multiplier * 100.0).round() / 100.0;

    PricingSuggestion {
        base_price: listing.price_per_night,
        suggested_price,
        demand,
    }
}
