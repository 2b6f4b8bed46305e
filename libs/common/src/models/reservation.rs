//! Reservation model and related functionality

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_enum;

text_enum! {
    /// Reservation lifecycle status
    ReservationStatus, "reservation status" {
        Pending => "PENDING",
        Confirmed => "CONFIRMED",
        Cancelled => "CANCELLED",
    }
}

/// Reservation entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ReservationStatus,
    pub total_price: f64,
    pub cancellation_risk: Option<f64>,
    pub fraud_risk: Option<f64>,
    pub overbooking_risk: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Number of nights covered by `[start_date, end_date)`
    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Half-open date range overlap
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date < end && start < self.end_date
    }

    /// Cached risk scores, if all three have been computed
    pub fn cached_risk(&self) -> Option<ReservationRisk> {
        Some(ReservationRisk {
            cancellation: self.cancellation_risk?,
            fraud: self.fraud_risk?,
            overbooking: self.overbooking_risk?,
        })
    }

    pub fn apply_risk(&mut self, risk: ReservationRisk) {
        self.cancellation_risk = Some(risk.cancellation);
        self.fraud_risk = Some(risk.fraud);
        self.overbooking_risk = Some(risk.overbooking);
    }
}

/// New reservation creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservation {
    pub listing_id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: f64,
}

/// The three reservation risk scores, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReservationRisk {
    pub cancellation: f64,
    pub fraud: f64,
    pub overbooking: f64,
}
