//! Repository-backed scoring service

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{
    Assessment, CancellationSignals, FraudSignals, OCCUPANCY_HORIZON_DAYS, OccupancySignals,
    OverbookingSignals, PricingSignals, PricingSuggestion, TrustSignals, cancellation_risk,
    fraud_risk, occupancy_prediction, overbooking_risk, suggest_price, trust_score,
};
use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{Listing, Reservation, ReservationRisk, ReservationStatus, User};
use crate::repositories::Repositories;

/// The three reservation scores with the factors behind each
#[derive(Debug, Clone, Serialize)]
pub struct ReservationRiskReport {
    pub reservation_id: Uuid,
    pub cancellation: Assessment,
    pub fraud: Assessment,
    pub overbooking: Assessment,
}

impl ReservationRiskReport {
    pub fn scores(&self) -> ReservationRisk {
        ReservationRisk {
            cancellation: self.cancellation.score,
            fraud: self.fraud.score,
            overbooking: self.overbooking.score,
        }
    }
}

/// Gathers scorer inputs from the repositories and writes the results back
#[derive(Clone)]
pub struct RiskService {
    repos: Repositories,
}

impl RiskService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn reservation(&self, id: Uuid) -> RepositoryResult<Reservation> {
        self.repos
            .reservations
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Reservation".to_string()))
    }

    async fn listing(&self, id: Uuid) -> RepositoryResult<Listing> {
        self.repos
            .listings
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Listing".to_string()))
    }

    async fn user(&self, id: Uuid) -> RepositoryResult<User> {
        self.repos
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("User".to_string()))
    }

    /// Compute all three reservation scores without persisting them
    pub async fn assess_reservation(
        &self,
        reservation: &Reservation,
        now: DateTime<Utc>,
    ) -> RepositoryResult<ReservationRiskReport> {
        let reservations = &self.repos.reservations;
        let listing = self.listing(reservation.listing_id).await?;
        let booker = self.user(reservation.user_id).await?;

        let confirmed = reservations
            .count_for_user(booker.id, Some(ReservationStatus::Confirmed))
            .await?;
        let cancellation_signals = CancellationSignals {
            user_reservations: reservations.count_for_user(booker.id, None).await?,
            user_cancellations: reservations
                .count_for_user(booker.id, Some(ReservationStatus::Cancelled))
                .await?,
            prior_confirmed: if reservation.status == ReservationStatus::Confirmed {
                confirmed - 1
            } else {
                confirmed
            },
        };

        let fraud_signals = FraudSignals {
            bookings_last_24h: reservations
                .count_created_by_user_since(booker.id, now - Duration::hours(24))
                .await?,
            nightly_price: listing.price_per_night,
        };

        let overbooking_signals = OverbookingSignals {
            overlapping_pending: reservations
                .count_overlapping(
                    reservation.listing_id,
                    reservation.start_date,
                    reservation.end_date,
                    ReservationStatus::Pending,
                    Some(reservation.id),
                )
                .await?,
            overlapping_confirmed: reservations
                .count_overlapping(
                    reservation.listing_id,
                    reservation.start_date,
                    reservation.end_date,
                    ReservationStatus::Confirmed,
                    Some(reservation.id),
                )
                .await?,
        };

        Ok(ReservationRiskReport {
            reservation_id: reservation.id,
            cancellation: cancellation_risk(
                reservation,
                &cancellation_signals,
                now.date_naive(),
            ),
            fraud: fraud_risk(reservation, &booker, &fraud_signals, now),
            overbooking: overbooking_risk(&overbooking_signals),
        })
    }

    /// Recompute and persist the reservation's scores, overwriting any cached ones
    pub async fn score_reservation(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> RepositoryResult<ReservationRiskReport> {
        let reservation = self.reservation(id).await?;
        let report = self.assess_reservation(&reservation, now).await?;

        self.repos
            .reservations
            .record_risk(id, report.scores())
            .await?;

        info!(
            "Scored reservation {}: cancellation={:.2} fraud={:.2} overbooking={:.2}",
            id, report.cancellation.score, report.fraud.score, report.overbooking.score
        );
        Ok(report)
    }

    /// Return the reservation with its scores, computing them only when missing
    pub async fn reservation_with_risk(
        &self,
        mut reservation: Reservation,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Reservation> {
        if reservation.cached_risk().is_some() {
            return Ok(reservation);
        }

        let report = self.assess_reservation(&reservation, now).await?;
        self.repos
            .reservations
            .record_risk(reservation.id, report.scores())
            .await?;
        reservation.apply_risk(report.scores());
        Ok(reservation)
    }

    /// Predict and persist the listing's occupancy over the next horizon
    pub async fn predict_occupancy(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Assessment> {
        self.listing(id).await?;
        let assessment = self.occupancy_for(id, now).await?;

        self.repos
            .listings
            .record_occupancy(id, assessment.score)
            .await?;
        Ok(assessment)
    }

    async fn occupancy_for(&self, id: Uuid, now: DateTime<Utc>) -> RepositoryResult<Assessment> {
        let from = now.date_naive();
        let to = from + Duration::days(OCCUPANCY_HORIZON_DAYS);
        let reservations = &self.repos.reservations;

        let signals = OccupancySignals {
            confirmed_nights: reservations
                .nights_booked(id, from, to, ReservationStatus::Confirmed)
                .await?,
            pending_nights: reservations
                .nights_booked(id, from, to, ReservationStatus::Pending)
                .await?,
        };
        Ok(occupancy_prediction(&signals))
    }

    /// Suggest and persist a nightly price from recent demand
    pub async fn price_listing(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> RepositoryResult<PricingSuggestion> {
        let listing = self.listing(id).await?;
        let occupancy = self.occupancy_for(id, now).await?;

        let signals = PricingSignals {
            recent_bookings: self
                .repos
                .reservations
                .count_created_for_listing_since(id, now - Duration::days(30))
                .await?,
            occupancy: occupancy.score,
        };
        let suggestion = suggest_price(&listing, &signals);

        self.repos
            .listings
            .record_pricing(id, suggestion.demand.score, suggestion.suggested_price)
            .await?;
        Ok(suggestion)
    }

    /// Compute and persist a user's trust score
    pub async fn score_user_trust(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Assessment> {
        let user = self.user(id).await?;
        let reservations = &self.repos.reservations;

        let signals = TrustSignals {
            reservations: reservations.count_for_user(id, None).await?,
            confirmed: reservations
                .count_for_user(id, Some(ReservationStatus::Confirmed))
                .await?,
            cancelled: reservations
                .count_for_user(id, Some(ReservationStatus::Cancelled))
                .await?,
        };
        let assessment = trust_score(&user, &signals, now);

        self.repos
            .users
            .record_trust_score(id, assessment.score)
            .await?;
        Ok(assessment)
    }
}
