//! Reservation cancellation, fraud and overbooking scorers

use chrono::{DateTime, NaiveDate, Utc};

use super::{Assessment, ScoreCard, ratio};
use crate::models::{Reservation, ReservationStatus, User};

/// Booking history of the reservation's customer
#[derive(Debug, Clone, Copy, Default)]
pub struct CancellationSignals {
    pub user_reservations: i64,
    pub user_cancellations: i64,
    /// Confirmed stays other than the scored reservation
    pub prior_confirmed: i64,
}

pub fn cancellation_risk(
    reservation: &Reservation,
    signals: &CancellationSignals,
    today: NaiveDate,
) -> Assessment {
    let mut card = ScoreCard::new();

    card.add_if(
        ratio(signals.user_cancellations, signals.user_reservations) > 0.3,
        "frequent_cancellations",
        0.4,
    );

    let lead_time = (reservation.start_date - reservation.created_at.date_naive()).num_days();
    card.add_if(lead_time < 2, "last_minute_booking", 0.2);
    card.add_if(reservation.nights() > 14, "long_stay", 0.2);
    card.add_if(signals.prior_confirmed == 0, "no_completed_stays", 0.1);

    let days_until_start = (reservation.start_date - today).num_days();
    card.add_if(
        reservation.status == ReservationStatus::Pending && (0..7).contains(&days_until_start),
        "unconfirmed_close_to_start",
        0.1,
    );

    card.finish()
}

/// Activity around the booking and the listing's advertised price
#[derive(Debug, Clone, Copy, Default)]
pub struct FraudSignals {
    /// Reservations the booker created in the last 24 hours
    pub bookings_last_24h: i64,
    pub nightly_price: f64,
}

pub fn fraud_risk(
    reservation: &Reservation,
    booker: &User,
    signals: &FraudSignals,
    now: DateTime<Utc>,
) -> Assessment {
    let mut card = ScoreCard::new();

    card.add_if(
        (now - booker.created_at).num_days() < 7,
        "new_account",
        0.3,
    );
    card.add_if(
        !booker.is_face_verified && !booker.is_otp_verified,
        "unverified_identity",
        0.3,
    );
    card.add_if(signals.bookings_last_24h > 3, "booking_burst", 0.2);

    let expected = signals.nightly_price * reservation.nights() as f64;
    let mismatch = expected > 0.0 && ((reservation.total_price - expected).abs() / expected) > 0.5;
    card.add_if(mismatch, "price_mismatch", 0.2);

    card.finish()
}

/// Other reservations on the same listing whose dates overlap
#[derive(Debug, Clone, Copy, Default)]
pub struct OverbookingSignals {
    pub overlapping_pending: i64,
    pub overlapping_confirmed: i64,
}

pub fn overbooking_risk(signals: &OverbookingSignals) -> Assessment {
    let mut card = ScoreCard::new();

    card.add_if(signals.overlapping_pending >= 1, "competing_requests", 0.5);
    card.add_if(signals.overlapping_pending >= 3, "heavily_contested", 0.3);
    card.add_if(signals.overlapping_confirmed >= 1, "dates_already_taken", 0.2);

    card.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn reservation(start_in: i64, nights: i64) -> Reservation {
        let today = now().date_naive();
        Reservation {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            start_date: today + Duration::days(start_in),
            end_date: today + Duration::days(start_in + nights),
            status: ReservationStatus::Pending,
            total_price: 100.0 * nights as f64,
            cancellation_risk: None,
            fraud_risk: None,
            overbooking_risk: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn booker(age_days: i64, face: bool, otp: bool) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Booker".to_string(),
            email: "booker@example.com".to_string(),
            password_hash: String::new(),
            role: Some(crate::models::Role::Customer),
            verified: false,
            is_face_verified: face,
            is_otp_verified: otp,
            trust_score: None,
            created_at: now() - Duration::days(age_days),
            updated_at: now(),
        }
    }

    #[test]
    fn reliable_customer_booking_ahead_scores_zero() {
        let signals = CancellationSignals {
            user_reservations: 10,
            user_cancellations: 1,
            prior_confirmed: 8,
        };
        let assessment = cancellation_risk(&reservation(30, 3), &signals, now().date_naive());
        assert_eq!(assessment.score, 0.0);
        assert!(assessment.contributions.is_empty());
    }

    #[test]
    fn cancellation_factors_accumulate() {
        let signals = CancellationSignals {
            user_reservations: 4,
            user_cancellations: 2,
            prior_confirmed: 0,
        };
        let assessment = cancellation_risk(&reservation(1, 20), &signals, now().date_naive());

        // 0.4 + 0.2 + 0.2 + 0.1 + 0.1
        assert!((assessment.score - 1.0).abs() < 1e-9);
        assert!(assessment.has_factor("frequent_cancellations"));
        assert!(assessment.has_factor("last_minute_booking"));
        assert!(assessment.has_factor("long_stay"));
        assert!(assessment.has_factor("unconfirmed_close_to_start"));
    }

    #[test]
    fn cancellation_status_is_not_a_factor() {
        let mut cancelled = reservation(30, 2);
        cancelled.status = ReservationStatus::Cancelled;
        let assessment = cancellation_risk(
            &cancelled,
            &CancellationSignals {
                prior_confirmed: 3,
                ..Default::default()
            },
            now().date_naive(),
        );
        assert_eq!(assessment.score, 0.0);
        assert!(assessment.contributions.is_empty());
    }

    #[test]
    fn fraud_flags_new_unverified_bursty_accounts() {
        let mut suspicious = reservation(10, 2);
        suspicious.total_price = 20.0;
        let signals = FraudSignals {
            bookings_last_24h: 5,
            nightly_price: 100.0,
        };

        let assessment = fraud_risk(&suspicious, &booker(1, false, false), &signals, now());
        assert!((assessment.score - 1.0).abs() < 1e-9);
        assert!(assessment.has_factor("price_mismatch"));
    }

    #[test]
    fn fraud_is_low_for_established_verified_users() {
        let signals = FraudSignals {
            bookings_last_24h: 1,
            nightly_price: 100.0,
        };
        let assessment = fraud_risk(&reservation(10, 2), &booker(400, true, false), &signals, now());
        assert_eq!(assessment.score, 0.0);
    }

    #[test]
    fn fraud_ignores_price_check_without_reference_price() {
        let signals = FraudSignals {
            bookings_last_24h: 0,
            nightly_price: 0.0,
        };
        let assessment = fraud_risk(&reservation(10, 2), &booker(400, false, true), &signals, now());
        assert!(!assessment.has_factor("price_mismatch"));
    }

    #[test]
    fn overbooking_reflects_competing_requests() {
        assert_eq!(overbooking_risk(&OverbookingSignals::default()).score, 0.0);

        let one = overbooking_risk(&OverbookingSignals {
            overlapping_pending: 1,
            overlapping_confirmed: 0,
        });
        assert!((one.score - 0.5).abs() < 1e-9);

        let crowded = overbooking_risk(&OverbookingSignals {
            overlapping_pending: 4,
            overlapping_confirmed: 1,
        });
        assert_eq!(crowded.score, 1.0);
    }

    #[test]
    fn reservation_scores_stay_in_unit_interval() {
        let today = now().date_naive();
        for start_in in [-5, 0, 1, 3, 10, 60] {
            for nights in [1, 7, 15, 40] {
                for (total, cancelled) in [(0, 0), (3, 3), (10, 2), (1, 0)] {
                    let r = reservation(start_in, nights);
                    let c = cancellation_risk(
                        &r,
                        &CancellationSignals {
                            user_reservations: total,
                            user_cancellations: cancelled,
                            prior_confirmed: total - cancelled,
                        },
                        today,
                    );
                    assert!((0.0..=1.0).contains(&c.score));

                    let f = fraud_risk(
                        &r,
                        &booker(start_in.abs(), false, false),
                        &FraudSignals {
                            bookings_last_24h: total,
                            nightly_price: 50.0,
                        },
                        now(),
                    );
                    assert!((0.0..=1.0).contains(&f.score));

                    let o = overbooking_risk(&OverbookingSignals {
                        overlapping_pending: total,
                        overlapping_confirmed: cancelled,
                    });
                    assert!((0.0..=1.0).contains(&o.score));
                }
            }
        }
    }
}
