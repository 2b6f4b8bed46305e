//! User trust scorer

use chrono::{DateTime, Utc};

use super::{Assessment, ScoreCard, ratio};
use crate::models::User;

/// Reservation history of the scored user
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustSignals {
    pub reservations: i64,
    pub confirmed: i64,
    pub cancelled: i64,
}

pub fn trust_score(user: &User, signals: &TrustSignals, now: DateTime<Utc>) -> Assessment {
    let mut card = ScoreCard::new();

    card.add_if(user.verified, "business_verified", 0.3);
    card.add_if(user.is_face_verified, "face_verified", 0.2);
    card.add_if(user.is_otp_verified, "otp_verified", 0.2);
    card.add_if(signals.confirmed >= 3, "repeat_guest", 0.2);
    card.add_if(
        (now - user.created_at).num_days() > 90,
        "established_account",
        0.1,
    );
    card.add_if(
        ratio(signals.cancelled, signals.reservations) > 0.5,
        "frequent_cancellations",
        -0.3,
    );

    card.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn user(verified: bool, face: bool, otp: bool, age_days: i64) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: String::new(),
            role: None,
            verified,
            is_face_verified: face,
            is_otp_verified: otp,
            trust_score: None,
            created_at: Utc::now() - Duration::days(age_days),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn fully_established_user_is_fully_trusted() {
        let signals = TrustSignals {
            reservations: 5,
            confirmed: 5,
            cancelled: 0,
        };
        let assessment = trust_score(&user(true, true, true, 365), &signals, Utc::now());
        assert_eq!(assessment.score, 1.0);
    }

    #[test]
    fn cancellations_reduce_trust_but_never_below_zero() {
        let signals = TrustSignals {
            reservations: 4,
            confirmed: 0,
            cancelled: 3,
        };
        let fresh = trust_score(&user(false, false, false, 1), &signals, Utc::now());
        assert_eq!(fresh.score, 0.0);
        assert!(fresh.has_factor("frequent_cancellations"));

        let verified = trust_score(&user(false, true, true, 1), &signals, Utc::now());
        assert!((verified.score - 0.1).abs() < 1e-9);
    }
}
