//! Domain models shared by the marketplace services

use serde::Deserialize;

// Re-export for convenience
pub use listing::{Listing, ListingFilter, ListingStatus, NewListing, UpdateListing};
pub use message::{Message, NewMessage};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use reservation::{NewReservation, Reservation, ReservationRisk, ReservationStatus};
pub use user::{NewUser, Principal, Role, User};
pub use verification::{BusinessVerification, NewBusinessVerification, VerificationStatus};

/// Error returned when a stored or submitted label is not a known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares an upper-case text enum stored as TEXT and serialized by name
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Get the stored label
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($label => Ok($name::$variant),)+
                    other => Err($crate::models::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use text_enum;

pub mod listing;
pub mod message;
pub mod notification;
pub mod reservation;
pub mod user;
pub mod verification;

/// Pagination parameters (1-based page)
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Page {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Page {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) as i64 * self.limit() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_page_defaults_and_bounds() {
        let page = Page::default();
        assert_eq!(page.page(), 1);
        assert_eq!(page.limit(), 10);
        assert_eq!(page.offset(), 0);

        let page = Page {
            page: Some(3),
            limit: Some(500),
        };
        assert_eq!(page.limit(), 100);
        assert_eq!(page.offset(), 200);

        let page = Page {
            page: Some(0),
            limit: Some(0),
        };
        assert_eq!(page.page(), 1);
        assert_eq!(page.limit(), 1);
    }

    #[test]
    fn test_text_enum_labels() {
        assert_eq!(Role::from_str("PROVIDER"), Ok(Role::Provider));
        assert_eq!(ReservationStatus::Confirmed.as_str(), "CONFIRMED");
        let err = ListingStatus::from_str("archived").unwrap_err();
        assert_eq!(err.to_string(), "unknown listing status 'archived'");
    }
}
