//! PostgreSQL implementations of the repository traits

mod listing;
mod message;
mod notification;
mod reservation;
mod user;
mod verification;

pub use listing::PgListingRepository;
pub use message::PgMessageRepository;
pub use notification::PgNotificationRepository;
pub use reservation::PgReservationRepository;
pub use user::PgUserRepository;
pub use verification::PgVerificationRepository;
