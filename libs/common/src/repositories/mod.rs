//! Repository traits for marketplace persistence
//!
//! Handlers and workers only see these traits. [`postgres`] holds the sqlx
//! implementations; [`memory::MemoryStore`] implements every trait over
//! in-process maps and is what the test suites run against.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::RepositoryResult;
use crate::models::{
    BusinessVerification, Listing, ListingFilter, ListingStatus, Message, NewBusinessVerification,
    NewListing, NewMessage, NewNotification, NewReservation, NewUser, Notification, Page,
    Reservation, ReservationRisk, ReservationStatus, Role, UpdateListing, User,
    VerificationStatus,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user without a role; duplicate e-mail is a conflict
    async fn create(&self, new_user: &NewUser) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn list(&self, page: Page) -> RepositoryResult<Vec<User>>;
    /// Set the role once; a user that already has one is a conflict
    async fn assign_role(&self, id: Uuid, role: Role) -> RepositoryResult<User>;
    async fn set_identity_checks(
        &self,
        id: Uuid,
        face: Option<bool>,
        otp: Option<bool>,
    ) -> RepositoryResult<User>;
    async fn record_trust_score(&self, id: Uuid, score: f64) -> RepositoryResult<()>;
    async fn count(&self) -> RepositoryResult<i64>;
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn create(&self, new_listing: &NewListing) -> RepositoryResult<Listing>;
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Listing>>;
    async fn list(&self, filter: &ListingFilter, page: Page) -> RepositoryResult<Vec<Listing>>;
    /// Apply the update and send the listing back to moderation
    async fn update(&self, id: Uuid, update: &UpdateListing) -> RepositoryResult<Listing>;
    async fn delete(&self, id: Uuid) -> RepositoryResult<bool>;
    async fn set_status(
        &self,
        id: Uuid,
        status: ListingStatus,
        reason: Option<String>,
    ) -> RepositoryResult<Listing>;
    async fn record_pricing(
        &self,
        id: Uuid,
        demand_score: f64,
        suggested_price: f64,
    ) -> RepositoryResult<()>;
    async fn record_occupancy(&self, id: Uuid, forecast: f64) -> RepositoryResult<()>;
    async fn count_by_status(&self, status: ListingStatus) -> RepositoryResult<i64>;
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert a pending reservation; dates overlapping a confirmed one are a conflict
    async fn create(&self, new_reservation: &NewReservation) -> RepositoryResult<Reservation>;
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Reservation>>;
    async fn list_for_user(&self, user_id: Uuid, page: Page) -> RepositoryResult<Vec<Reservation>>;
    /// Reservations on listings owned by the provider
    async fn list_for_provider(
        &self,
        provider_id: Uuid,
        page: Page,
    ) -> RepositoryResult<Vec<Reservation>>;
    /// Pending reservations starting on or after `from`, soonest first
    async fn list_upcoming_pending(
        &self,
        from: NaiveDate,
        limit: i64,
    ) -> RepositoryResult<Vec<Reservation>>;
    /// Reservations with any risk score at or above `threshold`
    async fn list_flagged(&self, threshold: f64, page: Page) -> RepositoryResult<Vec<Reservation>>;
    /// PENDING → CONFIRMED; overlap with another confirmed reservation is a conflict
    async fn confirm(&self, id: Uuid) -> RepositoryResult<Reservation>;
    /// PENDING|CONFIRMED → CANCELLED
    async fn cancel(&self, id: Uuid) -> RepositoryResult<Reservation>;
    async fn record_risk(&self, id: Uuid, risk: ReservationRisk) -> RepositoryResult<()>;
    async fn count_for_user(
        &self,
        user_id: Uuid,
        status: Option<ReservationStatus>,
    ) -> RepositoryResult<i64>;
    async fn count_created_by_user_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepositoryResult<i64>;
    async fn count_created_for_listing_since(
        &self,
        listing_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepositoryResult<i64>;
    /// Reservations with `status` on the listing overlapping `[start, end)`
    async fn count_overlapping(
        &self,
        listing_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        status: ReservationStatus,
        exclude: Option<Uuid>,
    ) -> RepositoryResult<i64>;
    /// Nights with `status` on the listing that fall inside `[from, to)`
    async fn nights_booked(
        &self,
        listing_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        status: ReservationStatus,
    ) -> RepositoryResult<i64>;
    async fn count(&self) -> RepositoryResult<i64>;
}

#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// A user may only have one pending request
    async fn submit(
        &self,
        request: &NewBusinessVerification,
    ) -> RepositoryResult<BusinessVerification>;
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<BusinessVerification>>;
    async fn latest_for_user(&self, user_id: Uuid)
    -> RepositoryResult<Option<BusinessVerification>>;
    async fn list(
        &self,
        status: Option<VerificationStatus>,
        page: Page,
    ) -> RepositoryResult<Vec<BusinessVerification>>;
    /// Marks the request approved and the user verified, atomically
    async fn approve(&self, id: Uuid, reviewer: Uuid) -> RepositoryResult<BusinessVerification>;
    async fn reject(
        &self,
        id: Uuid,
        reviewer: Uuid,
        note: Option<String>,
    ) -> RepositoryResult<BusinessVerification>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn record(&self, notification: &NewNotification) -> RepositoryResult<Notification>;
    async fn list_for_user(&self, user_id: Uuid, page: Page)
    -> RepositoryResult<Vec<Notification>>;
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<bool>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn send(&self, message: &NewMessage) -> RepositoryResult<Message>;
    /// Both directions between two users, oldest first
    async fn conversation(
        &self,
        user_id: Uuid,
        other_id: Uuid,
        page: Page,
    ) -> RepositoryResult<Vec<Message>>;
    /// Messages received by the user, newest first
    async fn inbox(&self, user_id: Uuid, page: Page) -> RepositoryResult<Vec<Message>>;
    /// Mark messages from `sender_id` to `reader_id` as read
    async fn mark_read_from(&self, reader_id: Uuid, sender_id: Uuid) -> RepositoryResult<u64>;
}

/// The full set of repositories injected into services
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub listings: Arc<dyn ListingRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub verifications: Arc<dyn VerificationRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub messages: Arc<dyn MessageRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(postgres::PgUserRepository::new(pool.clone())),
            listings: Arc::new(postgres::PgListingRepository::new(pool.clone())),
            reservations: Arc::new(postgres::PgReservationRepository::new(pool.clone())),
            verifications: Arc::new(postgres::PgVerificationRepository::new(pool.clone())),
            notifications: Arc::new(postgres::PgNotificationRepository::new(pool.clone())),
            messages: Arc::new(postgres::PgMessageRepository::new(pool)),
        }
    }

    /// Every repository served by the same in-memory store
    pub fn in_memory(store: memory::MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            listings: Arc::new(store.clone()),
            reservations: Arc::new(store.clone()),
            verifications: Arc::new(store.clone()),
            notifications: Arc::new(store.clone()),
            messages: Arc::new(store),
        }
    }
}
