//! In-memory repositories
//!
//! `MemoryStore` keeps every table in one mutex-guarded struct so that
//! multi-row operations (booking, confirmation, verification approval) are
//! atomic the same way the PostgreSQL transactions are.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{
    BusinessVerification, Listing, ListingFilter, ListingStatus, Message, NewBusinessVerification,
    NewListing, NewMessage, NewNotification, NewReservation, NewUser, Notification, Page,
    Reservation, ReservationRisk, ReservationStatus, Role, UpdateListing, User,
    VerificationStatus,
};
use crate::repositories::{
    ListingRepository, MessageRepository, NotificationRepository, ReservationRepository,
    UserRepository, VerificationRepository,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    listings: Vec<Listing>,
    reservations: Vec<Reservation>,
    verifications: Vec<BusinessVerification>,
    notifications: Vec<Notification>,
    messages: Vec<Message>,
}

impl Tables {
    fn user_mut(&mut self, id: Uuid) -> RepositoryResult<&mut User> {
        self.users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or_else(|| RepositoryError::NotFound("User".to_string()))
    }

    fn listing_mut(&mut self, id: Uuid) -> RepositoryResult<&mut Listing> {
        self.listings
            .iter_mut()
            .find(|listing| listing.id == id)
            .ok_or_else(|| RepositoryError::NotFound("Listing".to_string()))
    }

    fn reservation_mut(&mut self, id: Uuid) -> RepositoryResult<&mut Reservation> {
        self.reservations
            .iter_mut()
            .find(|reservation| reservation.id == id)
            .ok_or_else(|| RepositoryError::NotFound("Reservation".to_string()))
    }

    fn confirmed_overlap_exists(
        &self,
        listing_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> bool {
        self.reservations.iter().any(|r| {
            r.listing_id == listing_id
                && r.status == ReservationStatus::Confirmed
                && Some(r.id) != exclude
                && r.overlaps(start, end)
        })
    }
}

/// Slice out one page of an already ordered result
fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

fn overlap_conflict() -> RepositoryError {
    RepositoryError::Conflict("Dates overlap an existing confirmed reservation".to_string())
}

/// Shared in-process store implementing every repository trait
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, new_user: &NewUser) -> RepositoryResult<User> {
        let mut tables = self.tables.lock().await;
        let email = new_user.email.to_lowercase();

        if tables.users.iter().any(|user| user.email == email) {
            return Err(RepositoryError::Conflict(
                "Email is already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name.clone(),
            email,
            password_hash: new_user.password_hash.clone(),
            role: None,
            verified: false,
            is_face_verified: false,
            is_otp_verified: false,
            trust_score: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let email = email.to_lowercase();
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|user| user.email == email).cloned())
    }

    async fn list(&self, page: Page) -> RepositoryResult<Vec<User>> {
        let tables = self.tables.lock().await;
        let users = tables.users.iter().rev().cloned().collect();
        Ok(paginate(users, page))
    }

    async fn assign_role(&self, id: Uuid, role: Role) -> RepositoryResult<User> {
        let mut tables = self.tables.lock().await;
        let user = tables.user_mut(id)?;

        if user.role.is_some() {
            return Err(RepositoryError::Conflict(
                "Role has already been selected".to_string(),
            ));
        }

        user.role = Some(role);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_identity_checks(
        &self,
        id: Uuid,
        face: Option<bool>,
        otp: Option<bool>,
    ) -> RepositoryResult<User> {
        let mut tables = self.tables.lock().await;
        let user = tables.user_mut(id)?;

        if let Some(face) = face {
            user.is_face_verified = face;
        }
        if let Some(otp) = otp {
            user.is_otp_verified = otp;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn record_trust_score(&self, id: Uuid, score: f64) -> RepositoryResult<()> {
        let mut tables = self.tables.lock().await;
        tables.user_mut(id)?.trust_score = Some(score);
        Ok(())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        Ok(self.tables.lock().await.users.len() as i64)
    }
}

#[async_trait]
impl ListingRepository for MemoryStore {
    async fn create(&self, new_listing: &NewListing) -> RepositoryResult<Listing> {
        let mut tables = self.tables.lock().await;

        if !tables.users.iter().any(|user| user.id == new_listing.provider_id) {
            return Err(RepositoryError::NotFound("User".to_string()));
        }

        let now = Utc::now();
        let listing = Listing {
            id: Uuid::new_v4(),
            provider_id: new_listing.provider_id,
            title: new_listing.title.clone(),
            description: new_listing.description.clone(),
            category: new_listing.category.clone(),
            location: new_listing.location.clone(),
            price_per_night: new_listing.price_per_night,
            capacity: new_listing.capacity,
            status: ListingStatus::Pending,
            rejection_reason: None,
            demand_score: None,
            suggested_price: None,
            occupancy_forecast: None,
            created_at: now,
            updated_at: now,
        };
        tables.listings.push(listing.clone());
        Ok(listing)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Listing>> {
        let tables = self.tables.lock().await;
        Ok(tables.listings.iter().find(|listing| listing.id == id).cloned())
    }

    async fn list(&self, filter: &ListingFilter, page: Page) -> RepositoryResult<Vec<Listing>> {
        let tables = self.tables.lock().await;
        let listings = tables
            .listings
            .iter()
            .rev()
            .filter(|listing| filter.matches(listing))
            .cloned()
            .collect();
        Ok(paginate(listings, page))
    }

    async fn update(&self, id: Uuid, update: &UpdateListing) -> RepositoryResult<Listing> {
        let mut tables = self.tables.lock().await;
        let listing = tables.listing_mut(id)?;

        update.apply(listing);
        listing.status = ListingStatus::Pending;
        listing.rejection_reason = None;
        listing.updated_at = Utc::now();
        Ok(listing.clone())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.listings.len();
        tables.listings.retain(|listing| listing.id != id);

        if tables.listings.len() == before {
            return Ok(false);
        }

        tables.reservations.retain(|r| r.listing_id != id);
        for message in tables.messages.iter_mut() {
            if message.listing_id == Some(id) {
                message.listing_id = None;
            }
        }
        Ok(true)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ListingStatus,
        reason: Option<String>,
    ) -> RepositoryResult<Listing> {
        let mut tables = self.tables.lock().await;
        let listing = tables.listing_mut(id)?;

        listing.status = status;
        listing.rejection_reason = reason;
        listing.updated_at = Utc::now();
        Ok(listing.clone())
    }

    async fn record_pricing(
        &self,
        id: Uuid,
        demand_score: f64,
        suggested_price: f64,
    ) -> RepositoryResult<()> {
        let mut tables = self.tables.lock().await;
        let listing = tables.listing_mut(id)?;

        listing.demand_score = Some(demand_score);
        listing.suggested_price = Some(suggested_price);
        Ok(())
    }

    async fn record_occupancy(&self, id: Uuid, forecast: f64) -> RepositoryResult<()> {
        let mut tables = self.tables.lock().await;
        tables.listing_mut(id)?.occupancy_forecast = Some(forecast);
        Ok(())
    }

    async fn count_by_status(&self, status: ListingStatus) -> RepositoryResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables.listings.iter().filter(|l| l.status == status).count() as i64)
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn create(&self, new_reservation: &NewReservation) -> RepositoryResult<Reservation> {
        let mut tables = self.tables.lock().await;

        if !tables
            .listings
            .iter()
            .any(|listing| listing.id == new_reservation.listing_id)
        {
            return Err(RepositoryError::NotFound("Listing".to_string()));
        }
        if new_reservation.start_date >= new_reservation.end_date {
            return Err(RepositoryError::InvalidState(
                "Reservation must end after it starts".to_string(),
            ));
        }
        if tables.confirmed_overlap_exists(
            new_reservation.listing_id,
            new_reservation.start_date,
            new_reservation.end_date,
            None,
        ) {
            return Err(overlap_conflict());
        }

        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4(),
            listing_id: new_reservation.listing_id,
            user_id: new_reservation.user_id,
            start_date: new_reservation.start_date,
            end_date: new_reservation.end_date,
            status: ReservationStatus::Pending,
            total_price: new_reservation.total_price,
            cancellation_risk: None,
            fraud_risk: None,
            overbooking_risk: None,
            created_at: now,
            updated_at: now,
        };
        tables.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Reservation>> {
        let tables = self.tables.lock().await;
        Ok(tables.reservations.iter().find(|r| r.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid, page: Page) -> RepositoryResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        let mut reservations: Vec<Reservation> = tables
            .reservations
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(paginate(reservations, page))
    }

    async fn list_for_provider(
        &self,
        provider_id: Uuid,
        page: Page,
    ) -> RepositoryResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        let owned: Vec<Uuid> = tables
            .listings
            .iter()
            .filter(|listing| listing.provider_id == provider_id)
            .map(|listing| listing.id)
            .collect();

        let mut reservations: Vec<Reservation> = tables
            .reservations
            .iter()
            .filter(|r| owned.contains(&r.listing_id))
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(paginate(reservations, page))
    }

    async fn list_upcoming_pending(
        &self,
        from: NaiveDate,
        limit: i64,
    ) -> RepositoryResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        let mut reservations: Vec<Reservation> = tables
            .reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Pending && r.start_date >= from)
            .cloned()
            .collect();
        reservations.sort_by_key(|r| r.start_date);
        reservations.truncate(limit.max(0) as usize);
        Ok(reservations)
    }

    async fn list_flagged(&self, threshold: f64, page: Page) -> RepositoryResult<Vec<Reservation>> {
        fn highest(r: &Reservation) -> f64 {
            [r.cancellation_risk, r.fraud_risk, r.overbooking_risk]
                .into_iter()
                .map(|score| score.unwrap_or(0.0))
                .fold(0.0, f64::max)
        }

        let tables = self.tables.lock().await;
        let mut reservations: Vec<Reservation> = tables
            .reservations
            .iter()
            .filter(|r| highest(r) >= threshold)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| {
            highest(b)
                .total_cmp(&highest(a))
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(paginate(reservations, page))
    }

    async fn confirm(&self, id: Uuid) -> RepositoryResult<Reservation> {
        let mut tables = self.tables.lock().await;
        let current = tables.reservation_mut(id)?.clone();

        if current.status != ReservationStatus::Pending {
            return Err(RepositoryError::InvalidState(format!(
                "Only pending reservations can be confirmed (status is {})",
                current.status
            )));
        }
        if tables.confirmed_overlap_exists(
            current.listing_id,
            current.start_date,
            current.end_date,
            Some(current.id),
        ) {
            return Err(overlap_conflict());
        }

        let reservation = tables.reservation_mut(id)?;
        reservation.status = ReservationStatus::Confirmed;
        reservation.updated_at = Utc::now();
        Ok(reservation.clone())
    }

    async fn cancel(&self, id: Uuid) -> RepositoryResult<Reservation> {
        let mut tables = self.tables.lock().await;
        let reservation = tables.reservation_mut(id)?;

        if reservation.status == ReservationStatus::Cancelled {
            return Err(RepositoryError::InvalidState(
                "Reservation is already cancelled".to_string(),
            ));
        }

        reservation.status = ReservationStatus::Cancelled;
        reservation.updated_at = Utc::now();
        Ok(reservation.clone())
    }

    async fn record_risk(&self, id: Uuid, risk: ReservationRisk) -> RepositoryResult<()> {
        let mut tables = self.tables.lock().await;
        tables.reservation_mut(id)?.apply_risk(risk);
        Ok(())
    }

    async fn count_for_user(
        &self,
        user_id: Uuid,
        status: Option<ReservationStatus>,
    ) -> RepositoryResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reservations
            .iter()
            .filter(|r| r.user_id == user_id && status.is_none_or(|status| r.status == status))
            .count() as i64)
    }

    async fn count_created_by_user_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepositoryResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reservations
            .iter()
            .filter(|r| r.user_id == user_id && r.created_at >= since)
            .count() as i64)
    }

    async fn count_created_for_listing_since(
        &self,
        listing_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepositoryResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reservations
            .iter()
            .filter(|r| r.listing_id == listing_id && r.created_at >= since)
            .count() as i64)
    }

    async fn count_overlapping(
        &self,
        listing_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        status: ReservationStatus,
        exclude: Option<Uuid>,
    ) -> RepositoryResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reservations
            .iter()
            .filter(|r| {
                r.listing_id == listing_id
                    && r.status == status
                    && Some(r.id) != exclude
                    && r.overlaps(start, end)
            })
            .count() as i64)
    }

    async fn nights_booked(
        &self,
        listing_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        status: ReservationStatus,
    ) -> RepositoryResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reservations
            .iter()
            .filter(|r| r.listing_id == listing_id && r.status == status && r.overlaps(from, to))
            .map(|r| (r.end_date.min(to) - r.start_date.max(from)).num_days())
            .sum())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        Ok(self.tables.lock().await.reservations.len() as i64)
    }
}

#[async_trait]
impl VerificationRepository for MemoryStore {
    async fn submit(
        &self,
        request: &NewBusinessVerification,
    ) -> RepositoryResult<BusinessVerification> {
        let mut tables = self.tables.lock().await;

        if tables
            .verifications
            .iter()
            .any(|v| v.user_id == request.user_id && v.status == VerificationStatus::Pending)
        {
            return Err(RepositoryError::Conflict(
                "A verification request is already pending".to_string(),
            ));
        }

        let now = Utc::now();
        let verification = BusinessVerification {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            business_name: request.business_name.clone(),
            registration_number: request.registration_number.clone(),
            document_url: request.document_url.clone(),
            contact_phone: request.contact_phone.clone(),
            status: VerificationStatus::Pending,
            reviewed_by: None,
            review_note: None,
            created_at: now,
            updated_at: now,
        };
        tables.verifications.push(verification.clone());
        Ok(verification)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<BusinessVerification>> {
        let tables = self.tables.lock().await;
        Ok(tables.verifications.iter().find(|v| v.id == id).cloned())
    }

    async fn latest_for_user(
        &self,
        user_id: Uuid,
    ) -> RepositoryResult<Option<BusinessVerification>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .verifications
            .iter()
            .rev()
            .find(|v| v.user_id == user_id)
            .cloned())
    }

    async fn list(
        &self,
        status: Option<VerificationStatus>,
        page: Page,
    ) -> RepositoryResult<Vec<BusinessVerification>> {
        let tables = self.tables.lock().await;
        let verifications = tables
            .verifications
            .iter()
            .filter(|v| status.is_none_or(|status| v.status == status))
            .cloned()
            .collect();
        Ok(paginate(verifications, page))
    }

    async fn approve(&self, id: Uuid, reviewer: Uuid) -> RepositoryResult<BusinessVerification> {
        let mut tables = self.tables.lock().await;
        review(&mut tables, id, reviewer, VerificationStatus::Approved, None)
    }

    async fn reject(
        &self,
        id: Uuid,
        reviewer: Uuid,
        note: Option<String>,
    ) -> RepositoryResult<BusinessVerification> {
        let mut tables = self.tables.lock().await;
        review(&mut tables, id, reviewer, VerificationStatus::Rejected, note)
    }
}

fn review(
    tables: &mut Tables,
    id: Uuid,
    reviewer: Uuid,
    status: VerificationStatus,
    note: Option<String>,
) -> RepositoryResult<BusinessVerification> {
    let index = tables
        .verifications
        .iter()
        .position(|v| v.id == id)
        .ok_or_else(|| RepositoryError::NotFound("Verification request".to_string()))?;

    let (current_status, user_id) = {
        let current = &tables.verifications[index];
        (current.status, current.user_id)
    };
    if current_status != VerificationStatus::Pending {
        return Err(RepositoryError::InvalidState(format!(
            "Verification request was already {}",
            current_status
        )));
    }

    let now = Utc::now();
    if status == VerificationStatus::Approved {
        let user = tables.user_mut(user_id)?;
        user.verified = true;
        user.updated_at = now;
    }

    let verification = &mut tables.verifications[index];
    verification.status = status;
    verification.reviewed_by = Some(reviewer);
    verification.review_note = note;
    verification.updated_at = now;
    Ok(verification.clone())
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn record(&self, notification: &NewNotification) -> RepositoryResult<Notification> {
        let mut tables = self.tables.lock().await;
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            message: notification.message.clone(),
            kind: notification.kind,
            contact_details: notification.contact_details.clone(),
            read: false,
            created_at: Utc::now(),
        };
        tables.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> RepositoryResult<Vec<Notification>> {
        let tables = self.tables.lock().await;
        let notifications = tables
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        Ok(paginate(notifications, page))
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn send(&self, message: &NewMessage) -> RepositoryResult<Message> {
        let mut tables = self.tables.lock().await;
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            listing_id: message.listing_id,
            body: message.body.clone(),
            read: false,
            created_at: Utc::now(),
        };
        tables.messages.push(message.clone());
        Ok(message)
    }

    async fn conversation(
        &self,
        user_id: Uuid,
        other_id: Uuid,
        page: Page,
    ) -> RepositoryResult<Vec<Message>> {
        let tables = self.tables.lock().await;
        let messages = tables
            .messages
            .iter()
            .filter(|m| {
                (m.sender_id == user_id && m.recipient_id == other_id)
                    || (m.sender_id == other_id && m.recipient_id == user_id)
            })
            .cloned()
            .collect();
        Ok(paginate(messages, page))
    }

    async fn inbox(&self, user_id: Uuid, page: Page) -> RepositoryResult<Vec<Message>> {
        let tables = self.tables.lock().await;
        let messages = tables
            .messages
            .iter()
            .rev()
            .filter(|m| m.recipient_id == user_id)
            .cloned()
            .collect();
        Ok(paginate(messages, page))
    }

    async fn mark_read_from(&self, reader_id: Uuid, sender_id: Uuid) -> RepositoryResult<u64> {
        let mut tables = self.tables.lock().await;
        let mut updated = 0;
        for message in tables
            .messages
            .iter_mut()
            .filter(|m| m.recipient_id == reader_id && m.sender_id == sender_id && !m.read)
        {
            message.read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 3, day).unwrap()
    }

    async fn seed_listing(store: &MemoryStore) -> (User, Listing) {
        let provider = UserRepository::create(
            store,
            &NewUser {
                name: "Host".to_string(),
                email: "Host@Example.com".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap();

        let listing = ListingRepository::create(
            store,
            &NewListing {
                provider_id: provider.id,
                title: "Cabin".to_string(),
                description: "By the lake".to_string(),
                category: "cabin".to_string(),
                location: "Lakeside".to_string(),
                price_per_night: 80.0,
                capacity: 4,
            },
        )
        .await
        .unwrap();

        (provider, listing)
    }

    fn booking(listing: &Listing, start: u32, end: u32) -> NewReservation {
        NewReservation {
            listing_id: listing.id,
            user_id: Uuid::new_v4(),
            start_date: date(start),
            end_date: date(end),
            total_price: 80.0 * (end - start) as f64,
        }
    }

    #[tokio::test]
    async fn test_emails_are_unique_case_insensitively() {
        let store = MemoryStore::new();
        let (provider, _) = seed_listing(&store).await;
        assert_eq!(provider.email, "host@example.com");

        let duplicate = UserRepository::create(
            &store,
            &NewUser {
                name: "Other".to_string(),
                email: "HOST@example.com".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await;
        assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));

        let found = store.find_by_email("host@EXAMPLE.com").await.unwrap();
        assert_eq!(found.map(|user| user.id), Some(provider.id));
    }

    #[tokio::test]
    async fn test_role_can_only_be_assigned_once() {
        let store = MemoryStore::new();
        let (provider, _) = seed_listing(&store).await;

        let user = store.assign_role(provider.id, Role::Provider).await.unwrap();
        assert_eq!(user.role, Some(Role::Provider));

        let again = store.assign_role(provider.id, Role::Customer).await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_confirmed_reservations_block_overlapping_bookings() {
        let store = MemoryStore::new();
        let (_, listing) = seed_listing(&store).await;

        let first = ReservationRepository::create(&store, &booking(&listing, 10, 15))
            .await
            .unwrap();
        let competing = ReservationRepository::create(&store, &booking(&listing, 12, 14))
            .await
            .unwrap();

        store.confirm(first.id).await.unwrap();

        let blocked = ReservationRepository::create(&store, &booking(&listing, 14, 16)).await;
        assert!(matches!(blocked, Err(RepositoryError::Conflict(_))));

        let adjacent = ReservationRepository::create(&store, &booking(&listing, 15, 17)).await;
        assert!(adjacent.is_ok());

        let confirm_competing = store.confirm(competing.id).await;
        assert!(matches!(confirm_competing, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_cancel_twice_is_invalid() {
        let store = MemoryStore::new();
        let (_, listing) = seed_listing(&store).await;
        let reservation = ReservationRepository::create(&store, &booking(&listing, 1, 3))
            .await
            .unwrap();

        store.cancel(reservation.id).await.unwrap();
        let again = store.cancel(reservation.id).await;
        assert!(matches!(again, Err(RepositoryError::InvalidState(_))));

        let confirm = store.confirm(reservation.id).await;
        assert!(matches!(confirm, Err(RepositoryError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_nights_booked_clips_to_window() {
        let store = MemoryStore::new();
        let (_, listing) = seed_listing(&store).await;
        let reservation = ReservationRepository::create(&store, &booking(&listing, 5, 12))
            .await
            .unwrap();
        store.confirm(reservation.id).await.unwrap();

        let nights = store
            .nights_booked(listing.id, date(8), date(20), ReservationStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(nights, 4);

        let pending = store
            .nights_booked(listing.id, date(1), date(30), ReservationStatus::Pending)
            .await
            .unwrap();
        assert_eq!(pending, 0);
    }

    #[tokio::test]
    async fn test_approval_marks_user_verified() {
        let store = MemoryStore::new();
        let (provider, _) = seed_listing(&store).await;
        let request = NewBusinessVerification {
            user_id: provider.id,
            business_name: "Lake Stays".to_string(),
            registration_number: "RC-1".to_string(),
            document_url: None,
            contact_phone: None,
        };

        let pending = store.submit(&request).await.unwrap();
        assert!(matches!(
            store.submit(&request).await,
            Err(RepositoryError::Conflict(_))
        ));

        let reviewer = Uuid::new_v4();
        let approved = store.approve(pending.id, reviewer).await.unwrap();
        assert_eq!(approved.status, VerificationStatus::Approved);
        assert_eq!(approved.reviewed_by, Some(reviewer));

        let user = UserRepository::find_by_id(&store, provider.id)
            .await
            .unwrap()
            .unwrap();
        assert!(user.verified);

        let again = store.reject(pending.id, reviewer, None).await;
        assert!(matches!(again, Err(RepositoryError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_mark_read_only_touches_own_notifications() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let notification = store
            .record(&NewNotification {
                user_id: owner,
                message: "Welcome".to_string(),
                kind: crate::models::NotificationKind::System,
                contact_details: None,
            })
            .await
            .unwrap();

        assert!(!store.mark_read(notification.id, Uuid::new_v4()).await.unwrap());
        assert!(store.mark_read(notification.id, owner).await.unwrap());

        let listed = NotificationRepository::list_for_user(&store, owner, Page::default())
            .await
            .unwrap();
        assert!(listed[0].read);
    }
}
