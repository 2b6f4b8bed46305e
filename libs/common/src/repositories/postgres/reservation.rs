//! Reservation repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{NewReservation, Page, Reservation, ReservationRisk, ReservationStatus};
use crate::repositories::ReservationRepository;

const RESERVATION_COLUMNS: &str = "r.id, r.listing_id, r.user_id, r.start_date, r.end_date, \
                                   r.status, r.total_price, r.cancellation_risk, r.fraud_risk, \
                                   r.overbooking_risk, r.created_at, r.updated_at";

const HIGHEST_RISK: &str = "GREATEST(COALESCE(r.cancellation_risk, 0), COALESCE(r.fraud_risk, 0), \
                            COALESCE(r.overbooking_risk, 0))";

fn reservation_from_row(row: &PgRow) -> RepositoryResult<Reservation> {
    let status: String = row.get("status");

    Ok(Reservation {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        user_id: row.get("user_id"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        status: status.parse()?,
        total_price: row.get("total_price"),
        cancellation_risk: row.get("cancellation_risk"),
        fraud_risk: row.get("fraud_risk"),
        overbooking_risk: row.get("overbooking_risk"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn not_found() -> RepositoryError {
    RepositoryError::NotFound("Reservation".to_string())
}

fn overlap_conflict() -> RepositoryError {
    RepositoryError::Conflict("Dates overlap an existing confirmed reservation".to_string())
}

/// Reservation repository
#[derive(Clone)]
pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    /// Create a new reservation repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the listing row so concurrent bookings on it serialize
    async fn lock_listing(
        tx: &mut Transaction<'_, Postgres>,
        listing_id: Uuid,
    ) -> RepositoryResult<()> {
        sqlx::query("SELECT id FROM listings WHERE id = $1 FOR UPDATE")
            .bind(listing_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Listing".to_string()))?;
        Ok(())
    }

    async fn confirmed_overlap_exists(
        tx: &mut Transaction<'_, Postgres>,
        listing_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> RepositoryResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM reservations
                WHERE listing_id = $1
                  AND status = 'CONFIRMED'
                  AND start_date < $3
                  AND $2 < end_date
                  AND ($4::UUID IS NULL OR id <> $4)
            )
            "#,
        )
        .bind(listing_id)
        .bind(start)
        .bind(end)
        .bind(exclude)
        .fetch_one(&mut **tx)
        .await?;

        Ok(exists)
    }
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn create(&self, new_reservation: &NewReservation) -> RepositoryResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        Self::lock_listing(&mut tx, new_reservation.listing_id).await?;

        if Self::confirmed_overlap_exists(
            &mut tx,
            new_reservation.listing_id,
            new_reservation.start_date,
            new_reservation.end_date,
            None,
        )
        .await?
        {
            return Err(overlap_conflict());
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO reservations AS r (listing_id, user_id, start_date, end_date, total_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(new_reservation.listing_id)
        .bind(new_reservation.user_id)
        .bind(new_reservation.start_date)
        .bind(new_reservation.end_date)
        .bind(new_reservation.total_price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let reservation = reservation_from_row(&row)?;
        info!(
            "Created reservation {} on listing {}",
            reservation.id, reservation.listing_id
        );
        Ok(reservation)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Reservation>> {
        let row = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations r WHERE r.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(reservation_from_row).transpose()
    }

    async fn list_for_user(&self, user_id: Uuid, page: Page) -> RepositoryResult<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations r
            WHERE r.user_id = $1
            ORDER BY r.start_date DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(reservation_from_row).collect()
    }

    async fn list_for_provider(
        &self,
        provider_id: Uuid,
        page: Page,
    ) -> RepositoryResult<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations r
            JOIN listings l ON l.id = r.listing_id
            WHERE l.provider_id = $1
            ORDER BY r.start_date DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(provider_id)
        .bind(page.limit() as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(reservation_from_row).collect()
    }

    async fn list_upcoming_pending(
        &self,
        from: NaiveDate,
        limit: i64,
    ) -> RepositoryResult<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations r
            WHERE r.status = 'PENDING' AND r.start_date >= $1
            ORDER BY r.start_date ASC
            LIMIT $2
            "#
        ))
        .bind(from)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(reservation_from_row).collect()
    }

    async fn list_flagged(&self, threshold: f64, page: Page) -> RepositoryResult<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations r
            WHERE {HIGHEST_RISK} >= $1
            ORDER BY {HIGHEST_RISK} DESC, r.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(threshold)
        .bind(page.limit() as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(reservation_from_row).collect()
    }

    async fn confirm(&self, id: Uuid) -> RepositoryResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations r WHERE r.id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(not_found)?;
        let current = reservation_from_row(&current)?;

        if current.status != ReservationStatus::Pending {
            return Err(RepositoryError::InvalidState(format!(
                "Only pending reservations can be confirmed (status is {})",
                current.status
            )));
        }

        Self::lock_listing(&mut tx, current.listing_id).await?;

        if Self::confirmed_overlap_exists(
            &mut tx,
            current.listing_id,
            current.start_date,
            current.end_date,
            Some(current.id),
        )
        .await?
        {
            return Err(overlap_conflict());
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE reservations AS r
            SET status = 'CONFIRMED', updated_at = NOW()
            WHERE r.id = $1
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        reservation_from_row(&row)
    }

    async fn cancel(&self, id: Uuid) -> RepositoryResult<Reservation> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE reservations AS r
            SET status = 'CANCELLED', updated_at = NOW()
            WHERE r.id = $1 AND r.status <> 'CANCELLED'
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => reservation_from_row(&row),
            None => match self.find_by_id(id).await? {
                Some(_) => Err(RepositoryError::InvalidState(
                    "Reservation is already cancelled".to_string(),
                )),
                None => Err(not_found()),
            },
        }
    }

    async fn record_risk(&self, id: Uuid, risk: ReservationRisk) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET cancellation_risk = $2, fraud_risk = $3, overbooking_risk = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(risk.cancellation)
        .bind(risk.fraud)
        .bind(risk.overbooking)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    async fn count_for_user(
        &self,
        user_id: Uuid,
        status: Option<ReservationStatus>,
    ) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2)",
        )
        .bind(user_id)
        .bind(status.map(|status| status.as_str()))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_created_by_user_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_created_for_listing_since(
        &self,
        listing_id: Uuid,
        since: DateTime<Utc>,
    ) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE listing_id = $1 AND created_at >= $2",
        )
        .bind(listing_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_overlapping(
        &self,
        listing_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        status: ReservationStatus,
        exclude: Option<Uuid>,
    ) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM reservations
            WHERE listing_id = $1
              AND status = $4
              AND start_date < $3
              AND $2 < end_date
              AND ($5::UUID IS NULL OR id <> $5)
            "#,
        )
        .bind(listing_id)
        .bind(start)
        .bind(end)
        .bind(status.as_str())
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn nights_booked(
        &self,
        listing_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        status: ReservationStatus,
    ) -> RepositoryResult<i64> {
        let nights: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(LEAST(end_date, $3) - GREATEST(start_date, $2)), 0)::BIGINT
            FROM reservations
            WHERE listing_id = $1
              AND status = $4
              AND start_date < $3
              AND $2 < end_date
            "#,
        )
        .bind(listing_id)
        .bind(from)
        .bind(to)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(nights)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
