//! Listing repository for database operations

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{Listing, ListingFilter, ListingStatus, NewListing, Page, UpdateListing};
use crate::repositories::ListingRepository;

const LISTING_COLUMNS: &str = "id, provider_id, title, description, category, location, \
                               price_per_night, capacity, status, rejection_reason, demand_score, \
                               suggested_price, occupancy_forecast, created_at, updated_at";

fn listing_from_row(row: &PgRow) -> RepositoryResult<Listing> {
    let status: String = row.get("status");

    Ok(Listing {
        id: row.get("id"),
        provider_id: row.get("provider_id"),
        title: row.get("title"),
        description: row.get("description"),
        category: row.get("category"),
        location: row.get("location"),
        price_per_night: row.get("price_per_night"),
        capacity: row.get("capacity"),
        status: status.parse()?,
        rejection_reason: row.get("rejection_reason"),
        demand_score: row.get("demand_score"),
        suggested_price: row.get("suggested_price"),
        occupancy_forecast: row.get("occupancy_forecast"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn not_found() -> RepositoryError {
    RepositoryError::NotFound("Listing".to_string())
}

/// Listing repository
#[derive(Clone)]
pub struct PgListingRepository {
    pool: PgPool,
}

impl PgListingRepository {
    /// Create a new listing repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingRepository for PgListingRepository {
    async fn create(&self, new_listing: &NewListing) -> RepositoryResult<Listing> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO listings
                (provider_id, title, description, category, location, price_per_night, capacity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(new_listing.provider_id)
        .bind(&new_listing.title)
        .bind(&new_listing.description)
        .bind(&new_listing.category)
        .bind(&new_listing.location)
        .bind(new_listing.price_per_night)
        .bind(new_listing.capacity)
        .fetch_one(&self.pool)
        .await?;

        listing_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Listing>> {
        let row = sqlx::query(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(listing_from_row).transpose()
    }

    async fn list(&self, filter: &ListingFilter, page: Page) -> RepositoryResult<Vec<Listing>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {LISTING_COLUMNS} FROM listings WHERE TRUE"));

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(provider_id) = filter.provider_id {
            query.push(" AND provider_id = ").push_bind(provider_id);
        }
        if let Some(category) = &filter.category {
            query
                .push(" AND LOWER(category) = LOWER(")
                .push_bind(category.clone())
                .push(")");
        }
        if let Some(location) = &filter.location {
            query
                .push(" AND location ILIKE ")
                .push_bind(format!("%{}%", location));
        }

        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(listing_from_row).collect()
    }

    async fn update(&self, id: Uuid, update: &UpdateListing) -> RepositoryResult<Listing> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE listings
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                location = COALESCE($5, location),
                price_per_night = COALESCE($6, price_per_night),
                capacity = COALESCE($7, capacity),
                status = 'PENDING',
                rejection_reason = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.category)
        .bind(&update.location)
        .bind(update.price_per_night)
        .bind(update.capacity)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(not_found)?;

        listing_from_row(&row)
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ListingStatus,
        reason: Option<String>,
    ) -> RepositoryResult<Listing> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE listings
            SET status = $2, rejection_reason = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(not_found)?;

        listing_from_row(&row)
    }

    async fn record_pricing(
        &self,
        id: Uuid,
        demand_score: f64,
        suggested_price: f64,
    ) -> RepositoryResult<()> {
        let result =
            sqlx::query("UPDATE listings SET demand_score = $2, suggested_price = $3 WHERE id = $1")
                .bind(id)
                .bind(demand_score)
                .bind(suggested_price)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    async fn record_occupancy(&self, id: Uuid, forecast: f64) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE listings SET occupancy_forecast = $2 WHERE id = $1")
            .bind(id)
            .bind(forecast)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    async fn count_by_status(&self, status: ListingStatus) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
