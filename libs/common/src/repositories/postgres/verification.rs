//! Business verification repository for database operations

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{BusinessVerification, NewBusinessVerification, Page, VerificationStatus};
use crate::repositories::VerificationRepository;

const VERIFICATION_COLUMNS: &str = "id, user_id, business_name, registration_number, document_url, \
                                    contact_phone, status, reviewed_by, review_note, created_at, \
                                    updated_at";

fn verification_from_row(row: &PgRow) -> RepositoryResult<BusinessVerification> {
    let status: String = row.get("status");

    Ok(BusinessVerification {
        id: row.get("id"),
        user_id: row.get("user_id"),
        business_name: row.get("business_name"),
        registration_number: row.get("registration_number"),
        document_url: row.get("document_url"),
        contact_phone: row.get("contact_phone"),
        status: status.parse()?,
        reviewed_by: row.get("reviewed_by"),
        review_note: row.get("review_note"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Business verification repository
#[derive(Clone)]
pub struct PgVerificationRepository {
    pool: PgPool,
}

impl PgVerificationRepository {
    /// Create a new verification repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Close a pending request; approval also flips the user's verified flag
    async fn review(
        &self,
        id: Uuid,
        reviewer: Uuid,
        status: VerificationStatus,
        note: Option<String>,
    ) -> RepositoryResult<BusinessVerification> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM business_verifications WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("Verification request".to_string()))?;
        let current = verification_from_row(&current)?;

        if current.status != VerificationStatus::Pending {
            return Err(RepositoryError::InvalidState(format!(
                "Verification request was already {}",
                current.status
            )));
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE business_verifications
            SET status = $2, reviewed_by = $3, review_note = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {VERIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(reviewer)
        .bind(note)
        .fetch_one(&mut *tx)
        .await?;

        if status == VerificationStatus::Approved {
            let result =
                sqlx::query("UPDATE users SET verified = TRUE, updated_at = NOW() WHERE id = $1")
                    .bind(current.user_id)
                    .execute(&mut *tx)
                    .await?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound("User".to_string()));
            }
        }

        tx.commit().await?;

        info!(
            "Verification request {} for user {} marked {}",
            id, current.user_id, status
        );
        verification_from_row(&row)
    }
}

#[async_trait]
impl VerificationRepository for PgVerificationRepository {
    async fn submit(
        &self,
        request: &NewBusinessVerification,
    ) -> RepositoryResult<BusinessVerification> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO business_verifications
                (user_id, business_name, registration_number, document_url, contact_phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {VERIFICATION_COLUMNS}
            "#
        ))
        .bind(request.user_id)
        .bind(&request.business_name)
        .bind(&request.registration_number)
        .bind(&request.document_url)
        .bind(&request.contact_phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::Conflict(_) => RepositoryError::Conflict(
                "A verification request is already pending".to_string(),
            ),
            other => other,
        })?;

        verification_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<BusinessVerification>> {
        let row = sqlx::query(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM business_verifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(verification_from_row).transpose()
    }

    async fn latest_for_user(
        &self,
        user_id: Uuid,
    ) -> RepositoryResult<Option<BusinessVerification>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {VERIFICATION_COLUMNS}
            FROM business_verifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(verification_from_row).transpose()
    }

    async fn list(
        &self,
        status: Option<VerificationStatus>,
        page: Page,
    ) -> RepositoryResult<Vec<BusinessVerification>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {VERIFICATION_COLUMNS}
            FROM business_verifications
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status.map(|status| status.as_str()))
        .bind(page.limit() as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(verification_from_row).collect()
    }

    async fn approve(&self, id: Uuid, reviewer: Uuid) -> RepositoryResult<BusinessVerification> {
        self.review(id, reviewer, VerificationStatus::Approved, None)
            .await
    }

    async fn reject(
        &self,
        id: Uuid,
        reviewer: Uuid,
        note: Option<String>,
    ) -> RepositoryResult<BusinessVerification> {
        self.review(id, reviewer, VerificationStatus::Rejected, note)
            .await
    }
}
