//! User repository for database operations

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{NewUser, Page, Role, User};
use crate::repositories::UserRepository;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, verified, is_face_verified, \
                            is_otp_verified, trust_score, created_at, updated_at";

fn user_from_row(row: &PgRow) -> RepositoryResult<User> {
    let role: Option<String> = row.get("role");

    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: role.map(|role| role.parse::<Role>()).transpose()?,
        verified: row.get("verified"),
        is_face_verified: row.get("is_face_verified"),
        is_otp_verified: row.get("is_otp_verified"),
        trust_score: row.get("trust_score"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// User repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: &NewUser) -> RepositoryResult<User> {
        info!("Creating new user: {}", new_user.email);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.name)
        .bind(new_user.email.to_lowercase())
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::Conflict(_) => {
                RepositoryError::Conflict("Email is already registered".to_string())
            }
            other => other,
        })?;

        user_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self, page: Page) -> RepositoryResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.limit() as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    async fn assign_role(&self, id: Uuid, role: Role) -> RepositoryResult<User> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE id = $1 AND role IS NULL
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => user_from_row(&row),
            None => match self.find_by_id(id).await? {
                Some(_) => Err(RepositoryError::Conflict(
                    "Role has already been selected".to_string(),
                )),
                None => Err(RepositoryError::NotFound("User".to_string())),
            },
        }
    }

    async fn set_identity_checks(
        &self,
        id: Uuid,
        face: Option<bool>,
        otp: Option<bool>,
    ) -> RepositoryResult<User> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET is_face_verified = COALESCE($2, is_face_verified),
                is_otp_verified = COALESCE($3, is_otp_verified),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(face)
        .bind(otp)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("User".to_string()))?;

        user_from_row(&row)
    }

    async fn record_trust_score(&self, id: Uuid, score: f64) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE users SET trust_score = $2 WHERE id = $1")
            .bind(id)
            .bind(score)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("User".to_string()));
        }
        Ok(())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
