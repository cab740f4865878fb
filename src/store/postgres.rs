use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::warn;
use uuid::Uuid;

use super::{NewUser, UserRecord, UserStore};

pub struct PgUserStore {
    pool: PgPool,
    op_timeout: Duration,
}

impl PgUserStore {
    pub async fn connect(database_url: &str, op_timeout: Duration) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(op_timeout)
            .connect(database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            warn!(error = %e, "migrations folder not found or migration failed; continuing");
        }

        Ok(Self { pool, op_timeout })
    }

    /// Bounds a store call so a stalled database surfaces as a transient
    /// error instead of a hung request.
    async fn bounded<T>(
        &self,
        what: &'static str,
        fut: impl std::future::Future<Output = Result<T, sqlx::Error>> + Send,
    ) -> anyhow::Result<T> {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .with_context(|| format!("{what} timed out"))?
            .with_context(|| format!("{what} failed"))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let query = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, password_hash, is_verified,
                   verify_otp, verify_otp_expires_at, reset_otp, reset_otp_expires_at, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool);
        self.bounded("user lookup by email", query).await
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>> {
        let query = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, password_hash, is_verified,
                   verify_otp, verify_otp_expires_at, reset_otp, reset_otp_expires_at, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool);
        self.bounded("user lookup by id", query).await
    }

    async fn create(&self, new_user: NewUser) -> anyhow::Result<UserRecord> {
        let query = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, name, email, password_hash, is_verified)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING id, name, email, password_hash, is_verified,
                      verify_otp, verify_otp_expires_at, reset_otp, reset_otp_expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool);
        self.bounded("user insert", query).await
    }

    async fn save(&self, user: &UserRecord) -> anyhow::Result<()> {
        let query = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, is_verified,
                               verify_otp, verify_otp_expires_at, reset_otp, reset_otp_expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                is_verified = EXCLUDED.is_verified,
                verify_otp = EXCLUDED.verify_otp,
                verify_otp_expires_at = EXCLUDED.verify_otp_expires_at,
                reset_otp = EXCLUDED.reset_otp,
                reset_otp_expires_at = EXCLUDED.reset_otp_expires_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_verified)
        .bind(&user.verify_otp)
        .bind(user.verify_otp_expires_at)
        .bind(&user.reset_otp)
        .bind(user.reset_otp_expires_at)
        .bind(user.created_at)
        .execute(&self.pool);
        self.bounded("user save", query).await?;
        Ok(())
    }
}
