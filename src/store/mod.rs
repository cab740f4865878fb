use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgUserStore;

/// User record as persisted. The email is stored lowercase-normalized and is
/// unique across records; callers normalize before hitting the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    pub verify_otp: Option<String>,
    pub verify_otp_expires_at: Option<OffsetDateTime>,
    pub reset_otp: Option<String>,
    pub reset_otp_expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Fields supplied at registration; everything else is store-assigned.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>>;
    async fn create(&self, new_user: NewUser) -> anyhow::Result<UserRecord>;
    /// Full-record upsert keyed by id.
    async fn save(&self, user: &UserRecord) -> anyhow::Result<()>;
}
