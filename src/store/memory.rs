use std::collections::HashMap;

use anyhow::bail;
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewUser, UserRecord, UserStore};

/// Map-backed store used by the test suite and as the no-database dev mode.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> anyhow::Result<UserRecord> {
        let mut users = self.users.write().await;
        // Same uniqueness guarantee the database schema enforces.
        if users.values().any(|u| u.email == new_user.email) {
            bail!("email already exists: {}", new_user.email);
        }
        let user = UserRecord {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_verified: false,
            verify_otp: None,
            verify_otp_expires_at: None,
            reset_otp: None,
            reset_otp_expires_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &UserRecord) -> anyhow::Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.id, user.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(email: &str) -> NewUser {
        NewUser {
            name: "Sample".into(),
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
        }
    }

    #[tokio::test]
    async fn create_then_lookup_by_email_and_id() {
        let store = MemoryStore::new();
        let created = store.create(sample("a@example.com")).await.expect("create");
        let by_email = store
            .find_by_email("a@example.com")
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(by_email.id, created.id);
        let by_id = store
            .find_by_id(created.id)
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(by_id.email, "a@example.com");
        assert!(!by_id.is_verified);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryStore::new();
        store.create(sample("dup@example.com")).await.expect("create");
        assert!(store.create(sample("dup@example.com")).await.is_err());
    }

    #[tokio::test]
    async fn save_overwrites_full_record() {
        let store = MemoryStore::new();
        let mut user = store.create(sample("b@example.com")).await.expect("create");
        user.is_verified = true;
        user.verify_otp = Some("123456".into());
        store.save(&user).await.expect("save");
        let reloaded = store
            .find_by_id(user.id)
            .await
            .expect("lookup")
            .expect("present");
        assert!(reloaded.is_verified);
        assert_eq!(reloaded.verify_otp.as_deref(), Some("123456"));
    }
}
