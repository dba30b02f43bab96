//! In-memory [`UserStore`] used as a drop-in fake by the test suite.

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::models::{RecentRegistration, User, UserStats};
use crate::store::{NewUser, SessionRecord, StoreError, UserPatch, UserStore};

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    sessions: Vec<SessionRecord>,
    next_id: i32,
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: Mutex<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|user| user.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.clone())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.users.iter().any(|user| user.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        inner.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.next_id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            full_name: new_user.full_name,
            role: new_user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: i32, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.lock().await;

        if let Some(email) = &patch.email {
            if inner
                .users
                .iter()
                .any(|user| user.email == *email && user.id != id)
            {
                return Err(StoreError::DuplicateEmail);
            }
        }

        let Some(user) = inner.users.iter_mut().find(|user| user.id == id) else {
            return Ok(None);
        };

        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(full_name) = patch.full_name {
            user.full_name = full_name;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(is_active) = patch.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn stats(&self) -> Result<UserStats, StoreError> {
        use crate::models::Role;

        let inner = self.inner.lock().await;
        let mut stats = UserStats {
            total_users: inner.users.len() as i64,
            total_doctors: 0,
            total_receptionists: 0,
            active_users: 0,
        };
        for user in &inner.users {
            match user.role {
                Role::Doctor => stats.total_doctors += 1,
                Role::Receptionist => stats.total_receptionists += 1,
                Role::Admin => {}
            }
            if user.is_active {
                stats.active_users += 1;
            }
        }
        Ok(stats)
    }

    async fn recent_registrations(
        &self,
        limit: i64,
    ) -> Result<Vec<RecentRegistration>, StoreError> {
        let inner = self.inner.lock().await;
        let mut users: Vec<&User> = inner.users.iter().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|user| RecentRegistration {
                id: user.id,
                full_name: user.full_name.clone(),
                role: user.role,
                created_at: user.created_at,
            })
            .collect())
    }

    async fn insert_session(&self, record: SessionRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.sessions.push(record);
        Ok(())
    }

    async fn sessions_for(&self, user_id: i32) -> Result<Vec<SessionRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sessions
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn reset_credentials(&self, id: i32, password_hash: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;

        let Some(user) = inner.users.iter_mut().find(|user| user.id == id) else {
            return Ok(false);
        };
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();

        inner.sessions.retain(|record| record.user_id != id);
        Ok(true)
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.sessions.len();
        inner.sessions.retain(|record| record.expires_at > now);
        Ok((before - inner.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Duration;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "salt:digest".to_string(),
            full_name: "Test Person".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_emails() {
        let store = InMemoryUserStore::new();
        store
            .create(new_user("a@clinic.test", Role::Doctor))
            .await
            .expect("first insert");
        let err = store
            .create(new_user("a@clinic.test", Role::Admin))
            .await
            .expect_err("duplicate insert");
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn update_patches_only_provided_fields() {
        let store = InMemoryUserStore::new();
        let user = store
            .create(new_user("a@clinic.test", Role::Doctor))
            .await
            .expect("insert");

        let patch = UserPatch {
            is_active: Some(false),
            ..Default::default()
        };
        let updated = store
            .update(user.id, patch)
            .await
            .expect("update")
            .expect("user exists");

        assert!(!updated.is_active);
        assert_eq!(updated.email, "a@clinic.test");
        assert_eq!(updated.role, Role::Doctor);
        assert!(updated.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn reset_credentials_clears_sessions() {
        let store = InMemoryUserStore::new();
        let user = store
            .create(new_user("a@clinic.test", Role::Receptionist))
            .await
            .expect("insert");

        store
            .insert_session(SessionRecord {
                user_id: user.id,
                token: "tok-1".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
            })
            .await
            .expect("insert session");

        assert!(store
            .reset_credentials(user.id, "salt:new-digest")
            .await
            .expect("reset"));

        let sessions = store.sessions_for(user.id).await.expect("list sessions");
        assert!(sessions.is_empty());

        let reloaded = store
            .find_by_id(user.id)
            .await
            .expect("lookup")
            .expect("user exists");
        assert_eq!(reloaded.password_hash, "salt:new-digest");
    }

    #[tokio::test]
    async fn purge_drops_only_expired_sessions() {
        let store = InMemoryUserStore::new();
        let now = Utc::now();
        for (token, offset) in [("old", -5), ("fresh", 5)] {
            store
                .insert_session(SessionRecord {
                    user_id: 1,
                    token: token.to_string(),
                    expires_at: now + Duration::minutes(offset),
                })
                .await
                .expect("insert session");
        }

        let purged = store.purge_expired_sessions(now).await.expect("purge");
        assert_eq!(purged, 1);

        let remaining = store.sessions_for(1).await.expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].token, "fresh");
    }
}
