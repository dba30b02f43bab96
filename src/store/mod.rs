//! User repository abstraction.
//!
//! Every component that needs account data receives a narrow `UserStore`
//! capability instead of reaching for a shared database handle, so the auth
//! core can be exercised against the in-memory implementation in tests.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{RecentRegistration, Role, User, UserStats};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already in use")]
    DuplicateEmail,
    #[error("storage unavailable")]
    Unavailable,
    #[error("corrupt role value in storage: {0}")]
    UnknownRole(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fields required to insert a new account. The caller is responsible for
/// email normalization and password hashing.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
}

/// Partial update; `None` fields are left untouched. `updated_at` is always
/// refreshed when the patch applies.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Session-bookkeeping row recorded at login and cleared on password change.
/// Not consulted during token verification.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user_id: i32,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[rocket::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;

    /// Exact-match lookup; emails are normalized to lowercase at write time,
    /// so callers must present the stored casing.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Inserts a new account. Fails with [`StoreError::DuplicateEmail`] when
    /// the email is already taken.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Applies a partial update, returning the updated row or `None` when the
    /// id does not exist.
    async fn update(&self, id: i32, patch: UserPatch) -> Result<Option<User>, StoreError>;

    async fn stats(&self) -> Result<UserStats, StoreError>;

    async fn recent_registrations(&self, limit: i64)
        -> Result<Vec<RecentRegistration>, StoreError>;

    async fn insert_session(&self, record: SessionRecord) -> Result<(), StoreError>;

    async fn sessions_for(&self, user_id: i32) -> Result<Vec<SessionRecord>, StoreError>;

    /// Replaces the password digest and deletes all session rows for the
    /// user as one atomic unit. Returns `false` when the id does not exist.
    async fn reset_credentials(&self, id: i32, password_hash: &str) -> Result<bool, StoreError>;

    /// Removes session rows whose expiry is at or before `now`, returning the
    /// number of rows deleted.
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
