//! Postgres-backed [`UserStore`].
//!
//! Every repository call is wrapped in a bounded timeout; on expiry the
//! operation fails with [`StoreError::Unavailable`] instead of hanging the
//! request.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::models::{RecentRegistration, Role, User, UserStats};
use crate::store::{NewUser, SessionRecord, StoreError, UserPatch, UserStore};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgUserStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Unavailable),
        }
    }
}

fn row_to_user(row: &PgRow) -> Result<User, StoreError> {
    let role_str: String = row.try_get("role")?;
    let role = Role::parse(&role_str).ok_or(StoreError::UnknownRole(role_str))?;
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        full_name: row.try_get("full_name")?,
        role,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.code().map(|code| code == UNIQUE_VIOLATION).unwrap_or(false)
    )
}

const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, role, is_active, created_at, updated_at";

#[rocket::async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        self.bounded(async {
            let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            row.as_ref().map(row_to_user).transpose()
        })
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.bounded(async {
            let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
            row.as_ref().map(row_to_user).transpose()
        })
        .await
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.bounded(async {
            let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
            rows.iter().map(row_to_user).collect()
        })
        .await
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        self.bounded(async {
            let result = sqlx::query(&format!(
                "INSERT INTO users (email, password_hash, full_name, role, is_active) \
                 VALUES ($1, $2, $3, $4, TRUE) RETURNING {USER_COLUMNS}"
            ))
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.full_name)
            .bind(new_user.role.as_str())
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(row) => row_to_user(&row),
                Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateEmail),
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    async fn update(&self, id: i32, patch: UserPatch) -> Result<Option<User>, StoreError> {
        self.bounded(async {
            let result = sqlx::query(&format!(
                "UPDATE users SET \
                 email = COALESCE($2, email), \
                 full_name = COALESCE($3, full_name), \
                 role = COALESCE($4, role), \
                 is_active = COALESCE($5, is_active), \
                 updated_at = NOW() \
                 WHERE id = $1 RETURNING {USER_COLUMNS}"
            ))
            .bind(id)
            .bind(patch.email.as_deref())
            .bind(patch.full_name.as_deref())
            .bind(patch.role.map(|role| role.as_str()))
            .bind(patch.is_active)
            .fetch_optional(&self.pool)
            .await;

            match result {
                Ok(row) => row.as_ref().map(row_to_user).transpose(),
                Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateEmail),
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    async fn stats(&self) -> Result<UserStats, StoreError> {
        self.bounded(async {
            let (total, doctors, receptionists, active) = tokio::try_join!(
                async {
                    sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM users")
                        .fetch_one(&self.pool)
                        .await
                },
                async {
                    sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM users WHERE role = 'doctor'")
                        .fetch_one(&self.pool)
                        .await
                },
                async {
                    sqlx::query_as::<_, (i64,)>(
                        "SELECT COUNT(*) FROM users WHERE role = 'receptionist'",
                    )
                    .fetch_one(&self.pool)
                    .await
                },
                async {
                    sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM users WHERE is_active")
                        .fetch_one(&self.pool)
                        .await
                }
            )?;

            Ok(UserStats {
                total_users: total.0,
                total_doctors: doctors.0,
                total_receptionists: receptionists.0,
                active_users: active.0,
            })
        })
        .await
    }

    async fn recent_registrations(
        &self,
        limit: i64,
    ) -> Result<Vec<RecentRegistration>, StoreError> {
        self.bounded(async {
            let rows = sqlx::query(
                "SELECT id, full_name, role, created_at FROM users \
                 ORDER BY created_at DESC, id DESC LIMIT $1",
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

            rows.iter()
                .map(|row| {
                    let role_str: String = row.try_get("role")?;
                    let role = Role::parse(&role_str).ok_or(StoreError::UnknownRole(role_str))?;
                    Ok(RecentRegistration {
                        id: row.try_get("id")?,
                        full_name: row.try_get("full_name")?,
                        role,
                        created_at: row.try_get("created_at")?,
                    })
                })
                .collect()
        })
        .await
    }

    async fn insert_session(&self, record: SessionRecord) -> Result<(), StoreError> {
        self.bounded(async {
            sqlx::query("INSERT INTO sessions (user_id, token, expires_at) VALUES ($1, $2, $3)")
                .bind(record.user_id)
                .bind(&record.token)
                .bind(record.expires_at)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    async fn sessions_for(&self, user_id: i32) -> Result<Vec<SessionRecord>, StoreError> {
        self.bounded(async {
            let rows = sqlx::query(
                "SELECT user_id, token, expires_at FROM sessions WHERE user_id = $1 ORDER BY id",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

            rows.iter()
                .map(|row| {
                    Ok(SessionRecord {
                        user_id: row.try_get("user_id")?,
                        token: row.try_get("token")?,
                        expires_at: row.try_get("expires_at")?,
                    })
                })
                .collect()
        })
        .await
    }

    async fn reset_credentials(&self, id: i32, password_hash: &str) -> Result<bool, StoreError> {
        // Digest update and session cleanup commit together so a login cannot
        // observe the new digest while stale bookkeeping rows remain.
        self.bounded(async {
            let mut tx = self.pool.begin().await?;

            let updated =
                sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
                    .bind(password_hash)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

            if updated.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(false);
            }

            sqlx::query("DELETE FROM sessions WHERE user_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(true)
        })
        .await
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.bounded(async {
            let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
                .bind(now)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        })
        .await
    }
}
