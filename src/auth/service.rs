//! Credential orchestration: login and password change.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::auth::passwords::PasswordService;
use crate::auth::token::TokenCodec;
use crate::auth::{AuthError, AuthResult};
use crate::models::User;
use crate::store::{SessionRecord, UserStore};

/// Successful login result handed back to the HTTP layer.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub redirect_path: &'static str,
}

pub struct CredentialService {
    store: Arc<dyn UserStore>,
    passwords: Arc<PasswordService>,
    codec: Arc<TokenCodec>,
    token_ttl: Duration,
}

impl CredentialService {
    pub fn new(
        store: Arc<dyn UserStore>,
        passwords: Arc<PasswordService>,
        codec: Arc<TokenCodec>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            store,
            passwords,
            codec,
            token_ttl,
        }
    }

    /// Verifies credentials and issues a bearer token.
    ///
    /// Unknown email and wrong password both fail with
    /// [`AuthError::InvalidCredentials`]; only a known-but-deactivated account
    /// is reported distinctly. Lookup is exact-match: emails are normalized to
    /// lowercase when accounts are written, not here.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<LoginOutcome> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        if !verify_blocking(&self.passwords, password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self
            .codec
            .issue(user.id, user.role, &user.email, self.token_ttl)
            .map_err(|err| AuthError::Internal(err.to_string()))?;

        // Bookkeeping only; verification never consults this table.
        self.store
            .insert_session(SessionRecord {
                user_id: user.id,
                token: issued.token.clone(),
                expires_at: issued.expires_at,
            })
            .await?;

        log::info!("user {} logged in", user.id);

        let redirect_path = user.role.dashboard_path();
        Ok(LoginOutcome {
            user,
            token: issued.token,
            expires_at: issued.expires_at,
            redirect_path,
        })
    }

    /// Replaces the subject's password digest after re-proving the current
    /// password. The digest update and the session-bookkeeping cleanup commit
    /// as one atomic unit inside the store.
    pub async fn change_password(
        &self,
        subject_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let user = self
            .store
            .find_by_id(subject_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !verify_blocking(&self.passwords, current_password, &user.password_hash).await? {
            return Err(AuthError::IncorrectCurrentPassword);
        }

        let digest = hash_blocking(&self.passwords, new_password).await?;

        if !self.store.reset_credentials(user.id, &digest).await? {
            return Err(AuthError::NotFound);
        }

        log::info!("user {} changed password", user.id);
        Ok(())
    }
}

/// Key derivation is intentionally expensive; run it on the blocking pool so
/// it does not monopolize request-handling threads.
pub async fn hash_blocking(passwords: &Arc<PasswordService>, password: &str) -> AuthResult<String> {
    let passwords = passwords.clone();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || passwords.hash(&password))
        .await
        .map_err(|err| AuthError::Internal(err.to_string()))
}

pub async fn verify_blocking(
    passwords: &Arc<PasswordService>,
    password: &str,
    digest: &str,
) -> AuthResult<bool> {
    let passwords = passwords.clone();
    let password = password.to_string();
    let digest = digest.to_string();
    tokio::task::spawn_blocking(move || passwords.verify(&password, &digest))
        .await
        .map_err(|err| AuthError::Internal(err.to_string()))
}
