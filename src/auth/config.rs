use crate::auth::{AuthError, AuthResult};

/// Authentication configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub db_timeout_ms: u64,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        let jwt_secret = std::env::var("PORTAL_JWT_SECRET")
            .map_err(|_| AuthError::Config("PORTAL_JWT_SECRET is required".into()))?;
        let token_ttl_secs = std::env::var("PORTAL_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(24 * 60 * 60);
        let db_timeout_ms = std::env::var("PORTAL_DB_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5_000);

        Ok(Self {
            jwt_secret,
            token_ttl_secs,
            db_timeout_ms,
        })
    }
}
