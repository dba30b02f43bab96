use rocket::http::Status;
use thiserror::Error;

use crate::store::StoreError;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password; deliberately indistinguishable so the
    /// login endpoint cannot be used to enumerate accounts.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account is deactivated")]
    AccountDeactivated,
    #[error("current password is incorrect")]
    IncorrectCurrentPassword,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("service temporarily unavailable")]
    Unavailable,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> Status {
        match self {
            AuthError::InvalidCredentials | AuthError::Unauthorized => Status::Unauthorized,
            AuthError::AccountDeactivated | AuthError::Forbidden => Status::Forbidden,
            AuthError::IncorrectCurrentPassword | AuthError::Validation(_) => Status::BadRequest,
            AuthError::NotFound => Status::NotFound,
            AuthError::Conflict(_) => Status::Conflict,
            AuthError::Unavailable => Status::ServiceUnavailable,
            AuthError::Config(_) | AuthError::Internal(_) => Status::InternalServerError,
        }
    }

    /// Stable machine-readable error kind surfaced in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "InvalidCredentials",
            AuthError::AccountDeactivated => "AccountDeactivated",
            AuthError::IncorrectCurrentPassword => "IncorrectCurrentPassword",
            AuthError::Unauthorized => "Unauthorized",
            AuthError::Forbidden => "Forbidden",
            AuthError::NotFound => "NotFound",
            AuthError::Validation(_) => "ValidationError",
            AuthError::Conflict(_) => "Conflict",
            AuthError::Unavailable => "Unavailable",
            AuthError::Config(_) | AuthError::Internal(_) => "InternalError",
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::Conflict("email already in use".into()),
            StoreError::Unavailable => AuthError::Unavailable,
            StoreError::UnknownRole(role) => AuthError::Internal(format!("unknown role: {role}")),
            StoreError::Database(err) => AuthError::Internal(err.to_string()),
        }
    }
}
