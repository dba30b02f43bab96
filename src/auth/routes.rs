//! Auth endpoints: login, session verification, password change.

use rocket::serde::json::Json;
use rocket::{get, post, State};
use rocket_okapi::openapi;

use crate::auth::responses::{
    ChangePasswordRequest, ChangePasswordResponse, LoginRequest, LoginResponse, SessionResponse,
    UserSummary,
};
use crate::auth::{AuthState, AuthUser};
use crate::error::ApiError;

const MIN_PASSWORD_LEN: usize = 6;

/// Verify credentials and issue a 24h bearer token plus the role-keyed
/// dashboard redirect.
#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<payload>")]
pub async fn login(
    state: &State<AuthState>,
    payload: Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = payload.email.trim();
    let password = payload.password.as_str();

    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::validation("a valid email is required"));
    }
    // Shape check runs before any lookup so it cannot act as an
    // account-enumeration oracle.
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation("password must be at least 6 characters"));
    }

    let outcome = state.credentials.login(email, password).await?;

    Ok(Json(LoginResponse {
        user: UserSummary {
            id: outcome.user.id,
            email: outcome.user.email.clone(),
            full_name: outcome.user.full_name.clone(),
            role: outcome.user.role,
        },
        token: outcome.token,
        expires_at: outcome.expires_at,
        redirect_path: outcome.redirect_path.to_string(),
    }))
}

/// Report the verified identity behind the presented token.
#[openapi(tag = "Auth")]
#[get("/auth/session")]
pub async fn verify_session(user: AuthUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        valid: true,
        user_id: user.0.subject_id,
        role: user.0.role,
    })
}

/// Rotate the subject's password after re-proving the current one. Clears
/// all session-bookkeeping rows for the subject.
#[openapi(tag = "Auth")]
#[post("/auth/change-password", data = "<payload>")]
pub async fn change_password(
    state: &State<AuthState>,
    _user: AuthUser,
    payload: Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, ApiError> {
    if payload.new_password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(
            "new password must be at least 6 characters",
        ));
    }

    state
        .credentials
        .change_password(
            payload.user_id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(ChangePasswordResponse { success: true }))
}
