//! Rocket request guards gating protected operations.
//!
//! Composition order is fixed: the authentication gate runs first (missing,
//! malformed or invalid bearer token rejects with 401), then the role gate
//! checks membership of the live role in the operation's allowed set (403 on
//! mismatch). Handlers receive the derived [`Session`].

use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use rocket_okapi::request::OpenApiFromRequest;

use crate::auth::session::Session;
use crate::auth::{AuthError, AuthState};
use crate::models::Role;

/// Any-authenticated gate: a verified session, role not yet constrained.
#[derive(Debug, Clone, OpenApiFromRequest)]
pub struct AuthUser(pub Session);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match extract_session(request).await {
            Ok(session) => Outcome::Success(AuthUser(session)),
            Err(err) => Outcome::Error((err.status(), err)),
        }
    }
}

/// Checks membership of the session's role in the operation's allowed set.
/// Every current operation passes a one-element set, but multi-role
/// operations need no new machinery.
fn authorize(session: &Session, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&session.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

macro_rules! role_guard {
    ($name:ident, $allowed:expr) => {
        #[derive(Debug, Clone, OpenApiFromRequest)]
        pub struct $name(pub Session);

        #[rocket::async_trait]
        impl<'r> FromRequest<'r> for $name {
            type Error = AuthError;

            async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
                match AuthUser::from_request(request).await {
                    Outcome::Success(AuthUser(session)) => match authorize(&session, $allowed) {
                        Ok(()) => Outcome::Success($name(session)),
                        Err(err) => Outcome::Error((err.status(), err)),
                    },
                    Outcome::Error(err) => Outcome::Error(err),
                    Outcome::Forward(_) => {
                        Outcome::Error((Status::Unauthorized, AuthError::Unauthorized))
                    }
                }
            }
        }
    };
}

role_guard!(RequireAdmin, &[Role::Admin]);
role_guard!(RequireDoctor, &[Role::Doctor]);
role_guard!(RequireReceptionist, &[Role::Receptionist]);

async fn extract_session(request: &Request<'_>) -> Result<Session, AuthError> {
    let token = bearer_token_from_request(request)?;

    let auth_state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from state".into()))?;

    auth_state
        .verifier
        .verify(token)
        .await
        .ok_or(AuthError::Unauthorized)
}

/// An absent or malformed Authorization header is treated identically to an
/// invalid token.
fn bearer_token_from_request<'r>(request: &'r Request<'_>) -> Result<&'r str, AuthError> {
    let header = request
        .headers()
        .get_one("Authorization")
        .ok_or(AuthError::Unauthorized)?;
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default();
    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Ok(token)
    } else {
        Err(AuthError::Unauthorized)
    }
}
