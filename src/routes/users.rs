//! Admin-only staff account management.

use rocket::serde::json::Json;
use rocket::{get, patch, post, State};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::auth::service::hash_blocking;
use crate::auth::{AuthState, RequireAdmin};
use crate::error::ApiError;
use crate::models::{Role, UserResponse};
use crate::store::{NewUser, UserPatch};

const MIN_PASSWORD_LEN: usize = 6;
const MIN_FULL_NAME_LEN: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

/// Partial update; omitted fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn validate_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::validation("a valid email is required"));
    }
    // Emails are normalized to lowercase at write time; lookups later match
    // the stored casing exactly.
    Ok(email.to_lowercase())
}

/// Provision a new staff account. The account starts active.
#[openapi(tag = "Users")]
#[post("/users", data = "<payload>")]
pub async fn create_user(
    state: &State<AuthState>,
    _admin: RequireAdmin,
    payload: Json<CreateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let email = validate_email(&payload.email)?;
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation("password must be at least 6 characters"));
    }
    let full_name = payload.full_name.trim();
    if full_name.len() < MIN_FULL_NAME_LEN {
        return Err(ApiError::validation(
            "full name must be at least 2 characters",
        ));
    }

    let password_hash = hash_blocking(&state.passwords, &payload.password).await?;

    let user = state
        .store
        .create(NewUser {
            email,
            password_hash,
            full_name: full_name.to_string(),
            role: payload.role,
        })
        .await?;

    log::info!("admin created user {} ({})", user.id, user.role.as_str());
    Ok(Json(UserResponse::from(user)))
}

/// List every staff account, digests omitted.
#[openapi(tag = "Users")]
#[get("/users")]
pub async fn list_users(
    state: &State<AuthState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.store.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Apply a partial update to a staff account.
#[openapi(tag = "Users")]
#[patch("/users/<id>", data = "<payload>")]
pub async fn update_user(
    state: &State<AuthState>,
    _admin: RequireAdmin,
    id: i32,
    payload: Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let email = match &payload.email {
        Some(email) => Some(validate_email(email)?),
        None => None,
    };
    let full_name = match &payload.full_name {
        Some(name) => {
            let name = name.trim();
            if name.len() < MIN_FULL_NAME_LEN {
                return Err(ApiError::validation(
                    "full name must be at least 2 characters",
                ));
            }
            Some(name.to_string())
        }
        None => None,
    };

    let patch = UserPatch {
        email,
        full_name,
        role: payload.role,
        is_active: payload.is_active,
    };

    let updated = state
        .store
        .update(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("user {id} not found")))?;

    Ok(Json(UserResponse::from(updated)))
}
