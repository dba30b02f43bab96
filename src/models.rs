//! Core data model shared by the stores, the auth layer and the routes.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Staff role. Closed set: anything outside these three values is rejected
/// at the boundary (`parse` returns `None`), never tolerated downstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Receptionist,
}

impl Role {
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "admin" => Some(Role::Admin),
            "doctor" => Some(Role::Doctor),
            "receptionist" => Some(Role::Receptionist),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
        }
    }

    /// Post-login landing page for each role.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Doctor => "/doctor/dashboard",
            Role::Receptionist => "/receptionist/dashboard",
        }
    }
}

/// A staff account as stored. Carries the password digest, so this type
/// never serializes directly; API responses go through [`UserResponse`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sanitized user representation returned by the management endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Aggregate account counts for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UserStats {
    pub total_users: i64,
    pub total_doctors: i64,
    pub total_receptionists: i64,
    pub active_users: i64,
}

/// One row of the admin dashboard's recent-registrations list.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecentRegistration {
    pub id: i32,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_a_closed_set() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("doctor"), Some(Role::Doctor));
        assert_eq!(Role::parse("receptionist"), Some(Role::Receptionist));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn roles_round_trip_through_strings() {
        for role in [Role::Admin, Role::Doctor, Role::Receptionist] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn every_role_has_a_dashboard() {
        assert_eq!(Role::Admin.dashboard_path(), "/admin/dashboard");
        assert_eq!(Role::Doctor.dashboard_path(), "/doctor/dashboard");
        assert_eq!(
            Role::Receptionist.dashboard_path(),
            "/receptionist/dashboard"
        );
    }
}
