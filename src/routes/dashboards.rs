//! Role-gated dashboard endpoints.
//!
//! Appointment scheduling is outside the identity boundary, so the doctor
//! schedule and the receptionist counters are the placeholder values the
//! portal has always returned; only the identity data is live.

use rocket::serde::json::Json;
use rocket::{get, State};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthState, RequireAdmin, RequireDoctor, RequireReceptionist};
use crate::error::ApiError;
use crate::models::{RecentRegistration, UserStats};

const RECENT_REGISTRATIONS_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AdminDashboard {
    #[serde(flatten)]
    pub stats: UserStats,
    pub recent_registrations: Vec<RecentRegistration>,
}

/// Contact card shown at the top of the doctor/receptionist dashboards.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContactCard {
    pub id: i32,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScheduleSlot {
    pub time: String,
    pub patient_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DoctorDashboard {
    pub doctor_info: ContactCard,
    pub today_schedule: Vec<ScheduleSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReceptionistDashboard {
    pub receptionist_info: ContactCard,
    pub pending_appointments: i64,
    pub today_appointments: i64,
}

/// Account totals and the most recent registrations.
#[openapi(tag = "Dashboards")]
#[get("/dashboard/admin")]
pub async fn admin_dashboard(
    state: &State<AuthState>,
    _admin: RequireAdmin,
) -> Result<Json<AdminDashboard>, ApiError> {
    let stats = state.store.stats().await?;
    let recent_registrations = state
        .store
        .recent_registrations(RECENT_REGISTRATIONS_LIMIT)
        .await?;

    Ok(Json(AdminDashboard {
        stats,
        recent_registrations,
    }))
}

/// The signed-in doctor's contact info and today's (placeholder) schedule.
#[openapi(tag = "Dashboards")]
#[get("/dashboard/doctor")]
pub async fn doctor_dashboard(
    state: &State<AuthState>,
    doctor: RequireDoctor,
) -> Result<Json<DoctorDashboard>, ApiError> {
    let user = state
        .store
        .find_by_id(doctor.0.subject_id)
        .await?
        .ok_or_else(|| ApiError::not_found("doctor not found".to_string()))?;

    let today_schedule = ["08:00", "09:00", "10:00", "11:00", "13:00", "14:00", "15:00", "16:00"]
        .into_iter()
        .map(|time| ScheduleSlot {
            time: time.to_string(),
            patient_name: None,
        })
        .collect();

    Ok(Json(DoctorDashboard {
        doctor_info: ContactCard {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
        },
        today_schedule,
    }))
}

/// The signed-in receptionist's contact info and appointment counters.
#[openapi(tag = "Dashboards")]
#[get("/dashboard/receptionist")]
pub async fn receptionist_dashboard(
    state: &State<AuthState>,
    receptionist: RequireReceptionist,
) -> Result<Json<ReceptionistDashboard>, ApiError> {
    let user = state
        .store
        .find_by_id(receptionist.0.subject_id)
        .await?
        .ok_or_else(|| ApiError::not_found("receptionist not found".to_string()))?;

    Ok(Json(ReceptionistDashboard {
        receptionist_info: ContactCard {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
        },
        // No appointments table yet; counters stay at zero.
        pending_appointments: 0,
        today_appointments: 0,
    }))
}
