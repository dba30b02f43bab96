//! Admin user management and password-change flows over HTTP.

use clinic_portal::models::Role;
use clinic_portal::store::UserStore;
use clinic_portal::test_support::{TestPortal, TestRocketBuilder};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use rocket::routes;
use rocket::serde::json::json;
use serde_json::Value;

async fn client_for(portal: &TestPortal) -> Client {
    TestRocketBuilder::new()
        .mount_api_routes(routes![
            clinic_portal::auth::routes::login,
            clinic_portal::auth::routes::change_password,
            clinic_portal::routes::users::create_user,
            clinic_portal::routes::users::list_users,
            clinic_portal::routes::users::update_user,
            clinic_portal::routes::dashboards::admin_dashboard,
        ])
        .manage_auth_state(portal.auth_state())
        .async_client()
        .await
}

fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {token}"))
}

async fn login_token(client: &Client, email: &str, password: &str) -> String {
    let response = client
        .post("/api/v1/auth/login")
        .header(ContentType::JSON)
        .body(json!({ "email": email, "password": password }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.expect("JSON body");
    body["token"].as_str().expect("token string").to_string()
}

#[tokio::test]
async fn admin_creates_lists_and_updates_users() {
    let portal = TestPortal::new();
    portal
        .seed_user("admin@example.com", "The Admin", Role::Admin, "secret1")
        .await;
    let client = client_for(&portal).await;
    let token = login_token(&client, "admin@example.com", "secret1").await;

    let created = client
        .post("/api/v1/users")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(
            json!({
                "email": "New.Doctor@Example.com",
                "password": "secret2",
                "full_name": "New Doctor",
                "role": "doctor"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(created.status(), Status::Ok);
    let created: Value = created.into_json().await.expect("JSON body");
    // Email is normalized to lowercase and no digest material leaves the API.
    assert_eq!(created["email"], "new.doctor@example.com");
    assert_eq!(created["role"], "doctor");
    assert_eq!(created["is_active"], true);
    assert!(created.get("password_hash").is_none());
    assert!(created.get("password").is_none());
    let new_id = created["id"].as_i64().expect("id") as i32;

    let listed = client
        .get("/api/v1/users")
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(listed.status(), Status::Ok);
    let listed: Value = listed.into_json().await.expect("JSON body");
    let users = listed.as_array().expect("user array");
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));

    let updated = client
        .patch(format!("/api/v1/users/{new_id}"))
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(json!({ "role": "receptionist", "is_active": false }).to_string())
        .dispatch()
        .await;
    assert_eq!(updated.status(), Status::Ok);
    let updated: Value = updated.into_json().await.expect("JSON body");
    assert_eq!(updated["role"], "receptionist");
    assert_eq!(updated["is_active"], false);
    // Untouched fields survive a partial update.
    assert_eq!(updated["full_name"], "New Doctor");
}

#[tokio::test]
async fn create_user_rejects_duplicates_and_bad_input() {
    let portal = TestPortal::new();
    portal
        .seed_user("admin@example.com", "The Admin", Role::Admin, "secret1")
        .await;
    portal
        .seed_user("doc@example.com", "Dr. Example", Role::Doctor, "secret1")
        .await;
    let client = client_for(&portal).await;
    let token = login_token(&client, "admin@example.com", "secret1").await;

    let duplicate = client
        .post("/api/v1/users")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(
            json!({
                "email": "doc@example.com",
                "password": "secret2",
                "full_name": "Second Doctor",
                "role": "doctor"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(duplicate.status(), Status::Conflict);
    let duplicate: Value = duplicate.into_json().await.expect("JSON body");
    assert_eq!(duplicate["error"], "Conflict");

    let short_password = client
        .post("/api/v1/users")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(
            json!({
                "email": "ok@example.com",
                "password": "short",
                "full_name": "Short Password",
                "role": "doctor"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(short_password.status(), Status::BadRequest);

    let bad_email = client
        .post("/api/v1/users")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(
            json!({
                "email": "not-an-email",
                "password": "secret2",
                "full_name": "Bad Email",
                "role": "doctor"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(bad_email.status(), Status::BadRequest);

    // Roles are a closed set; anything else fails body deserialization.
    let bad_role = client
        .post("/api/v1/users")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(
            json!({
                "email": "role@example.com",
                "password": "secret2",
                "full_name": "Bad Role",
                "role": "superuser"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_ne!(bad_role.status(), Status::Ok);
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let portal = TestPortal::new();
    portal
        .seed_user("doc@example.com", "Dr. Example", Role::Doctor, "secret1")
        .await;
    let client = client_for(&portal).await;
    let token = login_token(&client, "doc@example.com", "secret1").await;

    let create = client
        .post("/api/v1/users")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(
            json!({
                "email": "sneaky@example.com",
                "password": "secret2",
                "full_name": "Sneaky",
                "role": "admin"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(create.status(), Status::Forbidden);

    let list = client
        .get("/api/v1/users")
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(list.status(), Status::Forbidden);

    let anonymous = client.get("/api/v1/users").dispatch().await;
    assert_eq!(anonymous.status(), Status::Unauthorized);
}

#[tokio::test]
async fn update_unknown_user_is_not_found() {
    let portal = TestPortal::new();
    portal
        .seed_user("admin@example.com", "The Admin", Role::Admin, "secret1")
        .await;
    let client = client_for(&portal).await;
    let token = login_token(&client, "admin@example.com", "secret1").await;

    let response = client
        .patch("/api/v1/users/9999")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(json!({ "is_active": false }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
    let body: Value = response.into_json().await.expect("JSON body");
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn admin_dashboard_reports_totals_and_recent_registrations() {
    let portal = TestPortal::new();
    portal
        .seed_user("admin@example.com", "The Admin", Role::Admin, "secret1")
        .await;
    portal
        .seed_user("doc@example.com", "Dr. Example", Role::Doctor, "secret1")
        .await;
    let id = portal
        .seed_user("desk@example.com", "Front Desk", Role::Receptionist, "secret1")
        .await;
    portal.deactivate_user(id).await;
    let client = client_for(&portal).await;
    let token = login_token(&client, "admin@example.com", "secret1").await;

    let response = client
        .get("/api/v1/dashboard/admin")
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.expect("JSON body");
    assert_eq!(body["total_users"], 3);
    assert_eq!(body["active_users"], 2);
    assert_eq!(body["total_doctors"], 1);
    assert_eq!(body["total_receptionists"], 1);
    assert_eq!(
        body["recent_registrations"]
            .as_array()
            .expect("registrations")
            .len(),
        3
    );
}

#[tokio::test]
async fn change_password_rotates_credentials_and_clears_sessions() {
    let portal = TestPortal::new();
    let id = portal
        .seed_user("doc@example.com", "Dr. Example", Role::Doctor, "secret1")
        .await;
    let client = client_for(&portal).await;
    let token = login_token(&client, "doc@example.com", "secret1").await;
    assert_eq!(portal.store.sessions_for(id).await.expect("sessions").len(), 1);

    let wrong_current = client
        .post("/api/v1/auth/change-password")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(
            json!({
                "user_id": id,
                "current_password": "not-the-password",
                "new_password": "secret2"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(wrong_current.status(), Status::BadRequest);
    let wrong_current: Value = wrong_current.into_json().await.expect("JSON body");
    assert_eq!(wrong_current["error"], "IncorrectCurrentPassword");

    let rotated = client
        .post("/api/v1/auth/change-password")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(
            json!({
                "user_id": id,
                "current_password": "secret1",
                "new_password": "secret2"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(rotated.status(), Status::Ok);
    let rotated: Value = rotated.into_json().await.expect("JSON body");
    assert_eq!(rotated["success"], true);
    assert!(portal.store.sessions_for(id).await.expect("sessions").is_empty());

    // Old password no longer logs in; the new one does.
    let stale = client
        .post("/api/v1/auth/login")
        .header(ContentType::JSON)
        .body(json!({ "email": "doc@example.com", "password": "secret1" }).to_string())
        .dispatch()
        .await;
    assert_eq!(stale.status(), Status::Unauthorized);

    login_token(&client, "doc@example.com", "secret2").await;
}

#[tokio::test]
async fn change_password_requires_a_valid_token() {
    let portal = TestPortal::new();
    let id = portal
        .seed_user("doc@example.com", "Dr. Example", Role::Doctor, "secret1")
        .await;
    let client = client_for(&portal).await;

    let response = client
        .post("/api/v1/auth/change-password")
        .header(ContentType::JSON)
        .body(
            json!({
                "user_id": id,
                "current_password": "secret1",
                "new_password": "secret2"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
}
