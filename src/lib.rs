#[macro_use]
extern crate rocket;

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod store;

use std::sync::{Arc, Once};
use std::time::Duration as StdDuration;

use crate::auth::{AuthConfig, AuthState};
use crate::db::ClinicDb;
use crate::request_logger::RequestLogger;
use crate::store::{PgUserStore, UserStore};
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{make_rapidoc, GeneralConfig, HideShowConfig, RapiDocConfig},
    settings::UrlObject,
    swagger_ui::{make_swagger_ui, SwaggerUIConfig},
};

const SESSION_PURGE_INTERVAL_SECS: u64 = 60 * 60;

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    // Configure CORS
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![
                Method::Get,
                Method::Post,
                Method::Put,
                Method::Delete,
                Method::Patch,
            ]
            .into_iter()
            .map(From::from)
            .collect(),
        )
        .allow_credentials(true)
        .to_cors()
        .expect("Error creating CORS");

    rocket::build()
        .attach(RequestLogger)
        .attach(ClinicDb::init())
        .attach(cors)
        // Run database migrations on startup
        .attach(AdHoc::try_on_ignite(
            "Run Migrations",
            |rocket| async move {
                match ClinicDb::fetch(&rocket) {
                    Some(db) => {
                        let pool = (**db).clone();
                        match db::run_migrations(&pool).await {
                            Ok(_) => {
                                log::info!("database migrations successful");
                                Ok(rocket)
                            }
                            Err(e) => {
                                log::error!("database migrations failed: {}", e);
                                Err(rocket)
                            }
                        }
                    }
                    None => {
                        log::error!("database pool not available for migrations");
                        Err(rocket)
                    }
                }
            },
        ))
        // Build the auth state over a Postgres-backed user store
        .attach(AdHoc::try_on_ignite("Manage Auth State", |rocket| async move {
            let config = match AuthConfig::from_env() {
                Ok(config) => config,
                Err(e) => {
                    log::error!("auth configuration failed: {}", e);
                    return Err(rocket);
                }
            };

            match ClinicDb::fetch(&rocket) {
                Some(db) => {
                    let pool = (**db).clone();
                    let store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(
                        pool,
                        StdDuration::from_millis(config.db_timeout_ms),
                    ));
                    Ok(rocket.manage(AuthState::new(config, store)))
                }
                None => {
                    log::error!("database pool not available for auth state");
                    Err(rocket)
                }
            }
        }))
        // Periodically purge expired session-bookkeeping rows
        .attach(AdHoc::on_liftoff("Spawn Session Purge", |rocket| {
            Box::pin(async move {
                if let Some(state) = rocket.state::<AuthState>() {
                    let store = state.store.clone();
                    tokio::spawn(async move {
                        let mut interval = tokio::time::interval(StdDuration::from_secs(
                            SESSION_PURGE_INTERVAL_SECS,
                        ));
                        loop {
                            interval.tick().await;
                            match store.purge_expired_sessions(chrono::Utc::now()).await {
                                Ok(0) => {}
                                Ok(purged) => {
                                    log::info!("purged {} expired session rows", purged)
                                }
                                Err(e) => log::warn!("session purge failed: {}", e),
                            }
                        }
                    });
                } else {
                    log::error!("failed to spawn session purge: auth state not found");
                }
            })
        }))
        .register("/", catchers![error::default_catcher])
        .mount(
            "/api/v1",
            openapi_get_routes![
                // Health routes
                routes::health::health_check,
                // Auth routes
                auth::routes::login,
                auth::routes::verify_session,
                auth::routes::change_password,
                // User management routes (admin only)
                routes::users::create_user,
                routes::users::list_users,
                routes::users::update_user,
                // Dashboard routes
                routes::dashboards::admin_dashboard,
                routes::dashboards::doctor_dashboard,
                routes::dashboards::receptionist_dashboard,
            ],
        )
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../v1/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Clinic Portal API", "../../v1/openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use std::sync::Arc;

    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};

    use crate::auth::{AuthConfig, AuthState, PasswordService};
    use crate::models::Role;
    use crate::store::{InMemoryUserStore, NewUser, UserPatch, UserStore};

    pub const TEST_JWT_SECRET: &str = "test-portal-secret";

    pub fn test_auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: TEST_JWT_SECRET.into(),
            token_ttl_secs: 24 * 60 * 60,
            db_timeout_ms: 5_000,
        }
    }

    /// In-memory portal harness: an `AuthState` over the fake user store,
    /// plus seeding helpers for the scenarios the integration tests exercise.
    pub struct TestPortal {
        pub store: Arc<InMemoryUserStore>,
        passwords: PasswordService,
    }

    impl TestPortal {
        pub fn new() -> Self {
            Self {
                store: Arc::new(InMemoryUserStore::new()),
                passwords: PasswordService::new(),
            }
        }

        pub fn auth_state(&self) -> AuthState {
            AuthState::new(test_auth_config(), self.store.clone())
        }

        pub async fn seed_user(&self, email: &str, name: &str, role: Role, password: &str) -> i32 {
            self.store
                .create(NewUser {
                    email: email.to_string(),
                    password_hash: self.passwords.hash(password),
                    full_name: name.to_string(),
                    role,
                })
                .await
                .expect("seed user")
                .id
        }

        pub async fn deactivate_user(&self, id: i32) {
            self.store
                .update(
                    id,
                    UserPatch {
                        is_active: Some(false),
                        ..Default::default()
                    },
                )
                .await
                .expect("deactivate user");
        }
    }

    impl Default for TestPortal {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    #[derive(Default)]
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        auth_state: Option<AuthState>,
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                mounts: Vec::new(),
                auth_state: None,
            }
        }

        /// Mount routes under `/api/v1`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/api/v1".to_string(), routes));
            self
        }

        /// Manage an `AuthState` for tests that exercise guarded routes.
        pub fn manage_auth_state(mut self, state: AuthState) -> Self {
            self.auth_state = Some(state);
            self
        }

        /// Finish building the Rocket instance. The catch-all error catcher
        /// is always registered so guard rejections carry JSON bodies, as in
        /// the production build.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment)
                .register("/", rocket::catchers![crate::error::default_catcher]);

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            if let Some(state) = self.auth_state {
                rocket = rocket.manage(state);
            }

            rocket
        }

        /// Convenience helper to produce a blocking local client.
        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        /// Convenience helper to produce an asynchronous local client.
        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
