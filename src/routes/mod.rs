//! HTTP route handlers grouped by resource domain.
//!
//! Each submodule exposes typed Rocket handlers annotated with `#[openapi]`
//! so `rocket_okapi` can derive an OpenAPI document automatically. Access
//! control is declared through the request guards in `crate::auth::guards`.

pub mod dashboards;
pub mod health;
pub mod users;
