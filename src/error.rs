//! HTTP boundary error responder.
//!
//! Domain failures surface as stable `{error, message}` JSON bodies with the
//! status taken from the error kind. Internal failures are logged server-side
//! and replaced with a generic message so parsing details never leak.

use std::io::Cursor;

use okapi::openapi3::Responses;
use rocket::catch;
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::response::OpenApiResponderInner;
use serde::Serialize;

use crate::auth::AuthError;
use crate::store::StoreError;

#[derive(Debug)]
pub struct ApiError {
    status: Status,
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: Status::BadRequest,
            kind: "ValidationError",
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: Status::NotFound,
            kind: "NotFound",
            message: message.into(),
        }
    }

    /// Builds the body for a status that never went through a handler, such
    /// as a guard rejection or an unmatched route.
    pub fn from_status(status: Status) -> Self {
        let (kind, message) = match status.code {
            401 => ("Unauthorized", "unauthorized"),
            403 => ("Forbidden", "forbidden"),
            404 => ("NotFound", "resource not found"),
            422 => ("ValidationError", "malformed request body"),
            _ => ("InternalError", "internal server error"),
        };

        Self {
            status,
            kind,
            message: message.to_string(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = err.status();
        let kind = err.kind();
        let message = if status == Status::InternalServerError {
            log::error!("internal error: {err}");
            "internal server error".to_string()
        } else {
            err.to_string()
        };

        Self {
            status,
            kind,
            message,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::from(AuthError::from(err))
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let body = ErrorBody {
            error: self.kind.to_string(),
            message: self.message,
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"error":"InternalError","message":"failed to serialize error"}"#.to_string()
        });

        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

/// Guard failures and other pre-handler rejections bypass the `Responder`
/// path entirely and land in Rocket's catchers, so the catch-all re-emits
/// the same `{error, message}` wire shape the handlers produce.
#[catch(default)]
pub fn default_catcher(status: Status, _request: &Request) -> ApiError {
    ApiError::from_status(status)
}

impl OpenApiResponderInner for ApiError {
    fn responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        Ok(Responses::default())
    }
}
