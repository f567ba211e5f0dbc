//! JSON response envelope and error rendering.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

/// Typed outcome of an operation: a short message for the user plus the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome<T> {
    /// Human-readable summary
    pub message: String,
    /// Operation result
    pub data: T,
}

impl<T> Outcome<T> {
    /// Wraps `data` with a message, ready to be returned from a handler.
    pub fn json(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            message: message.into(),
            data,
        })
    }
}

/// Result type returned by handlers.
pub type ApiResult<T> = Result<Json<Outcome<T>>, Error>;

impl Error {
    /// Status code and machine-readable kind of the error.
    #[must_use]
    pub const fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            Self::NotAuthorized { .. } => (StatusCode::FORBIDDEN, "not_authorized"),
            Self::InactiveAccount { .. } => (StatusCode::FORBIDDEN, "inactive_account"),
            Self::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
            Self::NoAttendance { .. } => (StatusCode::CONFLICT, "no_attendance"),
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            Self::Config { .. } | Self::Database(_) | Self::Io(_) | Self::EnvVar(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, kind) = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}
