//! Error types for the HTTP API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! error body has the shape `{"error": <message>, "status": <code>}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use campus_registry::RegistryError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The acting user is missing or unknown.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The acting user may not perform this action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The request body was not valid JSON for the endpoint.
    #[error("invalid body: {0}")]
    InvalidBody(#[from] JsonRejection),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Registry(err) => match err {
                RegistryError::EventNotFound(_)
                | RegistryError::RegistrationNotFound(_)
                | RegistryError::UserNotFound(_)
                | RegistryError::StudentNotFound(_) => StatusCode::NOT_FOUND,
                RegistryError::CapacityExceeded { .. }
                | RegistryError::DuplicateRegistration { .. }
                | RegistryError::Validation(_) => StatusCode::BAD_REQUEST,
                RegistryError::EventInUse { .. } | RegistryError::DuplicateStudentNo(_) => {
                    StatusCode::CONFLICT
                }
                RegistryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidUuid(_) | Self::InvalidQuery(_) | Self::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Storage details stay in the log.
            Self::Registry(RegistryError::Storage(detail)) => {
                tracing::error!(error = %detail, "Request failed in storage");
                String::from("internal storage error")
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
