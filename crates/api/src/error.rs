//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as
//! `{"error": "<code>", "message": "<text>"}`, plus a `fields` map for
//! validation failures. Server errors are captured to Sentry before
//! responding, and their detail never reaches the client.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::FieldErrors;
use crate::services::{AuthError, ShipmentError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Shipment operation failed.
    #[error("Shipment error: {0}")]
    Shipment(#[from] ShipmentError),

    /// Request body failed validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unique constraint violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Status, code and client-facing message of an error.
struct Parts<'a> {
    status: StatusCode,
    code: &'static str,
    message: String,
    fields: Option<&'a FieldErrors>,
}

impl<'a> Parts<'a> {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            fields: None,
        }
    }

    fn validation(fields: &'a FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "validation_failed",
            message: "Some fields are invalid".to_owned(),
            fields: Some(fields),
        }
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            INTERNAL_MESSAGE,
        )
    }

    fn repository(err: &RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::new(StatusCode::NOT_FOUND, "not_found", "Not found"),
            RepositoryError::Conflict(msg) => Self::new(StatusCode::CONFLICT, "conflict", msg),
            RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => Self::internal(),
        }
    }
}

impl AppError {
    /// Shorthand for a 404 naming the missing resource.
    #[must_use]
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    fn parts(&self) -> Parts<'_> {
        match self {
            Self::Database(err) => Parts::repository(err),
            Self::Auth(err) => match err {
                AuthError::Validation(fields) => Parts::validation(fields),
                AuthError::InvalidCredentials => Parts::new(
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    "Invalid email or password",
                ),
                AuthError::UserNotFound | AuthError::InvalidToken => Parts::new(
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    "Authentication required",
                ),
                AuthError::UserAlreadyExists => Parts::new(
                    StatusCode::CONFLICT,
                    "conflict",
                    "An account with this email already exists",
                ),
                AuthError::Repository(err) => Parts::repository(err),
                AuthError::TokenSigning(_) | AuthError::PasswordHash => Parts::internal(),
            },
            Self::Shipment(err) => match err {
                ShipmentError::Validation(fields) => Parts::validation(fields),
                ShipmentError::NotFound => {
                    Parts::new(StatusCode::NOT_FOUND, "not_found", "Shipment not found")
                }
                ShipmentError::Forbidden(msg) => {
                    Parts::new(StatusCode::FORBIDDEN, "forbidden", *msg)
                }
                ShipmentError::Transition(e) => {
                    Parts::new(StatusCode::CONFLICT, "invalid_transition", e.to_string())
                }
                ShipmentError::Conflict(msg) => Parts::new(StatusCode::CONFLICT, "conflict", msg),
                ShipmentError::Repository(err) => Parts::repository(err),
            },
            Self::Validation(fields) => Parts::validation(fields),
            Self::NotFound(msg) => Parts::new(StatusCode::NOT_FOUND, "not_found", msg),
            Self::Unauthorized(msg) => Parts::new(StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::Forbidden(msg) => Parts::new(StatusCode::FORBIDDEN, "forbidden", msg),
            Self::BadRequest(msg) => Parts::new(StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Conflict(msg) => Parts::new(StatusCode::CONFLICT, "conflict", msg),
            Self::RateLimited => Parts::new(
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests, slow down",
            ),
            Self::Internal(_) => Parts::internal(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let parts = self.parts();

        // Capture server errors to Sentry
        if parts.status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let mut body = json!({
            "error": parts.code,
            "message": parts.message,
        });
        if let Some(fields) = parts.fields {
            body["fields"] = json!(fields);
        }

        (parts.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Path ids that cannot be parsed cannot name anything.
impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        Self::NotFound("Not found".to_owned())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use shipdesk_core::{ShipmentStatus, TransitionError};

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::not_found("Shipment");
        assert_eq!(err.to_string(), "Not found: Shipment not found");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[tokio::test]
    async fn test_app_error_status_codes() {
        let cases = [
            (AppError::not_found("x"), StatusCode::NOT_FOUND, "not_found"),
            (
                AppError::Unauthorized("x".to_owned()),
                StatusCode::UNAUTHORIZED,
                "unauthorized",
            ),
            (
                AppError::Forbidden("x".to_owned()),
                StatusCode::FORBIDDEN,
                "forbidden",
            ),
            (
                AppError::BadRequest("x".to_owned()),
                StatusCode::BAD_REQUEST,
                "bad_request",
            ),
            (
                AppError::Conflict("x".to_owned()),
                StatusCode::CONFLICT,
                "conflict",
            ),
            (
                AppError::RateLimited,
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
            ),
            (
                AppError::Internal("x".to_owned()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ),
        ];

        for (err, status, code) in cases {
            let (got_status, body) = render(err).await;
            assert_eq!(got_status, status);
            assert_eq!(body["error"], code);
        }
    }

    #[tokio::test]
    async fn validation_errors_list_fields() {
        let mut fields = FieldErrors::new();
        fields.add("sender.city", "is required");
        let (status, body) = render(ShipmentError::Validation(fields).into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
        assert_eq!(body["fields"]["sender.city"], "is required");
    }

    #[tokio::test]
    async fn transition_errors_are_conflicts() {
        let err = ShipmentError::Transition(TransitionError::Terminal {
            from: ShipmentStatus::Delivered,
        });
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "invalid_transition");
        assert!(body.get("fields").is_none());
    }

    #[tokio::test]
    async fn internal_detail_is_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "bad status in row 42".to_owned(),
        ));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], INTERNAL_MESSAGE);

        let (status, body) = render(AuthError::PasswordHash.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_error");
    }

    #[tokio::test]
    async fn login_failures_are_undifferentiated() {
        let (status, body) = render(AuthError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid email or password");
    }
}
