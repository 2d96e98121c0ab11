//! Error types for the API layer.
//!
//! [`ApiError`] unifies action, storage, and framing failures into the
//! stable error-body contract: `{code, message, correlation_id}` with a
//! status derived from the kind. Internal details never leave the server;
//! the correlation id ties the response to the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use burnrate_core::ActionError;
use burnrate_db::DbError;
use uuid::Uuid;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A game-rule or auth failure from the action processor.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// A persistence failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed request input.
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// The admin key was missing or wrong.
    #[error("admin access denied")]
    AdminDenied,

    /// The request exceeded its deadline.
    #[error("request timed out")]
    RequestTimeout,
}

impl ApiError {
    /// The stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Action(e) => e.code(),
            Self::Db(e) => match e {
                DbError::NotFound(_) => "not_found",
                DbError::UniqueConflict(_) => "conflict",
                DbError::TransactionConflict => "transaction_conflict",
                DbError::Transient(_) => "transient",
                _ => "internal",
            },
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "validation",
            Self::AdminDenied => "unauthorized",
            Self::RequestTimeout => "request_timeout",
        }
    }

    /// The HTTP status for this error kind.
    fn status(&self) -> StatusCode {
        match self {
            Self::Action(e) => match e {
                ActionError::Unauthorized => StatusCode::UNAUTHORIZED,
                ActionError::NotFound(_) => StatusCode::NOT_FOUND,
                ActionError::Conflict(_) | ActionError::TransactionConflict => {
                    StatusCode::CONFLICT
                }
                ActionError::Validation(_) => StatusCode::BAD_REQUEST,
                ActionError::Precondition(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ActionError::RateLimited { .. } | ActionError::QuotaExceeded => {
                    StatusCode::TOO_MANY_REQUESTS
                }
                ActionError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
                ActionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Db(e) => match e {
                DbError::NotFound(_) => StatusCode::NOT_FOUND,
                DbError::UniqueConflict(_) => StatusCode::CONFLICT,
                DbError::TransactionConflict => StatusCode::CONFLICT,
                DbError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::AdminDenied => StatusCode::UNAUTHORIZED,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
        }
    }

    /// Whether the message is safe to show the caller. Internal details
    /// stay behind the correlation id.
    fn public_message(&self) -> String {
        match self {
            Self::Action(ActionError::Internal(_)) => "internal error".to_owned(),
            Self::Db(e) if !matches!(e, DbError::NotFound(_) | DbError::UniqueConflict(_)) => {
                "storage failure".to_owned()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let correlation_id = Uuid::new_v4();
        let status = self.status();
        let code = self.code();
        let message = self.public_message();

        if status.is_server_error() {
            tracing::error!(%correlation_id, code, error = %self, "request failed");
        } else {
            tracing::debug!(%correlation_id, code, error = %self, "request refused");
        }

        let mut body = serde_json::json!({
            "code": code,
            "message": message,
            "correlation_id": correlation_id,
        });
        if let Self::Action(ActionError::RateLimited { retry_after_ms }) = &self {
            body["retry_after_ms"] = serde_json::json!(retry_after_ms);
        }

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_catalog() {
        assert_eq!(
            ApiError::Action(ActionError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Action(ActionError::QuotaExceeded).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Action(ActionError::Precondition(String::new())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Db(DbError::TransactionConflict).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn internal_details_are_hidden() {
        let err = ApiError::Action(ActionError::Internal("secret stack".to_owned()));
        assert_eq!(err.public_message(), "internal error");
    }
}
