//! Error types for web handlers.
//!
//! [`AppError`] bridges settlement errors and HTTP responses. Every error is
//! rendered as a JSON body `{"code": ..., "message": ...}`; server errors are
//! logged with their source before the response goes out.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use brewspace_core::{ErrorKind, SettlementError};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: String,
    /// Internal error (logged, never exposed to the client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHENTICATED".to_string(),
        )
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }
}

/// HTTP status for each error class.
const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Resource => StatusCode::PAYMENT_REQUIRED,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        let status = status_for(err.kind());
        let code = err.code().to_string();

        if status.is_server_error() {
            // Store details stay in the logs
            Self::new(status, "An internal error occurred".to_string(), code)
                .with_source(anyhow::Error::new(err))
        } else {
            Self::new(status, err.to_string(), code)
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewspace_core::{BookingId, Money, UserId};

    #[test]
    fn test_validation_maps_to_422() {
        let err = AppError::from(SettlementError::InvalidTimeRange);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "INVALID_TIME_RANGE");
    }

    #[test]
    fn test_status_per_kind() {
        assert_eq!(
            AppError::from(SettlementError::BookingNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(SettlementError::SlotConflict).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(SettlementError::InsufficientBalance {
                required: Money::from_units(20),
                available: Money::from_units(5),
            })
            .status(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            AppError::from(SettlementError::Unauthorized).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let err = AppError::from(SettlementError::RefundFailed {
            booking_id: BookingId::new(),
            user_id: UserId::new(),
            reason: "connection reset".to_string(),
        });

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("connection reset"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display() {
        let err = AppError::forbidden("Admin role required");
        assert_eq!(err.to_string(), "[FORBIDDEN] Admin role required");
    }
}
