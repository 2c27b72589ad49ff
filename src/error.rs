use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::handlers::shared::ApiResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Immutable state: {0}")]
    ImmutableState(String),

    #[error("Invalid attendance: {0}")]
    InvalidAttendance(String),

    #[error("Calculation error: {0}")]
    Calculation(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ImmutableState(_) => StatusCode::CONFLICT,
            AppError::InvalidAttendance(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Calculation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        if status_code.is_server_error() {
            log::error!(
                "Request failed with status {}: {}",
                status_code,
                error_message
            );
        } else {
            log::warn!(
                "Request rejected with status {}: {}",
                status_code,
                error_message
            );
        }

        let response_body = ApiResponse::<()>::error(&error_message);

        HttpResponse::build(status_code).json(response_body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        // Composite unique indexes back the config/attendance/invoice
        // invariants; a violation is a caller-visible conflict, not a 500.
        if let Some(db_err) = error.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::Conflict(format!("Uniqueness violation: {}", db_err.message()));
            }
        }
        log::error!("Database error: {}", error);
        AppError::Database(error)
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    /// True for error kinds that indicate an upstream logic or
    /// data-integrity bug rather than bad user input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::InvalidAttendance(_) | AppError::Calculation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::validation("tenant is required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("no config").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("duplicate period".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::ImmutableState("invoice is final".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidAttendance("daysPresent out of range".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_are_distinguished_from_user_input() {
        assert!(AppError::Calculation("NaN".into()).is_internal());
        assert!(AppError::InvalidAttendance("bad".into()).is_internal());
        assert!(!AppError::validation("bad month").is_internal());
        assert!(!AppError::ImmutableState("locked".into()).is_internal());
    }
}
