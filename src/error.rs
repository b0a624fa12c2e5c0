use axum::{http::StatusCode, response::IntoResponse, Json};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error taxonomy. Every failure surfaced to a caller is one of these;
/// nothing is silently swallowed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Internal(String),
    #[error("database error: {0}")]
    Database(DbErr),
}

/// JSON error body: a message plus a stable machine-readable kind.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        // Constraint violations carry domain meaning: a duplicate key is a
        // Conflict (e.g. two concurrent registrations for one identity), a
        // broken reference is bad input.
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ApiError::Conflict("duplicate value violates a unique constraint".to_string())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                ApiError::Validation("referenced entity does not exist".to_string())
            }
            _ => ApiError::Database(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message, code) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED"),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, "FORBIDDEN"),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT"),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
            ApiError::Internal(msg) => {
                error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg, "INTERNAL_ERROR")
            }
            ApiError::Database(e) => {
                error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database operation failed".to_string(),
                    "DATABASE_ERROR",
                )
            }
        };

        let body = ErrorResponse {
            error: error_message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(ApiError::Unauthorized("no token".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ApiError::Forbidden("not your animal".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(ApiError::NotFound("user not found".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ApiError::Conflict("already registered".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ApiError::Validation("liters must be positive".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ApiError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_database_error_is_opaque() {
        let err = ApiError::Database(DbErr::Custom("connection reset".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ApiError::Conflict("tag exists".into()).to_string(),
            "tag exists"
        );
        assert!(ApiError::Database(DbErr::Custom("x".into()))
            .to_string()
            .starts_with("database error"));
    }
}
