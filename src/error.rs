use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Errors surfaced by the attendance engine and its HTTP handlers.
#[derive(Debug, Display, PartialEq)]
pub enum AppError {
    #[display(fmt = "Employee {} not found", _0)]
    NotFound(u64),

    #[display(fmt = "Conflicting attendance write: {}", _0)]
    Conflict(String),

    /// The record store could not be reached. Callers may retry.
    #[display(fmt = "Attendance store unavailable, please retry")]
    StoreUnavailable,

    #[display(fmt = "{}", _0)]
    InvalidInput(String),

    #[display(fmt = "{}", _0)]
    Unauthorized(&'static str),

    #[display(fmt = "{}", _0)]
    Forbidden(&'static str),

    #[display(fmt = "Internal Server Error")]
    Internal(String),
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StoreUnavailable)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string(),
            "retryable": self.is_retryable(),
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000") => {
                tracing::warn!(error = %e, "Integrity constraint rejected attendance write");
                AppError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => {
                tracing::error!(error = %e, "Attendance store unavailable");
                AppError::StoreUnavailable
            }
            _ => {
                tracing::error!(error = %e, "Attendance store failure");
                AppError::Internal(e.to_string())
            }
        }
    }
}
