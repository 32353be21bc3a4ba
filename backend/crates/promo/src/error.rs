//! Promo Error Types
//!
//! Promotion-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.
//!
//! Token rejections (already used, invalid, expired) are not errors here:
//! they are ordinary [`ConsumeOutcome`](crate::domain::entities::ConsumeOutcome)
//! values, since forged and stale links are expected traffic.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Promo-specific result type alias
pub type PromoResult<T> = Result<T, PromoError>;

#[derive(Debug, Error)]
pub enum PromoError {
    /// No promotion row for the requested id
    #[error("Promotion not found")]
    PromotionNotFound,

    /// A backing store did not answer within the configured timeout
    #[error("Store operation timed out")]
    StoreTimeout,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PromoError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PromoError::PromotionNotFound => ErrorKind::NotFound,
            PromoError::StoreTimeout => ErrorKind::ServiceUnavailable,
            PromoError::Database(e) if is_unavailable(e) => ErrorKind::ServiceUnavailable,
            PromoError::Database(_) | PromoError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            PromoError::Database(e) => {
                tracing::error!(error = %e, "Promo database error");
            }
            PromoError::Internal(msg) => {
                tracing::error!(message = %msg, "Promo internal error");
            }
            PromoError::StoreTimeout => {
                tracing::warn!("Promo store timed out");
            }
            PromoError::PromotionNotFound => {
                tracing::debug!(error = %self, "Promo error");
            }
        }
    }
}

fn is_unavailable(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
    )
}

impl From<PromoError> for AppError {
    fn from(err: PromoError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        AppError::new(kind, message).with_source(err)
    }
}

impl IntoResponse for PromoError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        // Redirect endpoints are hit by browsers; no body
        (status, ()).into_response()
    }
}
