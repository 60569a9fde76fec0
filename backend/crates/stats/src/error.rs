//! Stats Error Types
//!
//! This module provides stats-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use kernel::id::IdError;
use platform::http::FetchError;
use platform::kv::KvError;
use thiserror::Error;

/// Stats-specific result type alias
pub type StatsResult<T> = Result<T, StatsError>;

/// Stats-specific error variants
#[derive(Debug, Error)]
pub enum StatsError {
    /// No API key available; nothing is sent upstream
    #[error("No API key configured")]
    MissingCredential,

    /// Entity reference could not be parsed
    #[error("Invalid entity ID: {0}")]
    InvalidEntityId(String),

    /// Window outside the supported range
    #[error("Invalid window: {0} days")]
    InvalidWindow(u32),

    /// Upstream request failed
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Snapshot store failure
    #[error("Snapshot store error: {0}")]
    Store(#[from] KvError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StatsError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StatsError::MissingCredential => ErrorKind::ServiceUnavailable,
            StatsError::InvalidEntityId(_) | StatsError::InvalidWindow(_) => ErrorKind::BadRequest,
            StatsError::Fetch(e) => match e {
                FetchError::Timeout => ErrorKind::GatewayTimeout,
                e if e.is_unknown_entity() => ErrorKind::NotFound,
                e if e.is_rate_limited() => ErrorKind::TooManyRequests,
                FetchError::Api { .. } if e.is_transient() => ErrorKind::ServiceUnavailable,
                _ => ErrorKind::BadGateway,
            },
            StatsError::Store(_) | StatsError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            StatsError::Fetch(e) => e.is_transient(),
            StatsError::Store(_) => true,
            StatsError::MissingCredential
            | StatsError::InvalidEntityId(_)
            | StatsError::InvalidWindow(_)
            | StatsError::Internal(_) => false,
        }
    }

    /// Errors that must stop a whole batch, not just one entity
    pub fn is_fatal(&self) -> bool {
        matches!(self, StatsError::MissingCredential)
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            StatsError::MissingCredential => err.with_action("Set TORN_API_KEY and restart"),
            StatsError::Fetch(e) if e.is_unauthorized() => {
                err.with_action("Check that the configured API key is valid")
            }
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            StatsError::Store(e) => {
                tracing::error!(error = %e, "Snapshot store error");
            }
            StatsError::Internal(msg) => {
                tracing::error!(message = %msg, "Stats internal error");
            }
            StatsError::MissingCredential => {
                tracing::error!("Request refused: no API key configured");
            }
            StatsError::Fetch(e) => {
                tracing::warn!(error = %e, "Upstream fetch failed");
            }
            _ => {
                tracing::debug!(error = %self, "Stats error");
            }
        }
    }
}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        err.to_app_error()
    }
}

impl From<IdError> for StatsError {
    fn from(err: IdError) -> Self {
        StatsError::InvalidEntityId(err.to_string())
    }
}

impl IntoResponse for StatsError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
