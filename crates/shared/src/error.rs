//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Every error kind maps to a distinct, stable code so calling layers can
/// render specific guidance (e.g. "reload and retry" vs "insufficient
/// stock") instead of a generic failure.
#[derive(Debug, Error)]
pub enum AppError {
    /// Access denied (cross-tenant or role violation).
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Illegal document status transition or edit of a terminal document.
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Stale version token detected; the caller should reload and retry.
    #[error("Concurrent modification detected: {0}")]
    ConcurrencyConflict(String),

    /// Stock withdrawal exceeding the available quantity.
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock {
        /// Quantity currently on hand.
        available: rust_decimal::Decimal,
        /// Quantity the caller attempted to withdraw.
        requested: rust_decimal::Decimal,
    },

    /// Transient conflict (e.g. number allocation race beyond the retry
    /// budget); the caller may retry the whole command.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::StateConflict(_) | Self::InsufficientStock { .. } => 422,
            Self::ConcurrencyConflict(_) | Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StateConflict(_) => "STATE_CONFLICT",
            Self::ConcurrencyConflict(_) => "CONCURRENCY_CONFLICT",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may retry the whole command.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_) | Self::Conflict(_))
    }
}
