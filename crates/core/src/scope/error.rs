//! Scope resolution errors.

use defter_shared::types::FirmId;
use defter_shared::AppError;
use thiserror::Error;

/// Errors that can occur while resolving or enforcing tenant scope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    /// A firm-bound actor has no firm affiliation on record.
    #[error("Actor has no firm affiliation")]
    NoFirmAffiliation,

    /// A firm-bound actor asked for a firm other than their own.
    #[error("Actor may not act on firm {requested}")]
    FirmMismatch {
        /// The firm the actor asked for.
        requested: FirmId,
    },

    /// The target row is owned by a firm outside the actor's scope.
    #[error("Row owned by firm {owner} is outside the actor's scope")]
    OutOfScope {
        /// The firm owning the target row.
        owner: FirmId,
    },
}

impl ScopeError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoFirmAffiliation => "NO_FIRM_AFFILIATION",
            Self::FirmMismatch { .. } => "FIRM_MISMATCH",
            Self::OutOfScope { .. } => "OUT_OF_SCOPE",
        }
    }
}

impl From<ScopeError> for AppError {
    fn from(err: ScopeError) -> Self {
        Self::Forbidden(err.to_string())
    }
}
