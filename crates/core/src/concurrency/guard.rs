//! Version token checks for load-modify-save workflows.
//!
//! Documents that several staff members can edit concurrently carry an
//! opaque version token that changes on every write. A writer that sends
//! the token it loaded is rejected when the row has moved on; a writer
//! that sends no token opts into last-writer-wins.
//!
//! The check here catches stale writers before any work happens; the
//! persistence layer repeats it atomically by filtering its UPDATE on the
//! old token, so two writers racing past this check still cannot both win.

use defter_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the version guard.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConcurrencyError {
    /// The supplied version token no longer matches the stored one.
    #[error("Version token is stale; reload the document and retry")]
    VersionMismatch {
        /// The token the caller supplied.
        supplied: Uuid,
        /// The token currently stored.
        current: Uuid,
    },
}

impl From<ConcurrencyError> for AppError {
    fn from(err: ConcurrencyError) -> Self {
        Self::ConcurrencyConflict(err.to_string())
    }
}

/// Checks a caller-supplied version token against the stored one.
///
/// # Errors
///
/// Returns [`ConcurrencyError::VersionMismatch`] when a token is supplied
/// and differs from the stored token. No token skips the check.
pub fn check_version(current: Uuid, supplied: Option<Uuid>) -> Result<(), ConcurrencyError> {
    match supplied {
        Some(supplied) if supplied != current => Err(ConcurrencyError::VersionMismatch {
            supplied,
            current,
        }),
        _ => Ok(()),
    }
}

/// Produces the token a row carries after a successful write.
#[must_use]
pub fn next_version() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_token_passes() {
        let current = next_version();
        assert!(check_version(current, Some(current)).is_ok());
    }

    #[test]
    fn test_stale_token_rejected() {
        let current = next_version();
        let stale = next_version();
        assert_eq!(
            check_version(current, Some(stale)),
            Err(ConcurrencyError::VersionMismatch {
                supplied: stale,
                current,
            })
        );
    }

    #[test]
    fn test_no_token_skips_check() {
        assert!(check_version(next_version(), None).is_ok());
    }

    #[test]
    fn test_tokens_never_repeat() {
        assert_ne!(next_version(), next_version());
    }

    #[test]
    fn test_maps_to_concurrency_conflict() {
        let err = ConcurrencyError::VersionMismatch {
            supplied: Uuid::nil(),
            current: Uuid::nil(),
        };
        let app: AppError = err.into();
        assert_eq!(app.error_code(), "CONCURRENCY_CONFLICT");
        assert!(app.to_string().contains("reload"));
    }
}
