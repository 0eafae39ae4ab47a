//! Document state machine errors.

use defter_shared::AppError;
use thiserror::Error;

/// The document type an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Sales invoice.
    Invoice,
    /// Customer order.
    Order,
    /// Delivery note.
    DeliveryNote,
    /// Cheque or promissory note.
    Cheque,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Invoice => "invoice",
            Self::Order => "order",
            Self::DeliveryNote => "delivery note",
            Self::Cheque => "cheque",
        };
        f.write_str(name)
    }
}

/// Errors raised by the document state machines.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// The requested status change is not a legal transition.
    #[error("Illegal {kind} status transition from {from} to {to}")]
    InvalidTransition {
        /// The document type.
        kind: DocumentKind,
        /// The current status.
        from: &'static str,
        /// The requested status.
        to: &'static str,
    },

    /// The document's current status does not permit edits.
    #[error("A {kind} in status {status} cannot be edited")]
    NotEditable {
        /// The document type.
        kind: DocumentKind,
        /// The current status.
        status: &'static str,
    },

    /// The delivery note was already converted to an invoice.
    #[error("Delivery note is already invoiced")]
    AlreadyInvoiced,

    /// Delivery progress is system-driven and cannot be set directly.
    #[error("Order delivery progress is driven by delivery notes, not set directly")]
    DeliveryProgressIsDerived,

    /// An invoice becomes paid only through a payment posting.
    #[error("An invoice becomes paid only through a payment posting")]
    PaidOnlyViaPayment,
}

impl DocumentError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotEditable { .. } => "NOT_EDITABLE",
            Self::AlreadyInvoiced => "ALREADY_INVOICED",
            Self::DeliveryProgressIsDerived => "DELIVERY_PROGRESS_IS_DERIVED",
            Self::PaidOnlyViaPayment => "PAID_ONLY_VIA_PAYMENT",
        }
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        Self::StateConflict(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = DocumentError::InvalidTransition {
            kind: DocumentKind::Invoice,
            from: "paid",
            to: "draft",
        };
        assert_eq!(
            err.to_string(),
            "Illegal invoice status transition from paid to draft"
        );

        let err = DocumentError::NotEditable {
            kind: DocumentKind::DeliveryNote,
            status: "confirmed",
        };
        assert_eq!(
            err.to_string(),
            "A delivery note in status confirmed cannot be edited"
        );
    }

    #[test]
    fn test_maps_to_state_conflict() {
        let app: AppError = DocumentError::AlreadyInvoiced.into();
        assert_eq!(app.error_code(), "STATE_CONFLICT");
        assert_eq!(app.status_code(), 422);
    }
}
