//! Invoice status transitions.
//!
//! Legal transitions: Draft→Issued, {Draft, Issued}→Cancelled, and
//! Issued→Paid, the last one only on the payment-posting path. Paid and
//! Cancelled are terminal; the only accepted repeat is the idempotent
//! Paid→Paid no-op.

use super::error::{DocumentError, DocumentKind};
use super::types::InvoiceStatus;

/// Outcome of a status change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// The status after the request.
    pub status: InvoiceStatus,
    /// False for accepted no-ops (idempotent Paid→Paid).
    pub changed: bool,
}

/// Verifies that invoice fields and items may be modified.
///
/// # Errors
///
/// Returns [`DocumentError::NotEditable`] for Paid and Cancelled invoices.
pub fn ensure_editable(status: InvoiceStatus) -> Result<(), DocumentError> {
    if status.is_editable() {
        Ok(())
    } else {
        Err(DocumentError::NotEditable {
            kind: DocumentKind::Invoice,
            status: status.as_str(),
        })
    }
}

/// Applies a direct status change request.
///
/// A Paid target is rejected except for the idempotent Paid→Paid no-op;
/// settling an invoice is the ledger poster's job (see [`apply_payment`]).
///
/// # Errors
///
/// Returns [`DocumentError`] for illegal transitions.
pub fn set_status(
    current: InvoiceStatus,
    target: InvoiceStatus,
) -> Result<StatusChange, DocumentError> {
    use InvoiceStatus::{Cancelled, Draft, Issued, Paid};

    match (current, target) {
        (Paid, Paid) => Ok(StatusChange {
            status: Paid,
            changed: false,
        }),
        (_, Paid) => Err(DocumentError::PaidOnlyViaPayment),
        (Draft, Issued) | (Draft | Issued, Cancelled) => Ok(StatusChange {
            status: target,
            changed: true,
        }),
        _ => Err(DocumentError::InvalidTransition {
            kind: DocumentKind::Invoice,
            from: current.as_str(),
            to: target.as_str(),
        }),
    }
}

/// Settles an invoice from a successful payment posting.
///
/// # Errors
///
/// Returns [`DocumentError::InvalidTransition`] unless the invoice is
/// Issued.
pub fn apply_payment(current: InvoiceStatus) -> Result<InvoiceStatus, DocumentError> {
    match current {
        InvoiceStatus::Issued => Ok(InvoiceStatus::Paid),
        _ => Err(DocumentError::InvalidTransition {
            kind: DocumentKind::Invoice,
            from: current.as_str(),
            to: InvoiceStatus::Paid.as_str(),
        }),
    }
}
