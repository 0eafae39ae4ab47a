//! Delivery note status transitions.
//!
//! Draft→{Confirmed, Cancelled}; Confirmed is sticky and triggers the
//! stock posting exactly once; setting the invoice link makes the note
//! Invoiced, which is terminal regardless of anything else.

use super::error::{DocumentError, DocumentKind};
use super::types::DeliveryNoteStatus;

/// Outcome of a confirm request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// First confirm: the caller must post the stock movements.
    Confirmed,
    /// Repeat confirm: accepted, nothing further to do.
    AlreadyConfirmed,
}

/// Verifies that note fields and items may be modified.
///
/// The invoice link wins over status: a linked note is frozen even if its
/// status column were ever out of step.
///
/// # Errors
///
/// Returns [`DocumentError`] unless the note is an unlinked Draft.
pub fn ensure_editable(
    status: DeliveryNoteStatus,
    invoice_linked: bool,
) -> Result<(), DocumentError> {
    if invoice_linked {
        return Err(DocumentError::AlreadyInvoiced);
    }
    if status.is_editable() {
        Ok(())
    } else {
        Err(DocumentError::NotEditable {
            kind: DocumentKind::DeliveryNote,
            status: status.as_str(),
        })
    }
}

/// Requests confirmation of the note.
///
/// Confirm is idempotent: a note that is already Confirmed reports
/// [`ConfirmOutcome::AlreadyConfirmed`] so the caller can skip the stock
/// posting (which is additionally guarded by the movement batch check).
///
/// # Errors
///
/// Returns [`DocumentError`] for Cancelled or Invoiced notes.
pub fn confirm(
    status: DeliveryNoteStatus,
    invoice_linked: bool,
) -> Result<ConfirmOutcome, DocumentError> {
    if invoice_linked {
        return Err(DocumentError::AlreadyInvoiced);
    }
    match status {
        DeliveryNoteStatus::Draft => Ok(ConfirmOutcome::Confirmed),
        DeliveryNoteStatus::Confirmed => Ok(ConfirmOutcome::AlreadyConfirmed),
        DeliveryNoteStatus::Cancelled | DeliveryNoteStatus::Invoiced => {
            Err(DocumentError::InvalidTransition {
                kind: DocumentKind::DeliveryNote,
                from: status.as_str(),
                to: DeliveryNoteStatus::Confirmed.as_str(),
            })
        }
    }
}

/// Requests cancellation of the note. Only drafts can be cancelled;
/// confirmed notes have already moved stock.
///
/// # Errors
///
/// Returns [`DocumentError::InvalidTransition`] unless the note is Draft.
pub fn cancel(
    status: DeliveryNoteStatus,
    invoice_linked: bool,
) -> Result<DeliveryNoteStatus, DocumentError> {
    if invoice_linked {
        return Err(DocumentError::AlreadyInvoiced);
    }
    match status {
        DeliveryNoteStatus::Draft => Ok(DeliveryNoteStatus::Cancelled),
        _ => Err(DocumentError::InvalidTransition {
            kind: DocumentKind::DeliveryNote,
            from: status.as_str(),
            to: DeliveryNoteStatus::Cancelled.as_str(),
        }),
    }
}

/// Marks the note Invoiced as part of converting it to an invoice.
///
/// # Errors
///
/// Returns [`DocumentError`] unless the note is Confirmed and not yet
/// linked to an invoice.
pub fn mark_invoiced(
    status: DeliveryNoteStatus,
    invoice_linked: bool,
) -> Result<DeliveryNoteStatus, DocumentError> {
    if invoice_linked {
        return Err(DocumentError::AlreadyInvoiced);
    }
    match status {
        DeliveryNoteStatus::Confirmed => Ok(DeliveryNoteStatus::Invoiced),
        _ => Err(DocumentError::InvalidTransition {
            kind: DocumentKind::DeliveryNote,
            from: status.as_str(),
            to: DeliveryNoteStatus::Invoiced.as_str(),
        }),
    }
}
