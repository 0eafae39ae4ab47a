//! Document status state machines.
//!
//! Each document type has a fixed set of legal status transitions; illegal
//! transitions fail with a [`DocumentError`] instead of being silently
//! ignored, and terminal statuses gate all further mutation.

pub mod cheque;
pub mod delivery_note;
pub mod error;
pub mod invoice;
pub mod order;
pub mod types;

pub use error::{DocumentError, DocumentKind};
pub use types::{ChequeKind, ChequeStatus, DeliveryNoteStatus, InvoiceStatus, OrderStatus};

#[cfg(test)]
mod transition_props;
