//! Ledger posting plans and balance folds.
//!
//! This module implements the pure half of the ledger poster: validating a
//! business event and deriving the exact set of ledger rows and status
//! transitions it fans out into. The persistence layer executes the plan
//! inside one transaction so either every effect is visible or none is.

pub mod balance;
pub mod error;
pub mod service;
pub mod types;

pub use error::LedgerError;
pub use service::LedgerService;
pub use types::{
    CashDirection, EntryType, InvoiceFacts, PaymentKind, PaymentMethod, PaymentPlan,
    PaymentRequest, ReferenceType, StockMovementType,
};

#[cfg(test)]
mod service_props;
